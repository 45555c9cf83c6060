//! 过滤谓词
//!
//! 谓词是实体上的布尔函数，以闭包值表示。多个相互独立的可选条件通过
//! [`Predicate::all`] 折叠为一个短路求值的合取谓词。

use std::fmt;
use std::sync::Arc;

use crate::Entity;

type PredicateFn<T> = dyn Fn(&T) -> bool + Send + Sync;

/// 实体过滤谓词
pub struct Predicate<T> {
    test: Arc<PredicateFn<T>>,
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self {
            test: Arc::clone(&self.test),
        }
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate").finish_non_exhaustive()
    }
}

impl<T: 'static> Predicate<T> {
    pub fn new<F>(test: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            test: Arc::new(test),
        }
    }

    /// 恒真谓词
    pub fn always() -> Self {
        Self::new(|_| true)
    }

    /// 对实体求值
    pub fn evaluate(&self, entity: &T) -> bool {
        (self.test)(entity)
    }

    /// 逻辑与，左侧为假时不再求值右侧
    pub fn and_also(self, other: Predicate<T>) -> Self {
        Self::new(move |entity| self.evaluate(entity) && other.evaluate(entity))
    }

    /// 逻辑或，左侧为真时不再求值右侧
    pub fn or_else(self, other: Predicate<T>) -> Self {
        Self::new(move |entity| self.evaluate(entity) || other.evaluate(entity))
    }

    /// 逻辑非
    pub fn negate(self) -> Self {
        Self::new(move |entity| !self.evaluate(entity))
    }

    /// 将零个或多个谓词折叠为一个合取谓词，空列表视为恒真
    pub fn all<I>(predicates: I) -> Self
    where
        I: IntoIterator<Item = Predicate<T>>,
    {
        predicates
            .into_iter()
            .reduce(Predicate::and_also)
            .unwrap_or_else(Self::always)
    }
}

impl<T: Entity> Predicate<T> {
    /// 排除软删除记录
    pub fn not_deleted() -> Self {
        Self::new(|entity: &T| !entity.is_deleted())
    }
}
