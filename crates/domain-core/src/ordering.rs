//! 排序规则
//!
//! 以比较函数表示的排序，可链式追加次级排序键。排序是稳定的，
//! 键相等的记录保持存储扫描返回的相对顺序。

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

type CompareFn<T> = dyn Fn(&T, &T) -> Ordering + Send + Sync;

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    #[default]
    Ascending,
    Descending,
}

/// 实体排序规则
pub struct OrderBy<T> {
    compare: Arc<CompareFn<T>>,
}

impl<T> Clone for OrderBy<T> {
    fn clone(&self) -> Self {
        Self {
            compare: Arc::clone(&self.compare),
        }
    }
}

impl<T> fmt::Debug for OrderBy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderBy").finish_non_exhaustive()
    }
}

impl<T: 'static> OrderBy<T> {
    /// 由比较函数创建
    ///
    /// 比较函数必须是全序：`slice::sort_by` 遇到不满足全序的比较函数可能 panic，
    /// 因此只在 crate 内部使用，对外只暴露按键（`K: Ord`）构造的排序。
    pub(crate) fn new<F>(compare: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        Self {
            compare: Arc::new(compare),
        }
    }

    /// 按键排序
    pub fn by_key<K, F>(key: F, direction: OrderDirection) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self::new(move |a, b| {
            let ordering = key(a).cmp(&key(b));
            match direction {
                OrderDirection::Ascending => ordering,
                OrderDirection::Descending => ordering.reverse(),
            }
        })
    }

    /// 按键升序
    pub fn asc<K, F>(key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self::by_key(key, OrderDirection::Ascending)
    }

    /// 按键降序
    pub fn desc<K, F>(key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self::by_key(key, OrderDirection::Descending)
    }

    /// 追加次级排序
    pub fn then(self, next: OrderBy<T>) -> Self {
        Self::new(move |a, b| self.compare(a, b).then_with(|| next.compare(a, b)))
    }

    pub fn then_asc<K, F>(self, key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.then(Self::asc(key))
    }

    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.compare)(a, b)
    }

    /// 稳定排序
    pub fn sort(&self, items: &mut [T]) {
        items.sort_by(|a, b| self.compare(a, b));
    }
}
