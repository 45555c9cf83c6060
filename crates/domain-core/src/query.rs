//! 查询规格
//!
//! [`QuerySpec`] 组合三个相互独立的可选部分：过滤谓词、预加载路径、排序。
//! 仓储按 预加载 → 过滤 → 排序 的顺序执行。[`PageOptions`] 在此之上
//! 追加分页参数。

use crate::{Entity, Include, OrderBy, Predicate};

/// 查询规格
#[derive(Debug, Clone)]
pub struct QuerySpec<T> {
    pub filter: Option<Predicate<T>>,
    pub includes: Vec<Include<T>>,
    pub order_by: Option<OrderBy<T>>,
    /// 是否排除软删除记录（显式开启）
    pub exclude_deleted: bool,
    /// 读取结果是否登记到变更跟踪器
    pub track_changes: bool,
}

impl<T> Default for QuerySpec<T> {
    fn default() -> Self {
        Self {
            filter: None,
            includes: Vec::new(),
            order_by: None,
            exclude_deleted: false,
            track_changes: false,
        }
    }
}

impl<T: Entity> QuerySpec<T> {
    /// 空规格，等价于读取全表
    pub fn new() -> Self {
        Self::default()
    }

    /// 仅包含过滤条件的规格
    pub fn filtered(filter: Predicate<T>) -> Self {
        Self::new().with_filter(filter)
    }

    /// 追加过滤条件，与已有条件取合取
    pub fn with_filter(mut self, filter: Predicate<T>) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and_also(filter),
            None => filter,
        });
        self
    }

    pub fn include(mut self, include: Include<T>) -> Self {
        self.includes.push(include);
        self
    }

    pub fn order_by(mut self, order_by: OrderBy<T>) -> Self {
        self.order_by = Some(order_by);
        self
    }

    pub fn exclude_deleted(mut self) -> Self {
        self.exclude_deleted = true;
        self
    }

    pub fn track_changes(mut self) -> Self {
        self.track_changes = true;
        self
    }

    /// 是否为空规格
    pub fn is_empty(&self) -> bool {
        self.filter.is_none()
            && self.includes.is_empty()
            && self.order_by.is_none()
            && !self.exclude_deleted
    }

    /// 实际生效的过滤条件（合并软删除过滤）
    pub fn effective_filter(&self) -> Option<Predicate<T>> {
        effective_filter(self.filter.clone(), self.exclude_deleted)
    }
}

/// 分页读取参数
///
/// `page_size` 与 `page_index` 保持有符号，负值由仓储拒绝为 `InvalidArgument`。
#[derive(Debug, Clone)]
pub struct PageOptions<T> {
    pub predicate: Option<Predicate<T>>,
    pub order_by: Option<OrderBy<T>>,
    pub track_changes: bool,
    /// 忽略分页参数，返回全部匹配记录
    pub take_all: bool,
    /// 每页条数，0 表示单页容纳全部
    pub page_size: i64,
    pub page_index: i64,
    pub includes: Vec<Include<T>>,
    pub exclude_deleted: bool,
}

impl<T> Default for PageOptions<T> {
    fn default() -> Self {
        Self {
            predicate: None,
            order_by: None,
            track_changes: false,
            take_all: false,
            page_size: 0,
            page_index: 0,
            includes: Vec::new(),
            exclude_deleted: false,
        }
    }
}

impl<T: Entity> PageOptions<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定页码与页大小
    pub fn page(mut self, page_index: i64, page_size: i64) -> Self {
        self.page_index = page_index;
        self.page_size = page_size;
        self
    }

    pub fn with_predicate(mut self, predicate: Predicate<T>) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and_also(predicate),
            None => predicate,
        });
        self
    }

    pub fn order_by(mut self, order_by: OrderBy<T>) -> Self {
        self.order_by = Some(order_by);
        self
    }

    pub fn include(mut self, include: Include<T>) -> Self {
        self.includes.push(include);
        self
    }

    pub fn take_all(mut self) -> Self {
        self.take_all = true;
        self
    }

    pub fn track_changes(mut self) -> Self {
        self.track_changes = true;
        self
    }

    pub fn exclude_deleted(mut self) -> Self {
        self.exclude_deleted = true;
        self
    }

    /// 由查询规格构造，分页参数取默认值
    pub fn from_spec(spec: QuerySpec<T>) -> Self {
        Self {
            predicate: spec.filter,
            order_by: spec.order_by,
            track_changes: spec.track_changes,
            includes: spec.includes,
            exclude_deleted: spec.exclude_deleted,
            ..Self::default()
        }
    }

    pub fn effective_filter(&self) -> Option<Predicate<T>> {
        effective_filter(self.predicate.clone(), self.exclude_deleted)
    }
}

fn effective_filter<T: Entity>(
    filter: Option<Predicate<T>>,
    exclude_deleted: bool,
) -> Option<Predicate<T>> {
    match (filter, exclude_deleted) {
        (Some(filter), true) => Some(Predicate::not_deleted().and_also(filter)),
        (None, true) => Some(Predicate::not_deleted()),
        (filter, false) => filter,
    }
}

/// 按谓词过滤（保持原有顺序）
pub fn apply_filter<T: 'static>(items: Vec<T>, filter: Option<&Predicate<T>>) -> Vec<T> {
    match filter {
        Some(predicate) => items
            .into_iter()
            .filter(|item| predicate.evaluate(item))
            .collect(),
        None => items,
    }
}

/// 按排序规则排序，未指定时保持存储扫描顺序
pub fn apply_order<T: 'static>(items: &mut [T], order_by: Option<&OrderBy<T>>) {
    if let Some(order_by) = order_by {
        order_by.sort(items);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Item {
        id: Uuid,
        rank: i32,
        is_deleted: bool,
    }

    impl Entity for Item {
        const TABLE: &'static str = "items";
        fn id(&self) -> Uuid {
            self.id
        }
        fn is_deleted(&self) -> bool {
            self.is_deleted
        }
    }

    fn items() -> Vec<Item> {
        [(3, false), (1, true), (2, false)]
            .into_iter()
            .map(|(rank, is_deleted)| Item {
                id: Uuid::new_v4(),
                rank,
                is_deleted,
            })
            .collect()
    }

    fn ranks(items: &[Item]) -> Vec<i32> {
        items.iter().map(|i| i.rank).collect()
    }

    #[test]
    fn test_empty_spec_keeps_everything() {
        let spec: QuerySpec<Item> = QuerySpec::new();
        assert!(spec.is_empty());
        let out = apply_filter(items(), spec.effective_filter().as_ref());
        assert_eq!(ranks(&out), vec![3, 1, 2]);
    }

    #[test]
    fn test_exclude_deleted_is_opt_in() {
        let spec = QuerySpec::<Item>::new().exclude_deleted();
        let out = apply_filter(items(), spec.effective_filter().as_ref());
        assert_eq!(ranks(&out), vec![3, 2]);
    }

    #[test]
    fn test_with_filter_conjoins() {
        let spec = QuerySpec::filtered(Predicate::new(|i: &Item| i.rank > 1))
            .with_filter(Predicate::new(|i: &Item| i.rank < 3));
        let out = apply_filter(items(), spec.effective_filter().as_ref());
        assert_eq!(ranks(&out), vec![2]);
    }

    #[test]
    fn test_order_applied() {
        let spec = QuerySpec::<Item>::new().order_by(OrderBy::asc(|i: &Item| i.rank));
        let mut out = apply_filter(items(), spec.effective_filter().as_ref());
        apply_order(&mut out, spec.order_by.as_ref());
        assert_eq!(ranks(&out), vec![1, 2, 3]);
    }

    #[test]
    fn test_page_options_from_spec() {
        let spec = QuerySpec::<Item>::new()
            .exclude_deleted()
            .order_by(OrderBy::desc(|i: &Item| i.rank));
        let options = PageOptions::from_spec(spec).page(1, 10);
        assert_eq!(options.page_index, 1);
        assert_eq!(options.page_size, 10);
        assert!(options.exclude_deleted);
        assert!(options.order_by.is_some());
        assert!(!options.take_all);
    }
}
