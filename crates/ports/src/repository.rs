//! Repository trait 定义

use async_trait::async_trait;
use shop_common::Paginated;
use shop_domain_core::{Entity, PageOptions, Predicate, QuerySpec};
use shop_errors::AppResult;
use uuid::Uuid;

/// 泛型仓储
///
/// 读操作跨越存储边界，可能挂起；暂存操作只修改所属 Unit of Work 的变更跟踪状态，
/// 提交之前不会持久化。
#[async_trait]
pub trait GenericRepository<T: Entity>: Send + Sync {
    /// 按 ID 读取（不跟踪），不存在时返回 `None`
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<T>>;

    /// 读取整表，不做任何过滤
    async fn get_all(&self) -> AppResult<Vec<T>>;

    /// 按规格读取：预加载 → 过滤 → 排序
    async fn get(&self, spec: QuerySpec<T>) -> AppResult<Vec<T>>;

    /// 仅按谓词过滤
    async fn find(&self, predicate: Predicate<T>) -> AppResult<Vec<T>>;

    /// 统计匹配条数，谓词缺省时统计整表
    async fn count(&self, predicate: Option<Predicate<T>>) -> AppResult<u64>;

    /// 分页读取
    async fn get_paginated(&self, options: PageOptions<T>) -> AppResult<Paginated<T>>;

    fn add(&self, entity: T);

    fn add_range(&self, entities: Vec<T>);

    fn remove(&self, entity: &T);

    fn remove_range(&self, entities: &[T]);

    /// 整体替换
    fn update(&self, entity: T);

    fn update_range(&self, entities: Vec<T>);

    /// 将未跟踪读取的实体重新附加并标记为已修改
    fn modified(&self, entity: T);
}
