//! 基于会话的泛型仓储实现
//!
//! 读取路径：扫描存储 → 映射实体 → 预加载 → 过滤 → 排序（→ 分页）。
//! 所有读取都记录行版本；`track_changes` 读取额外登记为已跟踪。

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use shop_common::Paginated;
use shop_domain_core::{
    Entity, Include, PageOptions, Predicate, QuerySpec, RelatedRows, apply_filter, apply_order,
    from_row, to_row,
};
use shop_errors::{AppError, AppResult};
use shop_ports::{GenericRepository, StoredRow};
use tracing::debug;
use uuid::Uuid;

use super::query_metrics::QueryTimer;
use super::session::Session;

/// 泛型仓储
pub struct Repository<T> {
    session: Arc<Session>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Repository<T> {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            _entity: PhantomData,
        }
    }

    /// 扫描任意表（当前事务视图）
    async fn scan_table(&self, table: &'static str, operation: &'static str) -> AppResult<Vec<StoredRow>> {
        let tx = self.session.transaction()?;
        let timer = QueryTimer::new(table, operation, self.session.slow_query_threshold());
        let result = self.session.store().scan(table, tx).await;
        timer.observe(&result);
        result
    }

    /// 读取本表全部实体
    async fn load(&self, operation: &'static str, track: bool) -> AppResult<Vec<T>> {
        let rows = self.scan_table(T::TABLE, operation).await?;
        self.session.observe(T::TABLE, &rows, track);
        rows.into_iter().map(|row| from_row::<T>(row.data)).collect()
    }

    /// 执行预加载
    async fn load_includes(&self, items: &mut [T], includes: &[Include<T>]) -> AppResult<()> {
        if includes.is_empty() || items.is_empty() {
            return Ok(());
        }

        let mut related = RelatedRows::new();
        for include in includes {
            for &table in include.tables() {
                if related.contains(table) {
                    continue;
                }
                let rows = self.scan_table(table, "include").await?;
                self.session.observe(table, &rows, false);
                related.insert(table, rows.into_iter().map(|row| row.data).collect());
            }
        }

        for include in includes {
            include.load(items, &related)?;
            debug!(table = T::TABLE, path = include.path(), "Navigation loaded");
        }
        Ok(())
    }

    fn snapshot(entity: &T) -> Result<serde_json::Value, String> {
        to_row(entity).map_err(|e| e.to_string())
    }
}

#[async_trait]
impl<T: Entity> GenericRepository<T> for Repository<T> {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<T>> {
        let tx = self.session.transaction()?;
        let timer = QueryTimer::new(T::TABLE, "get_by_id", self.session.slow_query_threshold());
        let result = self.session.store().fetch(T::TABLE, id, tx).await;
        timer.observe(&result);

        match result? {
            Some(row) => {
                self.session.observe(T::TABLE, std::slice::from_ref(&row), false);
                Ok(Some(from_row(row.data)?))
            }
            None => {
                debug!(table = T::TABLE, %id, "Entity not found");
                Ok(None)
            }
        }
    }

    async fn get_all(&self) -> AppResult<Vec<T>> {
        self.load("get_all", false).await
    }

    async fn get(&self, spec: QuerySpec<T>) -> AppResult<Vec<T>> {
        if spec.is_empty() && !spec.track_changes {
            return self.get_all().await;
        }

        let mut items = self.load("get", spec.track_changes).await?;
        self.load_includes(&mut items, &spec.includes).await?;
        let mut items = apply_filter(items, spec.effective_filter().as_ref());
        apply_order(&mut items, spec.order_by.as_ref());

        debug!(table = T::TABLE, count = items.len(), "Query executed");
        Ok(items)
    }

    async fn find(&self, predicate: Predicate<T>) -> AppResult<Vec<T>> {
        self.get(QuerySpec::filtered(predicate)).await
    }

    async fn count(&self, predicate: Option<Predicate<T>>) -> AppResult<u64> {
        let items = self.load("count", false).await?;
        let count = match predicate {
            Some(predicate) => items.iter().filter(|item| predicate.evaluate(item)).count(),
            None => items.len(),
        };
        Ok(count as u64)
    }

    async fn get_paginated(&self, options: PageOptions<T>) -> AppResult<Paginated<T>> {
        if !options.take_all {
            if options.page_index < 0 {
                return Err(AppError::invalid_argument(format!(
                    "page_index must not be negative: {}",
                    options.page_index
                )));
            }
            if options.page_size < 0 {
                return Err(AppError::invalid_argument(format!(
                    "page_size must not be negative: {}",
                    options.page_size
                )));
            }
        }

        let filter = options.effective_filter();
        let total = self.count(filter.clone()).await?;
        let page_size = match u64::try_from(options.page_size) {
            Ok(0) | Err(_) => total,
            Ok(size) => size,
        };
        let page_index = u64::try_from(options.page_index).unwrap_or(0);

        let mut items = self.load("get_paginated", options.track_changes).await?;
        self.load_includes(&mut items, &options.includes).await?;
        let mut items = apply_filter(items, filter.as_ref());
        apply_order(&mut items, options.order_by.as_ref());

        let items: Vec<T> = if options.take_all {
            items
        } else {
            let skip = usize::try_from(page_size.saturating_mul(page_index)).unwrap_or(usize::MAX);
            let take = usize::try_from(page_size).unwrap_or(usize::MAX);
            items.into_iter().skip(skip).take(take).collect()
        };

        debug!(
            table = T::TABLE,
            total,
            page_size,
            page_index,
            count = items.len(),
            "Page loaded"
        );
        Ok(Paginated::new(items, total, page_size, page_index))
    }

    fn add(&self, entity: T) {
        let snapshot = Self::snapshot(&entity);
        self.session
            .stage(T::TABLE, "add", |tracker| tracker.add(T::TABLE, entity.id(), snapshot));
    }

    fn add_range(&self, entities: Vec<T>) {
        for entity in entities {
            self.add(entity);
        }
    }

    fn remove(&self, entity: &T) {
        let id = entity.id();
        self.session
            .stage(T::TABLE, "remove", |tracker| tracker.remove(T::TABLE, id));
    }

    fn remove_range(&self, entities: &[T]) {
        for entity in entities {
            self.remove(entity);
        }
    }

    fn update(&self, entity: T) {
        let snapshot = Self::snapshot(&entity);
        self.session
            .stage(T::TABLE, "update", |tracker| tracker.update(T::TABLE, entity.id(), snapshot));
    }

    fn update_range(&self, entities: Vec<T>) {
        for entity in entities {
            self.update(entity);
        }
    }

    fn modified(&self, entity: T) {
        let snapshot = Self::snapshot(&entity);
        self.session.stage(T::TABLE, "modified", |tracker| {
            tracker.attach(T::TABLE, entity.id());
            tracker.update(T::TABLE, entity.id(), snapshot)
        });
    }
}
