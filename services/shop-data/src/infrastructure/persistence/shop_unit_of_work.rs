//! 基于会话的 Unit of Work 实现
//!
//! 持有一个会话和所有实体的仓储实例，所有仓储操作都经由同一个会话。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use shop_config::StoreConfig;
use shop_errors::{AppError, AppResult};
use shop_ports::{GenericRepository, Store, TransactionId, UnitOfWork};
use tracing::{error, info, warn};

use crate::domain::entities::{Cart, CartItem, Category, Customer, Order, OrderItem, Product};
use crate::domain::unit_of_work::{ShopUnitOfWork, UnitOfWorkFactory};

use super::generic_repository::Repository;
use super::session::Session;

/// Unit of Work 工厂
///
/// 所有 Unit of Work 共享同一个存储，各自拥有独立的会话。
pub struct ShopUnitOfWorkFactory {
    store: Arc<dyn Store>,
    slow_query_threshold: Duration,
}

impl ShopUnitOfWorkFactory {
    pub fn new(store: Arc<dyn Store>, config: &StoreConfig) -> Self {
        Self {
            store,
            slow_query_threshold: Duration::from_millis(config.slow_query_threshold_ms),
        }
    }
}

impl UnitOfWorkFactory for ShopUnitOfWorkFactory {
    fn create(&self) -> Box<dyn ShopUnitOfWork> {
        Box::new(SessionUnitOfWork::new(Arc::new(Session::new(
            Arc::clone(&self.store),
            self.slow_query_threshold,
        ))))
    }
}

/// 会话 Unit of Work
pub struct SessionUnitOfWork {
    session: Arc<Session>,

    product_repo: Repository<Product>,
    category_repo: Repository<Category>,
    cart_repo: Repository<Cart>,
    cart_item_repo: Repository<CartItem>,
    order_repo: Repository<Order>,
    order_item_repo: Repository<OrderItem>,
    customer_repo: Repository<Customer>,
}

impl SessionUnitOfWork {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            product_repo: Repository::new(session.clone()),
            category_repo: Repository::new(session.clone()),
            cart_repo: Repository::new(session.clone()),
            cart_item_repo: Repository::new(session.clone()),
            order_repo: Repository::new(session.clone()),
            order_item_repo: Repository::new(session.clone()),
            customer_repo: Repository::new(session.clone()),
            session,
        }
    }

    async fn flush_and_commit(&self, tx: TransactionId) -> AppResult<usize> {
        let flushed = self.session.flush_into(Some(tx)).await?;
        self.session.store().commit(tx).await?;
        Ok(flushed)
    }

    /// 回滚事务并丢弃暂存变更；存储侧的回滚失败只记录日志
    async fn abort(&self, tx: TransactionId) {
        if let Err(e) = self.session.store().rollback(tx).await {
            warn!(tx_id = %tx, error = %e, "Store rollback failed");
        }
        self.session.clear_tracking();
        counter!("uow_rollbacks_total").increment(1);
    }
}

impl ShopUnitOfWork for SessionUnitOfWork {
    fn products(&self) -> &dyn GenericRepository<Product> {
        &self.product_repo
    }

    fn categories(&self) -> &dyn GenericRepository<Category> {
        &self.category_repo
    }

    fn carts(&self) -> &dyn GenericRepository<Cart> {
        &self.cart_repo
    }

    fn cart_items(&self) -> &dyn GenericRepository<CartItem> {
        &self.cart_item_repo
    }

    fn orders(&self) -> &dyn GenericRepository<Order> {
        &self.order_repo
    }

    fn order_items(&self) -> &dyn GenericRepository<OrderItem> {
        &self.order_item_repo
    }

    fn customers(&self) -> &dyn GenericRepository<Customer> {
        &self.customer_repo
    }
}

#[async_trait]
impl UnitOfWork for SessionUnitOfWork {
    async fn begin_transaction(&self) -> AppResult<()> {
        if let Some(active) = self.session.transaction()? {
            return Err(AppError::illegal_state(format!(
                "Transaction {} is already active",
                active
            )));
        }

        let tx = self.session.store().begin().await?;
        if let Err(e) = self.session.set_transaction(tx) {
            self.abort(tx).await;
            return Err(e);
        }
        info!(tx_id = %tx, "Unit of work transaction started");
        Ok(())
    }

    async fn commit(&self) -> AppResult<()> {
        let tx = self.session.take_transaction()?;

        match self.flush_and_commit(tx).await {
            Ok(flushed) => {
                counter!("uow_commits_total").increment(1);
                counter!("uow_flushed_changes_total").increment(flushed as u64);
                info!(tx_id = %tx, count = flushed, "Unit of work committed");
                Ok(())
            }
            Err(e) => {
                error!(tx_id = %tx, error = %e, "Commit failed, rolling back");
                self.abort(tx).await;
                Err(e)
            }
        }
    }

    async fn rollback(&self) -> AppResult<()> {
        let tx = self.session.take_transaction()?;
        let result = self.session.store().rollback(tx).await;
        self.session.clear_tracking();
        counter!("uow_rollbacks_total").increment(1);
        warn!(tx_id = %tx, "Unit of work rolled back");
        result
    }

    async fn complete(&self) -> AppResult<usize> {
        match self.session.flush().await {
            Ok(flushed) => {
                counter!("uow_flushed_changes_total").increment(flushed as u64);
                info!(
                    count = flushed,
                    in_transaction = self.session.in_transaction(),
                    "Changes flushed"
                );
                Ok(flushed)
            }
            Err(e) => {
                error!(error = %e, "Flush failed");
                // 事务内刷新失败时整体回滚
                if self.session.in_transaction()
                    && let Ok(tx) = self.session.take_transaction()
                {
                    self.abort(tx).await;
                }
                Err(e)
            }
        }
    }

    fn in_transaction(&self) -> bool {
        self.session.in_transaction()
    }

    fn clear_tracking(&self) {
        self.session.clear_tracking();
    }

    fn pending_changes(&self) -> usize {
        self.session.pending_changes()
    }

    async fn close(&self) -> AppResult<()> {
        if self.session.is_closed() {
            return Ok(());
        }

        if let Some(tx) = self.session.close() {
            warn!(tx_id = %tx, "Unit of work closed with an open transaction");
            self.session.store().rollback(tx).await?;
            counter!("uow_rollbacks_total").increment(1);
        }
        info!("Unit of work closed");
        Ok(())
    }
}
