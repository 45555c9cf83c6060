//! 会话
//!
//! 一个 Unit of Work 的全部仓储共享同一个会话：同一个存储句柄、
//! 同一个事务以及同一个变更跟踪器。会话只属于一个请求，
//! 内部锁仅用于满足 `Sync`，从不跨越 `.await` 持有。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use shop_errors::{AppError, AppResult};
use shop_ports::{Store, StoredRow, TransactionId};
use tracing::{debug, warn};

use super::change_tracker::ChangeTracker;

#[derive(Debug, Default)]
struct SessionState {
    transaction: Option<TransactionId>,
    tracker: ChangeTracker,
    closed: bool,
}

/// 共享会话
pub struct Session {
    store: Arc<dyn Store>,
    state: Mutex<SessionState>,
    slow_query_threshold: Duration,
}

impl Session {
    pub fn new(store: Arc<dyn Store>, slow_query_threshold: Duration) -> Self {
        Self {
            store,
            state: Mutex::new(SessionState::default()),
            slow_query_threshold,
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn slow_query_threshold(&self) -> Duration {
        self.slow_query_threshold
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 当前事务；会话已关闭时返回 `IllegalState`
    pub fn transaction(&self) -> AppResult<Option<TransactionId>> {
        let state = self.lock();
        if state.closed {
            return Err(closed_error());
        }
        Ok(state.transaction)
    }

    pub fn in_transaction(&self) -> bool {
        self.lock().transaction.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// 记录已开启的事务，已有事务时返回 `IllegalState`
    pub fn set_transaction(&self, tx: TransactionId) -> AppResult<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(closed_error());
        }
        if let Some(active) = state.transaction {
            return Err(AppError::illegal_state(format!(
                "Transaction {} is already active",
                active
            )));
        }
        state.transaction = Some(tx);
        Ok(())
    }

    /// 取出当前事务，没有事务时返回 `IllegalState`
    pub fn take_transaction(&self) -> AppResult<TransactionId> {
        let mut state = self.lock();
        if state.closed {
            return Err(closed_error());
        }
        state
            .transaction
            .take()
            .ok_or_else(|| AppError::illegal_state("No active transaction"))
    }

    /// 修改变更跟踪器；会话关闭后暂存操作被忽略
    pub fn stage<F>(&self, table: &'static str, operation: &'static str, f: F)
    where
        F: FnOnce(&mut ChangeTracker),
    {
        let mut state = self.lock();
        if state.closed {
            warn!(table, operation, "Staging ignored on a closed unit of work");
            return;
        }
        f(&mut state.tracker);
        debug!(
            table,
            operation,
            pending = state.tracker.pending_count(),
            "Change staged"
        );
    }

    /// 记录读取结果的行版本，按需登记为已跟踪
    pub fn observe(&self, table: &'static str, rows: &[StoredRow], track: bool) {
        let mut state = self.lock();
        state.tracker.observe(table, rows);
        if track {
            for row in rows {
                state.tracker.attach(table, row.id);
            }
        }
    }

    pub fn pending_changes(&self) -> usize {
        self.lock().tracker.pending_count()
    }

    pub fn clear_tracking(&self) {
        let mut state = self.lock();
        let tracked = state.tracker.tracked_count();
        state.tracker.clear();
        debug!(tracked, "Change tracker cleared");
    }

    /// 将暂存变更写入存储（有事务时写入事务），返回写入的行数
    pub async fn flush(&self) -> AppResult<usize> {
        let tx = self.transaction()?;
        self.flush_into(tx).await
    }

    /// 将暂存变更写入指定事务；`None` 时直接写入已提交数据
    pub async fn flush_into(&self, tx: Option<TransactionId>) -> AppResult<usize> {
        let changes = {
            let state = self.lock();
            if state.closed {
                return Err(closed_error());
            }
            state.tracker.pending_changes()?
        };
        if changes.is_empty() {
            return Ok(0);
        }

        let applied = self.store.apply(changes, tx).await?;
        self.lock().tracker.accept(&applied);
        Ok(applied.len())
    }

    /// 标记为已关闭并丢弃跟踪状态，返回未结束的事务
    pub fn close(&self) -> Option<TransactionId> {
        let mut state = self.lock();
        state.closed = true;
        state.tracker.clear();
        state.transaction.take()
    }
}

impl Drop for Session {
    /// 析构时放弃未结束的事务
    fn drop(&mut self) {
        let transaction = self
            .state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .transaction
            .take();
        if let Some(tx) = transaction {
            warn!(tx_id = %tx, "Session dropped with an open transaction");
            self.store.abandon(tx);
        }
    }
}

fn closed_error() -> AppError {
    AppError::illegal_state("Unit of work is closed")
}
