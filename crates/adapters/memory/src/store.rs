//! 内存存储
//!
//! 已提交数据按表保存；事务内写入先记录在事务自身的写集中，读取时叠加在已提交数据之上。
//! 提交采用先提交者胜出：事务首次写某行时记录该行的已提交版本，
//! 提交时若版本已被其他事务改变则返回 `ConcurrencyConflict`。

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use shop_errors::{AppError, AppResult};
use shop_ports::{AppliedChange, RowChange, Store, StoredRow, TransactionId};
use tokio::sync::{RwLock, RwLockWriteGuard};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

type RowKey = (String, Uuid);

/// 未提交事务
#[derive(Debug, Default)]
struct PendingTransaction {
    /// 写集，`None` 表示删除
    writes: HashMap<RowKey, Option<StoredRow>>,
    /// 首次写入时该行的已提交版本
    base_versions: HashMap<RowKey, Option<u64>>,
}

#[derive(Debug, Default)]
struct StoreState {
    tables: HashMap<String, BTreeMap<Uuid, StoredRow>>,
    transactions: HashMap<TransactionId, PendingTransaction>,
    last_version: u64,
}

impl StoreState {
    fn committed(&self, table: &str, id: Uuid) -> Option<&StoredRow> {
        self.tables.get(table).and_then(|rows| rows.get(&id))
    }

    fn pending(&self, tx: Option<TransactionId>) -> AppResult<Option<&PendingTransaction>> {
        match tx {
            None => Ok(None),
            Some(tx) => self
                .transactions
                .get(&tx)
                .map(Some)
                .ok_or_else(|| unknown_transaction(tx)),
        }
    }

    /// 事务视图下的行
    fn visible(
        &self,
        table: &str,
        id: Uuid,
        pending: Option<&PendingTransaction>,
    ) -> Option<StoredRow> {
        if let Some(write) = pending.and_then(|p| p.writes.get(&(table.to_string(), id))) {
            return write.clone();
        }
        self.committed(table, id).cloned()
    }
}

/// 内存存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    name: String,
    state: RwLock<StoreState>,
    /// 放弃时写锁被占用的事务，在下一次取得写锁时清理
    abandoned: Mutex<Vec<TransactionId>>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(StoreState::default()),
            abandoned: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 未结束的事务数
    pub async fn open_transactions(&self) -> usize {
        self.write_state().await.transactions.len()
    }

    /// 已提交的行数
    pub async fn committed_rows(&self, table: &str) -> usize {
        self.state
            .read()
            .await
            .tables
            .get(table)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }
}

impl MemoryStore {
    async fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        let mut state = self.state.write().await;
        self.reap_abandoned(&mut state);
        state
    }

    fn reap_abandoned(&self, state: &mut StoreState) {
        let abandoned = std::mem::take(
            &mut *self.abandoned.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for tx in abandoned {
            self.discard(state, tx);
        }
    }

    fn discard(&self, state: &mut StoreState, tx: TransactionId) {
        if let Some(pending) = state.transactions.remove(&tx) {
            warn!(
                store = %self.name,
                tx_id = %tx,
                count = pending.writes.len(),
                "Abandoned transaction discarded"
            );
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> AppResult<TransactionId> {
        let tx = TransactionId::new();
        self.write_state()
            .await
            .transactions
            .insert(tx, PendingTransaction::default());
        info!(store = %self.name, tx_id = %tx, "Transaction started");
        Ok(tx)
    }

    async fn scan(&self, table: &str, tx: Option<TransactionId>) -> AppResult<Vec<StoredRow>> {
        let state = self.state.read().await;
        let pending = state.pending(tx)?;

        let mut rows: BTreeMap<Uuid, StoredRow> = state.tables.get(table).cloned().unwrap_or_default();
        if let Some(pending) = pending {
            for ((write_table, id), write) in &pending.writes {
                if write_table != table {
                    continue;
                }
                match write {
                    Some(row) => rows.insert(*id, row.clone()),
                    None => rows.remove(id),
                };
            }
        }

        debug!(store = %self.name, table, count = rows.len(), "Table scanned");
        Ok(rows.into_values().collect())
    }

    async fn fetch(
        &self,
        table: &str,
        id: Uuid,
        tx: Option<TransactionId>,
    ) -> AppResult<Option<StoredRow>> {
        let state = self.state.read().await;
        let pending = state.pending(tx)?;
        Ok(state.visible(table, id, pending))
    }

    async fn apply(
        &self,
        changes: Vec<RowChange>,
        tx: Option<TransactionId>,
    ) -> AppResult<Vec<AppliedChange>> {
        let mut state = self.write_state().await;
        let pending = state.pending(tx)?;

        // 批内后续操作能看到前面操作的结果
        let mut staged: HashMap<RowKey, Option<StoredRow>> = HashMap::new();
        let mut staged_order: Vec<RowKey> = Vec::new();
        let mut applied = Vec::with_capacity(changes.len());
        let mut version = state.last_version;

        for change in changes {
            let key = (change.table().to_string(), change.id());
            let current = match staged.get(&key) {
                Some(row) => row.clone(),
                None => state.visible(&key.0, key.1, pending),
            };

            let next = match change {
                RowChange::Insert { table, id, data } => {
                    if current.is_some() {
                        error!(store = %self.name, table, %id, "Duplicate primary key");
                        return Err(AppError::storage_failure(format!(
                            "duplicate key value violates unique constraint \"{}_pkey\": {}",
                            table, id
                        )));
                    }
                    version += 1;
                    applied.push(AppliedChange {
                        table,
                        id,
                        version: Some(version),
                    });
                    Some(StoredRow { id, version, data })
                }
                RowChange::Update {
                    table,
                    id,
                    data,
                    expected_version,
                } => {
                    check_version(table, id, current.as_ref(), expected_version)?;
                    version += 1;
                    applied.push(AppliedChange {
                        table,
                        id,
                        version: Some(version),
                    });
                    Some(StoredRow { id, version, data })
                }
                RowChange::Delete {
                    table,
                    id,
                    expected_version,
                } => {
                    check_version(table, id, current.as_ref(), expected_version)?;
                    applied.push(AppliedChange {
                        table,
                        id,
                        version: None,
                    });
                    None
                }
            };

            if !staged.contains_key(&key) {
                staged_order.push(key.clone());
            }
            staged.insert(key, next);
        }

        state.last_version = version;
        match tx {
            None => {
                for key in staged_order {
                    let row = staged.remove(&key).flatten();
                    let (table, id) = key;
                    let rows = state.tables.entry(table).or_default();
                    match row {
                        Some(row) => rows.insert(id, row),
                        None => rows.remove(&id),
                    };
                }
            }
            Some(tx) => {
                let snapshot: Vec<(RowKey, Option<u64>)> = staged_order
                    .iter()
                    .map(|key| (key.clone(), state.committed(&key.0, key.1).map(|r| r.version)))
                    .collect();
                let pending = state
                    .transactions
                    .get_mut(&tx)
                    .ok_or_else(|| unknown_transaction(tx))?;
                for (key, base) in snapshot {
                    pending.base_versions.entry(key.clone()).or_insert(base);
                    let row = staged.remove(&key).flatten();
                    pending.writes.insert(key, row);
                }
            }
        }

        debug!(store = %self.name, tx_id = ?tx, count = applied.len(), "Changes applied");
        Ok(applied)
    }

    async fn commit(&self, tx: TransactionId) -> AppResult<()> {
        let mut state = self.write_state().await;
        let pending = state
            .transactions
            .remove(&tx)
            .ok_or_else(|| unknown_transaction(tx))?;

        for (key, base) in &pending.base_versions {
            let now = state.committed(&key.0, key.1).map(|r| r.version);
            if now != *base {
                warn!(
                    store = %self.name,
                    tx_id = %tx,
                    table = %key.0,
                    id = %key.1,
                    "Row changed by a concurrent transaction"
                );
                return Err(AppError::concurrency_conflict(format!(
                    "{} {} was modified by another transaction",
                    key.0, key.1
                )));
            }
        }

        let count = pending.writes.len();
        for ((table, id), row) in pending.writes {
            let rows = state.tables.entry(table).or_default();
            match row {
                Some(row) => rows.insert(id, row),
                None => rows.remove(&id),
            };
        }

        info!(store = %self.name, tx_id = %tx, count, "Transaction committed");
        Ok(())
    }

    async fn rollback(&self, tx: TransactionId) -> AppResult<()> {
        let removed = self.write_state().await.transactions.remove(&tx);
        match removed {
            Some(pending) => {
                warn!(
                    store = %self.name,
                    tx_id = %tx,
                    count = pending.writes.len(),
                    "Transaction rolled back"
                );
                Ok(())
            }
            None => Err(unknown_transaction(tx)),
        }
    }

    fn abandon(&self, tx: TransactionId) {
        match self.state.try_write() {
            Ok(mut state) => {
                self.reap_abandoned(&mut state);
                self.discard(&mut state, tx);
            }
            Err(_) => {
                debug!(store = %self.name, tx_id = %tx, "Store busy, transaction queued for discard");
                self.abandoned
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(tx);
            }
        }
    }
}

fn check_version(
    table: &str,
    id: Uuid,
    current: Option<&StoredRow>,
    expected_version: Option<u64>,
) -> AppResult<()> {
    let Some(current) = current else {
        warn!(table, %id, "Row no longer exists");
        return Err(AppError::concurrency_conflict(format!(
            "{} {} does not exist or was deleted",
            table, id
        )));
    };
    if let Some(expected) = expected_version
        && expected != current.version
    {
        warn!(table, %id, expected, actual = current.version, "Row version mismatch");
        return Err(AppError::concurrency_conflict(format!(
            "{} {} was modified (expected version {}, found {})",
            table, id, expected, current.version
        )));
    }
    Ok(())
}

fn unknown_transaction(tx: TransactionId) -> AppError {
    AppError::illegal_state(format!("Transaction {} is not active", tx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TABLE: &str = "products";

    fn insert(id: Uuid, name: &str) -> RowChange {
        RowChange::Insert {
            table: TABLE,
            id,
            data: json!({ "id": id, "name": name }),
        }
    }

    fn update(id: Uuid, name: &str, expected_version: Option<u64>) -> RowChange {
        RowChange::Update {
            table: TABLE,
            id,
            data: json!({ "id": id, "name": name }),
            expected_version,
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let store = MemoryStore::new("test");
        let id = Uuid::new_v4();
        let applied = store.apply(vec![insert(id, "pen")], None).await.unwrap();

        let row = store.fetch(TABLE, id, None).await.unwrap().unwrap();
        assert_eq!(row.data["name"], "pen");
        assert_eq!(Some(row.version), applied[0].version);
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_storage_failure() {
        let store = MemoryStore::new("test");
        let id = Uuid::new_v4();
        store.apply(vec![insert(id, "pen")], None).await.unwrap();

        let err = store.apply(vec![insert(id, "pen")], None).await.unwrap_err();
        assert!(matches!(err, AppError::StorageFailure(_)));
    }

    #[tokio::test]
    async fn test_batch_is_all_or_nothing() {
        let store = MemoryStore::new("test");
        let existing = Uuid::new_v4();
        store.apply(vec![insert(existing, "pen")], None).await.unwrap();

        let fresh = Uuid::new_v4();
        let result = store
            .apply(vec![insert(fresh, "ink"), insert(existing, "pen")], None)
            .await;

        assert!(result.is_err());
        assert!(store.fetch(TABLE, fresh, None).await.unwrap().is_none());
        assert_eq!(store.committed_rows(TABLE).await, 1);
    }

    #[tokio::test]
    async fn test_stale_version_is_conflict() {
        let store = MemoryStore::new("test");
        let id = Uuid::new_v4();
        let v1 = store.apply(vec![insert(id, "pen")], None).await.unwrap()[0].version;
        store.apply(vec![update(id, "pencil", v1)], None).await.unwrap();

        let err = store
            .apply(vec![update(id, "marker", v1)], None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ConcurrencyConflict(_)));
    }

    #[tokio::test]
    async fn test_update_missing_row_is_conflict() {
        let store = MemoryStore::new("test");
        let err = store
            .apply(vec![update(Uuid::new_v4(), "ghost", None)], None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ConcurrencyConflict(_)));
    }

    #[tokio::test]
    async fn test_transaction_writes_are_isolated_until_commit() {
        let store = MemoryStore::new("test");
        let tx = store.begin().await.unwrap();
        let id = Uuid::new_v4();
        store.apply(vec![insert(id, "pen")], Some(tx)).await.unwrap();

        assert!(store.fetch(TABLE, id, Some(tx)).await.unwrap().is_some());
        assert!(store.fetch(TABLE, id, None).await.unwrap().is_none());
        assert_eq!(store.scan(TABLE, Some(tx)).await.unwrap().len(), 1);
        assert!(store.scan(TABLE, None).await.unwrap().is_empty());

        store.commit(tx).await.unwrap();
        assert!(store.fetch(TABLE, id, None).await.unwrap().is_some());
        assert_eq!(store.open_transactions().await, 0);
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let store = MemoryStore::new("test");
        let tx = store.begin().await.unwrap();
        let id = Uuid::new_v4();
        store.apply(vec![insert(id, "pen")], Some(tx)).await.unwrap();
        store.rollback(tx).await.unwrap();

        assert!(store.fetch(TABLE, id, None).await.unwrap().is_none());
        assert!(matches!(
            store.rollback(tx).await.unwrap_err(),
            AppError::IllegalState(_)
        ));
    }

    #[tokio::test]
    async fn test_first_committer_wins() {
        let store = MemoryStore::new("test");
        let id = Uuid::new_v4();
        store.apply(vec![insert(id, "pen")], None).await.unwrap();

        let first = store.begin().await.unwrap();
        let second = store.begin().await.unwrap();
        store
            .apply(vec![update(id, "first", None)], Some(first))
            .await
            .unwrap();
        store
            .apply(vec![update(id, "second", None)], Some(second))
            .await
            .unwrap();

        store.commit(first).await.unwrap();
        let err = store.commit(second).await.unwrap_err();
        assert!(matches!(err, AppError::ConcurrencyConflict(_)));

        let row = store.fetch(TABLE, id, None).await.unwrap().unwrap();
        assert_eq!(row.data["name"], "first");
    }

    #[tokio::test]
    async fn test_delete_in_transaction_hides_row() {
        let store = MemoryStore::new("test");
        let id = Uuid::new_v4();
        store.apply(vec![insert(id, "pen")], None).await.unwrap();

        let tx = store.begin().await.unwrap();
        store
            .apply(
                vec![RowChange::Delete {
                    table: TABLE,
                    id,
                    expected_version: None,
                }],
                Some(tx),
            )
            .await
            .unwrap();

        assert!(store.scan(TABLE, Some(tx)).await.unwrap().is_empty());
        assert_eq!(store.scan(TABLE, None).await.unwrap().len(), 1);
        store.commit(tx).await.unwrap();
        assert_eq!(store.committed_rows(TABLE).await, 0);
    }

    #[tokio::test]
    async fn test_unknown_transaction_is_illegal_state() {
        let store = MemoryStore::new("test");
        let err = store
            .scan(TABLE, Some(TransactionId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::IllegalState(_)));
    }

    #[tokio::test]
    async fn test_abandon_discards_write_set() {
        let store = MemoryStore::new("test");
        let tx = store.begin().await.unwrap();
        store
            .apply(vec![insert(Uuid::new_v4(), "pen")], Some(tx))
            .await
            .unwrap();

        store.abandon(tx);
        assert_eq!(store.open_transactions().await, 0);
        assert_eq!(store.committed_rows(TABLE).await, 0);
        assert!(matches!(
            store.commit(tx).await,
            Err(AppError::IllegalState(_))
        ));
    }

    #[tokio::test]
    async fn test_abandon_while_locked_is_deferred() {
        let store = MemoryStore::new("test");
        let tx = store.begin().await.unwrap();

        let guard = store.state.read().await;
        store.abandon(tx);
        assert_eq!(guard.transactions.len(), 1);
        drop(guard);

        assert_eq!(store.open_transactions().await, 0);
    }
}
