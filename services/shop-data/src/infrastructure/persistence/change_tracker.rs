//! 变更跟踪
//!
//! 按 (表, ID) 记录实体状态。暂存时即序列化实体快照，刷新时按暂存顺序
//! 生成 [`RowChange`]。会话读取过的行版本也记录在这里，用于乐观并发检查。

use std::collections::HashMap;

use serde_json::Value;
use shop_errors::{AppError, AppResult};
use shop_ports::{AppliedChange, RowChange, StoredRow};
use uuid::Uuid;

type EntryKey = (&'static str, Uuid);

/// 实体跟踪状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Unchanged,
    Added,
    Modified,
    Deleted,
}

#[derive(Debug, Clone)]
struct TrackedEntry {
    state: EntryState,
    /// 序列化失败在刷新时以 `Internal` 报告
    snapshot: Option<Result<Value, String>>,
    seq: u64,
}

/// 变更跟踪器
#[derive(Debug, Default)]
pub struct ChangeTracker {
    entries: HashMap<EntryKey, TrackedEntry>,
    observed_versions: HashMap<EntryKey, u64>,
    next_seq: u64,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn put(&mut self, key: EntryKey, state: EntryState, snapshot: Option<Result<Value, String>>) {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.entries.insert(
            key,
            TrackedEntry {
                state,
                snapshot,
                seq,
            },
        );
    }

    /// 当前状态
    pub fn state(&self, table: &'static str, id: Uuid) -> Option<EntryState> {
        self.entries.get(&(table, id)).map(|entry| entry.state)
    }

    /// 暂存插入
    pub fn add(&mut self, table: &'static str, id: Uuid, snapshot: Result<Value, String>) {
        let state = match self.state(table, id) {
            // 删除后重新加入视为整体替换
            Some(EntryState::Deleted) => EntryState::Modified,
            _ => EntryState::Added,
        };
        self.put((table, id), state, Some(snapshot));
    }

    /// 暂存整体替换
    pub fn update(&mut self, table: &'static str, id: Uuid, snapshot: Result<Value, String>) {
        let state = match self.state(table, id) {
            Some(EntryState::Added) => EntryState::Added,
            _ => EntryState::Modified,
        };
        self.put((table, id), state, Some(snapshot));
    }

    /// 暂存删除，尚未写入存储的新增直接丢弃
    pub fn remove(&mut self, table: &'static str, id: Uuid) {
        match self.state(table, id) {
            Some(EntryState::Added) => {
                self.entries.remove(&(table, id));
            }
            _ => self.put((table, id), EntryState::Deleted, None),
        }
    }

    /// 登记跟踪读取的实体
    pub fn attach(&mut self, table: &'static str, id: Uuid) {
        if !self.entries.contains_key(&(table, id)) {
            self.put((table, id), EntryState::Unchanged, None);
        }
    }

    /// 记录读取到的行版本
    pub fn observe(&mut self, table: &'static str, rows: &[StoredRow]) {
        for row in rows {
            self.observed_versions.insert((table, row.id), row.version);
        }
    }

    pub fn observed_version(&self, table: &'static str, id: Uuid) -> Option<u64> {
        self.observed_versions.get(&(table, id)).copied()
    }

    /// 暂存但尚未刷新的变更数
    pub fn pending_count(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.state != EntryState::Unchanged)
            .count()
    }

    /// 已跟踪的实体数（含未修改）
    pub fn tracked_count(&self) -> usize {
        self.entries.len()
    }

    /// 按暂存顺序生成待写入的行变更
    pub fn pending_changes(&self) -> AppResult<Vec<RowChange>> {
        let mut pending: Vec<(&EntryKey, &TrackedEntry)> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.state != EntryState::Unchanged)
            .collect();
        pending.sort_by_key(|(_, entry)| entry.seq);

        let mut changes = Vec::with_capacity(pending.len());
        for (&(table, id), entry) in pending {
            let change = match entry.state {
                EntryState::Unchanged => continue,
                EntryState::Added => RowChange::Insert {
                    table,
                    id,
                    data: snapshot_of(table, id, entry)?,
                },
                EntryState::Modified => RowChange::Update {
                    table,
                    id,
                    data: snapshot_of(table, id, entry)?,
                    expected_version: self.observed_version(table, id),
                },
                EntryState::Deleted => RowChange::Delete {
                    table,
                    id,
                    expected_version: self.observed_version(table, id),
                },
            };
            changes.push(change);
        }
        Ok(changes)
    }

    /// 刷新成功后：新增和修改转为未修改，删除的实体不再跟踪
    pub fn accept(&mut self, applied: &[AppliedChange]) {
        for change in applied {
            let key = (change.table, change.id);
            match change.version {
                Some(version) => {
                    self.observed_versions.insert(key, version);
                    if let Some(entry) = self.entries.get_mut(&key) {
                        entry.state = EntryState::Unchanged;
                        entry.snapshot = None;
                    }
                }
                None => {
                    self.observed_versions.remove(&key);
                    self.entries.remove(&key);
                }
            }
        }
    }

    /// 丢弃全部跟踪状态
    pub fn clear(&mut self) {
        self.entries.clear();
        self.observed_versions.clear();
    }
}

fn snapshot_of(table: &str, id: Uuid, entry: &TrackedEntry) -> AppResult<Value> {
    match &entry.snapshot {
        Some(Ok(value)) => Ok(value.clone()),
        Some(Err(message)) => Err(AppError::internal(format!(
            "Entity mapping failed for {} {}: {}",
            table, id, message
        ))),
        None => Err(AppError::internal(format!(
            "Missing snapshot for {} {}",
            table, id
        ))),
    }
}
