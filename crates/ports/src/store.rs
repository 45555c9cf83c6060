//! 存储引擎边界
//!
//! 存储以表为单位保存 JSON 行，每行带一个单调递增的版本号。
//! 写入通过 [`RowChange`] 批量提交，批次内全部成功或全部失败。

use async_trait::async_trait;
use derive_more::Display;
use serde_json::Value;
use shop_errors::AppResult;
use uuid::Uuid;

/// 存储事务标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display("{_0}")]
pub struct TransactionId(pub Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

/// 存储行
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub id: Uuid,
    pub version: u64,
    pub data: Value,
}

/// 行级写操作
#[derive(Debug, Clone, PartialEq)]
pub enum RowChange {
    Insert {
        table: &'static str,
        id: Uuid,
        data: Value,
    },
    /// `expected_version` 为 `None` 时只要求行存在
    Update {
        table: &'static str,
        id: Uuid,
        data: Value,
        expected_version: Option<u64>,
    },
    Delete {
        table: &'static str,
        id: Uuid,
        expected_version: Option<u64>,
    },
}

impl RowChange {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Insert { table, .. } | Self::Update { table, .. } | Self::Delete { table, .. } => {
                table
            }
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Insert { id, .. } | Self::Update { id, .. } | Self::Delete { id, .. } => *id,
        }
    }
}

/// 写入结果，删除时 `version` 为 `None`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedChange {
    pub table: &'static str,
    pub id: Uuid,
    pub version: Option<u64>,
}

/// 存储引擎
///
/// `tx` 为 `None` 时直接读写已提交数据；否则读取事务内视图，写入仅对该事务可见，
/// 直到 `commit`。
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    /// 开启事务
    async fn begin(&self) -> AppResult<TransactionId>;

    /// 扫描整表，顺序为存储自身的扫描顺序
    async fn scan(&self, table: &str, tx: Option<TransactionId>) -> AppResult<Vec<StoredRow>>;

    /// 按主键读取
    async fn fetch(
        &self,
        table: &str,
        id: Uuid,
        tx: Option<TransactionId>,
    ) -> AppResult<Option<StoredRow>>;

    /// 原子地应用一批写操作
    async fn apply(
        &self,
        changes: Vec<RowChange>,
        tx: Option<TransactionId>,
    ) -> AppResult<Vec<AppliedChange>>;

    /// 提交事务
    async fn commit(&self, tx: TransactionId) -> AppResult<()>;

    /// 回滚事务
    async fn rollback(&self, tx: TransactionId) -> AppResult<()>;

    /// 放弃事务，供析构路径同步调用
    ///
    /// 不返回错误；存储可以延后释放，但之后不得再提交该事务。
    fn abandon(&self, tx: TransactionId);
}
