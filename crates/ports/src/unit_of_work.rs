//! Unit of Work trait 定义

use async_trait::async_trait;
use shop_errors::AppResult;

/// Unit of Work trait
///
/// 状态机：`Idle → begin_transaction → Active → commit | rollback → Idle`。
/// 单个实例对应一个请求会话，不支持并发使用。
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// 开启事务，已有事务时返回 `IllegalState`
    async fn begin_transaction(&self) -> AppResult<()>;

    /// 刷新全部暂存变更并提交事务；任何失败都会先回滚再返回错误
    async fn commit(&self) -> AppResult<()>;

    /// 回滚事务并丢弃暂存变更
    async fn rollback(&self) -> AppResult<()>;

    /// 立即刷新暂存变更，返回写入的行数
    async fn complete(&self) -> AppResult<usize>;

    /// 是否存在未结束的事务
    fn in_transaction(&self) -> bool;

    /// 清空变更跟踪器
    fn clear_tracking(&self);

    /// 暂存但尚未刷新的变更数
    fn pending_changes(&self) -> usize;

    /// 释放会话，可重复调用；存在未结束的事务时回滚
    async fn close(&self) -> AppResult<()>;
}
