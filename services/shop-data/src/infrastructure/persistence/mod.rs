//! 持久化：变更跟踪会话、泛型仓储与 Unit of Work

mod change_tracker;
mod generic_repository;
mod query_metrics;
mod session;
mod shop_unit_of_work;

pub use change_tracker::{ChangeTracker, EntryState};
pub use generic_repository::Repository;
pub use query_metrics::{QueryTimer, RepositoryMetrics};
pub use session::Session;
pub use shop_unit_of_work::{SessionUnitOfWork, ShopUnitOfWorkFactory};
