//! domain-core - 数据访问层的领域核心类型
//!
//! 实体能力 trait、查询规格（过滤、预加载、排序、分页）以及跨实体共享的值对象

mod entity;
mod include;
mod money;
mod ordering;
mod predicate;
mod query;

pub use entity::*;
pub use include::*;
pub use money::*;
pub use ordering::*;
pub use predicate::*;
pub use query::*;
