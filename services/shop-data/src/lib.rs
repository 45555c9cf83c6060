//! Shop Data Service Library
//!
//! 商城数据访问层：
//! - `domain`: 实体与 Unit of Work 抽象
//! - `infrastructure`: 会话、泛型仓储与 Unit of Work 实现
//! - `application`: 商品查询与购物车流程

pub mod application;
pub mod domain;
pub mod infrastructure;
