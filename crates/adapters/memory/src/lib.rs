//! shop-adapter-memory - 内存存储适配器
//!
//! 带事务隔离与乐观并发控制的 [`shop_ports::Store`] 实现

mod store;

pub use store::*;
