//! ports - 抽象 trait 层
//!
//! 存储边界（[`Store`]）以及对调用方暴露的仓储与 Unit of Work 抽象

mod repository;
mod store;
mod unit_of_work;

pub use repository::*;
pub use store::*;
pub use unit_of_work::*;
