//! common - 通用类型和工具库

pub mod pagination;
pub mod utils;

pub use pagination::*;
pub use utils::*;
