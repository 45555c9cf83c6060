//! 领域层：实体与 Unit of Work 抽象

pub mod entities;
pub mod unit_of_work;
