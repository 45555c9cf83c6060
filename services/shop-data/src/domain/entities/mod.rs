//! 商城实体
//!
//! 实体之间通过 ID 关联，导航属性（`#[serde(skip)]`）只由预加载填充，从不持久化。

mod cart;
mod cart_item;
mod category;
mod customer;
mod order;
mod order_item;
mod product;

pub use cart::*;
pub use cart_item::*;
pub use category::*;
pub use customer::*;
pub use order::*;
pub use order_item::*;
pub use product::*;
