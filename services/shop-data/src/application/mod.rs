//! 应用层：商品查询、购物车与订单流程

pub mod cart_handler;
pub mod order_handler;
pub mod product_filter;
pub mod product_query;

pub use cart_handler::CartHandler;
pub use order_handler::OrderHandler;
pub use product_filter::ProductFilter;
pub use product_query::ProductQueryHandler;

use shop_ports::UnitOfWork;
use tracing::warn;

use crate::domain::unit_of_work::ShopUnitOfWork;

/// 请求结束时释放 Unit of Work，释放失败只记录日志
pub(crate) async fn close_quietly(uow: &dyn ShopUnitOfWork) {
    if let Err(e) = uow.close().await {
        warn!(error = %e, "Failed to close unit of work");
    }
}
