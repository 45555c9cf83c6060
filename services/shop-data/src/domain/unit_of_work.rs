//! Unit of Work 模式
//!
//! 每个实体类型一个命名仓储，所有仓储共享同一个会话，
//! 通过任一仓储暂存的变更在提交前对其他仓储可见。

use shop_ports::{GenericRepository, UnitOfWork};

use crate::domain::entities::{Cart, CartItem, Category, Customer, Order, OrderItem, Product};

/// 商城 Unit of Work
///
/// # 使用示例
///
/// ```ignore
/// let uow = factory.create();
/// uow.begin_transaction().await?;
///
/// uow.orders().add(order);
/// uow.order_items().add_range(items);
///
/// // 任何失败都会先回滚
/// uow.commit().await?;
/// ```
pub trait ShopUnitOfWork: UnitOfWork {
    fn products(&self) -> &dyn GenericRepository<Product>;

    fn categories(&self) -> &dyn GenericRepository<Category>;

    fn carts(&self) -> &dyn GenericRepository<Cart>;

    fn cart_items(&self) -> &dyn GenericRepository<CartItem>;

    fn orders(&self) -> &dyn GenericRepository<Order>;

    fn order_items(&self) -> &dyn GenericRepository<OrderItem>;

    fn customers(&self) -> &dyn GenericRepository<Customer>;
}

/// Unit of Work 工厂，每个请求创建一个实例
pub trait UnitOfWorkFactory: Send + Sync {
    fn create(&self) -> Box<dyn ShopUnitOfWork>;
}
