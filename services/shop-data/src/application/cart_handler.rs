//! 购物车处理器
//!
//! 加入购物车、移出购物车与结算。库存与购物车行在同一事务中修改，
//! 任何失败都会整体回滚。

use std::sync::Arc;

use shop_domain_core::{Money, Predicate, QuerySpec};
use shop_errors::{AppError, AppResult};
use shop_ports::{GenericRepository, UnitOfWork};
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::close_quietly;
use crate::domain::entities::{Cart, CartItem, Order, OrderItem, Product};
use crate::domain::unit_of_work::{ShopUnitOfWork, UnitOfWorkFactory};

pub struct CartHandler {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
}

impl CartHandler {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { uow_factory }
    }

    /// 加入购物车，同一商品合并到已有购物车行；返回更新后的购物车行
    pub async fn add_to_cart(
        &self,
        customer_id: Uuid,
        product_id: Uuid,
        quantity: i64,
    ) -> AppResult<CartItem> {
        if quantity <= 0 {
            return Err(AppError::invalid_argument(format!(
                "Quantity must be positive: {}",
                quantity
            )));
        }

        let uow = self.uow_factory.create();
        let result = self
            .stage_add(uow.as_ref(), customer_id, product_id, quantity)
            .await;
        let result = finish(uow.as_ref(), result).await;
        close_quietly(uow.as_ref()).await;

        if let Ok(line) = &result {
            info!(%customer_id, %product_id, quantity = line.quantity, "Product added to cart");
        }
        result
    }

    async fn stage_add(
        &self,
        uow: &dyn ShopUnitOfWork,
        customer_id: Uuid,
        product_id: Uuid,
        quantity: i64,
    ) -> AppResult<CartItem> {
        let cart = load_cart(uow, customer_id).await?;
        let mut product = load_product(uow, product_id).await?;

        if product.quantity < quantity {
            return Err(AppError::invalid_argument(format!(
                "Insufficient stock for product {}: requested {}, available {}",
                product.id, quantity, product.quantity
            )));
        }

        uow.begin_transaction().await?;

        product.quantity -= quantity;
        uow.products().update(product);

        let line = match cart.line_for(product_id) {
            Some(existing) => {
                let mut line = existing.clone();
                line.quantity += quantity;
                uow.cart_items().update(line.clone());
                line
            }
            None => {
                let line = CartItem::new(cart.id, product_id, quantity);
                uow.cart_items().add(line.clone());
                line
            }
        };
        Ok(line)
    }

    /// 移出购物车行并归还库存
    pub async fn remove_from_cart(&self, customer_id: Uuid, cart_item_id: Uuid) -> AppResult<()> {
        let uow = self.uow_factory.create();
        let result = self
            .stage_remove(uow.as_ref(), customer_id, cart_item_id)
            .await;
        let result = finish(uow.as_ref(), result).await;
        close_quietly(uow.as_ref()).await;

        if result.is_ok() {
            info!(%customer_id, %cart_item_id, "Cart item removed");
        }
        result
    }

    async fn stage_remove(
        &self,
        uow: &dyn ShopUnitOfWork,
        customer_id: Uuid,
        cart_item_id: Uuid,
    ) -> AppResult<()> {
        let cart = load_cart(uow, customer_id).await?;
        let line = cart
            .cart_items
            .iter()
            .find(|item| item.id == cart_item_id && !item.is_deleted)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Cart item {}", cart_item_id)))?;
        let mut product = load_product(uow, line.product_id).await?;

        uow.begin_transaction().await?;

        product.quantity += line.quantity;
        uow.products().update(product);
        uow.cart_items().remove(&line);
        Ok(())
    }

    /// 结算：生成订单与订单行并清空购物车
    pub async fn checkout(
        &self,
        customer_id: Uuid,
        address: &str,
        note: Option<String>,
    ) -> AppResult<Order> {
        let uow = self.uow_factory.create();
        let result = self
            .stage_checkout(uow.as_ref(), customer_id, address, note)
            .await;
        let result = finish(uow.as_ref(), result).await;
        close_quietly(uow.as_ref()).await;

        if let Ok(order) = &result {
            info!(
                %customer_id,
                order_id = %order.id,
                total = %order.total_price,
                lines = order.order_items.len(),
                "Checkout completed"
            );
        }
        result
    }

    async fn stage_checkout(
        &self,
        uow: &dyn ShopUnitOfWork,
        customer_id: Uuid,
        address: &str,
        note: Option<String>,
    ) -> AppResult<Order> {
        let cart = uow
            .carts()
            .get(cart_spec(customer_id).include(Cart::include_items_with_products()))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found(format!("Cart for customer {}", customer_id)))?;

        let lines: Vec<CartItem> = cart
            .cart_items
            .into_iter()
            .filter(|item| !item.is_deleted)
            .collect();
        if lines.is_empty() {
            return Err(AppError::invalid_argument("Cart is empty"));
        }

        let mut total: Option<Money> = None;
        for line in &lines {
            let product = line
                .product
                .as_ref()
                .ok_or_else(|| AppError::not_found(format!("Product {}", line.product_id)))?;
            let amount = product.price.times(line.quantity)?;
            total = Some(match total {
                Some(sum) => sum.checked_add(&amount)?,
                None => amount,
            });
        }
        let total = total.ok_or_else(|| AppError::invalid_argument("Cart is empty"))?;

        uow.begin_transaction().await?;

        let mut order = Order::new(customer_id, address, note, total);
        uow.orders().add(order.clone());
        uow.complete().await?;

        let items: Vec<OrderItem> = lines
            .iter()
            .map(|line| OrderItem::new(order.id, line.product_id, line.quantity))
            .collect();
        uow.order_items().add_range(items.clone());
        uow.cart_items().remove_range(&lines);

        order.order_items = items;
        Ok(order)
    }
}

fn cart_spec(customer_id: Uuid) -> QuerySpec<Cart> {
    QuerySpec::filtered(Predicate::new(move |cart: &Cart| cart.customer_id == customer_id))
        .exclude_deleted()
}

async fn load_cart(uow: &dyn ShopUnitOfWork, customer_id: Uuid) -> AppResult<Cart> {
    uow.carts()
        .get(cart_spec(customer_id).include(Cart::include_items()))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::not_found(format!("Cart for customer {}", customer_id)))
}

async fn load_product(uow: &dyn ShopUnitOfWork, product_id: Uuid) -> AppResult<Product> {
    uow.products()
        .get_by_id(product_id)
        .await?
        .filter(|product| !product.is_deleted)
        .ok_or_else(|| AppError::not_found(format!("Product {}", product_id)))
}

/// 成功时提交；失败时若事务仍未结束则回滚
async fn finish<T>(uow: &dyn ShopUnitOfWork, result: AppResult<T>) -> AppResult<T> {
    match result {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if uow.in_transaction()
                && let Err(rollback_err) = uow.rollback().await
            {
                warn!(error = %rollback_err, "Rollback after failure did not succeed");
            }
            Err(e)
        }
    }
}
