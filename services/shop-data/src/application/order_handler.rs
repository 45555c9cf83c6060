//! 订单处理器
//!
//! 订单分页列表（附带顾客与订单行）、订单详情以及状态流转。
//! 状态更新读取时不跟踪，写回经由 `modified` + `complete`。

use std::sync::Arc;

use chrono::Utc;
use shop_common::Paginated;
use shop_config::PaginationConfig;
use shop_domain_core::{OrderBy, PageOptions, Predicate, QuerySpec};
use shop_errors::{AppError, AppResult};
use shop_ports::{GenericRepository, UnitOfWork};
use tracing::info;
use uuid::Uuid;

use crate::application::close_quietly;
use crate::domain::entities::{Order, OrderStatus};
use crate::domain::unit_of_work::{ShopUnitOfWork, UnitOfWorkFactory};

pub struct OrderHandler {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    default_page_size: i64,
}

impl OrderHandler {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>, config: &PaginationConfig) -> Self {
        Self {
            uow_factory,
            default_page_size: config.default_page_size,
        }
    }

    /// 全部订单，最新的在前
    pub async fn list_orders(
        &self,
        page_index: i64,
        page_size: Option<i64>,
    ) -> AppResult<Paginated<Order>> {
        self.page(None, page_index, page_size).await
    }

    /// 某个顾客的订单，最新的在前
    pub async fn list_orders_by_customer(
        &self,
        customer_id: Uuid,
        page_index: i64,
        page_size: Option<i64>,
    ) -> AppResult<Paginated<Order>> {
        let predicate = Predicate::new(move |order: &Order| order.customer_id == customer_id);
        self.page(Some(predicate), page_index, page_size).await
    }

    async fn page(
        &self,
        predicate: Option<Predicate<Order>>,
        page_index: i64,
        page_size: Option<i64>,
    ) -> AppResult<Paginated<Order>> {
        let mut options = PageOptions::new()
            .include(Order::include_customer())
            .include(Order::include_items())
            .order_by(OrderBy::desc(|o: &Order| o.order_date).then_asc(|o: &Order| o.id))
            .page(page_index, page_size.unwrap_or(self.default_page_size));
        if let Some(predicate) = predicate {
            options = options.with_predicate(predicate);
        }

        let uow = self.uow_factory.create();
        let result = uow.orders().get_paginated(options).await;
        close_quietly(uow.as_ref()).await;
        result
    }

    /// 订单详情（附带顾客与订单行）
    pub async fn get_order(&self, order_id: Uuid) -> AppResult<Order> {
        let uow = self.uow_factory.create();
        let result = uow
            .orders()
            .get(
                QuerySpec::filtered(Predicate::new(move |o: &Order| o.id == order_id))
                    .include(Order::include_customer())
                    .include(Order::include_items()),
            )
            .await;
        close_quietly(uow.as_ref()).await;

        result?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found(format!("Order {}", order_id)))
    }

    /// 更新订单状态，已送达或送达失败的订单不可再变更
    pub async fn update_status(&self, order_id: Uuid, status: OrderStatus) -> AppResult<Order> {
        let uow = self.uow_factory.create();
        let result = apply_status(uow.as_ref(), order_id, status).await;
        close_quietly(uow.as_ref()).await;

        if let Ok(order) = &result {
            info!(%order_id, status = order.order_status.code(), "Order status updated");
        }
        result
    }
}

async fn apply_status(
    uow: &dyn ShopUnitOfWork,
    order_id: Uuid,
    status: OrderStatus,
) -> AppResult<Order> {
    let mut order = uow
        .orders()
        .get_by_id(order_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {}", order_id)))?;

    if order.order_status.is_final() {
        return Err(AppError::invalid_argument(format!(
            "Order {} has already been completed or failed",
            order_id
        )));
    }

    if status == OrderStatus::Delivered {
        order.delivery_date = Some(Utc::now());
    }
    order.order_status = status;

    uow.orders().modified(order.clone());
    uow.complete().await?;
    Ok(order)
}
