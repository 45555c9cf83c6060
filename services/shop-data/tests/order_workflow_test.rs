mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use shop_config::{PaginationConfig, StoreConfig};
use shop_data::application::OrderHandler;
use shop_data::domain::entities::{Customer, Order, OrderItem, OrderStatus};
use shop_data::domain::unit_of_work::UnitOfWorkFactory;
use shop_data::infrastructure::persistence::ShopUnitOfWorkFactory;
use shop_domain_core::{Money, to_row};
use shop_errors::AppError;
use shop_ports::{AppliedChange, GenericRepository, MockStore, RowChange, Store, StoredRow, UnitOfWork};
use uuid::Uuid;

fn handler(ctx: &common::TestContext) -> OrderHandler {
    OrderHandler::new(ctx.factory.clone(), &PaginationConfig::default())
}

/// 写入一个订单，`days_ago` 控制下单时间
async fn seed_order(
    ctx: &common::TestContext,
    customer: &Customer,
    status: OrderStatus,
    days_ago: i64,
) -> Order {
    let mut order = Order::new(customer.id, "1 Main St", None, Money::usd(1_000));
    order.order_status = status;
    order.order_date = Utc::now() - Duration::days(days_ago);

    let uow = ctx.factory.create();
    uow.orders().add(order.clone());
    uow.order_items()
        .add(OrderItem::new(order.id, Uuid::new_v4(), 1));
    uow.complete().await.unwrap();
    uow.close().await.unwrap();
    order
}

async fn stored(ctx: &common::TestContext, id: Uuid) -> Order {
    let uow = ctx.factory.create();
    uow.orders().get_by_id(id).await.unwrap().unwrap()
}

#[tokio::test]
async fn test_update_status_persists_new_status() {
    let ctx = common::context();
    let (customer, _) = common::seed_customer(&ctx).await;
    let order = seed_order(&ctx, &customer, OrderStatus::Waiting, 0).await;

    let updated = handler(&ctx)
        .update_status(order.id, OrderStatus::Paid)
        .await
        .unwrap();
    assert_eq!(updated.order_status, OrderStatus::Paid);
    assert!(updated.delivery_date.is_none());

    let after = stored(&ctx, order.id).await;
    assert_eq!(after.order_status, OrderStatus::Paid);
    assert_eq!(after.address, order.address);
    assert_eq!(after.total_price, order.total_price);
}

#[tokio::test]
async fn test_delivered_stamps_delivery_date_and_becomes_final() {
    let ctx = common::context();
    let (customer, _) = common::seed_customer(&ctx).await;
    let order = seed_order(&ctx, &customer, OrderStatus::Delivering, 0).await;
    let handler = handler(&ctx);

    let before = Utc::now();
    let delivered = handler
        .update_status(order.id, OrderStatus::Delivered)
        .await
        .unwrap();
    let stamped = delivered.delivery_date.unwrap();
    assert!(stamped >= before);
    assert_eq!(stored(&ctx, order.id).await.delivery_date, Some(stamped));

    let err = handler
        .update_status(order.id, OrderStatus::Delivering)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));
    assert_eq!(stored(&ctx, order.id).await.order_status, OrderStatus::Delivered);
}

#[tokio::test]
async fn test_delivery_failed_is_final() {
    let ctx = common::context();
    let (customer, _) = common::seed_customer(&ctx).await;
    let order = seed_order(&ctx, &customer, OrderStatus::DeliveryFailed, 0).await;

    let err = handler(&ctx)
        .update_status(order.id, OrderStatus::Paid)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));
    assert_eq!(
        stored(&ctx, order.id).await.order_status,
        OrderStatus::DeliveryFailed
    );
}

#[tokio::test]
async fn test_update_status_of_missing_order_is_not_found() {
    let ctx = common::context();
    let err = handler(&ctx)
        .update_status(Uuid::new_v4(), OrderStatus::Paid)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_update_status_writes_observed_version_without_transaction() {
    let customer_id = Uuid::new_v4();
    let order = Order::new(customer_id, "1 Main St", None, Money::usd(1_000));
    let order_id = order.id;
    let row = StoredRow {
        id: order_id,
        version: 7,
        data: to_row(&order).unwrap(),
    };

    // 没有 begin 的期望：状态更新不开启事务
    let mut store = MockStore::new();
    store
        .expect_fetch()
        .times(1)
        .returning(move |_, _, _| Ok(Some(row.clone())));
    store
        .expect_apply()
        .withf(move |changes, tx| {
            tx.is_none()
                && changes.len() == 1
                && matches!(
                    &changes[0],
                    RowChange::Update {
                        table: "orders",
                        id,
                        expected_version: Some(7),
                        data,
                    } if *id == order_id && data["order_status"] == json!(2)
                )
        })
        .times(1)
        .returning(|changes, _| {
            Ok(changes
                .iter()
                .map(|change| AppliedChange {
                    table: change.table(),
                    id: change.id(),
                    version: Some(8),
                })
                .collect())
        });

    let store: Arc<dyn Store> = Arc::new(store);
    let factory: Arc<dyn UnitOfWorkFactory> =
        Arc::new(ShopUnitOfWorkFactory::new(store, &StoreConfig::default()));
    let handler = OrderHandler::new(factory, &PaginationConfig::default());

    let updated = handler
        .update_status(order_id, OrderStatus::Paid)
        .await
        .unwrap();
    assert_eq!(updated.order_status, OrderStatus::Paid);
}

#[tokio::test]
async fn test_list_orders_newest_first_with_navigation() {
    let ctx = common::context();
    let (customer, _) = common::seed_customer(&ctx).await;
    let oldest = seed_order(&ctx, &customer, OrderStatus::Waiting, 3).await;
    let middle = seed_order(&ctx, &customer, OrderStatus::Paid, 2).await;
    let newest = seed_order(&ctx, &customer, OrderStatus::Waiting, 1).await;

    let handler = handler(&ctx);
    let first = handler.list_orders(0, Some(2)).await.unwrap();
    assert_eq!(first.total_items_count, 3);
    assert!(first.has_next());
    let ids: Vec<Uuid> = first.items.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![newest.id, middle.id]);
    assert!(first.items.iter().all(|o| {
        o.customer.as_ref().map(|c| c.id) == Some(customer.id) && o.order_items.len() == 1
    }));

    let second = handler.list_orders(1, Some(2)).await.unwrap();
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].id, oldest.id);
}

#[tokio::test]
async fn test_list_orders_by_customer_filters() {
    let ctx = common::context();
    let (customer, _) = common::seed_customer(&ctx).await;
    let other = Customer::new("user-2");
    {
        let uow = ctx.factory.create();
        uow.customers().add(other.clone());
        uow.complete().await.unwrap();
    }
    seed_order(&ctx, &customer, OrderStatus::Waiting, 1).await;
    seed_order(&ctx, &other, OrderStatus::Waiting, 2).await;
    seed_order(&ctx, &other, OrderStatus::Paid, 3).await;

    let handler = handler(&ctx);
    let page = handler
        .list_orders_by_customer(other.id, 0, None)
        .await
        .unwrap();
    assert_eq!(page.total_items_count, 2);
    assert!(page.items.iter().all(|o| o.customer_id == other.id));

    let err = handler
        .list_orders_by_customer(other.id, -1, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_get_order_includes_customer_and_items() {
    let ctx = common::context();
    let (customer, _) = common::seed_customer(&ctx).await;
    let order = seed_order(&ctx, &customer, OrderStatus::Waiting, 0).await;

    let handler = handler(&ctx);
    let loaded = handler.get_order(order.id).await.unwrap();
    assert_eq!(loaded.customer.map(|c| c.id), Some(customer.id));
    assert_eq!(loaded.order_items.len(), 1);

    let err = handler.get_order(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
