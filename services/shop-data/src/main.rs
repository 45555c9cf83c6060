//! Shop Data Service - 数据访问层演示入口
//!
//! 加载配置、初始化遥测、打开内存存储，在一个事务中写入示例目录，
//! 读取第一页商品，然后走一遍下单与订单状态流转。

use std::sync::Arc;

use anyhow::Context;
use shop_adapter_memory::MemoryStore;
use shop_config::AppConfig;
use shop_domain_core::Money;
use shop_ports::{GenericRepository, Store, UnitOfWork};
use shop_telemetry::{describe_metrics, init_metrics, init_tracing, init_tracing_json};
use tracing::{info, warn};
use uuid::Uuid;

use shop_data::application::{CartHandler, OrderHandler, ProductFilter, ProductQueryHandler};
use shop_data::domain::entities::{Cart, Category, Customer, OrderStatus, Product};
use shop_data::domain::unit_of_work::UnitOfWorkFactory;
use shop_data::infrastructure::persistence::ShopUnitOfWorkFactory;

/// 初始化运行时
fn init_runtime(config: &AppConfig) -> anyhow::Result<()> {
    if config.telemetry.json || config.is_production() {
        init_tracing_json(&config.telemetry.log_level)?;
    } else {
        init_tracing(&config.telemetry.log_level)?;
    }

    match init_metrics() {
        Ok(_handle) => describe_metrics(),
        Err(e) => warn!(error = %e, "Metrics recorder not installed"),
    }

    info!(
        app_name = %config.app_name,
        app_env = %config.app_env,
        "Runtime initialized"
    );
    Ok(())
}

/// 写入示例目录，返回示例顾客与第一个商品的 ID
async fn seed(factory: &dyn UnitOfWorkFactory) -> anyhow::Result<(Uuid, Uuid)> {
    let uow = factory.create();
    uow.begin_transaction().await?;

    let phones = Category::new("Phones");
    let laptops = Category::new("Laptops");
    let products = vec![
        Product::new(phones.id, "Smartphone A1", "PH-A1", Money::usd(49_900), 25),
        Product::new(phones.id, "Smartphone B2", "PH-B2", Money::usd(79_900), 10),
        Product::new(laptops.id, "Ultrabook 13", "LT-13", Money::usd(129_900), 5)
            .with_description("13-inch ultrabook"),
        Product::new(laptops.id, "Workstation 16", "LT-16", Money::usd(249_900), 2),
    ];
    let customer = Customer::new("demo-user");
    let cart = Cart::new(customer.id);
    let ids = (customer.id, products[0].id);

    uow.categories().add_range(vec![phones, laptops]);
    uow.products().add_range(products);
    uow.customers().add(customer);
    uow.carts().add(cart);

    uow.commit().await.context("Failed to seed catalog")?;
    uow.close().await?;
    Ok(ids)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let config = AppConfig::load(&config_dir).context("Failed to load configuration")?;
    init_runtime(&config)?;

    let store: Arc<dyn Store> = Arc::new(MemoryStore::new(config.store.name.clone()));
    let factory: Arc<dyn UnitOfWorkFactory> =
        Arc::new(ShopUnitOfWorkFactory::new(store, &config.store));

    let (customer_id, product_id) = seed(factory.as_ref()).await?;

    let queries = ProductQueryHandler::new(factory.clone(), &config.pagination);
    let page = queries
        .list_products(&ProductFilter::default(), 0, None)
        .await?;

    info!(
        total = page.total_items_count,
        pages = page.total_pages_count(),
        has_next = page.has_next(),
        "First product page loaded"
    );
    for product in &page.items {
        info!(
            name = %product.name,
            code = %product.code,
            price = %product.price,
            category = product.category.as_ref().map(|c| c.name.as_str()).unwrap_or("-"),
            "Product"
        );
    }

    let carts = CartHandler::new(factory.clone());
    carts.add_to_cart(customer_id, product_id, 2).await?;
    let order = carts.checkout(customer_id, "1 Demo Street", None).await?;

    let orders = OrderHandler::new(factory, &config.pagination);
    let order = orders.update_status(order.id, OrderStatus::Paid).await?;
    let history = orders.list_orders_by_customer(customer_id, 0, None).await?;
    info!(
        order_id = %order.id,
        status = order.order_status.code(),
        orders = history.total_items_count,
        "Demo order paid"
    );

    Ok(())
}
