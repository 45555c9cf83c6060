#![allow(dead_code)]

use std::sync::Arc;

use shop_adapter_memory::MemoryStore;
use shop_config::StoreConfig;
use shop_data::domain::entities::{Cart, Category, Customer, Product};
use shop_data::domain::unit_of_work::UnitOfWorkFactory;
use shop_data::infrastructure::persistence::ShopUnitOfWorkFactory;
use shop_domain_core::Money;
use shop_ports::{GenericRepository, Store, UnitOfWork};

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub factory: Arc<dyn UnitOfWorkFactory>,
}

pub fn context() -> TestContext {
    let store = Arc::new(MemoryStore::new("test"));
    let dyn_store: Arc<dyn Store> = store.clone();
    let factory: Arc<dyn UnitOfWorkFactory> =
        Arc::new(ShopUnitOfWorkFactory::new(dyn_store, &StoreConfig::default()));
    TestContext { store, factory }
}

/// 写入一个分类及 `count` 个商品，商品名为 `product-00` .. 并按名称递增定价
pub async fn seed_products(ctx: &TestContext, count: usize) -> (Category, Vec<Product>) {
    let category = Category::new("General");
    let products: Vec<Product> = (0..count)
        .map(|i| {
            Product::new(
                category.id,
                format!("product-{:02}", i),
                format!("SKU-{:02}", i),
                Money::usd(100 * (i as i64 + 1)),
                10,
            )
        })
        .collect();

    let uow = ctx.factory.create();
    uow.categories().add(category.clone());
    uow.products().add_range(products.clone());
    uow.complete().await.unwrap();
    uow.close().await.unwrap();

    (category, products)
}

/// 写入一个顾客及其空购物车
pub async fn seed_customer(ctx: &TestContext) -> (Customer, Cart) {
    let customer = Customer::new("user-1");
    let cart = Cart::new(customer.id);

    let uow = ctx.factory.create();
    uow.customers().add(customer.clone());
    uow.carts().add(cart.clone());
    uow.complete().await.unwrap();
    uow.close().await.unwrap();

    (customer, cart)
}
