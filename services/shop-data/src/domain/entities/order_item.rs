use serde::{Deserialize, Serialize};
use shop_common::new_id;
use shop_domain_core::{Entity, Include};
use uuid::Uuid;

use super::{Order, Product};

/// 订单行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(skip)]
    pub order: Option<Box<Order>>,
    #[serde(skip)]
    pub product: Option<Product>,
}

impl OrderItem {
    pub fn new(order_id: Uuid, product_id: Uuid, quantity: i64) -> Self {
        Self {
            id: new_id(),
            order_id,
            product_id,
            quantity,
            is_deleted: false,
            order: None,
            product: None,
        }
    }

    pub fn include_product() -> Include<OrderItem> {
        Include::reference(
            "product",
            |item: &OrderItem| item.product_id,
            |item: &mut OrderItem, product| item.product = product,
        )
    }

    pub fn include_order() -> Include<OrderItem> {
        Include::reference(
            "order",
            |item: &OrderItem| item.order_id,
            |item: &mut OrderItem, order: Option<Order>| item.order = order.map(Box::new),
        )
    }
}

impl Entity for OrderItem {
    const TABLE: &'static str = "order_items";

    fn id(&self) -> Uuid {
        self.id
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }
}
