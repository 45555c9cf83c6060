use serde::{Deserialize, Serialize};
use shop_common::new_id;
use shop_domain_core::{Entity, Include};
use uuid::Uuid;

use super::{Cart, Product};

/// 购物车行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(skip)]
    pub cart: Option<Box<Cart>>,
    #[serde(skip)]
    pub product: Option<Product>,
}

impl CartItem {
    pub fn new(cart_id: Uuid, product_id: Uuid, quantity: i64) -> Self {
        Self {
            id: new_id(),
            cart_id,
            product_id,
            quantity,
            is_deleted: false,
            cart: None,
            product: None,
        }
    }

    pub fn include_product() -> Include<CartItem> {
        Include::reference(
            "product",
            |item: &CartItem| item.product_id,
            |item: &mut CartItem, product| item.product = product,
        )
    }

    pub fn include_cart() -> Include<CartItem> {
        Include::reference(
            "cart",
            |item: &CartItem| item.cart_id,
            |item: &mut CartItem, cart: Option<Cart>| item.cart = cart.map(Box::new),
        )
    }
}

impl Entity for CartItem {
    const TABLE: &'static str = "cart_items";

    fn id(&self) -> Uuid {
        self.id
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }
}
