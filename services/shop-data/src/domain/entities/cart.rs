use serde::{Deserialize, Serialize};
use shop_common::new_id;
use shop_domain_core::{Entity, Include};
use uuid::Uuid;

use super::{CartItem, Customer};

/// 购物车，每个顾客一个
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: Uuid,
    pub customer_id: Uuid,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(skip)]
    pub cart_items: Vec<CartItem>,
    #[serde(skip)]
    pub customer: Option<Customer>,
}

impl Cart {
    pub fn new(customer_id: Uuid) -> Self {
        Self {
            id: new_id(),
            customer_id,
            is_deleted: false,
            cart_items: Vec::new(),
            customer: None,
        }
    }

    /// 指定商品所在的购物车行
    pub fn line_for(&self, product_id: Uuid) -> Option<&CartItem> {
        self.cart_items
            .iter()
            .find(|item| item.product_id == product_id && !item.is_deleted)
    }

    pub fn include_items() -> Include<Cart> {
        Include::collection(
            "cart_items",
            |item: &CartItem| item.cart_id,
            |cart: &mut Cart, items| cart.cart_items = items,
        )
    }

    /// 购物车行及其商品
    pub fn include_items_with_products() -> Include<Cart> {
        Include::collection_with(
            "cart_items",
            |item: &CartItem| item.cart_id,
            |cart: &mut Cart, items| cart.cart_items = items,
            vec![CartItem::include_product()],
        )
    }

    pub fn include_customer() -> Include<Cart> {
        Include::reference(
            "customer",
            |cart: &Cart| cart.customer_id,
            |cart: &mut Cart, customer| cart.customer = customer,
        )
    }
}

impl Entity for Cart {
    const TABLE: &'static str = "carts";

    fn id(&self) -> Uuid {
        self.id
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }
}
