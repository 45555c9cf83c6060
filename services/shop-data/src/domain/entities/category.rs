use serde::{Deserialize, Serialize};
use shop_common::new_id;
use shop_domain_core::{Entity, Include};
use uuid::Uuid;

use super::Product;

/// 商品分类
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(skip)]
    pub products: Vec<Product>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            is_deleted: false,
            products: Vec::new(),
        }
    }

    pub fn include_products() -> Include<Category> {
        Include::collection(
            "products",
            |product: &Product| product.category_id,
            |category: &mut Category, products| category.products = products,
        )
    }
}

impl Entity for Category {
    const TABLE: &'static str = "categories";

    fn id(&self) -> Uuid {
        self.id
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }
}
