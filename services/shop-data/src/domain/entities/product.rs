use serde::{Deserialize, Serialize};
use shop_common::new_id;
use shop_domain_core::{Entity, Include, Money};
use uuid::Uuid;

use super::Category;

/// 商品
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    /// 商品编码
    pub code: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Money,
    /// 库存数量
    pub quantity: i64,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(skip)]
    pub category: Option<Category>,
}

impl Product {
    pub fn new(
        category_id: Uuid,
        name: impl Into<String>,
        code: impl Into<String>,
        price: Money,
        quantity: i64,
    ) -> Self {
        Self {
            id: new_id(),
            category_id,
            name: name.into(),
            code: code.into(),
            description: None,
            image_url: None,
            price,
            quantity,
            is_deleted: false,
            category: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn include_category() -> Include<Product> {
        Include::reference(
            "category",
            |product: &Product| product.category_id,
            |product: &mut Product, category| product.category = category,
        )
    }
}

impl Entity for Product {
    const TABLE: &'static str = "products";

    fn id(&self) -> Uuid {
        self.id
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }
}
