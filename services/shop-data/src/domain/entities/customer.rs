use serde::{Deserialize, Serialize};
use shop_common::new_id;
use shop_domain_core::Entity;
use uuid::Uuid;

/// 顾客，`user_id` 指向外部身份系统中的用户
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub user_id: String,
    #[serde(default)]
    pub is_deleted: bool,
}

impl Customer {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            user_id: user_id.into(),
            is_deleted: false,
        }
    }
}

impl Entity for Customer {
    const TABLE: &'static str = "customers";

    fn id(&self) -> Uuid {
        self.id
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }
}
