use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use shop_common::new_id;
use shop_domain_core::{Entity, Include, Money};
use shop_errors::AppError;
use uuid::Uuid;

use super::{Customer, OrderItem};

/// 订单状态，按状态码持久化
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum OrderStatus {
    /// 待支付
    #[default]
    Waiting,
    Paid,
    Delivering,
    Delivered,
    Failed,
    DeliveryFailed,
}

impl OrderStatus {
    /// 状态码（1 起始）
    pub fn code(self) -> i32 {
        match self {
            Self::Waiting => 1,
            Self::Paid => 2,
            Self::Delivering => 3,
            Self::Delivered => 4,
            Self::Failed => 5,
            Self::DeliveryFailed => 6,
        }
    }

    /// 已送达或送达失败，之后不再流转
    pub fn is_final(self) -> bool {
        matches!(self, Self::Delivered | Self::DeliveryFailed)
    }
}

impl From<OrderStatus> for i32 {
    fn from(status: OrderStatus) -> Self {
        status.code()
    }
}

impl TryFrom<i32> for OrderStatus {
    type Error = AppError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Waiting),
            2 => Ok(Self::Paid),
            3 => Ok(Self::Delivering),
            4 => Ok(Self::Delivered),
            5 => Ok(Self::Failed),
            6 => Ok(Self::DeliveryFailed),
            other => Err(AppError::invalid_argument(format!(
                "Unknown order status code: {}",
                other
            ))),
        }
    }
}

/// 订单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub address: String,
    pub order_date: DateTime<Utc>,
    pub expected_delivery_date: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub total_price: Money,
    pub order_status: OrderStatus,
    pub note: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(skip)]
    pub order_items: Vec<OrderItem>,
    #[serde(skip)]
    pub customer: Option<Customer>,
}

impl Order {
    /// 新建待支付订单，预计三天后送达
    pub fn new(
        customer_id: Uuid,
        address: impl Into<String>,
        note: Option<String>,
        total_price: Money,
    ) -> Self {
        let order_date = Utc::now();
        Self {
            id: new_id(),
            customer_id,
            address: address.into(),
            order_date,
            expected_delivery_date: Some(order_date + Duration::days(3)),
            delivery_date: None,
            total_price,
            order_status: OrderStatus::Waiting,
            note,
            is_deleted: false,
            order_items: Vec::new(),
            customer: None,
        }
    }

    pub fn include_items() -> Include<Order> {
        Include::collection(
            "order_items",
            |item: &OrderItem| item.order_id,
            |order: &mut Order, items| order.order_items = items,
        )
    }

    /// 订单行及其商品
    pub fn include_items_with_products() -> Include<Order> {
        Include::collection_with(
            "order_items",
            |item: &OrderItem| item.order_id,
            |order: &mut Order, items| order.order_items = items,
            vec![OrderItem::include_product()],
        )
    }

    pub fn include_customer() -> Include<Order> {
        Include::reference(
            "customer",
            |order: &Order| order.customer_id,
            |order: &mut Order, customer| order.customer = customer,
        )
    }
}

impl Entity for Order {
    const TABLE: &'static str = "orders";

    fn id(&self) -> Uuid {
        self.id
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_round_trip() {
        for code in 1..=6 {
            let status = OrderStatus::try_from(code).unwrap();
            assert_eq!(status.code(), code);
        }
        assert!(OrderStatus::try_from(0).is_err());
    }

    #[test]
    fn test_status_is_stored_as_code() {
        let mut order = Order::new(Uuid::new_v4(), "1 Main St", None, Money::usd(500));
        order.order_status = OrderStatus::Delivering;

        let row = serde_json::to_value(&order).unwrap();
        assert_eq!(row["order_status"], serde_json::json!(3));

        let mut bad = row.clone();
        bad["order_status"] = serde_json::json!(9);
        assert!(serde_json::from_value::<Order>(bad).is_err());

        let back: Order = serde_json::from_value(row).unwrap();
        assert_eq!(back.order_status, OrderStatus::Delivering);
    }

    #[test]
    fn test_navigation_is_not_persisted() {
        let mut order = Order::new(Uuid::new_v4(), "1 Main St", None, Money::usd(500));
        order
            .order_items
            .push(OrderItem::new(order.id, Uuid::new_v4(), 1));

        let row = serde_json::to_value(&order).unwrap();
        assert!(row.get("order_items").is_none());
        assert!(row.get("customer").is_none());

        let back: Order = serde_json::from_value(row).unwrap();
        assert!(back.order_items.is_empty());
        assert_eq!(back.order_status, OrderStatus::Waiting);
    }
}
