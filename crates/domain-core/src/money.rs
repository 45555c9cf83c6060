//! 货币值对象

use serde::{Deserialize, Serialize};
use shop_errors::{AppError, AppResult};
use std::fmt;

/// 货币代码
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency(pub String);

impl Currency {
    pub fn new(code: &str) -> Self {
        Self(code.to_uppercase())
    }

    pub fn vnd() -> Self {
        Self("VND".to_string())
    }

    pub fn usd() -> Self {
        Self("USD".to_string())
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::usd()
    }
}

/// 金额值对象
///
/// 以最小货币单位（如分）存储，避免浮点误差。同币种之间才能做加减。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    pub amount: i64,
    pub currency: Currency,
}

impl Money {
    pub fn new(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn usd(amount: i64) -> Self {
        Self::new(amount, Currency::usd())
    }

    /// 转换为浮点数（用于显示）
    pub fn to_decimal(&self) -> f64 {
        self.amount as f64 / 100.0
    }

    pub fn checked_add(&self, other: &Money) -> AppResult<Money> {
        self.ensure_same_currency(other)?;
        self.amount
            .checked_add(other.amount)
            .map(|amount| Self::new(amount, self.currency.clone()))
            .ok_or_else(|| AppError::invalid_argument("Money amount overflow"))
    }

    /// 单价乘以数量
    pub fn times(&self, quantity: i64) -> AppResult<Money> {
        self.amount
            .checked_mul(quantity)
            .map(|amount| Self::new(amount, self.currency.clone()))
            .ok_or_else(|| AppError::invalid_argument("Money amount overflow"))
    }

    fn ensure_same_currency(&self, other: &Money) -> AppResult<()> {
        if self.currency != other.currency {
            return Err(AppError::invalid_argument(format!(
                "Currency mismatch: {} vs {}",
                self.currency.0, other.currency.0
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.to_decimal(), self.currency.0)
    }
}
