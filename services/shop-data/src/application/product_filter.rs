//! 商品过滤条件
//!
//! 各条件相互独立、均可缺省，组合为一个合取谓词。软删除的商品总是被排除。

use serde::Deserialize;
use shop_domain_core::Predicate;
use shop_errors::{AppError, AppResult};
use uuid::Uuid;

use crate::domain::entities::Product;

/// 商品过滤条件（价格以最小货币单位表示）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub keyword: Option<String>,
    pub category_id: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
}

impl ProductFilter {
    /// 组合为单个谓词，分类 ID 格式错误时返回 `InvalidArgument`
    pub fn to_predicate(&self) -> AppResult<Predicate<Product>> {
        let mut filters = vec![Predicate::<Product>::not_deleted()];

        if let Some(keyword) = self.keyword.as_deref().map(str::trim)
            && !keyword.is_empty()
        {
            let keyword = keyword.to_lowercase();
            filters.push(Predicate::new(move |p: &Product| {
                p.name.to_lowercase().contains(&keyword)
            }));
        }

        if let Some(raw) = self.category_id.as_deref().map(str::trim)
            && !raw.is_empty()
        {
            let category_id = Uuid::parse_str(raw)
                .map_err(|e| AppError::invalid_argument(format!("Invalid category id {}: {}", raw, e)))?;
            filters.push(Predicate::new(move |p: &Product| p.category_id == category_id));
        }

        if let Some(min) = self.min_price {
            filters.push(Predicate::new(move |p: &Product| p.price.amount >= min));
        }

        if let Some(max) = self.max_price {
            filters.push(Predicate::new(move |p: &Product| p.price.amount <= max));
        }

        Ok(Predicate::all(filters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_domain_core::Money;

    fn product(name: &str, category_id: Uuid, cents: i64) -> Product {
        Product::new(category_id, name, name.to_uppercase(), Money::usd(cents), 1)
    }

    #[test]
    fn test_empty_filter_only_excludes_deleted() {
        let p = ProductFilter::default().to_predicate().unwrap();
        let mut deleted = product("pen", Uuid::new_v4(), 100);
        assert!(p.evaluate(&deleted));
        deleted.is_deleted = true;
        assert!(!p.evaluate(&deleted));
    }

    #[test]
    fn test_keyword_is_case_insensitive() {
        let filter = ProductFilter {
            keyword: Some("  PhOnE ".to_string()),
            ..Default::default()
        };
        let p = filter.to_predicate().unwrap();
        assert!(p.evaluate(&product("Smartphone X", Uuid::new_v4(), 100)));
        assert!(!p.evaluate(&product("Laptop", Uuid::new_v4(), 100)));
    }

    #[test]
    fn test_all_conditions_combine() {
        let category = Uuid::new_v4();
        let filter = ProductFilter {
            keyword: Some("pen".to_string()),
            category_id: Some(category.to_string()),
            min_price: Some(100),
            max_price: Some(500),
        };
        let p = filter.to_predicate().unwrap();

        assert!(p.evaluate(&product("pen", category, 100)));
        assert!(p.evaluate(&product("pencil", category, 500)));
        assert!(!p.evaluate(&product("pen", category, 501)));
        assert!(!p.evaluate(&product("pen", Uuid::new_v4(), 200)));
        assert!(!p.evaluate(&product("ink", category, 200)));
    }

    #[test]
    fn test_malformed_category_is_invalid_argument() {
        let filter = ProductFilter {
            category_id: Some("not-a-uuid".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            filter.to_predicate(),
            Err(AppError::InvalidArgument(_))
        ));
    }
}
