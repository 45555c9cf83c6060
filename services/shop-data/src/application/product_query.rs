//! 商品查询处理器

use std::sync::Arc;

use shop_common::Paginated;
use shop_config::PaginationConfig;
use shop_domain_core::{OrderBy, PageOptions, Predicate, QuerySpec};
use shop_errors::{AppError, AppResult};
use shop_ports::GenericRepository;
use uuid::Uuid;

use crate::application::{ProductFilter, close_quietly};
use crate::domain::entities::{Category, Product};
use crate::domain::unit_of_work::{ShopUnitOfWork, UnitOfWorkFactory};

pub struct ProductQueryHandler {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    default_page_size: i64,
}

impl ProductQueryHandler {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>, config: &PaginationConfig) -> Self {
        Self {
            uow_factory,
            default_page_size: config.default_page_size,
        }
    }

    /// 分页列出商品（附带分类），按名称排序
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        page_index: i64,
        page_size: Option<i64>,
    ) -> AppResult<Paginated<Product>> {
        let predicate = filter.to_predicate()?;
        let options = PageOptions::new()
            .with_predicate(predicate)
            .include(Product::include_category())
            .order_by(OrderBy::asc(|p: &Product| p.name.clone()).then_asc(|p: &Product| p.id))
            .page(page_index, page_size.unwrap_or(self.default_page_size));

        let uow = self.uow_factory.create();
        let result = uow.products().get_paginated(options).await;
        close_quietly(uow.as_ref()).await;
        result
    }

    /// 商品详情，不存在或已删除时返回 `NotFound`
    pub async fn get_product(&self, id: Uuid) -> AppResult<Product> {
        let uow = self.uow_factory.create();
        let result = uow
            .products()
            .get(
                QuerySpec::filtered(Predicate::new(move |p: &Product| p.id == id))
                    .exclude_deleted()
                    .include(Product::include_category()),
            )
            .await;
        close_quietly(uow.as_ref()).await;

        result?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found(format!("Product {}", id)))
    }

    /// 未删除的分类及其商品
    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let uow = self.uow_factory.create();
        let result = uow
            .categories()
            .get(
                QuerySpec::new()
                    .exclude_deleted()
                    .include(Category::include_products())
                    .order_by(OrderBy::asc(|c: &Category| c.name.clone())),
            )
            .await;
        close_quietly(uow.as_ref()).await;
        result
    }
}
