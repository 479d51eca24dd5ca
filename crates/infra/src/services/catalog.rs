use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use tillpoint_catalog::{Category, CategoryPatch, NewCategory, NewProduct, Product, ProductPatch};
use tillpoint_core::{CategoryId, DomainError, ProductId};

use crate::context::RequestContext;
use crate::error::ServiceResult;
use crate::repository::{CategoryRepository, ProductFilter, ProductRepository};

#[derive(Clone)]
pub struct CatalogService {
    categories: Arc<dyn CategoryRepository>,
    products: Arc<dyn ProductRepository>,
}

impl CatalogService {
    pub fn new(categories: Arc<dyn CategoryRepository>, products: Arc<dyn ProductRepository>) -> Self {
        Self {
            categories,
            products,
        }
    }

    async fn ensure_category(&self, ctx: &RequestContext, id: Option<CategoryId>) -> ServiceResult<()> {
        if let Some(id) = id {
            if self.categories.get(ctx.store_id, id).await?.is_none() {
                return Err(DomainError::not_found(format!("category {id}")).into());
            }
        }
        Ok(())
    }

    pub async fn create_category(&self, ctx: &RequestContext, input: NewCategory) -> ServiceResult<Category> {
        let category = input.into_category(ctx.store_id, Utc::now())?;
        self.categories.insert(&category).await?;
        info!(store_id = %ctx.store_id, category_id = %category.id, "category created");
        Ok(category)
    }

    pub async fn list_categories(&self, ctx: &RequestContext) -> ServiceResult<Vec<Category>> {
        Ok(self.categories.list(ctx.store_id).await?)
    }

    pub async fn get_category(&self, ctx: &RequestContext, id: CategoryId) -> ServiceResult<Category> {
        self.categories
            .get(ctx.store_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("category {id}")).into())
    }

    pub async fn update_category(
        &self,
        ctx: &RequestContext,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> ServiceResult<Category> {
        let mut category = self.get_category(ctx, id).await?;
        category.apply_patch(patch, Utc::now())?;
        self.categories.update(&category).await?;
        Ok(category)
    }

    /// A category that still has products cannot be deleted.
    #[instrument(skip(self, ctx), fields(store_id = %ctx.store_id, category_id = %id))]
    pub async fn delete_category(&self, ctx: &RequestContext, id: CategoryId) -> ServiceResult<()> {
        let in_use = self
            .products
            .list(
                ctx.store_id,
                &ProductFilter {
                    category_id: Some(id),
                    ..ProductFilter::default()
                },
            )
            .await?;
        if !in_use.is_empty() {
            return Err(DomainError::conflict(format!(
                "category {id} still has {} product(s)",
                in_use.len()
            ))
            .into());
        }
        if !self.categories.delete(ctx.store_id, id).await? {
            return Err(DomainError::not_found(format!("category {id}")).into());
        }
        info!("category deleted");
        Ok(())
    }

    #[instrument(skip(self, ctx, input), fields(store_id = %ctx.store_id, sku = %input.sku))]
    pub async fn create_product(&self, ctx: &RequestContext, input: NewProduct) -> ServiceResult<Product> {
        input.validate()?;
        self.ensure_category(ctx, input.category_id).await?;
        let product = input.into_product(ctx.store_id, Utc::now())?;
        self.products.insert(&product).await?;
        info!(product_id = %product.id, "product created");
        Ok(product)
    }

    pub async fn list_products(&self, ctx: &RequestContext, filter: &ProductFilter) -> ServiceResult<Vec<Product>> {
        Ok(self.products.list(ctx.store_id, filter).await?)
    }

    pub async fn get_product(&self, ctx: &RequestContext, id: ProductId) -> ServiceResult<Product> {
        self.products
            .get(ctx.store_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("product {id}")).into())
    }

    #[instrument(skip(self, ctx, patch), fields(store_id = %ctx.store_id, product_id = %id))]
    pub async fn update_product(
        &self,
        ctx: &RequestContext,
        id: ProductId,
        patch: ProductPatch,
    ) -> ServiceResult<Product> {
        patch.validate()?;
        if let Some(category_id) = patch.category_id {
            self.ensure_category(ctx, category_id).await?;
        }
        let mut product = self.get_product(ctx, id).await?;
        product.apply_patch(patch, Utc::now())?;
        self.products.update(&product).await?;
        info!("product updated");
        Ok(product)
    }

    pub async fn delete_product(&self, ctx: &RequestContext, id: ProductId) -> ServiceResult<()> {
        if !self.products.delete(ctx.store_id, id).await? {
            return Err(DomainError::not_found(format!("product {id}")).into());
        }
        info!(store_id = %ctx.store_id, product_id = %id, "product deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tillpoint_auth::Role;
    use tillpoint_core::{ErrorKind, StoreId, UserId};

    use crate::repository::Repositories;

    fn setup() -> (CatalogService, RequestContext) {
        let repos = Repositories::in_memory();
        let svc = CatalogService::new(repos.categories.clone(), repos.products.clone());
        let ctx = RequestContext::new(StoreId::new(), UserId::new(), Role::manager());
        (svc, ctx)
    }

    fn product(sku: &str, category_id: Option<CategoryId>) -> NewProduct {
        NewProduct {
            sku: sku.into(),
            name: format!("Item {sku}"),
            category_id,
            price: 5_000,
            cost: 4_000,
            stock: 10,
            active: true,
        }
    }

    #[tokio::test]
    async fn category_in_use_cannot_be_deleted() {
        let (svc, ctx) = setup();
        let drinks = svc
            .create_category(
                &ctx,
                NewCategory {
                    name: "Drinks".into(),
                    description: None,
                },
            )
            .await
            .unwrap();
        let tea = svc.create_product(&ctx, product("TEA", Some(drinks.id))).await.unwrap();

        let err = svc.delete_category(&ctx, drinks.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        svc.delete_product(&ctx, tea.id).await.unwrap();
        svc.delete_category(&ctx, drinks.id).await.unwrap();
    }

    #[tokio::test]
    async fn unknown_category_is_rejected() {
        let (svc, ctx) = setup();
        let err = svc
            .create_product(&ctx, product("TEA", Some(CategoryId::new())))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn sku_is_unique_per_store_only() {
        let (svc, ctx) = setup();
        svc.create_product(&ctx, product("TEA", None)).await.unwrap();
        let err = svc.create_product(&ctx, product("tea", None)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let other = RequestContext::new(StoreId::new(), ctx.user_id, Role::manager());
        svc.create_product(&other, product("TEA", None)).await.unwrap();
    }

    #[tokio::test]
    async fn search_matches_name_or_sku() {
        let (svc, ctx) = setup();
        svc.create_product(&ctx, product("TEA", None)).await.unwrap();
        svc.create_product(&ctx, product("RICE", None)).await.unwrap();
        let filter = ProductFilter {
            q: Some("ric".into()),
            ..ProductFilter::default()
        };
        let hits = svc.list_products(&ctx, &filter).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].sku, "RICE");
    }
}
