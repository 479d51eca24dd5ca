use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::instrument;

use tillpoint_catalog::{Category, Product};
use tillpoint_core::{CategoryId, DomainError, ProductId, StoreId};

use super::{decode_err, like_pattern, map_sqlx_error, product_from_row, PgStore, PRODUCT_COLUMNS};
use crate::error::{RepoError, RepoResult};
use crate::repository::{CategoryRepository, ProductFilter, ProductRepository};

const CATEGORY_COLUMNS: &str = "id, store_id, name, description, created_at, updated_at";

fn category_from_row(row: &PgRow) -> Result<Category, sqlx::Error> {
    Ok(Category {
        id: row.try_get::<uuid::Uuid, _>("id")?.into(),
        store_id: row.try_get::<uuid::Uuid, _>("store_id")?.into(),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl CategoryRepository for PgStore {
    #[instrument(skip(self, category), fields(store_id = %category.store_id), err)]
    async fn insert(&self, category: &Category) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, store_id, name, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(*category.id.as_uuid())
        .bind(*category.store_id.as_uuid())
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("insert_category", e))?;
        Ok(())
    }

    async fn get(&self, store_id: StoreId, id: CategoryId) -> RepoResult<Option<Category>> {
        let row = sqlx::query(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE store_id = $1 AND id = $2"
        ))
        .bind(*store_id.as_uuid())
        .bind(*id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("get_category", e))?;
        row.as_ref()
            .map(category_from_row)
            .transpose()
            .map_err(decode_err("get_category"))
    }

    async fn list(&self, store_id: StoreId) -> RepoResult<Vec<Category>> {
        let rows = sqlx::query(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE store_id = $1 ORDER BY lower(name)"
        ))
        .bind(*store_id.as_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("list_categories", e))?;
        rows.iter()
            .map(category_from_row)
            .collect::<Result<_, _>>()
            .map_err(decode_err("list_categories"))
    }

    async fn update(&self, category: &Category) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE categories SET name = $3, description = $4, updated_at = $5
            WHERE store_id = $1 AND id = $2
            "#,
        )
        .bind(*category.store_id.as_uuid())
        .bind(*category.id.as_uuid())
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("update_category", e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("category {}", category.id)).into());
        }
        Ok(())
    }

    async fn delete(&self, store_id: StoreId, id: CategoryId) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE store_id = $1 AND id = $2")
            .bind(*store_id.as_uuid())
            .bind(*id.as_uuid())
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("delete_category", e))?;
        Ok(result.rows_affected() > 0)
    }
}

fn sku_conflict(product: &Product) -> impl Fn(sqlx::Error) -> RepoError + '_ {
    move |e| match map_sqlx_error("save_product", e) {
        RepoError::Conflict(_) => RepoError::Conflict(format!("sku {} already exists", product.sku)),
        other => other,
    }
}

#[async_trait]
impl ProductRepository for PgStore {
    #[instrument(skip(self, product), fields(store_id = %product.store_id, sku = %product.sku), err)]
    async fn insert(&self, product: &Product) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products
                (id, store_id, sku, name, category_id, price, cost, stock, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(*product.id.as_uuid())
        .bind(*product.store_id.as_uuid())
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.category_id.map(|c| *c.as_uuid()))
        .bind(product.price)
        .bind(product.cost)
        .bind(product.stock)
        .bind(product.active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(self.pool())
        .await
        .map_err(sku_conflict(product))?;
        Ok(())
    }

    async fn get(&self, store_id: StoreId, id: ProductId) -> RepoResult<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE store_id = $1 AND id = $2"
        ))
        .bind(*store_id.as_uuid())
        .bind(*id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("get_product", e))?;
        row.as_ref()
            .map(product_from_row)
            .transpose()
            .map_err(decode_err("get_product"))
    }

    async fn list(&self, store_id: StoreId, filter: &ProductFilter) -> RepoResult<Vec<Product>> {
        let pattern = filter
            .q
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .map(like_pattern);
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE store_id = $1
              AND ($2::text IS NULL OR name ILIKE $2 OR sku ILIKE $2)
              AND ($3::uuid IS NULL OR category_id = $3)
            ORDER BY lower(name)
            "#
        ))
        .bind(*store_id.as_uuid())
        .bind(pattern)
        .bind(filter.category_id.map(|c| *c.as_uuid()))
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;
        rows.iter()
            .map(product_from_row)
            .collect::<Result<_, _>>()
            .map_err(decode_err("list_products"))
    }

    #[instrument(skip(self, product), fields(store_id = %product.store_id, product_id = %product.id), err)]
    async fn update(&self, product: &Product) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET sku = $3, name = $4, category_id = $5, price = $6, cost = $7,
                stock = $8, active = $9, updated_at = $10
            WHERE store_id = $1 AND id = $2
            "#,
        )
        .bind(*product.store_id.as_uuid())
        .bind(*product.id.as_uuid())
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.category_id.map(|c| *c.as_uuid()))
        .bind(product.price)
        .bind(product.cost)
        .bind(product.stock)
        .bind(product.active)
        .bind(product.updated_at)
        .execute(self.pool())
        .await
        .map_err(sku_conflict(product))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("product {}", product.id)).into());
        }
        Ok(())
    }

    async fn delete(&self, store_id: StoreId, id: ProductId) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE store_id = $1 AND id = $2")
            .bind(*store_id.as_uuid())
            .bind(*id.as_uuid())
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        Ok(result.rows_affected() > 0)
    }
}
