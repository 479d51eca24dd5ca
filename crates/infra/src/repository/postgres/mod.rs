//! Postgres backend.
//!
//! ## Error Mapping
//!
//! | PostgreSQL code | RepoError | Scenario |
//! |---|---|---|
//! | `23505` unique violation | `Conflict` | duplicate SKU/email, second open shift |
//! | `23503` foreign key violation | `Conflict` | deleting a referenced record |
//! | `23514` check violation | `Domain(InvariantViolation)` | e.g. stock below zero |
//! | anything else | `Storage` | connectivity, pool closed, decode failures |
//!
//! Every store-scoped query includes `store_id` in its `WHERE` clause.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

use tillpoint_catalog::Product;
use tillpoint_core::{DomainError, ProductId, StoreId};

use crate::error::{RepoError, RepoResult};

mod catalog;
mod customers;
mod ledger;
mod shifts;
mod storefront;
mod stores;
mod users;

/// Postgres-backed implementation of every repository trait.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub(crate) async fn begin(&self, operation: &str) -> RepoResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error(operation, e))
    }
}

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") | Some("23503") => RepoError::Conflict(msg),
                Some("23514") => RepoError::Domain(DomainError::invariant(msg)),
                _ => RepoError::Storage(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            RepoError::Storage(format!("connection pool closed in {}", operation))
        }
        _ => RepoError::Storage(format!("sqlx error in {}: {}", operation, err)),
    }
}

/// A stored value that no longer parses into its domain type.
pub(crate) fn corrupt(err: DomainError) -> RepoError {
    RepoError::Storage(format!("corrupt row: {err}"))
}

pub(crate) fn decode_err(operation: &str) -> impl Fn(sqlx::Error) -> RepoError + '_ {
    move |e| RepoError::Storage(format!("failed to decode row in {operation}: {e}"))
}

pub(crate) const PRODUCT_COLUMNS: &str =
    "id, store_id, sku, name, category_id, price, cost, stock, active, created_at, updated_at";

pub(crate) fn product_from_row(row: &PgRow) -> Result<Product, sqlx::Error> {
    Ok(Product {
        id: row.try_get::<uuid::Uuid, _>("id")?.into(),
        store_id: row.try_get::<uuid::Uuid, _>("store_id")?.into(),
        sku: row.try_get("sku")?,
        name: row.try_get("name")?,
        category_id: row.try_get::<Option<uuid::Uuid>, _>("category_id")?.map(Into::into),
        price: row.try_get("price")?,
        cost: row.try_get("cost")?,
        stock: row.try_get("stock")?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Lock the products (in id order), apply the decrements through
/// `Product::take_stock`, and write the new stock levels.
pub(crate) async fn take_stock_tx(
    tx: &mut Transaction<'static, Postgres>,
    store_id: StoreId,
    wanted: impl IntoIterator<Item = (ProductId, i64)>,
    now: DateTime<Utc>,
) -> RepoResult<()> {
    let mut totals: BTreeMap<ProductId, i64> = BTreeMap::new();
    for (product_id, quantity) in wanted {
        *totals.entry(product_id).or_default() += quantity;
    }

    for (product_id, quantity) in totals {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE store_id = $1 AND id = $2 FOR UPDATE"
        ))
        .bind(*store_id.as_uuid())
        .bind(*product_id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("take_stock", e))?
        .ok_or_else(|| DomainError::not_found(format!("product {product_id}")))?;

        let mut product = product_from_row(&row).map_err(decode_err("take_stock"))?;
        product.take_stock(quantity, now)?;

        sqlx::query("UPDATE products SET stock = $3, updated_at = $4 WHERE store_id = $1 AND id = $2")
            .bind(*store_id.as_uuid())
            .bind(*product_id.as_uuid())
            .bind(product.stock)
            .bind(product.updated_at)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("take_stock", e))?;
    }
    Ok(())
}

/// `%q%` for ILIKE with `%`, `_` and `\` escaped.
pub(crate) fn like_pattern(q: &str) -> String {
    let mut escaped = String::with_capacity(q.len() + 2);
    escaped.push('%');
    for c in q.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" cola "), "%cola%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
