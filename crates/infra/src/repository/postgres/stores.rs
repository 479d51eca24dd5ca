use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::instrument;

use tillpoint_core::{DomainError, StoreId};
use tillpoint_stores::Store;

use super::{decode_err, map_sqlx_error, PgStore};
use crate::error::RepoResult;
use crate::repository::StoreRepository;

const COLUMNS: &str = "id, name, address, phone, active, created_at, updated_at";

fn store_from_row(row: &PgRow) -> Result<Store, sqlx::Error> {
    Ok(Store {
        id: row.try_get::<uuid::Uuid, _>("id")?.into(),
        name: row.try_get("name")?,
        address: row.try_get("address")?,
        phone: row.try_get("phone")?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl StoreRepository for PgStore {
    #[instrument(skip(self, store), fields(store_id = %store.id), err)]
    async fn insert(&self, store: &Store) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stores (id, name, address, phone, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(*store.id.as_uuid())
        .bind(&store.name)
        .bind(&store.address)
        .bind(&store.phone)
        .bind(store.active)
        .bind(store.created_at)
        .bind(store.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("insert_store", e))?;
        Ok(())
    }

    async fn get(&self, id: StoreId) -> RepoResult<Option<Store>> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM stores WHERE id = $1"))
            .bind(*id.as_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| map_sqlx_error("get_store", e))?;
        row.as_ref()
            .map(store_from_row)
            .transpose()
            .map_err(decode_err("get_store"))
    }

    async fn list(&self) -> RepoResult<Vec<Store>> {
        let rows = sqlx::query(&format!("SELECT {COLUMNS} FROM stores ORDER BY lower(name)"))
            .fetch_all(self.pool())
            .await
            .map_err(|e| map_sqlx_error("list_stores", e))?;
        rows.iter()
            .map(store_from_row)
            .collect::<Result<_, _>>()
            .map_err(decode_err("list_stores"))
    }

    #[instrument(skip(self, store), fields(store_id = %store.id), err)]
    async fn update(&self, store: &Store) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE stores
            SET name = $2, address = $3, phone = $4, active = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(*store.id.as_uuid())
        .bind(&store.name)
        .bind(&store.address)
        .bind(&store.phone)
        .bind(store.active)
        .bind(store.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("update_store", e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("store {}", store.id)).into());
        }
        Ok(())
    }

    #[instrument(skip(self), fields(store_id = %id), err)]
    async fn delete(&self, id: StoreId) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM stores WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("delete_store", e))?;
        Ok(result.rows_affected() > 0)
    }
}
