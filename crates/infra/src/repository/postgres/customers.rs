use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::instrument;

use tillpoint_core::{CustomerId, DomainError, StoreId};
use tillpoint_customers::{ContactInfo, Customer};

use super::{decode_err, map_sqlx_error, PgStore};
use crate::error::RepoResult;
use crate::repository::CustomerRepository;

const COLUMNS: &str =
    "id, store_id, name, email, phone, address, credit_limit, created_at, updated_at";

fn customer_from_row(row: &PgRow) -> Result<Customer, sqlx::Error> {
    Ok(Customer {
        id: row.try_get::<uuid::Uuid, _>("id")?.into(),
        store_id: row.try_get::<uuid::Uuid, _>("store_id")?.into(),
        name: row.try_get("name")?,
        contact: ContactInfo {
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
        },
        credit_limit: row.try_get("credit_limit")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl CustomerRepository for PgStore {
    #[instrument(skip(self, customer), fields(store_id = %customer.store_id), err)]
    async fn insert(&self, customer: &Customer) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO customers
                (id, store_id, name, email, phone, address, credit_limit, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(*customer.id.as_uuid())
        .bind(*customer.store_id.as_uuid())
        .bind(&customer.name)
        .bind(&customer.contact.email)
        .bind(&customer.contact.phone)
        .bind(&customer.contact.address)
        .bind(customer.credit_limit)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("insert_customer", e))?;
        Ok(())
    }

    async fn get(&self, store_id: StoreId, id: CustomerId) -> RepoResult<Option<Customer>> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM customers WHERE store_id = $1 AND id = $2"
        ))
        .bind(*store_id.as_uuid())
        .bind(*id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("get_customer", e))?;
        row.as_ref()
            .map(customer_from_row)
            .transpose()
            .map_err(decode_err("get_customer"))
    }

    async fn list(&self, store_id: StoreId) -> RepoResult<Vec<Customer>> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM customers WHERE store_id = $1 ORDER BY lower(name)"
        ))
        .bind(*store_id.as_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("list_customers", e))?;
        rows.iter()
            .map(customer_from_row)
            .collect::<Result<_, _>>()
            .map_err(decode_err("list_customers"))
    }

    async fn update(&self, customer: &Customer) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE customers
            SET name = $3, email = $4, phone = $5, address = $6, credit_limit = $7, updated_at = $8
            WHERE store_id = $1 AND id = $2
            "#,
        )
        .bind(*customer.store_id.as_uuid())
        .bind(*customer.id.as_uuid())
        .bind(&customer.name)
        .bind(&customer.contact.email)
        .bind(&customer.contact.phone)
        .bind(&customer.contact.address)
        .bind(customer.credit_limit)
        .bind(customer.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("update_customer", e))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("customer {}", customer.id)).into());
        }
        Ok(())
    }

    async fn delete(&self, store_id: StoreId, id: CustomerId) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM customers WHERE store_id = $1 AND id = $2")
            .bind(*store_id.as_uuid())
            .bind(*id.as_uuid())
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("delete_customer", e))?;
        Ok(result.rows_affected() > 0)
    }
}
