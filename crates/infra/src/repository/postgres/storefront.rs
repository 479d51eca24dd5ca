//! Storefront carts and online orders.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::Row;
use tracing::instrument;

use tillpoint_core::{CustomerId, DomainError, OrderId, StoreId};
use tillpoint_sales::{Cart, CartItem, OnlineOrder, OrderStatus};

use super::{corrupt, decode_err, map_sqlx_error, take_stock_tx, PgStore};
use crate::error::RepoResult;
use crate::repository::{CartRepository, OrderRepository};

const ORDER_COLUMNS: &str = "id, store_id, customer_id, items, total, status, created_at, updated_at";

fn cart_from_row(row: &PgRow) -> Result<Cart, sqlx::Error> {
    let Json(items): Json<Vec<CartItem>> = row.try_get("items")?;
    Ok(Cart {
        store_id: row.try_get::<uuid::Uuid, _>("store_id")?.into(),
        customer_id: row.try_get::<uuid::Uuid, _>("customer_id")?.into(),
        items,
        updated_at: row.try_get("updated_at")?,
    })
}

fn order_from_row(row: &PgRow) -> RepoResult<OnlineOrder> {
    let decode = decode_err("order_from_row");
    let status: String = row.try_get("status").map_err(&decode)?;
    let Json(items): Json<Vec<CartItem>> = row.try_get("items").map_err(&decode)?;
    Ok(OnlineOrder {
        id: row.try_get::<uuid::Uuid, _>("id").map_err(&decode)?.into(),
        store_id: row.try_get::<uuid::Uuid, _>("store_id").map_err(&decode)?.into(),
        customer_id: row.try_get::<uuid::Uuid, _>("customer_id").map_err(&decode)?.into(),
        items,
        total: row.try_get("total").map_err(&decode)?,
        status: OrderStatus::parse(&status).map_err(corrupt)?,
        created_at: row.try_get("created_at").map_err(&decode)?,
        updated_at: row.try_get("updated_at").map_err(&decode)?,
    })
}

#[async_trait]
impl CartRepository for PgStore {
    async fn get(&self, store_id: StoreId, customer_id: CustomerId) -> RepoResult<Option<Cart>> {
        let row = sqlx::query(
            "SELECT store_id, customer_id, items, updated_at FROM carts WHERE store_id = $1 AND customer_id = $2",
        )
        .bind(*store_id.as_uuid())
        .bind(*customer_id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("get_cart", e))?;
        row.as_ref()
            .map(cart_from_row)
            .transpose()
            .map_err(decode_err("get_cart"))
    }

    async fn save(&self, cart: &Cart) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO carts (store_id, customer_id, items, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (store_id, customer_id)
            DO UPDATE SET items = EXCLUDED.items, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(*cart.store_id.as_uuid())
        .bind(*cart.customer_id.as_uuid())
        .bind(Json(&cart.items))
        .bind(cart.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("save_cart", e))?;
        Ok(())
    }

    async fn delete(&self, store_id: StoreId, customer_id: CustomerId) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM carts WHERE store_id = $1 AND customer_id = $2")
            .bind(*store_id.as_uuid())
            .bind(*customer_id.as_uuid())
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("delete_cart", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderRepository for PgStore {
    #[instrument(skip(self, order), fields(store_id = %order.store_id, order_id = %order.id), err)]
    async fn checkout(&self, order: &OnlineOrder) -> RepoResult<()> {
        let mut tx = self.begin("checkout").await?;

        sqlx::query(
            r#"
            INSERT INTO online_orders
                (id, store_id, customer_id, items, total, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(*order.id.as_uuid())
        .bind(*order.store_id.as_uuid())
        .bind(*order.customer_id.as_uuid())
        .bind(Json(&order.items))
        .bind(order.total)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("checkout", e))?;

        sqlx::query("DELETE FROM carts WHERE store_id = $1 AND customer_id = $2")
            .bind(*order.store_id.as_uuid())
            .bind(*order.customer_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("checkout", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("checkout", e))?;
        Ok(())
    }

    async fn get(&self, store_id: StoreId, id: OrderId) -> RepoResult<Option<OnlineOrder>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM online_orders WHERE store_id = $1 AND id = $2"
        ))
        .bind(*store_id.as_uuid())
        .bind(*id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("get_order", e))?;
        row.as_ref().map(order_from_row).transpose()
    }

    async fn list(&self, store_id: StoreId) -> RepoResult<Vec<OnlineOrder>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM online_orders WHERE store_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(*store_id.as_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("list_orders", e))?;
        rows.iter().map(order_from_row).collect()
    }

    #[instrument(skip(self), fields(store_id = %store_id, order_id = %id, next = next.as_str()), err)]
    async fn update_status(
        &self,
        store_id: StoreId,
        id: OrderId,
        next: OrderStatus,
        now: DateTime<Utc>,
    ) -> RepoResult<OnlineOrder> {
        let mut tx = self.begin("update_order_status").await?;

        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM online_orders WHERE store_id = $1 AND id = $2 FOR UPDATE"
        ))
        .bind(*store_id.as_uuid())
        .bind(*id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_order_status", e))?
        .ok_or_else(|| DomainError::not_found(format!("order {id}")))?;
        let mut order = order_from_row(&row)?;
        order.transition_to(next, now)?;

        if next == OrderStatus::Fulfilled {
            take_stock_tx(
                &mut tx,
                store_id,
                order.items.iter().map(|i| (i.product_id, i.quantity)),
                now,
            )
            .await?;
        }

        sqlx::query("UPDATE online_orders SET status = $3, updated_at = $4 WHERE store_id = $1 AND id = $2")
            .bind(*store_id.as_uuid())
            .bind(*id.as_uuid())
            .bind(order.status.as_str())
            .bind(order.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_order_status", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("update_order_status", e))?;
        Ok(order)
    }
}
