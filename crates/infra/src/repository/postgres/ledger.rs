//! Sales and cash transactions.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::Row;
use tracing::instrument;

use tillpoint_core::{SaleId, StoreId, TransactionId};
use tillpoint_sales::{CashTransaction, PaymentMethod, Sale, SaleLine, TransactionCategory};

use super::{corrupt, decode_err, map_sqlx_error, take_stock_tx, PgStore};
use crate::error::RepoResult;
use crate::repository::{LedgerFilter, PaymentRepository, SaleRepository};

pub(super) const SALE_COLUMNS: &str = "id, store_id, lines, total, payment_method, amount_paid, \
     change_given, customer_id, cashier_id, shift_id, note, created_at";

pub(super) const TRANSACTION_COLUMNS: &str =
    "id, store_id, amount, category, description, customer_id, user_id, created_at";

pub(super) fn sale_from_row(row: &PgRow) -> RepoResult<Sale> {
    let decode = decode_err("sale_from_row");
    let method: String = row.try_get("payment_method").map_err(&decode)?;
    let Json(lines): Json<Vec<SaleLine>> = row.try_get("lines").map_err(&decode)?;
    Ok(Sale {
        id: row.try_get::<uuid::Uuid, _>("id").map_err(&decode)?.into(),
        store_id: row.try_get::<uuid::Uuid, _>("store_id").map_err(&decode)?.into(),
        lines,
        total: row.try_get("total").map_err(&decode)?,
        payment_method: PaymentMethod::parse(&method).map_err(corrupt)?,
        amount_paid: row.try_get("amount_paid").map_err(&decode)?,
        change_given: row.try_get("change_given").map_err(&decode)?,
        customer_id: row
            .try_get::<Option<uuid::Uuid>, _>("customer_id")
            .map_err(&decode)?
            .map(Into::into),
        cashier_id: row.try_get::<uuid::Uuid, _>("cashier_id").map_err(&decode)?.into(),
        shift_id: row
            .try_get::<Option<uuid::Uuid>, _>("shift_id")
            .map_err(&decode)?
            .map(Into::into),
        note: row.try_get("note").map_err(&decode)?,
        created_at: row.try_get("created_at").map_err(&decode)?,
    })
}

pub(super) fn transaction_from_row(row: &PgRow) -> RepoResult<CashTransaction> {
    let decode = decode_err("transaction_from_row");
    let category: String = row.try_get("category").map_err(&decode)?;
    Ok(CashTransaction {
        id: row.try_get::<uuid::Uuid, _>("id").map_err(&decode)?.into(),
        store_id: row.try_get::<uuid::Uuid, _>("store_id").map_err(&decode)?.into(),
        amount: row.try_get("amount").map_err(&decode)?,
        category: TransactionCategory::parse(&category).map_err(corrupt)?,
        description: row.try_get("description").map_err(&decode)?,
        customer_id: row
            .try_get::<Option<uuid::Uuid>, _>("customer_id")
            .map_err(&decode)?
            .map(Into::into),
        user_id: row.try_get::<uuid::Uuid, _>("user_id").map_err(&decode)?.into(),
        created_at: row.try_get("created_at").map_err(&decode)?,
    })
}

#[async_trait]
impl SaleRepository for PgStore {
    #[instrument(
        skip(self, sale),
        fields(store_id = %sale.store_id, sale_id = %sale.id, lines = sale.lines.len()),
        err
    )]
    async fn record(&self, sale: &Sale) -> RepoResult<()> {
        let mut tx = self.begin("record_sale").await?;

        take_stock_tx(
            &mut tx,
            sale.store_id,
            sale.lines.iter().map(|l| (l.product_id, l.quantity)),
            sale.created_at,
        )
        .await?;

        sqlx::query(
            r#"
            INSERT INTO sales
                (id, store_id, lines, total, payment_method, amount_paid, change_given,
                 customer_id, cashier_id, shift_id, note, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(*sale.id.as_uuid())
        .bind(*sale.store_id.as_uuid())
        .bind(Json(&sale.lines))
        .bind(sale.total)
        .bind(sale.payment_method.as_str())
        .bind(sale.amount_paid)
        .bind(sale.change_given)
        .bind(sale.customer_id.map(|c| *c.as_uuid()))
        .bind(*sale.cashier_id.as_uuid())
        .bind(sale.shift_id.map(|s| *s.as_uuid()))
        .bind(&sale.note)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("record_sale", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("record_sale", e))?;
        Ok(())
    }

    async fn get(&self, store_id: StoreId, id: SaleId) -> RepoResult<Option<Sale>> {
        let row = sqlx::query(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE store_id = $1 AND id = $2"
        ))
        .bind(*store_id.as_uuid())
        .bind(*id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("get_sale", e))?;
        row.as_ref().map(sale_from_row).transpose()
    }

    async fn list(&self, store_id: StoreId, filter: &LedgerFilter) -> RepoResult<Vec<Sale>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {SALE_COLUMNS} FROM sales
            WHERE store_id = $1
              AND ($2::uuid IS NULL OR customer_id = $2)
              AND ($3::uuid IS NULL OR cashier_id = $3)
              AND ($4::timestamptz IS NULL OR created_at >= $4)
              AND ($5::timestamptz IS NULL OR created_at < $5)
            ORDER BY created_at, id
            "#
        ))
        .bind(*store_id.as_uuid())
        .bind(filter.customer_id.map(|c| *c.as_uuid()))
        .bind(filter.user_id.map(|u| *u.as_uuid()))
        .bind(filter.since)
        .bind(filter.until)
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("list_sales", e))?;
        rows.iter().map(sale_from_row).collect()
    }
}

#[async_trait]
impl PaymentRepository for PgStore {
    #[instrument(skip(self, transaction), fields(store_id = %transaction.store_id), err)]
    async fn insert(&self, transaction: &CashTransaction) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO cash_transactions
                (id, store_id, amount, category, description, customer_id, user_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(*transaction.id.as_uuid())
        .bind(*transaction.store_id.as_uuid())
        .bind(transaction.amount)
        .bind(transaction.category.as_str())
        .bind(&transaction.description)
        .bind(transaction.customer_id.map(|c| *c.as_uuid()))
        .bind(*transaction.user_id.as_uuid())
        .bind(transaction.created_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("insert_transaction", e))?;
        Ok(())
    }

    async fn get(&self, store_id: StoreId, id: TransactionId) -> RepoResult<Option<CashTransaction>> {
        let row = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM cash_transactions WHERE store_id = $1 AND id = $2"
        ))
        .bind(*store_id.as_uuid())
        .bind(*id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("get_transaction", e))?;
        row.as_ref().map(transaction_from_row).transpose()
    }

    async fn list(&self, store_id: StoreId, filter: &LedgerFilter) -> RepoResult<Vec<CashTransaction>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS} FROM cash_transactions
            WHERE store_id = $1
              AND ($2::uuid IS NULL OR customer_id = $2)
              AND ($3::uuid IS NULL OR user_id = $3)
              AND ($4::timestamptz IS NULL OR created_at >= $4)
              AND ($5::timestamptz IS NULL OR created_at < $5)
            ORDER BY created_at, id
            "#
        ))
        .bind(*store_id.as_uuid())
        .bind(filter.customer_id.map(|c| *c.as_uuid()))
        .bind(filter.user_id.map(|u| *u.as_uuid()))
        .bind(filter.since)
        .bind(filter.until)
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("list_transactions", e))?;
        rows.iter().map(transaction_from_row).collect()
    }
}
