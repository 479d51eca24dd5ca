use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::Row;
use tracing::instrument;

use tillpoint_core::{DomainError, ShiftId, StoreId, UserId};
use tillpoint_shifts::{summarize_shift, Shift, ShiftStatus, ShiftSummary, ShiftTotals};

use super::ledger::{sale_from_row, transaction_from_row, SALE_COLUMNS, TRANSACTION_COLUMNS};
use super::{corrupt, decode_err, map_sqlx_error, PgStore};
use crate::error::{RepoError, RepoResult};
use crate::repository::ShiftRepository;

const COLUMNS: &str = "id, store_id, user_id, started_at, ended_at, starting_cash, \
     ending_cash, expected_cash, cash_difference, status, closing_totals";

fn shift_from_row(row: &PgRow) -> RepoResult<Shift> {
    let decode = decode_err("shift_from_row");
    let status: String = row.try_get("status").map_err(&decode)?;
    let closing_totals: Option<Json<ShiftTotals>> = row.try_get("closing_totals").map_err(&decode)?;
    Ok(Shift {
        id: row.try_get::<uuid::Uuid, _>("id").map_err(&decode)?.into(),
        store_id: row.try_get::<uuid::Uuid, _>("store_id").map_err(&decode)?.into(),
        user_id: row.try_get::<uuid::Uuid, _>("user_id").map_err(&decode)?.into(),
        started_at: row.try_get("started_at").map_err(&decode)?,
        ended_at: row.try_get("ended_at").map_err(&decode)?,
        starting_cash: row.try_get("starting_cash").map_err(&decode)?,
        ending_cash: row.try_get("ending_cash").map_err(&decode)?,
        expected_cash: row.try_get("expected_cash").map_err(&decode)?,
        cash_difference: row.try_get("cash_difference").map_err(&decode)?,
        status: ShiftStatus::parse(&status).map_err(corrupt)?,
        closing_totals: closing_totals.map(|Json(totals)| totals),
    })
}

#[async_trait]
impl ShiftRepository for PgStore {
    /// The partial unique index `shifts_one_open_per_operator` rejects a
    /// second open shift even under concurrent starts.
    #[instrument(skip(self, shift), fields(store_id = %shift.store_id, user_id = %shift.user_id), err)]
    async fn open(&self, shift: &Shift) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO shifts (id, store_id, user_id, started_at, starting_cash, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(*shift.id.as_uuid())
        .bind(*shift.store_id.as_uuid())
        .bind(*shift.user_id.as_uuid())
        .bind(shift.started_at)
        .bind(shift.starting_cash)
        .bind(shift.status.as_str())
        .execute(self.pool())
        .await
        .map_err(|e| match map_sqlx_error("open_shift", e) {
            RepoError::Conflict(_) => RepoError::Conflict(format!(
                "user {} already has an open shift in this store",
                shift.user_id
            )),
            other => other,
        })?;
        Ok(())
    }

    async fn get(&self, store_id: StoreId, id: ShiftId) -> RepoResult<Option<Shift>> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM shifts WHERE store_id = $1 AND id = $2"
        ))
        .bind(*store_id.as_uuid())
        .bind(*id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("get_shift", e))?;
        row.as_ref().map(shift_from_row).transpose()
    }

    async fn current(&self, store_id: StoreId, user_id: UserId) -> RepoResult<Option<Shift>> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM shifts WHERE store_id = $1 AND user_id = $2 AND status = 'open'"
        ))
        .bind(*store_id.as_uuid())
        .bind(*user_id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("current_shift", e))?;
        row.as_ref().map(shift_from_row).transpose()
    }

    async fn list(&self, store_id: StoreId) -> RepoResult<Vec<Shift>> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM shifts WHERE store_id = $1 ORDER BY started_at DESC, id DESC"
        ))
        .bind(*store_id.as_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("list_shifts", e))?;
        rows.iter().map(shift_from_row).collect()
    }

    /// Runs in one transaction holding the shift row lock
    /// (`SELECT ... FOR UPDATE`), so a concurrent close waits and then sees
    /// the shift as closed.
    #[instrument(skip(self), fields(store_id = %store_id, shift_id = %id), err)]
    async fn close(
        &self,
        store_id: StoreId,
        id: ShiftId,
        ending_cash: i64,
        now: DateTime<Utc>,
    ) -> RepoResult<(Shift, ShiftSummary)> {
        let mut tx = self.begin("close_shift").await?;

        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM shifts WHERE store_id = $1 AND id = $2 FOR UPDATE"
        ))
        .bind(*store_id.as_uuid())
        .bind(*id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("close_shift", e))?
        .ok_or_else(|| DomainError::not_found(format!("shift {id}")))?;
        let mut shift = shift_from_row(&row)?;
        if !shift.is_open() {
            return Err(DomainError::invalid_state(format!("shift {id} is already closed")).into());
        }

        let sale_rows = sqlx::query(&format!(
            r#"
            SELECT {SALE_COLUMNS} FROM sales
            WHERE store_id = $1 AND cashier_id = $2 AND created_at >= $3 AND created_at < $4
            "#
        ))
        .bind(*store_id.as_uuid())
        .bind(*shift.user_id.as_uuid())
        .bind(shift.started_at)
        .bind(now)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("close_shift", e))?;
        let sales = sale_rows.iter().map(sale_from_row).collect::<RepoResult<Vec<_>>>()?;

        let refund_rows = sqlx::query(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS} FROM cash_transactions
            WHERE store_id = $1 AND user_id = $2 AND category = 'refund'
              AND created_at >= $3 AND created_at < $4
            "#
        ))
        .bind(*store_id.as_uuid())
        .bind(*shift.user_id.as_uuid())
        .bind(shift.started_at)
        .bind(now)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("close_shift", e))?;
        let refunds = refund_rows
            .iter()
            .map(transaction_from_row)
            .collect::<RepoResult<Vec<_>>>()?;

        let totals = ShiftTotals::tally(&shift, &sales, &refunds, now);
        shift.close(ending_cash, totals, now)?;

        sqlx::query(
            r#"
            UPDATE shifts
            SET ended_at = $3, ending_cash = $4, expected_cash = $5, cash_difference = $6, status = $7,
                closing_totals = $8
            WHERE store_id = $1 AND id = $2
            "#,
        )
        .bind(*store_id.as_uuid())
        .bind(*id.as_uuid())
        .bind(shift.ended_at)
        .bind(shift.ending_cash)
        .bind(shift.expected_cash)
        .bind(shift.cash_difference)
        .bind(shift.status.as_str())
        .bind(shift.closing_totals.clone().map(Json))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("close_shift", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("close_shift", e))?;

        let summary = summarize_shift(&shift, &sales, &refunds, now);
        Ok((shift, summary))
    }
}
