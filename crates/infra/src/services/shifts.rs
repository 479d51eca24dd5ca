//! Till shifts: start, reconcile, close.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};

use tillpoint_core::{DomainError, Outcome, ShiftId};
use tillpoint_shifts::{summarize_shift, Shift, ShiftSummary};

use crate::context::RequestContext;
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{LedgerFilter, PaymentRepository, SaleRepository, ShiftRepository};

/// A closed shift together with the reconciliation it was closed against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShiftClosure {
    #[serde(flatten)]
    pub shift: Shift,
    pub summary: ShiftSummary,
}

#[derive(Clone)]
pub struct ShiftService {
    shifts: Arc<dyn ShiftRepository>,
    sales: Arc<dyn SaleRepository>,
    payments: Arc<dyn PaymentRepository>,
}

impl ShiftService {
    pub fn new(
        shifts: Arc<dyn ShiftRepository>,
        sales: Arc<dyn SaleRepository>,
        payments: Arc<dyn PaymentRepository>,
    ) -> Self {
        Self {
            shifts,
            sales,
            payments,
        }
    }

    /// Open a shift for the calling operator in the active store.
    #[instrument(skip(self, ctx), fields(store_id = %ctx.store_id, user_id = %ctx.user_id))]
    pub async fn start(&self, ctx: &RequestContext, starting_cash: i64) -> Outcome<Shift> {
        let result: ServiceResult<Shift> = async {
            let shift = Shift::open(ctx.store_id, ctx.user_id, starting_cash, Utc::now())?;
            self.shifts.open(&shift).await?;
            Ok(shift)
        }
        .await;
        match &result {
            Ok(shift) => info!(shift_id = %shift.id, starting_cash, "shift opened"),
            Err(e) => warn!(error = %e, "shift start rejected"),
        }
        result.into()
    }

    /// Close a shift, freezing ending, expected and difference figures.
    ///
    /// Operators close their own shifts; managers and admins may close any.
    #[instrument(skip(self, ctx), fields(store_id = %ctx.store_id, user_id = %ctx.user_id))]
    pub async fn close(&self, ctx: &RequestContext, id: ShiftId, ending_cash: i64) -> Outcome<ShiftClosure> {
        let result = self.close_inner(ctx, id, ending_cash).await;
        match &result {
            Ok(closure) => info!(
                shift_id = %id,
                expected_cash = closure.summary.expected_cash,
                ending_cash,
                cash_difference = closure.shift.cash_difference.unwrap_or_default(),
                "shift closed"
            ),
            Err(e) => warn!(shift_id = %id, error = %e, "shift close rejected"),
        }
        result.into()
    }

    async fn close_inner(
        &self,
        ctx: &RequestContext,
        id: ShiftId,
        ending_cash: i64,
    ) -> ServiceResult<ShiftClosure> {
        let shift = self.fetch(ctx, id).await?;
        if shift.user_id != ctx.user_id && !ctx.can_supervise() {
            return Err(ServiceError::Forbidden(
                "only the shift's operator or a manager may close it".to_string(),
            ));
        }
        let (shift, summary) = self
            .shifts
            .close(ctx.store_id, id, ending_cash, Utc::now())
            .await?;
        Ok(ShiftClosure { shift, summary })
    }

    /// Live figures for an open shift (window ends now), frozen figures for a
    /// closed one.
    #[instrument(skip(self, ctx), fields(store_id = %ctx.store_id))]
    pub async fn summary(&self, ctx: &RequestContext, id: ShiftId) -> Outcome<ShiftSummary> {
        self.summary_inner(ctx, id).await.into()
    }

    async fn summary_inner(&self, ctx: &RequestContext, id: ShiftId) -> ServiceResult<ShiftSummary> {
        let shift = self.fetch(ctx, id).await?;
        let now = Utc::now();
        let filter = LedgerFilter {
            user_id: Some(shift.user_id),
            since: Some(shift.started_at),
            until: Some(shift.window_end(now)),
            ..LedgerFilter::default()
        };
        let sales = self.sales.list(ctx.store_id, &filter).await?;
        let transactions = self.payments.list(ctx.store_id, &filter).await?;
        Ok(summarize_shift(&shift, &sales, &transactions, now))
    }

    /// The calling operator's open shift in the active store, if any.
    pub async fn current(&self, ctx: &RequestContext) -> Outcome<Option<Shift>> {
        let result: ServiceResult<Option<Shift>> = self
            .shifts
            .current(ctx.store_id, ctx.user_id)
            .await
            .map_err(Into::into);
        result.into()
    }

    pub async fn list(&self, ctx: &RequestContext) -> Outcome<Vec<Shift>> {
        let result: ServiceResult<Vec<Shift>> =
            self.shifts.list(ctx.store_id).await.map_err(Into::into);
        result.into()
    }

    pub async fn get(&self, ctx: &RequestContext, id: ShiftId) -> Outcome<Shift> {
        self.fetch(ctx, id).await.into()
    }

    async fn fetch(&self, ctx: &RequestContext, id: ShiftId) -> ServiceResult<Shift> {
        self.shifts
            .get(ctx.store_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("shift {id}")).into())
    }
}
