//! Cash drawer reconciliation.
//!
//! expected = starting cash + cash sales − cash refunds, counted over the
//! shift window for the shift's operator in the shift's store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillpoint_core::ShiftId;
use tillpoint_sales::{CashTransaction, PaymentMethod, Sale};

use crate::{Shift, ShiftStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueByMethod {
    pub cash: i64,
    pub card: i64,
    pub transfer: i64,
    pub credit: i64,
}

impl RevenueByMethod {
    fn add(&mut self, method: PaymentMethod, amount: i64) {
        let slot = match method {
            PaymentMethod::Cash => &mut self.cash,
            PaymentMethod::Card => &mut self.card,
            PaymentMethod::Transfer => &mut self.transfer,
            PaymentMethod::Credit => &mut self.credit,
        };
        *slot = slot.saturating_add(amount);
    }
}

/// Sales and refunds counted in a shift window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftTotals {
    pub sale_count: usize,
    pub total_revenue: i64,
    pub revenue_by_method: RevenueByMethod,
    pub cash_sales: i64,
    pub cash_refunds: i64,
}

impl ShiftTotals {
    /// Count the operator's sales and refunds in `[started_at, window_end)`.
    ///
    /// Inputs may include records from other stores, operators or times;
    /// they are filtered out here.
    pub fn tally(
        shift: &Shift,
        sales: &[Sale],
        transactions: &[CashTransaction],
        now: DateTime<Utc>,
    ) -> Self {
        let mut totals = ShiftTotals::default();
        for sale in sales.iter().filter(|s| {
            s.store_id == shift.store_id && s.cashier_id == shift.user_id && shift.covers(s.created_at, now)
        }) {
            totals.sale_count += 1;
            totals.total_revenue = totals.total_revenue.saturating_add(sale.total);
            totals.revenue_by_method.add(sale.payment_method, sale.total);
        }
        totals.cash_sales = totals.revenue_by_method.cash;

        totals.cash_refunds = transactions
            .iter()
            .filter(|t| {
                t.store_id == shift.store_id && t.user_id == shift.user_id && shift.covers(t.created_at, now)
            })
            .map(CashTransaction::refund_amount)
            .fold(0i64, i64::saturating_add);
        totals
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShiftSummary {
    pub shift_id: ShiftId,
    pub status: ShiftStatus,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub sale_count: usize,
    pub total_revenue: i64,
    pub revenue_by_method: RevenueByMethod,
    pub starting_cash: i64,
    pub cash_sales: i64,
    pub cash_refunds: i64,
    pub expected_cash: i64,
    pub ending_cash: Option<i64>,
    pub cash_difference: Option<i64>,
}

/// Summarise a shift.
///
/// An open shift is tallied live up to `now`. A closed shift reports the
/// tally frozen at close, so records written afterwards never change its
/// figures.
pub fn summarize_shift(
    shift: &Shift,
    sales: &[Sale],
    transactions: &[CashTransaction],
    now: DateTime<Utc>,
) -> ShiftSummary {
    let totals = match &shift.closing_totals {
        Some(frozen) => frozen.clone(),
        None => ShiftTotals::tally(shift, sales, transactions, now),
    };
    let expected_cash = shift
        .expected_cash
        .unwrap_or_else(|| shift.expected_cash_for(&totals));

    ShiftSummary {
        shift_id: shift.id,
        status: shift.status,
        window_start: shift.started_at,
        window_end: shift.window_end(now),
        sale_count: totals.sale_count,
        total_revenue: totals.total_revenue,
        revenue_by_method: totals.revenue_by_method,
        starting_cash: shift.starting_cash,
        cash_sales: totals.cash_sales,
        cash_refunds: totals.cash_refunds,
        expected_cash,
        ending_cash: shift.ending_cash,
        cash_difference: shift.cash_difference,
    }
}
