use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillpoint_core::{require_non_negative, DomainError, DomainResult, Entity, ShiftId, StoreId, UserId};

use crate::ShiftTotals;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftStatus {
    Open,
    Closed,
}

impl ShiftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftStatus::Open => "open",
            ShiftStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "open" => Ok(ShiftStatus::Open),
            "closed" => Ok(ShiftStatus::Closed),
            other => Err(DomainError::validation(format!("unknown shift status '{other}'"))),
        }
    }
}

/// One operator's till session in one store.
///
/// # Invariants
/// - `open → closed` happens exactly once; there is no reopen.
/// - Closing figures (`ending_cash`, `expected_cash`, `cash_difference` and
///   `closing_totals`) are set together at close and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub id: ShiftId,
    pub store_id: StoreId,
    pub user_id: UserId,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub starting_cash: i64,
    pub ending_cash: Option<i64>,
    pub expected_cash: Option<i64>,
    pub cash_difference: Option<i64>,
    pub status: ShiftStatus,
    /// Sales tally the drawer was reconciled against.
    #[serde(default, skip_serializing)]
    pub closing_totals: Option<ShiftTotals>,
}

impl Entity for Shift {
    type Id = ShiftId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn store_id(&self) -> StoreId {
        self.store_id
    }
}

impl Shift {
    pub fn open(
        store_id: StoreId,
        user_id: UserId,
        starting_cash: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        require_non_negative("starting_cash", starting_cash)?;
        Ok(Self {
            id: ShiftId::new(),
            store_id,
            user_id,
            started_at: now,
            ended_at: None,
            starting_cash,
            ending_cash: None,
            expected_cash: None,
            cash_difference: None,
            status: ShiftStatus::Open,
            closing_totals: None,
        })
    }

    pub fn is_open(&self) -> bool {
        self.status == ShiftStatus::Open
    }

    /// Exclusive end of the reconciliation window.
    pub fn window_end(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.ended_at.unwrap_or(now)
    }

    /// `started_at <= at < window_end`.
    pub fn covers(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        at >= self.started_at && at < self.window_end(now)
    }

    /// starting cash + cash sales − cash refunds.
    pub fn expected_cash_for(&self, totals: &ShiftTotals) -> i64 {
        self.starting_cash
            .saturating_add(totals.cash_sales)
            .saturating_sub(totals.cash_refunds)
    }

    /// Freeze closing figures from the window tally. Leaves `self` untouched
    /// on error.
    pub fn close(&mut self, ending_cash: i64, totals: ShiftTotals, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.is_open() {
            return Err(DomainError::invalid_state(format!("shift {} is already closed", self.id)));
        }
        require_non_negative("ending_cash", ending_cash)?;
        let expected_cash = self.expected_cash_for(&totals);
        self.ended_at = Some(now.max(self.started_at));
        self.ending_cash = Some(ending_cash);
        self.expected_cash = Some(expected_cash);
        self.cash_difference = Some(ending_cash - expected_cash);
        self.closing_totals = Some(totals);
        self.status = ShiftStatus::Closed;
        Ok(())
    }
}
