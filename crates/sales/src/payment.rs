//! Cash transactions: money moving in or out of the till outside a sale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillpoint_core::{CustomerId, DomainError, DomainResult, Entity, StoreId, TransactionId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionCategory {
    /// Customer paying down their debt (receipt).
    DebtPayment,
    /// Money returned to a customer (disbursement).
    Refund,
    Expense,
    Deposit,
    Other,
}

impl TransactionCategory {
    pub const ALL: [TransactionCategory; 5] = [
        TransactionCategory::DebtPayment,
        TransactionCategory::Refund,
        TransactionCategory::Expense,
        TransactionCategory::Deposit,
        TransactionCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionCategory::DebtPayment => "debt_payment",
            TransactionCategory::Refund => "refund",
            TransactionCategory::Expense => "expense",
            TransactionCategory::Deposit => "deposit",
            TransactionCategory::Other => "other",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown transaction category '{s}'")))
    }
}

/// A signed cash movement: positive amounts are receipts, negative are
/// disbursements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashTransaction {
    pub id: TransactionId,
    pub store_id: StoreId,
    pub amount: i64,
    pub category: TransactionCategory,
    pub description: Option<String>,
    pub customer_id: Option<CustomerId>,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Entity for CashTransaction {
    type Id = TransactionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn store_id(&self) -> StoreId {
        self.store_id
    }
}

impl CashTransaction {
    /// Counts against a customer's debt.
    pub fn is_debt_payment(&self) -> bool {
        self.category == TransactionCategory::DebtPayment && self.customer_id.is_some()
    }

    /// Cash paid out as a refund (always a positive figure).
    pub fn refund_amount(&self) -> i64 {
        match self.category {
            TransactionCategory::Refund => -self.amount,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCashTransaction {
    pub amount: i64,
    pub category: TransactionCategory,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
}

impl NewCashTransaction {
    /// Sign rules: debt payments and deposits are receipts, refunds and
    /// expenses are disbursements, `other` may go either way.
    pub fn validate(&self) -> DomainResult<()> {
        if self.amount == 0 {
            return Err(DomainError::validation("amount cannot be zero"));
        }
        match self.category {
            TransactionCategory::DebtPayment => {
                if self.customer_id.is_none() {
                    return Err(DomainError::validation("debt payments require a customer"));
                }
                if self.amount < 0 {
                    return Err(DomainError::validation("debt payments must be positive"));
                }
            }
            TransactionCategory::Deposit if self.amount < 0 => {
                return Err(DomainError::validation("deposits must be positive"));
            }
            TransactionCategory::Refund | TransactionCategory::Expense if self.amount > 0 => {
                return Err(DomainError::validation(format!(
                    "{} amounts must be negative (disbursement)",
                    self.category.as_str()
                )));
            }
            _ => {}
        }
        Ok(())
    }

    pub fn into_transaction(
        self,
        store_id: StoreId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<CashTransaction> {
        self.validate()?;
        Ok(CashTransaction {
            id: TransactionId::new(),
            store_id,
            amount: self.amount,
            category: self.category,
            description: self.description.filter(|d| !d.trim().is_empty()),
            customer_id: self.customer_id,
            user_id,
            created_at: now,
        })
    }
}
