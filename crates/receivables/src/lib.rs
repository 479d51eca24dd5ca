//! Customer receivables: debt derived from credit sales and debt payments.
//!
//! Pure read-side logic; callers load the customer's sales and cash
//! transactions and fold them here.

pub mod debt;

pub use debt::{debt_entries, debtors, summarize, DebtEntry, DebtEntryKind, DebtSummary, Debtor};
