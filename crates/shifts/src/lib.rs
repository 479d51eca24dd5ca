//! Cashier shifts: open/close lifecycle and cash drawer reconciliation.
//!
//! Pure domain logic. Atomicity of close (one winner under concurrent
//! attempts) is the repository's job.

pub mod reconciliation;
pub mod shift;

pub use reconciliation::{summarize_shift, RevenueByMethod, ShiftSummary, ShiftTotals};
pub use shift::{Shift, ShiftStatus};
