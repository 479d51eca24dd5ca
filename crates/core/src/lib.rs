//! `tillpoint-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod outcome;
pub mod patch;

pub use entity::Entity;
pub use error::{require_non_empty, require_non_negative, DomainError, DomainResult};
pub use id::{
    CategoryId, CustomerId, OrderId, ProductId, SaleId, ShiftId, StoreId, TransactionId, UserId,
};
pub use outcome::{ErrorKind, Outcome, OutcomeError};
