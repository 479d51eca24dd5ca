//! `tillpoint-ai`
//!
//! **Responsibility:** analytics insights (market basket, debt risk).
//!
//! This crate is intentionally **not** part of the domain model:
//! - It must not depend on sales/customer entities; callers hand it snapshots.
//! - It must not mutate domain state.
//! - It emits **insights**, not domain records.

pub mod debt_risk;
pub mod engine;
pub mod error;
pub mod insight;
pub mod job;
pub mod market_basket;

pub use debt_risk::{DebtProfile, DebtRiskAssessment, DebtRiskJob, RiskLevel};
pub use engine::{HeuristicEngine, InsightEngine, RemoteEngine};
pub use error::AiError;
pub use insight::{Insight, InsightKind};
pub use job::AiJob;
pub use market_basket::{
    AssociationRule, BasketSnapshot, MarketBasketJob, MarketBasketParams, MarketBasketReport,
    ProductRef,
};
