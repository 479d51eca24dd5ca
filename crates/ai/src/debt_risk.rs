use serde::{Deserialize, Serialize};

use tillpoint_core::{CustomerId, StoreId};

use crate::job::AiJob;
use crate::error::AiError;
use crate::insight::{Insight, InsightKind};

/// Debt position of one customer, prepared by the caller from receivables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtProfile {
    pub customer_id: CustomerId,
    pub name: String,
    pub current_debt: i64,
    pub credit_limit: i64,
    pub total_sales: i64,
    pub total_payments: i64,
    /// Days since the last debt payment; `None` if the customer never paid.
    pub days_since_last_payment: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.65 {
            RiskLevel::High
        } else if score >= 0.35 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtRiskAssessment {
    pub customer_id: CustomerId,
    pub name: String,
    pub current_debt: i64,
    pub credit_limit: i64,
    /// Risk in \[0, 1\].
    pub score: f64,
    pub level: RiskLevel,
    pub factors: Vec<String>,
    pub insight: Insight,
}

const UTILIZATION_WEIGHT: f64 = 0.5;
const RECENCY_WEIGHT: f64 = 0.3;
const REPAYMENT_WEIGHT: f64 = 0.2;
const STALE_PAYMENT_DAYS: f64 = 90.0;

/// Weighted heuristic over credit utilisation, payment recency and the
/// share of credit sales already repaid.
#[derive(Debug, Clone)]
pub struct DebtRiskJob {
    store_id: StoreId,
    input: Vec<DebtProfile>,
}

impl DebtRiskJob {
    pub fn new(store_id: StoreId, input: Vec<DebtProfile>) -> Self {
        Self { store_id, input }
    }
}

fn assess(profile: &DebtProfile) -> (f64, Vec<String>) {
    if profile.current_debt <= 0 {
        return (0.0, vec!["no outstanding debt".to_string()]);
    }
    let mut factors = Vec::new();

    let utilization = if profile.credit_limit > 0 {
        (profile.current_debt as f64 / profile.credit_limit as f64).min(1.5) / 1.5
    } else {
        1.0
    };
    if profile.current_debt > profile.credit_limit {
        factors.push(format!(
            "debt {} exceeds credit limit {}",
            profile.current_debt, profile.credit_limit
        ));
    }

    let recency = match profile.days_since_last_payment {
        None => {
            factors.push("never made a debt payment".to_string());
            1.0
        }
        Some(days) => {
            let r = (days.max(0) as f64 / STALE_PAYMENT_DAYS).min(1.0);
            if r >= 1.0 {
                factors.push(format!("no payment in {days} days"));
            }
            r
        }
    };

    let repaid = if profile.total_sales > 0 {
        (profile.total_payments as f64 / profile.total_sales as f64).clamp(0.0, 1.0)
    } else {
        1.0
    };
    if repaid < 0.25 {
        factors.push(format!("only {:.0}% of credit sales repaid", repaid * 100.0));
    }

    let score = UTILIZATION_WEIGHT * utilization
        + RECENCY_WEIGHT * recency
        + REPAYMENT_WEIGHT * (1.0 - repaid);
    (score.clamp(0.0, 1.0), factors)
}

impl AiJob for DebtRiskJob {
    type Input = Vec<DebtProfile>;
    type Output = Vec<DebtRiskAssessment>;

    fn store_id(&self) -> StoreId {
        self.store_id
    }

    fn input(&self) -> &Self::Input {
        &self.input
    }

    fn run(&self) -> Result<Self::Output, AiError> {
        if let Some(bad) = self.input.iter().find(|p| p.credit_limit < 0) {
            return Err(AiError::InvalidInput(format!(
                "customer {} has a negative credit limit",
                bad.customer_id
            )));
        }

        let mut out: Vec<DebtRiskAssessment> = self
            .input
            .iter()
            .map(|profile| {
                let (score, factors) = assess(profile);
                let level = RiskLevel::from_score(score);
                let insight = Insight::heuristic(
                    InsightKind::DebtRisk,
                    score,
                    0.6,
                    format!("{:?} risk: {}", level, factors.join("; ")),
                );
                DebtRiskAssessment {
                    customer_id: profile.customer_id,
                    name: profile.name.clone(),
                    current_debt: profile.current_debt,
                    credit_limit: profile.credit_limit,
                    score,
                    level,
                    factors,
                    insight,
                }
            })
            .collect();
        out.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.customer_id.cmp(&b.customer_id)));
        Ok(out)
    }

    fn insight(&self, output: &Self::Output) -> Insight {
        let high = output.iter().filter(|a| a.level == RiskLevel::High).count();
        Insight::heuristic(
            InsightKind::DebtRisk,
            high as f64,
            0.6,
            format!("{high} of {} customer(s) at high risk", output.len()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(debt: i64, limit: i64, paid: i64, days: Option<i64>) -> DebtProfile {
        DebtProfile {
            customer_id: CustomerId::new(),
            name: "Budi".into(),
            current_debt: debt,
            credit_limit: limit,
            total_sales: debt + paid,
            total_payments: paid,
            days_since_last_payment: days,
        }
    }

    #[test]
    fn settled_customer_is_low_risk() {
        let out = DebtRiskJob::new(StoreId::new(), vec![profile(0, 100_000, 50_000, Some(3))])
            .run()
            .unwrap();
        assert_eq!(out[0].score, 0.0);
        assert_eq!(out[0].level, RiskLevel::Low);
    }

    #[test]
    fn over_limit_never_paying_customer_is_high_risk() {
        let out = DebtRiskJob::new(StoreId::new(), vec![profile(300_000, 100_000, 0, None)])
            .run()
            .unwrap();
        assert_eq!(out[0].level, RiskLevel::High);
        assert!(out[0].factors.iter().any(|f| f.contains("exceeds credit limit")));
    }

    #[test]
    fn results_are_sorted_riskiest_first() {
        let safe = profile(10_000, 1_000_000, 90_000, Some(1));
        let risky = profile(900_000, 1_000_000, 0, Some(120));
        let risky_id = risky.customer_id;
        let out = DebtRiskJob::new(StoreId::new(), vec![safe, risky]).run().unwrap();
        assert_eq!(out[0].customer_id, risky_id);
        assert!(out[0].score > out[1].score);
    }

    #[test]
    fn negative_limit_is_invalid_input() {
        let job = DebtRiskJob::new(StoreId::new(), vec![profile(1, -5, 0, None)]);
        assert!(matches!(job.run(), Err(AiError::InvalidInput(_))));
    }
}
