use serde::{Deserialize, Serialize};

/// Which analysis produced an [`Insight`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    MarketBasket,
    DebtRisk,
}

/// Headline figure attached to every analytics answer.
///
/// `score` is the lift of the strongest basket rule for
/// [`InsightKind::MarketBasket`], and the risk score (or the number of
/// high-risk customers, for a whole report) for [`InsightKind::DebtRisk`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    /// Engine that computed it (`heuristic`, `remote`).
    #[serde(default = "default_engine")]
    pub engine: String,
    pub score: f64,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    pub summary: String,
}

fn default_engine() -> String {
    "remote".to_owned()
}

impl Insight {
    pub fn heuristic(kind: InsightKind, score: f64, confidence: f64, summary: impl Into<String>) -> Self {
        Self {
            kind,
            engine: "heuristic".to_owned(),
            score,
            confidence: if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, 1.0) },
            summary: summary.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_is_kept_in_unit_range() {
        assert_eq!(Insight::heuristic(InsightKind::DebtRisk, 1.0, 3.5, "x").confidence, 1.0);
        assert_eq!(Insight::heuristic(InsightKind::DebtRisk, 1.0, -0.2, "x").confidence, 0.0);
        assert_eq!(Insight::heuristic(InsightKind::DebtRisk, 1.0, f64::NAN, "x").confidence, 0.0);
    }

    #[test]
    fn remote_insights_without_engine_are_tagged_remote() {
        let raw = r#"{"kind":"market_basket","score":2.5,"confidence":0.4,"summary":"ok"}"#;
        let insight: Insight = serde_json::from_str(raw).unwrap();
        assert_eq!(insight.kind, InsightKind::MarketBasket);
        assert_eq!(insight.engine, "remote");
    }
}
