use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use tillpoint_core::{ProductId, StoreId};

use crate::job::AiJob;
use crate::error::AiError;
use crate::insight::{Insight, InsightKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub product_id: ProductId,
    pub name: String,
}

/// Baskets (one per sale) for a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketSnapshot {
    pub store_id: StoreId,
    pub baskets: Vec<Vec<ProductRef>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketBasketParams {
    pub min_support: f64,
    pub min_confidence: f64,
    pub limit: usize,
}

impl Default for MarketBasketParams {
    fn default() -> Self {
        Self {
            min_support: 0.01,
            min_confidence: 0.3,
            limit: 20,
        }
    }
}

impl MarketBasketParams {
    pub fn validate(&self) -> Result<(), AiError> {
        let unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        if !unit(self.min_support) || !unit(self.min_confidence) {
            return Err(AiError::InvalidInput(
                "min_support and min_confidence must be within [0, 1]".to_string(),
            ));
        }
        if self.limit == 0 {
            return Err(AiError::InvalidInput("limit must be positive".to_string()));
        }
        Ok(())
    }
}

/// "Customers who bought `antecedent` also bought `consequent`".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationRule {
    pub antecedent: ProductRef,
    pub consequent: ProductRef,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketBasketReport {
    pub store_id: StoreId,
    pub transactions_analyzed: usize,
    pub rules: Vec<AssociationRule>,
    pub insight: Insight,
}

/// Pairwise association mining over sale baskets.
///
/// Model:
/// - support(A→B) = baskets with A and B / all baskets
/// - confidence(A→B) = baskets with A and B / baskets with A
/// - lift(A→B) = confidence / support(B)
#[derive(Debug, Clone)]
pub struct MarketBasketJob {
    input: BasketSnapshot,
    params: MarketBasketParams,
}

impl MarketBasketJob {
    pub fn new(input: BasketSnapshot, params: MarketBasketParams) -> Self {
        Self { input, params }
    }

    pub fn report(&self) -> Result<MarketBasketReport, AiError> {
        let rules = self.run()?;
        let insight = self.insight(&rules);
        Ok(MarketBasketReport {
            store_id: self.input.store_id,
            transactions_analyzed: self.input.baskets.len(),
            rules,
            insight,
        })
    }
}

impl AiJob for MarketBasketJob {
    type Input = BasketSnapshot;
    type Output = Vec<AssociationRule>;

    fn store_id(&self) -> StoreId {
        self.input.store_id
    }

    fn input(&self) -> &Self::Input {
        &self.input
    }

    fn run(&self) -> Result<Self::Output, AiError> {
        self.params.validate()?;
        let n = self.input.baskets.len();
        if n == 0 {
            return Ok(Vec::new());
        }

        let mut names: BTreeMap<ProductId, String> = BTreeMap::new();
        let mut item_counts: BTreeMap<ProductId, usize> = BTreeMap::new();
        let mut pair_counts: BTreeMap<(ProductId, ProductId), usize> = BTreeMap::new();

        for basket in &self.input.baskets {
            let items: BTreeSet<ProductId> = basket
                .iter()
                .map(|p| {
                    names.entry(p.product_id).or_insert_with(|| p.name.clone());
                    p.product_id
                })
                .collect();
            for a in &items {
                *item_counts.entry(*a).or_insert(0) += 1;
                for b in items.range((std::ops::Bound::Excluded(*a), std::ops::Bound::Unbounded)) {
                    *pair_counts.entry((*a, *b)).or_insert(0) += 1;
                }
            }
        }

        let total = n as f64;
        let product = |id: ProductId| ProductRef {
            product_id: id,
            name: names.get(&id).cloned().unwrap_or_default(),
        };

        let mut rules = Vec::new();
        for (&(a, b), &both) in &pair_counts {
            let support = both as f64 / total;
            if support < self.params.min_support {
                continue;
            }
            for (from, to) in [(a, b), (b, a)] {
                let from_count = item_counts.get(&from).copied().unwrap_or(0);
                let to_count = item_counts.get(&to).copied().unwrap_or(0);
                if from_count == 0 || to_count == 0 {
                    continue;
                }
                let confidence = both as f64 / from_count as f64;
                if confidence < self.params.min_confidence {
                    continue;
                }
                let lift = confidence / (to_count as f64 / total);
                rules.push(AssociationRule {
                    antecedent: product(from),
                    consequent: product(to),
                    support,
                    confidence,
                    lift,
                });
            }
        }

        rules.sort_by(|x, y| {
            y.lift
                .total_cmp(&x.lift)
                .then_with(|| y.confidence.total_cmp(&x.confidence))
                .then_with(|| x.antecedent.product_id.cmp(&y.antecedent.product_id))
                .then_with(|| x.consequent.product_id.cmp(&y.consequent.product_id))
        });
        rules.truncate(self.params.limit);
        Ok(rules)
    }

    fn insight(&self, output: &Self::Output) -> Insight {
        let top_lift = output.first().map(|r| r.lift).unwrap_or(0.0);
        // Few baskets make rules noisy.
        let confidence = (self.input.baskets.len() as f64 / 100.0).min(1.0);
        Insight::heuristic(
            InsightKind::MarketBasket,
            top_lift,
            confidence,
            format!(
                "found {} association rule(s) across {} sale(s) (min_support={}, min_confidence={})",
                output.len(),
                self.input.baskets.len(),
                self.params.min_support,
                self.params.min_confidence
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: ProductId, name: &str) -> ProductRef {
        ProductRef {
            product_id: id,
            name: name.to_string(),
        }
    }

    #[test]
    fn bread_and_butter_are_associated() {
        let bread = ProductId::new();
        let butter = ProductId::new();
        let milk = ProductId::new();
        let snapshot = BasketSnapshot {
            store_id: StoreId::new(),
            baskets: vec![
                vec![p(bread, "Roti"), p(butter, "Mentega")],
                vec![p(bread, "Roti"), p(butter, "Mentega"), p(milk, "Susu")],
                vec![p(bread, "Roti")],
                vec![p(milk, "Susu")],
            ],
        };
        let params = MarketBasketParams {
            min_support: 0.4,
            min_confidence: 0.6,
            limit: 10,
        };
        let report = MarketBasketJob::new(snapshot, params).report().unwrap();

        let butter_to_bread = report
            .rules
            .iter()
            .find(|r| r.antecedent.product_id == butter && r.consequent.product_id == bread)
            .expect("butter → bread rule");
        assert_eq!(butter_to_bread.support, 0.5);
        assert_eq!(butter_to_bread.confidence, 1.0);
        assert!((butter_to_bread.lift - 4.0 / 3.0).abs() < 1e-9);
        assert!(report.rules.iter().all(|r| r.antecedent.product_id != milk));
        assert_eq!(report.transactions_analyzed, 4);
    }

    #[test]
    fn duplicate_lines_in_one_basket_count_once() {
        let a = ProductId::new();
        let b = ProductId::new();
        let snapshot = BasketSnapshot {
            store_id: StoreId::new(),
            baskets: vec![vec![p(a, "A"), p(a, "A"), p(b, "B")]],
        };
        let rules = MarketBasketJob::new(snapshot, MarketBasketParams::default()).run().unwrap();
        assert_eq!(rules.len(), 2);
        assert!(rules.iter().all(|r| r.support == 1.0 && r.confidence == 1.0));
    }

    #[test]
    fn limit_truncates_and_bad_params_are_rejected() {
        let ids: Vec<ProductId> = (0..5).map(|_| ProductId::new()).collect();
        let basket: Vec<ProductRef> = ids.iter().map(|id| p(*id, "x")).collect();
        let snapshot = BasketSnapshot {
            store_id: StoreId::new(),
            baskets: vec![basket],
        };
        let params = MarketBasketParams {
            limit: 3,
            ..Default::default()
        };
        assert_eq!(MarketBasketJob::new(snapshot.clone(), params).run().unwrap().len(), 3);

        let bad = MarketBasketParams {
            min_support: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            MarketBasketJob::new(snapshot, bad).run(),
            Err(AiError::InvalidInput(_))
        ));
    }

    #[test]
    fn empty_history_yields_no_rules() {
        let snapshot = BasketSnapshot {
            store_id: StoreId::new(),
            baskets: vec![],
        };
        let report = MarketBasketJob::new(snapshot, MarketBasketParams::default()).report().unwrap();
        assert!(report.rules.is_empty());
        assert_eq!(report.insight.confidence, 0.0);
        assert_eq!(report.insight.kind, InsightKind::MarketBasket);
        assert_eq!(report.insight.engine, "heuristic");
    }
}
