//! Swappable analytics backends behind one capability interface.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use tillpoint_core::StoreId;

use crate::debt_risk::{DebtProfile, DebtRiskAssessment, DebtRiskJob};
use crate::job::AiJob;
use crate::market_basket::{BasketSnapshot, MarketBasketJob, MarketBasketParams, MarketBasketReport};
use crate::error::AiError;

#[async_trait]
pub trait InsightEngine: Send + Sync {
    /// Short identifier for logs and response metadata.
    fn name(&self) -> &'static str;

    async fn market_basket(
        &self,
        snapshot: BasketSnapshot,
        params: MarketBasketParams,
    ) -> Result<MarketBasketReport, AiError>;

    async fn debt_risk(
        &self,
        store_id: StoreId,
        profiles: Vec<DebtProfile>,
    ) -> Result<Vec<DebtRiskAssessment>, AiError>;
}

/// Deterministic in-process engine.
#[derive(Debug, Clone, Default)]
pub struct HeuristicEngine;

#[async_trait]
impl InsightEngine for HeuristicEngine {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn market_basket(
        &self,
        snapshot: BasketSnapshot,
        params: MarketBasketParams,
    ) -> Result<MarketBasketReport, AiError> {
        MarketBasketJob::new(snapshot, params).report()
    }

    async fn debt_risk(
        &self,
        store_id: StoreId,
        profiles: Vec<DebtProfile>,
    ) -> Result<Vec<DebtRiskAssessment>, AiError> {
        DebtRiskJob::new(store_id, profiles).run()
    }
}

/// Calls an HTTP inference service.
///
/// Contract: `POST {endpoint}/market-basket` with `{snapshot, params}` returns a
/// `MarketBasketReport`; `POST {endpoint}/debt-risk` with `{store_id, profiles}`
/// returns a list of `DebtRiskAssessment`.
#[derive(Debug, Clone)]
pub struct RemoteEngine {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
struct MarketBasketRequest<'a> {
    snapshot: &'a BasketSnapshot,
    params: &'a MarketBasketParams,
}

#[derive(Serialize)]
struct DebtRiskRequest<'a> {
    store_id: StoreId,
    profiles: &'a [DebtProfile],
}

impl RemoteEngine {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, AiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AiError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, AiError>
    where
        B: Serialize + Sync,
        R: serde::de::DeserializeOwned,
    {
        let url = format!("{}/{}", self.endpoint, path);
        debug!(%url, "calling analytics backend");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(%url, error = %e, "analytics backend request failed");
                AiError::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, %status, "analytics backend returned an error status");
            return Err(AiError::InferenceFailed(format!("backend responded {status}")));
        }
        response
            .json::<R>()
            .await
            .map_err(|e| AiError::InferenceFailed(format!("malformed backend response: {e}")))
    }
}

#[async_trait]
impl InsightEngine for RemoteEngine {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn market_basket(
        &self,
        snapshot: BasketSnapshot,
        params: MarketBasketParams,
    ) -> Result<MarketBasketReport, AiError> {
        params.validate()?;
        self.post(
            "market-basket",
            &MarketBasketRequest {
                snapshot: &snapshot,
                params: &params,
            },
        )
        .await
    }

    async fn debt_risk(
        &self,
        store_id: StoreId,
        profiles: Vec<DebtProfile>,
    ) -> Result<Vec<DebtRiskAssessment>, AiError> {
        self.post(
            "debt-risk",
            &DebtRiskRequest {
                store_id,
                profiles: &profiles,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn heuristic_engine_answers_both_questions() {
        let engine = HeuristicEngine;
        let store_id = StoreId::new();
        let report = engine
            .market_basket(
                BasketSnapshot {
                    store_id,
                    baskets: vec![],
                },
                MarketBasketParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(report.store_id, store_id);
        assert!(engine.debt_risk(store_id, vec![]).await.unwrap().is_empty());
        assert_eq!(engine.name(), "heuristic");
    }

    #[tokio::test]
    async fn unreachable_remote_is_reported_as_unavailable() {
        // Port 9 (discard) on loopback is closed in test environments.
        let engine = RemoteEngine::new("http://127.0.0.1:9/", Duration::from_secs(2)).unwrap();
        let err = engine.debt_risk(StoreId::new(), vec![]).await.unwrap_err();
        assert!(matches!(err, AiError::Unavailable(_)));
    }

    #[tokio::test]
    async fn remote_rejects_bad_params_before_calling_out() {
        let engine = RemoteEngine::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = engine
            .market_basket(
                BasketSnapshot {
                    store_id: StoreId::new(),
                    baskets: vec![],
                },
                MarketBasketParams {
                    limit: 0,
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::InvalidInput(_)));
    }
}
