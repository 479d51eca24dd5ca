//! Analytics: hands ledger snapshots to the configured insight engine.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use tillpoint_ai::{
    BasketSnapshot, DebtProfile, DebtRiskAssessment, InsightEngine, MarketBasketParams,
    MarketBasketReport, ProductRef,
};
use tillpoint_core::{CustomerId, DomainError};
use tillpoint_customers::Customer;
use tillpoint_receivables::summarize;
use tillpoint_sales::{CashTransaction, Sale};

use crate::context::RequestContext;
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{CustomerRepository, LedgerFilter, PaymentRepository, SaleRepository};

#[derive(Clone)]
pub struct AnalyticsService {
    engine: Arc<dyn InsightEngine>,
    customers: Arc<dyn CustomerRepository>,
    sales: Arc<dyn SaleRepository>,
    payments: Arc<dyn PaymentRepository>,
}

impl AnalyticsService {
    pub fn new(
        engine: Arc<dyn InsightEngine>,
        customers: Arc<dyn CustomerRepository>,
        sales: Arc<dyn SaleRepository>,
        payments: Arc<dyn PaymentRepository>,
    ) -> Self {
        Self {
            engine,
            customers,
            sales,
            payments,
        }
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Every recorded sale of the store is one basket.
    #[instrument(skip(self, ctx), fields(store_id = %ctx.store_id, engine = self.engine.name()))]
    pub async fn market_basket(
        &self,
        ctx: &RequestContext,
        params: MarketBasketParams,
    ) -> ServiceResult<MarketBasketReport> {
        let sales = self.sales.list(ctx.store_id, &LedgerFilter::default()).await?;
        let snapshot = BasketSnapshot {
            store_id: ctx.store_id,
            baskets: sales.iter().map(basket).collect(),
        };
        let report = self.engine.market_basket(snapshot, params).await?;
        info!(
            transactions = report.transactions_analyzed,
            rules = report.rules.len(),
            "market basket analysed"
        );
        Ok(report)
    }

    /// Risk for every customer currently carrying debt, riskiest first.
    #[instrument(skip(self, ctx), fields(store_id = %ctx.store_id, engine = self.engine.name()))]
    pub async fn debt_risk(&self, ctx: &RequestContext) -> ServiceResult<Vec<DebtRiskAssessment>> {
        let customers = self.customers.list(ctx.store_id).await?;
        let all = LedgerFilter::default();
        let sales = self.sales.list(ctx.store_id, &all).await?;
        let payments = self.payments.list(ctx.store_id, &all).await?;

        let now = Utc::now();
        let mut sales_by: HashMap<CustomerId, Vec<Sale>> = HashMap::new();
        for sale in sales {
            if let Some(id) = sale.customer_id {
                sales_by.entry(id).or_default().push(sale);
            }
        }
        let mut payments_by: HashMap<CustomerId, Vec<CashTransaction>> = HashMap::new();
        for payment in payments {
            if let Some(id) = payment.customer_id {
                payments_by.entry(id).or_default().push(payment);
            }
        }

        let profiles: Vec<DebtProfile> = customers
            .iter()
            .map(|c| {
                let s = sales_by.get(&c.id).map(Vec::as_slice).unwrap_or_default();
                let p = payments_by.get(&c.id).map(Vec::as_slice).unwrap_or_default();
                profile(c, s, p, now)
            })
            .filter(|p| p.current_debt > 0)
            .collect();

        let assessments = self.engine.debt_risk(ctx.store_id, profiles).await?;
        info!(assessed = assessments.len(), "debt risk assessed");
        Ok(assessments)
    }

    /// Risk for one customer, regardless of whether they currently owe.
    #[instrument(skip(self, ctx), fields(store_id = %ctx.store_id, engine = self.engine.name()))]
    pub async fn debt_risk_for(
        &self,
        ctx: &RequestContext,
        customer_id: CustomerId,
    ) -> ServiceResult<DebtRiskAssessment> {
        let customer = self
            .customers
            .get(ctx.store_id, customer_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("customer {customer_id}")))?;
        let filter = LedgerFilter::for_customer(customer_id);
        let sales = self.sales.list(ctx.store_id, &filter).await?;
        let payments = self.payments.list(ctx.store_id, &filter).await?;

        let profiles = vec![profile(&customer, &sales, &payments, Utc::now())];
        self.engine
            .debt_risk(ctx.store_id, profiles)
            .await?
            .into_iter()
            .find(|a| a.customer_id == customer_id)
            .ok_or_else(|| {
                ServiceError::Upstream(format!(
                    "{} engine returned no assessment for customer {customer_id}",
                    self.engine.name()
                ))
            })
    }
}

fn basket(sale: &Sale) -> Vec<ProductRef> {
    sale.lines
        .iter()
        .map(|line| ProductRef {
            product_id: line.product_id,
            name: line.name.clone(),
        })
        .collect()
}

fn profile(customer: &Customer, sales: &[Sale], payments: &[CashTransaction], now: DateTime<Utc>) -> DebtProfile {
    let summary = summarize(customer, sales, payments, false);
    let last_payment = payments
        .iter()
        .filter(|p| p.is_debt_payment() && p.customer_id == Some(customer.id))
        .map(|p| p.created_at)
        .max();
    DebtProfile {
        customer_id: customer.id,
        name: customer.name.clone(),
        current_debt: summary.current_debt,
        credit_limit: customer.credit_limit,
        total_sales: summary.total_sales,
        total_payments: summary.total_payments,
        days_since_last_payment: last_payment.map(|at| (now - at).num_days()),
    }
}
