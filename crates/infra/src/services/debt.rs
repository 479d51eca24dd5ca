//! Customer debt queries. Read-only.

use std::sync::Arc;

use tracing::{debug, instrument};

use tillpoint_core::{CustomerId, DomainError, Outcome};
use tillpoint_receivables::{debtors, summarize, DebtSummary, Debtor};

use crate::context::RequestContext;
use crate::error::ServiceResult;
use crate::repository::{CustomerRepository, LedgerFilter, PaymentRepository, SaleRepository};

#[derive(Clone)]
pub struct DebtService {
    customers: Arc<dyn CustomerRepository>,
    sales: Arc<dyn SaleRepository>,
    payments: Arc<dyn PaymentRepository>,
}

impl DebtService {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        sales: Arc<dyn SaleRepository>,
        payments: Arc<dyn PaymentRepository>,
    ) -> Self {
        Self {
            customers,
            sales,
            payments,
        }
    }

    /// Debt position of one customer of the active store. A customer of
    /// another store is reported as not found.
    #[instrument(skip(self, ctx), fields(store_id = %ctx.store_id))]
    pub async fn customer_debt(
        &self,
        ctx: &RequestContext,
        customer_id: CustomerId,
        include_history: bool,
    ) -> Outcome<DebtSummary> {
        self.customer_debt_inner(ctx, customer_id, include_history)
            .await
            .into()
    }

    pub(crate) async fn customer_debt_inner(
        &self,
        ctx: &RequestContext,
        customer_id: CustomerId,
        include_history: bool,
    ) -> ServiceResult<DebtSummary> {
        let customer = self
            .customers
            .get(ctx.store_id, customer_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("customer {customer_id}")))?;
        let filter = LedgerFilter::for_customer(customer_id);
        let sales = self.sales.list(ctx.store_id, &filter).await?;
        let payments = self.payments.list(ctx.store_id, &filter).await?;
        let summary = summarize(&customer, &sales, &payments, include_history);
        debug!(current_debt = summary.current_debt, "debt computed");
        Ok(summary)
    }

    #[instrument(skip(self, ctx), fields(store_id = %ctx.store_id))]
    pub async fn debtors(&self, ctx: &RequestContext) -> Outcome<Vec<Debtor>> {
        self.debtors_inner(ctx).await.into()
    }

    async fn debtors_inner(&self, ctx: &RequestContext) -> ServiceResult<Vec<Debtor>> {
        let customers = self.customers.list(ctx.store_id).await?;
        let all = LedgerFilter::default();
        let sales = self.sales.list(ctx.store_id, &all).await?;
        let payments = self.payments.list(ctx.store_id, &all).await?;
        Ok(debtors(&customers, &sales, &payments))
    }
}
