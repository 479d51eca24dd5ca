//! Point-of-sale checkout and cash transactions.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use tillpoint_core::{CustomerId, DomainError, SaleId, TransactionId};
use tillpoint_customers::Customer;
use tillpoint_receivables::summarize;
use tillpoint_sales::{CashTransaction, NewCashTransaction, NewSale, Sale, SaleLine};

use crate::context::RequestContext;
use crate::error::ServiceResult;
use crate::repository::{
    CustomerRepository, LedgerFilter, PaymentRepository, ProductRepository, SaleRepository,
    ShiftRepository,
};

#[derive(Clone)]
pub struct SalesService {
    products: Arc<dyn ProductRepository>,
    customers: Arc<dyn CustomerRepository>,
    sales: Arc<dyn SaleRepository>,
    payments: Arc<dyn PaymentRepository>,
    shifts: Arc<dyn ShiftRepository>,
}

impl SalesService {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        customers: Arc<dyn CustomerRepository>,
        sales: Arc<dyn SaleRepository>,
        payments: Arc<dyn PaymentRepository>,
        shifts: Arc<dyn ShiftRepository>,
    ) -> Self {
        Self {
            products,
            customers,
            sales,
            payments,
            shifts,
        }
    }

    async fn customer(&self, ctx: &RequestContext, id: CustomerId) -> ServiceResult<Customer> {
        self.customers
            .get(ctx.store_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("customer {id}")).into())
    }

    /// Price the lines from the catalog, attach the operator's open shift (if
    /// any) and record the sale. Stock is decremented in the same write.
    #[instrument(
        skip(self, ctx, input),
        fields(store_id = %ctx.store_id, cashier_id = %ctx.user_id, method = input.payment_method.as_str())
    )]
    pub async fn record_sale(&self, ctx: &RequestContext, input: NewSale) -> ServiceResult<Sale> {
        input.validate()?;
        let customer = match input.customer_id {
            Some(id) => Some(self.customer(ctx, id).await?),
            None => None,
        };

        let mut lines = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let product = self
                .products
                .get(ctx.store_id, line.product_id)
                .await?
                .ok_or_else(|| DomainError::not_found(format!("product {}", line.product_id)))?;
            lines.push(SaleLine::priced(&product, line.quantity, line.unit_price)?);
        }

        let shift_id = self
            .shifts
            .current(ctx.store_id, ctx.user_id)
            .await?
            .map(|s| s.id);
        let sale = input.into_sale(lines, ctx.store_id, ctx.user_id, shift_id, Utc::now())?;

        if let Some(customer) = &customer {
            if sale.debt_amount() > 0 {
                self.warn_if_over_limit(ctx, customer, &sale).await?;
            }
        }

        self.sales.record(&sale).await?;
        info!(sale_id = %sale.id, total = sale.total, "sale recorded");
        Ok(sale)
    }

    /// Credit beyond the limit is allowed but logged.
    async fn warn_if_over_limit(&self, ctx: &RequestContext, customer: &Customer, sale: &Sale) -> ServiceResult<()> {
        let filter = LedgerFilter::for_customer(customer.id);
        let sales = self.sales.list(ctx.store_id, &filter).await?;
        let payments = self.payments.list(ctx.store_id, &filter).await?;
        let position = summarize(customer, &sales, &payments, false);
        let projected = position.current_debt.saturating_add(sale.debt_amount());
        if projected > customer.credit_limit {
            warn!(
                customer_id = %customer.id,
                projected_debt = projected,
                credit_limit = customer.credit_limit,
                "credit sale exceeds the customer's credit limit"
            );
        }
        Ok(())
    }

    pub async fn get_sale(&self, ctx: &RequestContext, id: SaleId) -> ServiceResult<Sale> {
        self.sales
            .get(ctx.store_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("sale {id}")).into())
    }

    pub async fn list_sales(&self, ctx: &RequestContext, filter: &LedgerFilter) -> ServiceResult<Vec<Sale>> {
        Ok(self.sales.list(ctx.store_id, filter).await?)
    }

    #[instrument(
        skip(self, ctx, input),
        fields(store_id = %ctx.store_id, category = input.category.as_str(), amount = input.amount)
    )]
    pub async fn record_payment(
        &self,
        ctx: &RequestContext,
        input: NewCashTransaction,
    ) -> ServiceResult<CashTransaction> {
        input.validate()?;
        if let Some(customer_id) = input.customer_id {
            self.customer(ctx, customer_id).await?;
        }
        let transaction = input.into_transaction(ctx.store_id, ctx.user_id, Utc::now())?;
        self.payments.insert(&transaction).await?;
        info!(transaction_id = %transaction.id, "cash transaction recorded");
        Ok(transaction)
    }

    pub async fn get_payment(&self, ctx: &RequestContext, id: TransactionId) -> ServiceResult<CashTransaction> {
        self.payments
            .get(ctx.store_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("transaction {id}")).into())
    }

    pub async fn list_payments(
        &self,
        ctx: &RequestContext,
        filter: &LedgerFilter,
    ) -> ServiceResult<Vec<CashTransaction>> {
        Ok(self.payments.list(ctx.store_id, filter).await?)
    }
}
