use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use tillpoint_core::{CustomerId, DomainError};
use tillpoint_customers::{Customer, CustomerPatch, NewCustomer};

use crate::context::RequestContext;
use crate::error::ServiceResult;
use crate::repository::{CustomerRepository, LedgerFilter, PaymentRepository, SaleRepository};

#[derive(Clone)]
pub struct CustomerService {
    customers: Arc<dyn CustomerRepository>,
    sales: Arc<dyn SaleRepository>,
    payments: Arc<dyn PaymentRepository>,
}

impl CustomerService {
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

    pub async fn create(&self, ctx: &RequestContext, input: NewCustomer) -> ServiceResult<Customer> {
        let customer = input.into_customer(ctx.store_id, Utc::now())?;
        self.customers.insert(&customer).await?;
        info!(store_id = %ctx.store_id, customer_id = %customer.id, "customer created");
        Ok(customer)
    }

    pub async fn list(&self, ctx: &RequestContext) -> ServiceResult<Vec<Customer>> {
        Ok(self.customers.list(ctx.store_id).await?)
    }

    pub async fn get(&self, ctx: &RequestContext, id: CustomerId) -> ServiceResult<Customer> {
        self.customers
            .get(ctx.store_id, id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("customer {id}")).into())
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: CustomerId,
        patch: CustomerPatch,
    ) -> ServiceResult<Customer> {
        let mut customer = self.get(ctx, id).await?;
        customer.apply_patch(patch, Utc::now())?;
        self.customers.update(&customer).await?;
        info!(store_id = %ctx.store_id, customer_id = %id, "customer updated");
        Ok(customer)
    }

    /// Customers with sales or payments on record are kept for the ledger.
    #[instrument(skip(self, ctx), fields(store_id = %ctx.store_id, customer_id = %id))]
    pub async fn delete(&self, ctx: &RequestContext, id: CustomerId) -> ServiceResult<()> {
        self.get(ctx, id).await?;
        let filter = LedgerFilter::for_customer(id);
        let has_sales = !self.sales.list(ctx.store_id, &filter).await?.is_empty();
        let has_payments = !self.payments.list(ctx.store_id, &filter).await?.is_empty();
        if has_sales || has_payments {
            return Err(DomainError::conflict(format!(
                "customer {id} has transaction history and cannot be deleted"
            ))
            .into());
        }
        self.customers.delete(ctx.store_id, id).await?;
        info!("customer deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tillpoint_auth::Role;
    use tillpoint_core::{ErrorKind, StoreId, UserId};
    use tillpoint_customers::ContactInfo;
    use tillpoint_sales::{NewCashTransaction, TransactionCategory};

    use crate::repository::Repositories;

    fn new_customer() -> NewCustomer {
        NewCustomer {
            name: "Sari".into(),
            contact: ContactInfo::default(),
            credit_limit: 20_000,
        }
    }

    #[tokio::test]
    async fn customer_with_history_is_kept() {
        let repos = Repositories::in_memory();
        let svc = CustomerService::new(repos.customers.clone(), repos.sales.clone(), repos.payments.clone());
        let ctx = RequestContext::new(StoreId::new(), UserId::new(), Role::manager());
        let customer = svc.create(&ctx, new_customer()).await.unwrap();

        let payment = NewCashTransaction {
            amount: 1_000,
            category: TransactionCategory::DebtPayment,
            description: None,
            customer_id: Some(customer.id),
        }
        .into_transaction(ctx.store_id, ctx.user_id, Utc::now())
        .unwrap();
        repos.payments.insert(&payment).await.unwrap();

        let err = svc.delete(&ctx, customer.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn customer_without_history_is_deleted() {
        let repos = Repositories::in_memory();
        let svc = CustomerService::new(repos.customers.clone(), repos.sales.clone(), repos.payments.clone());
        let ctx = RequestContext::new(StoreId::new(), UserId::new(), Role::manager());
        let customer = svc.create(&ctx, new_customer()).await.unwrap();

        svc.delete(&ctx, customer.id).await.unwrap();
        let err = svc.get(&ctx, customer.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn negative_credit_limit_is_rejected_on_update() {
        let repos = Repositories::in_memory();
        let svc = CustomerService::new(repos.customers.clone(), repos.sales.clone(), repos.payments.clone());
        let ctx = RequestContext::new(StoreId::new(), UserId::new(), Role::manager());
        let customer = svc.create(&ctx, new_customer()).await.unwrap();

        let patch = CustomerPatch {
            credit_limit: Some(-1),
            ..CustomerPatch::default()
        };
        let err = svc.update(&ctx, customer.id, patch).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
