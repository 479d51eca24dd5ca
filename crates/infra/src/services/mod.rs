//! Domain services: store-scoped use cases over the repositories.
//!
//! Each service takes a [`RequestContext`](crate::context::RequestContext) on
//! every call; nothing here holds per-request state. Debt and shift
//! operations answer with [`Outcome`](tillpoint_core::Outcome), the rest with
//! [`ServiceResult`](crate::error::ServiceResult).

pub mod analytics;
pub mod auth;
pub mod bootstrap;
pub mod catalog;
pub mod customers;
pub mod debt;
pub mod sales;
pub mod shifts;
pub mod storefront;
pub mod stores;
pub mod users;

use std::sync::Arc;

use tillpoint_ai::InsightEngine;
use tillpoint_auth::JwtIssuer;

use crate::repository::Repositories;

pub use analytics::AnalyticsService;
pub use auth::{AuthService, LoginRequest, LoginResponse, PasswordChange};
pub use bootstrap::bootstrap_admin;
pub use catalog::CatalogService;
pub use customers::CustomerService;
pub use debt::DebtService;
pub use sales::SalesService;
pub use shifts::{ShiftClosure, ShiftService};
pub use storefront::{PutCartItem, StorefrontService};
pub use stores::StoreService;
pub use users::UserService;

/// Every service, wired to one set of repositories.
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub users: UserService,
    pub stores: StoreService,
    pub catalog: CatalogService,
    pub customers: CustomerService,
    pub sales: SalesService,
    pub debt: DebtService,
    pub shifts: ShiftService,
    pub storefront: StorefrontService,
    pub analytics: AnalyticsService,
}

impl Services {
    pub fn new(
        repos: &Repositories,
        engine: Arc<dyn InsightEngine>,
        issuer: Arc<dyn JwtIssuer>,
        password_cost: u32,
    ) -> Self {
        let r = repos.clone();
        Self {
            auth: AuthService::new(r.users.clone(), r.stores.clone(), issuer, password_cost),
            users: UserService::new(r.users.clone(), r.stores.clone(), password_cost),
            stores: StoreService::new(r.stores.clone(), r.users.clone()),
            catalog: CatalogService::new(r.categories.clone(), r.products.clone()),
            customers: CustomerService::new(r.customers.clone(), r.sales.clone(), r.payments.clone()),
            sales: SalesService::new(
                r.products.clone(),
                r.customers.clone(),
                r.sales.clone(),
                r.payments.clone(),
                r.shifts.clone(),
            ),
            debt: DebtService::new(r.customers.clone(), r.sales.clone(), r.payments.clone()),
            shifts: ShiftService::new(r.shifts.clone(), r.sales.clone(), r.payments.clone()),
            storefront: StorefrontService::new(
                r.customers.clone(),
                r.products.clone(),
                r.carts.clone(),
                r.orders.clone(),
            ),
            analytics: AnalyticsService::new(engine, r.customers, r.sales, r.payments),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;
    use tillpoint_ai::HeuristicEngine;
    use tillpoint_auth::{Hs256Jwt, Role};
    use tillpoint_catalog::NewProduct;
    use tillpoint_core::{ErrorKind, StoreId, UserId};
    use tillpoint_customers::{ContactInfo, NewCustomer};
    use tillpoint_sales::{
        NewCashTransaction, NewSale, NewSaleLine, PaymentMethod, TransactionCategory,
    };

    use crate::context::RequestContext;

    fn services() -> Services {
        let repos = Repositories::in_memory();
        Services::new(
            &repos,
            Arc::new(HeuristicEngine),
            Arc::new(Hs256Jwt::new(b"test-secret", Duration::hours(1))),
            4,
        )
    }

    #[tokio::test]
    async fn new_customer_has_zero_debt_and_empty_history() {
        let svc = services();
        let ctx = RequestContext::new(StoreId::new(), UserId::new(), Role::cashier());
        let customer = svc
            .customers
            .create(
                &ctx,
                NewCustomer {
                    name: "Sari".into(),
                    contact: ContactInfo::default(),
                    credit_limit: 50_000,
                },
            )
            .await
            .unwrap();

        let summary = svc.debt.customer_debt(&ctx, customer.id, true).await.into_result().unwrap();
        assert_eq!(summary.current_debt, 0);
        assert_eq!(summary.available_credit, 50_000);
        assert_eq!(summary.history, Some(vec![]));
    }

    #[tokio::test]
    async fn credit_sale_and_payment_flow_into_debt_and_debtors() {
        let svc = services();
        let ctx = RequestContext::new(StoreId::new(), UserId::new(), Role::cashier());
        let customer = svc
            .customers
            .create(
                &ctx,
                NewCustomer {
                    name: "Sari".into(),
                    contact: ContactInfo::default(),
                    credit_limit: 10_000,
                },
            )
            .await
            .unwrap();
        let product = svc
            .catalog
            .create_product(
                &ctx,
                NewProduct {
                    sku: "RICE-5".into(),
                    name: "Rice 5kg".into(),
                    category_id: None,
                    price: 15_000,
                    cost: 12_000,
                    stock: 4,
                    active: true,
                },
            )
            .await
            .unwrap();

        svc.sales
            .record_sale(
                &ctx,
                NewSale {
                    lines: vec![NewSaleLine {
                        product_id: product.id,
                        quantity: 1,
                        unit_price: None,
                    }],
                    payment_method: PaymentMethod::Credit,
                    amount_paid: Some(3_000),
                    customer_id: Some(customer.id),
                    note: None,
                },
            )
            .await
            .unwrap();
        svc.sales
            .record_payment(
                &ctx,
                NewCashTransaction {
                    amount: 2_000,
                    category: TransactionCategory::DebtPayment,
                    description: None,
                    customer_id: Some(customer.id),
                },
            )
            .await
            .unwrap();

        let summary = svc.debt.customer_debt(&ctx, customer.id, true).await.into_result().unwrap();
        assert_eq!(summary.total_sales, 12_000);
        assert_eq!(summary.total_payments, 2_000);
        assert_eq!(summary.current_debt, 10_000);
        assert!(!summary.over_limit);
        let history = summary.history.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].running_balance, 10_000);

        let again = svc.debt.customer_debt(&ctx, customer.id, true).await.into_result().unwrap();
        assert_eq!(again.current_debt, 10_000);

        let debtors = svc.debt.debtors(&ctx).await.into_result().unwrap();
        assert_eq!(debtors.len(), 1);
        assert_eq!(debtors[0].customer_id, customer.id);

        let risk = svc.analytics.debt_risk(&ctx).await.unwrap();
        assert_eq!(risk.len(), 1);

        let stock = svc.catalog.get_product(&ctx, product.id).await.unwrap().stock;
        assert_eq!(stock, 3);
    }

    #[tokio::test]
    async fn debt_of_another_stores_customer_is_not_found() {
        let svc = services();
        let ctx = RequestContext::new(StoreId::new(), UserId::new(), Role::cashier());
        let customer = svc
            .customers
            .create(
                &ctx,
                NewCustomer {
                    name: "Sari".into(),
                    contact: ContactInfo::default(),
                    credit_limit: 0,
                },
            )
            .await
            .unwrap();
        let other = RequestContext::new(StoreId::new(), ctx.user_id, Role::cashier());
        let outcome = svc.debt.customer_debt(&other, customer.id, false).await;
        assert!(!outcome.success);
        assert_eq!(outcome.error.unwrap().kind, ErrorKind::NotFound);
    }
}
