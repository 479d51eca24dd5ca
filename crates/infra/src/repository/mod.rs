//! Storage traits and the two backends behind them.
//!
//! Every store-scoped method takes the `StoreId` explicitly; a record that
//! exists in another store is indistinguishable from one that does not exist.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use tillpoint_auth::User;
use tillpoint_catalog::{Category, Product};
use tillpoint_core::{
    CategoryId, CustomerId, OrderId, ProductId, SaleId, ShiftId, StoreId, TransactionId, UserId,
};
use tillpoint_customers::Customer;
use tillpoint_sales::{Cart, CashTransaction, OnlineOrder, OrderStatus, Sale};
use tillpoint_shifts::{Shift, ShiftSummary};
use tillpoint_stores::Store;

use crate::error::RepoResult;

pub mod memory;
pub mod postgres;
mod scoped;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive match on name or SKU.
    pub q: Option<String>,
    pub category_id: Option<CategoryId>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        self.q.as_deref().is_none_or(|q| product.matches_query(q))
            && self.category_id.is_none_or(|c| product.category_id == Some(c))
    }
}

/// Sale/transaction filter. Time bounds are half-open: `since <= t < until`.
#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    pub customer_id: Option<CustomerId>,
    pub user_id: Option<UserId>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl LedgerFilter {
    pub fn for_customer(customer_id: CustomerId) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, customer_id: Option<CustomerId>, user_id: UserId, at: DateTime<Utc>) -> bool {
        self.customer_id.is_none_or(|c| customer_id == Some(c))
            && self.user_id.is_none_or(|u| user_id == u)
            && self.since.is_none_or(|s| at >= s)
            && self.until.is_none_or(|u| at < u)
    }
}

#[async_trait]
pub trait StoreRepository: Send + Sync {
    async fn insert(&self, store: &Store) -> RepoResult<()>;
    async fn get(&self, id: StoreId) -> RepoResult<Option<Store>>;
    async fn list(&self) -> RepoResult<Vec<Store>>;
    async fn update(&self, store: &Store) -> RepoResult<()>;
    async fn delete(&self, id: StoreId) -> RepoResult<bool>;
}

/// Users are global; store access is a property of the user.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn insert(&self, user: &User) -> RepoResult<()>;
    async fn get(&self, id: UserId) -> RepoResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    async fn list(&self) -> RepoResult<Vec<User>>;
    async fn update(&self, user: &User) -> RepoResult<()>;
    async fn count(&self) -> RepoResult<u64>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn insert(&self, category: &Category) -> RepoResult<()>;
    async fn get(&self, store_id: StoreId, id: CategoryId) -> RepoResult<Option<Category>>;
    async fn list(&self, store_id: StoreId) -> RepoResult<Vec<Category>>;
    async fn update(&self, category: &Category) -> RepoResult<()>;
    async fn delete(&self, store_id: StoreId, id: CategoryId) -> RepoResult<bool>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Fails with `Conflict` when the SKU is taken in the store.
    async fn insert(&self, product: &Product) -> RepoResult<()>;
    async fn get(&self, store_id: StoreId, id: ProductId) -> RepoResult<Option<Product>>;
    async fn list(&self, store_id: StoreId, filter: &ProductFilter) -> RepoResult<Vec<Product>>;
    async fn update(&self, product: &Product) -> RepoResult<()>;
    async fn delete(&self, store_id: StoreId, id: ProductId) -> RepoResult<bool>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn insert(&self, customer: &Customer) -> RepoResult<()>;
    async fn get(&self, store_id: StoreId, id: CustomerId) -> RepoResult<Option<Customer>>;
    async fn list(&self, store_id: StoreId) -> RepoResult<Vec<Customer>>;
    async fn update(&self, customer: &Customer) -> RepoResult<()>;
    async fn delete(&self, store_id: StoreId, id: CustomerId) -> RepoResult<bool>;
}

#[async_trait]
pub trait SaleRepository: Send + Sync {
    /// Decrement stock for every line and insert the sale, atomically.
    ///
    /// An oversell or an inactive/missing product aborts the whole sale.
    async fn record(&self, sale: &Sale) -> RepoResult<()>;
    async fn get(&self, store_id: StoreId, id: SaleId) -> RepoResult<Option<Sale>>;
    /// Oldest first.
    async fn list(&self, store_id: StoreId, filter: &LedgerFilter) -> RepoResult<Vec<Sale>>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn insert(&self, transaction: &CashTransaction) -> RepoResult<()>;
    async fn get(&self, store_id: StoreId, id: TransactionId) -> RepoResult<Option<CashTransaction>>;
    /// Oldest first.
    async fn list(&self, store_id: StoreId, filter: &LedgerFilter) -> RepoResult<Vec<CashTransaction>>;
}

#[async_trait]
pub trait ShiftRepository: Send + Sync {
    /// Fails with `Conflict` if the operator already has an open shift in the store.
    async fn open(&self, shift: &Shift) -> RepoResult<()>;
    async fn get(&self, store_id: StoreId, id: ShiftId) -> RepoResult<Option<Shift>>;
    async fn current(&self, store_id: StoreId, user_id: UserId) -> RepoResult<Option<Shift>>;
    /// Most recent first.
    async fn list(&self, store_id: StoreId) -> RepoResult<Vec<Shift>>;

    /// Reconcile and close in one step; concurrent closes of the same shift
    /// serialize and only the first succeeds.
    async fn close(
        &self,
        store_id: StoreId,
        id: ShiftId,
        ending_cash: i64,
        now: DateTime<Utc>,
    ) -> RepoResult<(Shift, ShiftSummary)>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn get(&self, store_id: StoreId, customer_id: CustomerId) -> RepoResult<Option<Cart>>;
    async fn save(&self, cart: &Cart) -> RepoResult<()>;
    async fn delete(&self, store_id: StoreId, customer_id: CustomerId) -> RepoResult<bool>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert the order and clear the customer's cart, atomically.
    async fn checkout(&self, order: &OnlineOrder) -> RepoResult<()>;
    async fn get(&self, store_id: StoreId, id: OrderId) -> RepoResult<Option<OnlineOrder>>;
    /// Most recent first.
    async fn list(&self, store_id: StoreId) -> RepoResult<Vec<OnlineOrder>>;

    /// Move an order along its lifecycle; reaching `fulfilled` takes stock.
    async fn update_status(
        &self,
        store_id: StoreId,
        id: OrderId,
        next: OrderStatus,
        now: DateTime<Utc>,
    ) -> RepoResult<OnlineOrder>;
}

/// All repositories, sharing one backend.
#[derive(Clone)]
pub struct Repositories {
    pub stores: Arc<dyn StoreRepository>,
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub customers: Arc<dyn CustomerRepository>,
    pub sales: Arc<dyn SaleRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub shifts: Arc<dyn ShiftRepository>,
    pub carts: Arc<dyn CartRepository>,
    pub orders: Arc<dyn OrderRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self::from_backend(Arc::new(InMemoryStore::default()))
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self::from_backend(Arc::new(PgStore::new(pool)))
    }

    fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: StoreRepository
            + UserRepository
            + CategoryRepository
            + ProductRepository
            + CustomerRepository
            + SaleRepository
            + PaymentRepository
            + ShiftRepository
            + CartRepository
            + OrderRepository
            + 'static,
    {
        Self {
            stores: backend.clone(),
            users: backend.clone(),
            categories: backend.clone(),
            products: backend.clone(),
            customers: backend.clone(),
            sales: backend.clone(),
            payments: backend.clone(),
            shifts: backend.clone(),
            carts: backend.clone(),
            orders: backend,
        }
    }
}
