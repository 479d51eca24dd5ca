//! In-memory backend for development and tests.
//!
//! Multi-table operations take their write locks in a fixed order:
//! `products → sales`, `products → orders`, `carts → orders`,
//! `shifts → sales → payments`.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use tillpoint_auth::User;
use tillpoint_catalog::{Category, Product};
use tillpoint_core::{
    CategoryId, CustomerId, DomainError, OrderId, ProductId, SaleId, ShiftId, StoreId,
    TransactionId, UserId,
};
use tillpoint_customers::Customer;
use tillpoint_sales::{Cart, CartItem, CashTransaction, OnlineOrder, OrderStatus, Sale};
use tillpoint_shifts::{summarize_shift, Shift, ShiftSummary, ShiftTotals};
use tillpoint_stores::Store;

use super::scoped::{poisoned, Rows, ScopedTable};
use super::{
    CartRepository, CategoryRepository, CustomerRepository, LedgerFilter, OrderRepository,
    PaymentRepository, ProductFilter, ProductRepository, SaleRepository, ShiftRepository,
    StoreRepository, UserRepository,
};
use crate::error::{RepoError, RepoResult};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    stores: RwLock<HashMap<StoreId, Store>>,
    users: RwLock<HashMap<UserId, User>>,
    categories: ScopedTable<CategoryId, Category>,
    products: ScopedTable<ProductId, Product>,
    customers: ScopedTable<CustomerId, Customer>,
    sales: ScopedTable<SaleId, Sale>,
    payments: ScopedTable<TransactionId, CashTransaction>,
    shifts: ScopedTable<ShiftId, Shift>,
    carts: ScopedTable<CustomerId, Cart>,
    orders: ScopedTable<OrderId, OnlineOrder>,
}

/// Apply stock decrements to a staged copy; nothing is written on error.
fn take_stock_for(
    products: &Rows<ProductId, Product>,
    store_id: StoreId,
    wanted: impl IntoIterator<Item = (ProductId, i64)>,
    now: DateTime<Utc>,
) -> RepoResult<Vec<Product>> {
    let mut staged: Vec<Product> = Vec::new();
    for (product_id, quantity) in wanted {
        let mut product = match staged.iter().position(|p| p.id == product_id) {
            Some(i) => staged.swap_remove(i),
            None => products
                .get(&(store_id, product_id))
                .cloned()
                .ok_or_else(|| DomainError::not_found(format!("product {product_id}")))?,
        };
        product.take_stock(quantity, now)?;
        staged.push(product);
    }
    Ok(staged)
}

fn by_name<T>(mut rows: Vec<T>, name: impl Fn(&T) -> String) -> Vec<T> {
    rows.sort_by_key(|r| name(r).to_lowercase());
    rows
}

#[async_trait]
impl StoreRepository for InMemoryStore {
    async fn insert(&self, store: &Store) -> RepoResult<()> {
        let mut stores = self.stores.write().map_err(|_| poisoned())?;
        if stores.contains_key(&store.id) {
            return Err(RepoError::Conflict(format!("store {} already exists", store.id)));
        }
        stores.insert(store.id, store.clone());
        Ok(())
    }

    async fn get(&self, id: StoreId) -> RepoResult<Option<Store>> {
        Ok(self.stores.read().map_err(|_| poisoned())?.get(&id).cloned())
    }

    async fn list(&self) -> RepoResult<Vec<Store>> {
        let stores = self.stores.read().map_err(|_| poisoned())?;
        Ok(by_name(stores.values().cloned().collect(), |s| s.name.clone()))
    }

    async fn update(&self, store: &Store) -> RepoResult<()> {
        let mut stores = self.stores.write().map_err(|_| poisoned())?;
        match stores.get_mut(&store.id) {
            Some(slot) => {
                *slot = store.clone();
                Ok(())
            }
            None => Err(DomainError::not_found(format!("store {}", store.id)).into()),
        }
    }

    async fn delete(&self, id: StoreId) -> RepoResult<bool> {
        let removed = self.stores.write().map_err(|_| poisoned())?.remove(&id).is_some();
        if removed {
            self.orders.write()?.retain(|(s, _), _| *s != id);
            self.carts.write()?.retain(|(s, _), _| *s != id);
            self.payments.write()?.retain(|(s, _), _| *s != id);
            self.sales.write()?.retain(|(s, _), _| *s != id);
            self.shifts.write()?.retain(|(s, _), _| *s != id);
            self.customers.write()?.retain(|(s, _), _| *s != id);
            self.products.write()?.retain(|(s, _), _| *s != id);
            self.categories.write()?.retain(|(s, _), _| *s != id);
            debug!(store_id = %id, "purged store data");
        }
        Ok(removed)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert(&self, user: &User) -> RepoResult<()> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        if users.values().any(|u| u.email == user.email) {
            return Err(RepoError::Conflict(format!("email {} is already registered", user.email)));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get(&self, id: UserId) -> RepoResult<Option<User>> {
        Ok(self.users.read().map_err(|_| poisoned())?.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> RepoResult<Vec<User>> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(by_name(users.values().cloned().collect(), |u| u.email.clone()))
    }

    async fn update(&self, user: &User) -> RepoResult<()> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        if users.values().any(|u| u.id != user.id && u.email == user.email) {
            return Err(RepoError::Conflict(format!("email {} is already registered", user.email)));
        }
        match users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(())
            }
            None => Err(DomainError::not_found(format!("user {}", user.id)).into()),
        }
    }

    async fn count(&self) -> RepoResult<u64> {
        Ok(self.users.read().map_err(|_| poisoned())?.len() as u64)
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn insert(&self, category: &Category) -> RepoResult<()> {
        self.categories.upsert(category.store_id, category.id, category.clone())
    }

    async fn get(&self, store_id: StoreId, id: CategoryId) -> RepoResult<Option<Category>> {
        self.categories.get(store_id, id)
    }

    async fn list(&self, store_id: StoreId) -> RepoResult<Vec<Category>> {
        let rows = self.categories.list_where(store_id, |_| true)?;
        Ok(by_name(rows, |c| c.name.clone()))
    }

    async fn update(&self, category: &Category) -> RepoResult<()> {
        self.categories.replace(
            category.store_id,
            category.id,
            category.clone(),
            &format!("category {}", category.id),
        )
    }

    async fn delete(&self, store_id: StoreId, id: CategoryId) -> RepoResult<bool> {
        self.categories.remove(store_id, id)
    }
}

fn ensure_unique_sku(rows: &Rows<ProductId, Product>, product: &Product) -> RepoResult<()> {
    let taken = rows.values().any(|p| {
        p.store_id == product.store_id && p.id != product.id && p.sku.eq_ignore_ascii_case(&product.sku)
    });
    if taken {
        return Err(RepoError::Conflict(format!("sku {} already exists", product.sku)));
    }
    Ok(())
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn insert(&self, product: &Product) -> RepoResult<()> {
        let mut rows = self.products.write()?;
        ensure_unique_sku(&rows, product)?;
        rows.insert((product.store_id, product.id), product.clone());
        Ok(())
    }

    async fn get(&self, store_id: StoreId, id: ProductId) -> RepoResult<Option<Product>> {
        self.products.get(store_id, id)
    }

    async fn list(&self, store_id: StoreId, filter: &ProductFilter) -> RepoResult<Vec<Product>> {
        let rows = self.products.list_where(store_id, |p| filter.matches(p))?;
        Ok(by_name(rows, |p| p.name.clone()))
    }

    async fn update(&self, product: &Product) -> RepoResult<()> {
        let mut rows = self.products.write()?;
        ensure_unique_sku(&rows, product)?;
        match rows.get_mut(&(product.store_id, product.id)) {
            Some(slot) => {
                *slot = product.clone();
                Ok(())
            }
            None => Err(DomainError::not_found(format!("product {}", product.id)).into()),
        }
    }

    async fn delete(&self, store_id: StoreId, id: ProductId) -> RepoResult<bool> {
        self.products.remove(store_id, id)
    }
}

#[async_trait]
impl CustomerRepository for InMemoryStore {
    async fn insert(&self, customer: &Customer) -> RepoResult<()> {
        self.customers.upsert(customer.store_id, customer.id, customer.clone())
    }

    async fn get(&self, store_id: StoreId, id: CustomerId) -> RepoResult<Option<Customer>> {
        self.customers.get(store_id, id)
    }

    async fn list(&self, store_id: StoreId) -> RepoResult<Vec<Customer>> {
        let rows = self.customers.list_where(store_id, |_| true)?;
        Ok(by_name(rows, |c| c.name.clone()))
    }

    async fn update(&self, customer: &Customer) -> RepoResult<()> {
        self.customers.replace(
            customer.store_id,
            customer.id,
            customer.clone(),
            &format!("customer {}", customer.id),
        )
    }

    async fn delete(&self, store_id: StoreId, id: CustomerId) -> RepoResult<bool> {
        self.customers.remove(store_id, id)
    }
}

#[async_trait]
impl SaleRepository for InMemoryStore {
    async fn record(&self, sale: &Sale) -> RepoResult<()> {
        let mut products = self.products.write()?;
        let staged = take_stock_for(
            &products,
            sale.store_id,
            sale.lines.iter().map(|l| (l.product_id, l.quantity)),
            sale.created_at,
        )?;
        let mut sales = self.sales.write()?;
        for product in staged {
            products.insert((product.store_id, product.id), product);
        }
        sales.insert((sale.store_id, sale.id), sale.clone());
        Ok(())
    }

    async fn get(&self, store_id: StoreId, id: SaleId) -> RepoResult<Option<Sale>> {
        self.sales.get(store_id, id)
    }

    async fn list(&self, store_id: StoreId, filter: &LedgerFilter) -> RepoResult<Vec<Sale>> {
        let mut rows = self
            .sales
            .list_where(store_id, |s| filter.matches(s.customer_id, s.cashier_id, s.created_at))?;
        rows.sort_by_key(|s| (s.created_at, s.id));
        Ok(rows)
    }
}

#[async_trait]
impl PaymentRepository for InMemoryStore {
    async fn insert(&self, transaction: &CashTransaction) -> RepoResult<()> {
        self.payments.upsert(transaction.store_id, transaction.id, transaction.clone())
    }

    async fn get(&self, store_id: StoreId, id: TransactionId) -> RepoResult<Option<CashTransaction>> {
        self.payments.get(store_id, id)
    }

    async fn list(&self, store_id: StoreId, filter: &LedgerFilter) -> RepoResult<Vec<CashTransaction>> {
        let mut rows = self
            .payments
            .list_where(store_id, |t| filter.matches(t.customer_id, t.user_id, t.created_at))?;
        rows.sort_by_key(|t| (t.created_at, t.id));
        Ok(rows)
    }
}

#[async_trait]
impl ShiftRepository for InMemoryStore {
    async fn open(&self, shift: &Shift) -> RepoResult<()> {
        let mut shifts = self.shifts.write()?;
        let already_open = shifts
            .values()
            .any(|s| s.store_id == shift.store_id && s.user_id == shift.user_id && s.is_open());
        if already_open {
            return Err(RepoError::Conflict(format!(
                "user {} already has an open shift in this store",
                shift.user_id
            )));
        }
        shifts.insert((shift.store_id, shift.id), shift.clone());
        Ok(())
    }

    async fn get(&self, store_id: StoreId, id: ShiftId) -> RepoResult<Option<Shift>> {
        self.shifts.get(store_id, id)
    }

    async fn current(&self, store_id: StoreId, user_id: UserId) -> RepoResult<Option<Shift>> {
        let open = self
            .shifts
            .list_where(store_id, |s| s.user_id == user_id && s.is_open())?;
        Ok(open.into_iter().next())
    }

    async fn list(&self, store_id: StoreId) -> RepoResult<Vec<Shift>> {
        let mut rows = self.shifts.list_where(store_id, |_| true)?;
        rows.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn close(
        &self,
        store_id: StoreId,
        id: ShiftId,
        ending_cash: i64,
        now: DateTime<Utc>,
    ) -> RepoResult<(Shift, ShiftSummary)> {
        // Held until the closing figures are written.
        let mut shifts = self.shifts.write()?;
        let shift = shifts
            .get_mut(&(store_id, id))
            .ok_or_else(|| DomainError::not_found(format!("shift {id}")))?;

        let operator = shift.user_id;
        let sales = self.sales.list_where(store_id, |s| s.cashier_id == operator)?;
        let refunds = self.payments.list_where(store_id, |t| t.user_id == operator)?;

        let totals = ShiftTotals::tally(shift, &sales, &refunds, now);
        shift.close(ending_cash, totals, now)?;
        let summary = summarize_shift(shift, &sales, &refunds, now);
        Ok((shift.clone(), summary))
    }
}

#[async_trait]
impl CartRepository for InMemoryStore {
    async fn get(&self, store_id: StoreId, customer_id: CustomerId) -> RepoResult<Option<Cart>> {
        self.carts.get(store_id, customer_id)
    }

    async fn save(&self, cart: &Cart) -> RepoResult<()> {
        self.carts.upsert(cart.store_id, cart.customer_id, cart.clone())
    }

    async fn delete(&self, store_id: StoreId, customer_id: CustomerId) -> RepoResult<bool> {
        self.carts.remove(store_id, customer_id)
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn checkout(&self, order: &OnlineOrder) -> RepoResult<()> {
        let mut carts = self.carts.write()?;
        let mut orders = self.orders.write()?;
        orders.insert((order.store_id, order.id), order.clone());
        carts.remove(&(order.store_id, order.customer_id));
        Ok(())
    }

    async fn get(&self, store_id: StoreId, id: OrderId) -> RepoResult<Option<OnlineOrder>> {
        self.orders.get(store_id, id)
    }

    async fn list(&self, store_id: StoreId) -> RepoResult<Vec<OnlineOrder>> {
        let mut rows = self.orders.list_where(store_id, |_| true)?;
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn update_status(
        &self,
        store_id: StoreId,
        id: OrderId,
        next: OrderStatus,
        now: DateTime<Utc>,
    ) -> RepoResult<OnlineOrder> {
        let mut products = self.products.write()?;
        let mut orders = self.orders.write()?;
        let slot = orders
            .get_mut(&(store_id, id))
            .ok_or_else(|| DomainError::not_found(format!("order {id}")))?;

        let mut updated = slot.clone();
        updated.transition_to(next, now)?;
        if next == OrderStatus::Fulfilled {
            let staged = take_stock_for(
                &products,
                store_id,
                updated.items.iter().map(|i: &CartItem| (i.product_id, i.quantity)),
                now,
            )?;
            for product in staged {
                products.insert((product.store_id, product.id), product);
            }
        }
        *slot = updated.clone();
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tillpoint_catalog::NewProduct;
    use tillpoint_sales::{NewSale, NewSaleLine, PaymentMethod, SaleLine};

    use crate::repository::Repositories;

    fn product(store_id: StoreId, sku: &str, stock: i64) -> Product {
        NewProduct {
            sku: sku.into(),
            name: format!("Item {sku}"),
            category_id: None,
            price: 1_000,
            cost: 500,
            stock,
            active: true,
        }
        .into_product(store_id, Utc::now())
        .unwrap()
    }

    fn cash_sale(store_id: StoreId, product: &Product, quantity: i64) -> Sale {
        let line = SaleLine::priced(product, quantity, None).unwrap();
        NewSale {
            lines: vec![NewSaleLine {
                product_id: product.id,
                quantity,
                unit_price: None,
            }],
            payment_method: PaymentMethod::Cash,
            amount_paid: None,
            customer_id: None,
            note: None,
        }
        .into_sale(vec![line], store_id, UserId::new(), None, Utc::now())
        .unwrap()
    }

    #[tokio::test]
    async fn sale_decrements_stock_and_rejects_oversell_atomically() {
        let repos = Repositories::in_memory();
        let store_id = StoreId::new();
        let p = product(store_id, "A-1", 5);
        repos.products.insert(&p).await.unwrap();

        repos.sales.record(&cash_sale(store_id, &p, 3)).await.unwrap();
        let after = repos.products.get(store_id, p.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 2);

        let oversell = cash_sale(store_id, &p, 3);
        let err = repos.sales.record(&oversell).await.unwrap_err();
        assert!(matches!(err, RepoError::Domain(DomainError::InvariantViolation(_))));
        assert!(repos.sales.get(store_id, oversell.id).await.unwrap().is_none());
        assert_eq!(repos.products.get(store_id, p.id).await.unwrap().unwrap().stock, 2);
    }

    #[tokio::test]
    async fn duplicate_sku_in_store_is_a_conflict() {
        let repos = Repositories::in_memory();
        let store_id = StoreId::new();
        repos.products.insert(&product(store_id, "SKU", 1)).await.unwrap();
        let err = repos.products.insert(&product(store_id, "sku", 1)).await.unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));
        // Same SKU in another store is fine.
        repos.products.insert(&product(StoreId::new(), "SKU", 1)).await.unwrap();
    }

    #[tokio::test]
    async fn second_open_shift_for_operator_conflicts() {
        let repos = Repositories::in_memory();
        let (store_id, user_id) = (StoreId::new(), UserId::new());
        let first = Shift::open(store_id, user_id, 0, Utc::now()).unwrap();
        repos.shifts.open(&first).await.unwrap();

        let second = Shift::open(store_id, user_id, 0, Utc::now()).unwrap();
        assert!(matches!(repos.shifts.open(&second).await, Err(RepoError::Conflict(_))));

        // Another store is a separate drawer.
        let elsewhere = Shift::open(StoreId::new(), user_id, 0, Utc::now()).unwrap();
        repos.shifts.open(&elsewhere).await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_closes_let_exactly_one_win() {
        let backend = Arc::new(InMemoryStore::default());
        let (store_id, user_id) = (StoreId::new(), UserId::new());
        let shift = Shift::open(store_id, user_id, 100_000, Utc::now()).unwrap();
        ShiftRepository::open(&*backend, &shift).await.unwrap();
        let shift_id = shift.id;

        let mut handles = Vec::new();
        for ending in [100_000, 90_000] {
            let backend = backend.clone();
            handles.push(tokio::spawn(async move {
                ShiftRepository::close(&*backend, store_id, shift_id, ending, Utc::now()).await
            }));
        }

        let mut wins = 0;
        let mut invalid_state = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(RepoError::Domain(DomainError::InvalidState(_))) => invalid_state += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!((wins, invalid_state), (1, 1));
    }

    #[tokio::test]
    async fn store_lookups_never_cross_stores() {
        let repos = Repositories::in_memory();
        let store_id = StoreId::new();
        let p = product(store_id, "X", 1);
        repos.products.insert(&p).await.unwrap();
        assert!(repos.products.get(StoreId::new(), p.id).await.unwrap().is_none());
        assert!(!repos.products.delete(StoreId::new(), p.id).await.unwrap());
    }
}
