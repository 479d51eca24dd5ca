//! Storefront cart, one per (store, customer).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillpoint_catalog::Product;
use tillpoint_core::{CustomerId, DomainError, DomainResult, ProductId, StoreId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i64,
    pub unit_price: i64,
}

impl CartItem {
    pub fn for_product(product: &Product, quantity: i64) -> DomainResult<Self> {
        if quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if !product.can_be_sold() {
            return Err(DomainError::invariant(format!("product {} is not active", product.sku)));
        }
        Ok(Self {
            product_id: product.id,
            name: product.name.clone(),
            quantity,
            unit_price: product.price,
        })
    }

    pub fn line_total(&self) -> i64 {
        self.unit_price.saturating_mul(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub store_id: StoreId,
    pub customer_id: CustomerId,
    pub items: Vec<CartItem>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn empty(store_id: StoreId, customer_id: CustomerId, now: DateTime<Utc>) -> Self {
        Self {
            store_id,
            customer_id,
            items: Vec::new(),
            updated_at: now,
        }
    }

    /// Add an item, replacing the quantity if the product is already present.
    pub fn put_item(&mut self, item: CartItem, now: DateTime<Utc>) {
        match self.items.iter_mut().find(|i| i.product_id == item.product_id) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
        self.updated_at = now;
    }

    /// Returns whether an item was removed.
    pub fn remove_item(&mut self, product_id: ProductId, now: DateTime<Utc>) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        let removed = self.items.len() != before;
        if removed {
            self.updated_at = now;
        }
        removed
    }

    pub fn total(&self) -> i64 {
        self.items.iter().map(CartItem::line_total).fold(0i64, i64::saturating_add)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tillpoint_catalog::NewProduct;

    fn product(sku: &str, price: i64) -> Product {
        NewProduct {
            sku: sku.into(),
            name: sku.into(),
            category_id: None,
            price,
            cost: 0,
            stock: 5,
            active: true,
        }
        .into_product(StoreId::new(), Utc::now())
        .unwrap()
    }

    #[test]
    fn put_replaces_quantity_for_same_product() {
        let p = product("TEH", 5_000);
        let mut cart = Cart::empty(p.store_id, CustomerId::new(), Utc::now());
        cart.put_item(CartItem::for_product(&p, 1).unwrap(), Utc::now());
        cart.put_item(CartItem::for_product(&p, 3).unwrap(), Utc::now());
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.total(), 15_000);
    }

    #[test]
    fn remove_reports_whether_anything_changed() {
        let p = product("TEH", 5_000);
        let mut cart = Cart::empty(p.store_id, CustomerId::new(), Utc::now());
        cart.put_item(CartItem::for_product(&p, 1).unwrap(), Utc::now());
        assert!(cart.remove_item(p.id, Utc::now()));
        assert!(!cart.remove_item(p.id, Utc::now()));
        assert!(cart.is_empty());
    }

    #[test]
    fn inactive_products_cannot_be_added() {
        let mut p = product("TEH", 5_000);
        p.active = false;
        assert!(CartItem::for_product(&p, 1).is_err());
    }
}
