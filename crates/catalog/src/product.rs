use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillpoint_core::{
    patch::nullable, require_non_empty, require_non_negative, CategoryId, DomainError,
    DomainResult, Entity, ProductId, StoreId,
};

/// A sellable item. Prices are in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub store_id: StoreId,
    pub sku: String,
    pub name: String,
    pub category_id: Option<CategoryId>,
    pub price: i64,
    pub cost: i64,
    pub stock: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn store_id(&self) -> StoreId {
        self.store_id
    }
}

impl Product {
    /// Check if product can be sold (must be active).
    pub fn can_be_sold(&self) -> bool {
        self.active
    }

    /// Case-insensitive match on name or SKU.
    pub fn matches_query(&self, q: &str) -> bool {
        let q = q.trim().to_lowercase();
        q.is_empty() || self.name.to_lowercase().contains(&q) || self.sku.to_lowercase().contains(&q)
    }

    /// Remove `quantity` units from stock.
    ///
    /// Stock never goes negative; an oversell is an invariant violation.
    pub fn take_stock(&mut self, quantity: i64, now: DateTime<Utc>) -> DomainResult<()> {
        if quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if !self.active {
            return Err(DomainError::invariant(format!("product {} is not active", self.sku)));
        }
        if self.stock < quantity {
            return Err(DomainError::invariant(format!(
                "insufficient stock for {}: have {}, need {}",
                self.sku, self.stock, quantity
            )));
        }
        self.stock -= quantity;
        self.updated_at = now;
        Ok(())
    }

    pub fn apply_patch(&mut self, patch: ProductPatch, now: DateTime<Utc>) -> DomainResult<()> {
        patch.validate()?;
        if let Some(sku) = patch.sku {
            self.sku = sku.trim().to_string();
        }
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(category_id) = patch.category_id {
            self.category_id = category_id;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(cost) = patch.cost {
            self.cost = cost;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    pub price: i64,
    #[serde(default)]
    pub cost: i64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl NewProduct {
    pub fn validate(&self) -> DomainResult<()> {
        require_non_empty("sku", &self.sku)?;
        require_non_empty("name", &self.name)?;
        require_non_negative("price", self.price)?;
        require_non_negative("cost", self.cost)?;
        require_non_negative("stock", self.stock)?;
        Ok(())
    }

    pub fn into_product(self, store_id: StoreId, now: DateTime<Utc>) -> DomainResult<Product> {
        self.validate()?;
        Ok(Product {
            id: ProductId::new(),
            store_id,
            sku: self.sku.trim().to_string(),
            name: self.name.trim().to_string(),
            category_id: self.category_id,
            price: self.price,
            cost: self.cost,
            stock: self.stock,
            active: self.active,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial product update. `category_id: null` detaches the category.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub sku: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub category_id: Option<Option<CategoryId>>,
    pub price: Option<i64>,
    pub cost: Option<i64>,
    pub stock: Option<i64>,
    pub active: Option<bool>,
}

impl ProductPatch {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(sku) = &self.sku {
            require_non_empty("sku", sku)?;
        }
        if let Some(name) = &self.name {
            require_non_empty("name", name)?;
        }
        if let Some(price) = self.price {
            require_non_negative("price", price)?;
        }
        if let Some(cost) = self.cost {
            require_non_negative("cost", cost)?;
        }
        if let Some(stock) = self.stock {
            require_non_negative("stock", stock)?;
        }
        Ok(())
    }
}
