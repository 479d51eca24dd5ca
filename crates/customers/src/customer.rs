use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillpoint_core::{
    patch::nullable, require_non_empty, require_non_negative, CustomerId, DomainResult, Entity,
    StoreId,
};

/// Contact information for a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub store_id: StoreId,
    pub name: String,
    #[serde(flatten)]
    pub contact: ContactInfo,
    /// Maximum outstanding debt the store extends, in minor units.
    pub credit_limit: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn store_id(&self) -> StoreId {
        self.store_id
    }
}

impl Customer {
    pub fn apply_patch(&mut self, patch: CustomerPatch, now: DateTime<Utc>) -> DomainResult<()> {
        patch.validate()?;
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(email) = patch.email {
            self.contact.email = email;
        }
        if let Some(phone) = patch.phone {
            self.contact.phone = phone;
        }
        if let Some(address) = patch.address {
            self.contact.address = address;
        }
        if let Some(limit) = patch.credit_limit {
            self.credit_limit = limit;
        }
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    #[serde(flatten)]
    pub contact: ContactInfo,
    #[serde(default)]
    pub credit_limit: i64,
}

impl NewCustomer {
    pub fn into_customer(self, store_id: StoreId, now: DateTime<Utc>) -> DomainResult<Customer> {
        require_non_empty("name", &self.name)?;
        require_non_negative("credit_limit", self.credit_limit)?;
        Ok(Customer {
            id: CustomerId::new(),
            store_id,
            name: self.name.trim().to_string(),
            contact: self.contact,
            credit_limit: self.credit_limit,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial customer update; contact fields accept `null` to clear.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub address: Option<Option<String>>,
    pub credit_limit: Option<i64>,
}

impl CustomerPatch {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            require_non_empty("name", name)?;
        }
        if let Some(limit) = self.credit_limit {
            require_non_negative("credit_limit", limit)?;
        }
        Ok(())
    }
}
