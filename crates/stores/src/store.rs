use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillpoint_core::{patch::nullable, require_non_empty, DomainResult, Entity, StoreId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Store {
    type Id = StoreId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    /// A store is its own scope.
    fn store_id(&self) -> StoreId {
        self.id
    }
}

impl Store {
    pub fn apply_patch(&mut self, patch: StorePatch, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(name) = &patch.name {
            require_non_empty("name", name)?;
        }
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(address) = patch.address {
            self.address = address;
        }
        if let Some(phone) = patch.phone {
            self.phone = phone;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStore {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl NewStore {
    pub fn into_store(self, now: DateTime<Utc>) -> DomainResult<Store> {
        require_non_empty("name", &self.name)?;
        Ok(Store {
            id: StoreId::new(),
            name: self.name.trim().to_string(),
            address: self.address,
            phone: self.phone,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorePatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,
    pub active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_store_is_active_and_self_scoped() {
        let store = NewStore {
            name: " Toko Maju ".into(),
            address: None,
            phone: None,
        }
        .into_store(Utc::now())
        .unwrap();
        assert!(store.active);
        assert_eq!(store.name, "Toko Maju");
        assert_eq!(store.store_id(), store.id);
    }

    #[test]
    fn blank_rename_is_rejected() {
        let mut store = NewStore {
            name: "Toko".into(),
            address: None,
            phone: None,
        }
        .into_store(Utc::now())
        .unwrap();
        let patch = StorePatch {
            name: Some("".into()),
            active: Some(false),
            ..Default::default()
        };
        assert!(store.apply_patch(patch, Utc::now()).is_err());
        assert!(store.active);
    }
}
