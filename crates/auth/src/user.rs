//! User accounts.
//!
//! Users are global (one email, one account) but only act within the stores
//! listed in `stores`. Admins may act in every store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillpoint_core::{require_non_empty, DomainError, DomainResult, StoreId, UserId};

use crate::Role;

/// User account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// User is active and can authenticate/transact.
    #[default]
    Active,
    /// User is suspended and cannot authenticate.
    Suspended,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Suspended => "suspended",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "active" => Ok(UserStatus::Active),
            "suspended" => Ok(UserStatus::Suspended),
            other => Err(DomainError::validation(format!("unknown user status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub stores: Vec<StoreId>,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// Store used when the login request does not name one.
    pub fn default_store(&self) -> Option<StoreId> {
        self.stores.first().copied()
    }

    pub fn can_access(&self, store_id: StoreId) -> bool {
        self.role == Role::admin() || self.stores.contains(&store_id)
    }

    /// Apply a validated patch. `password_hash` is never touched here.
    pub fn apply_patch(&mut self, patch: UserPatch, now: DateTime<Utc>) -> DomainResult<()> {
        patch.validate()?;
        if let Some(display_name) = patch.display_name {
            self.display_name = display_name.trim().to_string();
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(stores) = patch.stores {
            self.stores = dedup_stores(stores);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Input for creating a user; the plaintext password is hashed by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub display_name: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub stores: Vec<StoreId>,
}

impl NewUser {
    pub fn validate(&self) -> DomainResult<()> {
        validate_email(&self.email)?;
        require_non_empty("display_name", &self.display_name)?;
        validate_role(&self.role)?;
        if self.role != Role::admin() && self.stores.is_empty() {
            return Err(DomainError::validation(
                "non-admin users must be assigned at least one store",
            ));
        }
        Ok(())
    }

    pub fn into_user(self, password_hash: String, now: DateTime<Utc>) -> DomainResult<User> {
        self.validate()?;
        Ok(User {
            id: UserId::new(),
            email: normalize_email(&self.email),
            display_name: self.display_name.trim().to_string(),
            password_hash,
            role: self.role,
            stores: dedup_stores(self.stores),
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update for a user. Email and password have their own flows.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub display_name: Option<String>,
    pub role: Option<Role>,
    pub stores: Option<Vec<StoreId>>,
    pub status: Option<UserStatus>,
}

impl UserPatch {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.display_name {
            require_non_empty("display_name", name)?;
        }
        if let Some(role) = &self.role {
            validate_role(role)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.role.is_none()
            && self.stores.is_none()
            && self.status.is_none()
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> DomainResult<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(DomainError::validation("invalid email format")),
    }
}

fn validate_role(role: &Role) -> DomainResult<()> {
    if !role.is_known() {
        return Err(DomainError::validation(format!("unknown role '{role}'")));
    }
    Ok(())
}

fn dedup_stores(stores: Vec<StoreId>) -> Vec<StoreId> {
    let mut out: Vec<StoreId> = Vec::with_capacity(stores.len());
    for s in stores {
        if !out.contains(&s) {
            out.push(s);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_cashier(store: StoreId) -> NewUser {
        NewUser {
            email: "  Kasir@Example.COM ".into(),
            display_name: " Sari ".into(),
            password: "password123".into(),
            role: Role::cashier(),
            stores: vec![store, store],
        }
    }

    #[test]
    fn new_user_is_normalized() {
        let store = StoreId::new();
        let user = new_cashier(store).into_user("hash".into(), Utc::now()).unwrap();
        assert_eq!(user.email, "kasir@example.com");
        assert_eq!(user.display_name, "Sari");
        assert_eq!(user.stores, vec![store]);
        assert!(user.is_active());
    }

    #[test]
    fn invalid_email_is_rejected() {
        let mut input = new_cashier(StoreId::new());
        input.email = "nobody".into();
        assert!(matches!(input.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn cashier_without_store_is_rejected() {
        let mut input = new_cashier(StoreId::new());
        input.stores.clear();
        assert!(input.validate().is_err());
    }

    #[test]
    fn unknown_role_is_rejected() {
        let mut input = new_cashier(StoreId::new());
        input.role = Role::new("owner");
        assert!(input.validate().is_err());
    }

    #[test]
    fn patch_updates_only_given_fields() {
        let store = StoreId::new();
        let mut user = new_cashier(store).into_user("hash".into(), Utc::now()).unwrap();
        user.apply_patch(
            UserPatch {
                status: Some(UserStatus::Suspended),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(user.status, UserStatus::Suspended);
        assert_eq!(user.role, Role::cashier());
        assert_eq!(user.password_hash, "hash");
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let user = new_cashier(StoreId::new())
            .into_user("secret-hash".into(), Utc::now())
            .unwrap();
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
    }
}
