use thiserror::Error;

use tillpoint_core::{StoreId, UserId};

use crate::{JwtClaims, Permission, Role, StoreMembership};

/// A fully resolved principal for authorization decisions.
///
/// Derived from verified claims plus the store the request targets; no
/// storage access is needed to build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub active_store_id: StoreId,
    pub membership: StoreMembership,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("store mismatch")]
    StoreMismatch,

    #[error("no access to store {0}")]
    NoStoreAccess(StoreId),

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

impl Principal {
    /// Resolve a principal for `requested` (or the token's default store).
    ///
    /// Admins may act in any store; everyone else only in stores listed in
    /// their token.
    pub fn from_claims(claims: &JwtClaims, requested: Option<StoreId>) -> Result<Self, AuthzError> {
        let store_id = requested.unwrap_or(claims.store_id);
        if claims.role != Role::admin() && !claims.can_access(store_id) {
            return Err(AuthzError::NoStoreAccess(store_id));
        }
        Ok(Self {
            user_id: claims.sub,
            active_store_id: store_id,
            membership: StoreMembership::from_role(store_id, claims.role.clone()),
        })
    }

    pub fn role(&self) -> &Role {
        &self.membership.role
    }

    pub fn is_admin(&self) -> bool {
        self.membership.role == Role::admin()
    }
}

/// Authorize a principal within its active store.
///
/// Pure policy check: no IO, no panics.
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    if principal.active_store_id != principal.membership.store_id {
        return Err(AuthzError::StoreMismatch);
    }

    let granted = principal
        .membership
        .permissions
        .iter()
        .any(|p| p.is_wildcard() || p == required);

    if granted {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}
