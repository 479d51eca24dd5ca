use serde::{Deserialize, Serialize};

use tillpoint_core::StoreId;

/// A user's membership in a store.
///
/// This is an authorization boundary object: it states *which store* the
/// user is acting within and which role/permissions are granted there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMembership {
    pub store_id: StoreId,
    pub role: crate::Role,
    pub permissions: Vec<crate::Permission>,
}

impl StoreMembership {
    /// Membership derived from the static role policy.
    pub fn from_role(store_id: StoreId, role: crate::Role) -> Self {
        let permissions = crate::permissions::role_permissions(&role);
        Self {
            store_id,
            role,
            permissions,
        }
    }
}
