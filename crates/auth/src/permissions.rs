use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Role;

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "catalog.write").
/// The wildcard permission `"*"` grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

const MANAGER_PERMISSIONS: &[&str] = &[
    "catalog.read",
    "catalog.write",
    "customers.read",
    "customers.write",
    "sales.read",
    "sales.create",
    "payments.read",
    "payments.create",
    "shifts.read",
    "shifts.operate",
    "orders.read",
    "orders.write",
    "carts.write",
    "analytics.read",
    "stores.read",
    "users.read",
];

const CASHIER_PERMISSIONS: &[&str] = &[
    "catalog.read",
    "customers.read",
    "sales.read",
    "sales.create",
    "payments.create",
    "shifts.read",
    "shifts.operate",
    "orders.read",
    "carts.write",
    "stores.read",
];

/// Static role → permission policy.
///
/// Unknown roles get nothing.
pub fn role_permissions(role: &Role) -> Vec<Permission> {
    let names: &[&'static str] = match role.as_str() {
        Role::ADMIN => &["*"],
        Role::MANAGER => MANAGER_PERMISSIONS,
        Role::CASHIER => CASHIER_PERMISSIONS,
        _ => &[],
    };
    names.iter().map(|n| Permission::new(*n)).collect()
}
