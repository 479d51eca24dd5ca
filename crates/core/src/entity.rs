//! Entity trait: identity + store scope.

use crate::id::StoreId;

/// Entity marker + minimal interface.
///
/// Every persisted record in the system belongs to exactly one store; generic
/// storage code keys records by `(store_id, id)`.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Returns the store the entity belongs to.
    fn store_id(&self) -> StoreId;
}
