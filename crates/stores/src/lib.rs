//! Stores: the tenancy boundary. Every other record carries a `store_id`.

pub mod store;

pub use store::{NewStore, Store, StorePatch};
