//! Catalog domain module: products and categories.
//!
//! Pure domain logic (no IO, no HTTP, no storage). SKU uniqueness per store
//! is enforced by the repositories.

pub mod category;
pub mod product;

pub use category::{Category, CategoryPatch, NewCategory};
pub use product::{NewProduct, Product, ProductPatch};
