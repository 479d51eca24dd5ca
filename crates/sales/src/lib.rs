//! Sales domain module: point-of-sale sales, cash transactions and the
//! storefront cart/order flow.
//!
//! Deterministic domain logic only (no IO, no HTTP, no storage). Sales and
//! cash transactions are immutable once built.

pub mod cart;
pub mod order;
pub mod payment;
pub mod sale;

pub use cart::{Cart, CartItem};
pub use order::{OnlineOrder, OrderStatus};
pub use payment::{CashTransaction, NewCashTransaction, TransactionCategory};
pub use sale::{NewSale, NewSaleLine, PaymentMethod, Sale, SaleLine};
