//! Customers domain module.
//!
//! A customer's debt is derived from sales and payments (see
//! `tillpoint-receivables`) and is never stored on the customer.

pub mod customer;

pub use customer::{ContactInfo, Customer, CustomerPatch, NewCustomer};
