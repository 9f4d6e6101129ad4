//! Customer orders domain module.
//!
//! This crate contains the order record, customer validation and the order
//! status lifecycle, implemented purely as deterministic domain logic (no IO,
//! no HTTP, no storage).

pub mod order;

pub use order::{CustomerInfo, Order, OrderStatus};
