//! Lead/order/cap persistence boundary.
//!
//! Mutations run inside a [`StoreTransaction`]: all-or-nothing, serialized per
//! region. Reads go straight to the [`LeadStore`] and only see committed state.

pub mod in_memory;
pub mod postgres;
pub mod query;
pub mod r#trait;

pub use in_memory::InMemoryLeadStore;
pub use postgres::PostgresLeadStore;
pub use query::{
    FulfilledLeadRow, LeadFilter, OrderFilter, OrderSummary, OrderWithLeads, Page, Pagination,
};
pub use r#trait::{LeadStore, StoreError, StoreTransaction};
