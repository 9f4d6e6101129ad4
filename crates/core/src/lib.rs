//! `leadflow-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the lead and order
//! modules (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod region;

pub use error::{DomainError, DomainResult};
pub use id::{LeadId, OrderId};
pub use region::RegionCode;
