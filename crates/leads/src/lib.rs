//! Leads domain module.
//!
//! This crate contains the lead record and its status transitions, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod lead;

pub use lead::{ContactInfo, Lead, LeadStatus, NewLead};
