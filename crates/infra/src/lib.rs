//! Infrastructure layer: storage backends, the allocation/lifecycle engine,
//! configuration and the automation dispatcher.

pub mod allocation;
pub mod automation;
pub mod capacity;
pub mod config;
pub mod engine;
pub mod error;
pub mod intake;
pub mod lifecycle;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use allocation::{Allocation, AllocationEngine, OrderRequest};
pub use automation::{AutomationCommand, AutomationDispatcher, AutomationRequest, RuleAction};
pub use capacity::CapacityRegistry;
pub use config::{ConfigError, EngineConfig};
pub use engine::LeadEngine;
pub use error::EngineError;
pub use intake::LeadIntake;
pub use lifecycle::LifecycleCoordinator;
pub use store::{InMemoryLeadStore, LeadStore, PostgresLeadStore, StoreError};
