//! Engine-level error taxonomy.
//!
//! Every engine operation fails with exactly one [`EngineError`]. Domain
//! errors and store errors are folded in through `From` so `?` works across
//! layers.

use thiserror::Error;

use leadflow_core::{DomainError, LeadId, OrderId};

use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Malformed input (missing customer fields, bad region code, bad page).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Referenced order or lead does not exist.
    #[error("{0} not found")]
    NotFound(String),

    #[error("order already fulfilled")]
    AlreadyFulfilled,

    #[error("order already cancelled")]
    AlreadyCancelled,

    /// Requested lead status is not a legal value.
    #[error("invalid lead status: {0}")]
    InvalidStatus(String),

    /// The backend failed; the boundary was rolled back.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl EngineError {
    pub fn order_not_found(id: OrderId) -> Self {
        EngineError::NotFound(format!("order {id}"))
    }

    pub fn lead_not_found(id: LeadId) -> Self {
        EngineError::NotFound(format!("lead {id}"))
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "validation_error",
            EngineError::NotFound(_) => "not_found",
            EngineError::AlreadyFulfilled => "already_fulfilled",
            EngineError::AlreadyCancelled => "already_cancelled",
            EngineError::InvalidStatus(_) => "invalid_status",
            EngineError::Storage(_) => "storage_error",
        }
    }

    /// Whether the caller may retry the whole operation.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Storage(e) if e.is_transient())
    }
}

impl From<DomainError> for EngineError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => EngineError::Validation(msg),
            DomainError::InvalidId(msg) => EngineError::Validation(msg),
            DomainError::InvalidStatus(msg) => EngineError::InvalidStatus(msg),
            DomainError::AlreadyFulfilled => EngineError::AlreadyFulfilled,
            DomainError::AlreadyCancelled => EngineError::AlreadyCancelled,
            // Only reachable when the store hands back rows that contradict
            // its own query (e.g. an assigned lead from the unassigned pool).
            DomainError::InvariantViolation(msg) => {
                EngineError::Storage(StoreError::Corrupt(msg))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_engine_kinds() {
        assert_eq!(
            EngineError::from(DomainError::invalid_id("nope")),
            EngineError::Validation("nope".to_string())
        );
        assert_eq!(
            EngineError::from(DomainError::AlreadyCancelled),
            EngineError::AlreadyCancelled
        );
        assert_eq!(
            EngineError::from(DomainError::invalid_status("x")).code(),
            "invalid_status"
        );
        assert!(matches!(
            EngineError::from(DomainError::invariant("bad row")),
            EngineError::Storage(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn not_found_names_the_missing_record() {
        let order = OrderId::new();
        let err = EngineError::order_not_found(order);
        assert_eq!(err.code(), "not_found");
        assert_eq!(err.to_string(), format!("order {order} not found"));

        let lead = LeadId::new();
        assert_eq!(
            EngineError::lead_not_found(lead),
            EngineError::NotFound(format!("lead {lead}"))
        );
    }

    #[test]
    fn only_transient_storage_errors_are_retryable() {
        assert!(EngineError::from(StoreError::Conflict("deadlock".into())).is_transient());
        assert!(!EngineError::from(StoreError::Backend("boom".into())).is_transient());
        assert!(!EngineError::AlreadyFulfilled.is_transient());
    }
}
