//! Runtime errors raised while driving the simulation.
//!
//! Buffer full/empty conditions are never errors; they suspend the caller.
//! Everything here is either a configuration failure surfaced before the
//! first event, or an internal-logic fault that aborts the run.

use thiserror::Error;

use crate::config::ConfigError;
use crate::event::Wake;
use crate::types::{ProcessId, StoreId};

/// Errors that abort a simulation run.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invariant violation: buffer '{store}' holds {occupancy} items, capacity {capacity}")]
    CapacityExceeded {
        store: String,
        occupancy: usize,
        capacity: usize,
    },

    #[error(
        "Invariant violation: {generated} generated, {completed} completed, but {in_system} in system"
    )]
    ConservationBroken {
        generated: u64,
        completed: u64,
        in_system: u64,
    },

    #[error("Process '{process}' cannot handle {wake:?} while {state}")]
    UnexpectedWake {
        process: String,
        wake: Wake,
        state: &'static str,
    },

    #[error("Unknown process id: {0}")]
    UnknownProcess(ProcessId),

    #[error("Unknown store id: {0}")]
    UnknownStore(StoreId),
}

impl SimError {
    /// Returns true for faults that indicate a broken buffer or item invariant.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            SimError::CapacityExceeded { .. } | SimError::ConservationBroken { .. }
        )
    }
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invariant_classification() {
        let err = SimError::CapacityExceeded {
            store: "fill_queue".to_string(),
            occupancy: 6,
            capacity: 5,
        };
        assert!(err.is_invariant_violation());
        assert!(err.to_string().contains("fill_queue"));

        assert!(!SimError::UnknownStore(9).is_invariant_violation());
    }

    #[test]
    fn test_config_error_conversion() {
        let err: SimError = ConfigError::Validation("horizon must be positive".into()).into();
        assert!(matches!(err, SimError::Config(_)));
        assert!(err.to_string().contains("horizon"));
    }
}
