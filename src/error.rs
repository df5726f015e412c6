//! Errors raised synchronously by the state machine.

use thiserror::Error;

/// Errors returned to the caller of `init`, `fire_state_event` and `collapse`.
///
/// These are setup or programming errors. Routine runtime misses (no active
/// state, no matching transition, unknown target) are not errors: the event
/// is dropped and a diagnostic is logged instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MachineError {
    #[error("Invalid state name: '{0}'")]
    InvalidStateName(String),

    #[error("Invalid event type: '{0}'")]
    InvalidEventType(String),

    #[error("StateMachine already initialized")]
    AlreadyInitialized,

    #[error("State not found: '{0}'")]
    StateNotFound(String),

    #[error("State '{child}' must be a child of '{parent}'")]
    BrokenPath { child: String, parent: String },
}
