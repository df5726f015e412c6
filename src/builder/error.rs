//! Build errors for state machine and transition builders.

use crate::validation::DefinitionIssue;
use thiserror::Error;

/// Errors that can occur when building state machines and transitions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Transition event type not specified. Call .on(event_type)")]
    MissingEventType,

    #[error("Transition event types must not be empty strings")]
    EmptyEventType,

    #[error("Transition target state not specified. Call .to(state)")]
    MissingTarget,

    #[error("Transition from '{state}' to '{target}' is delayed but no scheduler was given. Call .scheduler(..)")]
    MissingScheduler { state: String, target: String },

    #[error("State tree failed validation with {} issue(s)", .0.len())]
    InvalidDefinition(Vec<DefinitionIssue>),
}
