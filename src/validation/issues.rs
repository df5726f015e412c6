//! Problems a state tree definition can have.

use thiserror::Error;

/// A definition problem found by [`validate`](super::validate).
///
/// None of these stop a machine from being built unless validation is
/// requested; they describe parts of the tree that can never be reached or
/// names that cannot be resolved.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DefinitionIssue {
    #[error("State under '{parent}' has an empty name")]
    EmptyName { parent: String },

    #[error("State name '{name}' contains '.' and can never be resolved")]
    DottedName { name: String },

    #[error("Duplicate state '{name}' under '{parent}', only the first one is reachable")]
    DuplicateSibling { parent: String, name: String },

    #[error("Transition on '{state}' targets unknown state '{target}'")]
    UnknownTarget { state: String, target: String },

    #[error("Transition on '{state}' handles an empty event type")]
    EmptyEventType { state: String },
}
