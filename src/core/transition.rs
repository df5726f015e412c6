//! Declarative transition rules owned by a state.

use super::event::{Delay, StateEvent};
use super::guard::Guard;

/// Rule mapping one or more event types to a target state.
///
/// Transitions are immutable once built; use
/// [`TransitionBuilder`](crate::builder::TransitionBuilder) to create them.
#[derive(Clone, Debug)]
pub struct Transition {
    pub(crate) event_types: Vec<String>,
    pub(crate) target: String,
    pub(crate) guard: Option<Guard>,
    pub(crate) delay: Delay,
    pub(crate) stop_propagation: bool,
    pub(crate) stop_immediate_propagation: bool,
}

impl Transition {
    /// Event types this transition handles.
    pub fn event_types(&self) -> &[String] {
        &self.event_types
    }

    /// Full dot-joined name of the target state.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// When the exit/enter sequence runs once this transition is chosen.
    pub fn delay(&self) -> Delay {
        self.delay
    }

    /// Whether outer states are skipped after this state.
    pub fn stops_propagation(&self) -> bool {
        self.stop_propagation
    }

    /// Whether evaluation stops right after this transition.
    pub fn stops_immediate_propagation(&self) -> bool {
        self.stop_immediate_propagation
    }

    /// Check if this transition handles the given event type.
    pub fn matches(&self, event_type: &str) -> bool {
        self.event_types.iter().any(|t| t == event_type)
    }

    /// Run the guard. No guard means always allowed.
    pub fn test(&self, event: &StateEvent) -> bool {
        self.guard.as_ref().is_none_or(|g| g.check(event))
    }
}
