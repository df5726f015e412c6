//! Builder API for ergonomic state machine construction.
//!
//! This module provides fluent builders and helpers for creating state
//! trees, transitions and machines with minimal boilerplate.

pub mod error;
pub mod machine;
pub mod macros;
pub mod transition;

pub use error::BuildError;
pub use machine::StateMachineBuilder;
pub use transition::TransitionBuilder;

use crate::core::{Context, Delay, Guard, Transition};

/// Create an unconditional, immediate transition.
///
/// # Example
///
/// ```
/// use statepath::builder::simple_transition;
///
/// let transition = simple_transition("start", "root.active");
/// assert!(transition.matches("start"));
/// assert_eq!(transition.target(), "root.active");
/// ```
pub fn simple_transition(event_type: impl Into<String>, target: impl Into<String>) -> Transition {
    Transition {
        event_types: vec![event_type.into()],
        target: target.into(),
        guard: None,
        delay: Delay::Immediate,
        stop_propagation: false,
        stop_immediate_propagation: false,
    }
}

/// Create an immediate transition with a guard.
///
/// # Example
///
/// ```
/// use statepath::builder::guarded_transition;
/// use statepath::core::{Context, StateEvent};
///
/// let transition = guarded_transition("start", "root.active", |ctx, _, _| ctx.contains_key("token"));
/// assert!(!transition.test(&StateEvent::new("start", "root.idle", Context::new())));
/// ```
pub fn guarded_transition<F>(event_type: impl Into<String>, target: impl Into<String>, guard: F) -> Transition
where
    F: Fn(&Context, &str, &str) -> bool + Send + Sync + 'static,
{
    Transition {
        guard: Some(Guard::new(guard)),
        ..simple_transition(event_type, target)
    }
}
