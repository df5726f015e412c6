//! Guard predicates for controlling state transitions.
//!
//! A guard decides whether a matching transition may set the event's target.
//! It sees the merged context, the event type and the full name of the
//! active state at dispatch time.

use super::event::{Context, StateEvent};
use std::fmt;
use std::sync::Arc;

type Predicate = dyn Fn(&Context, &str, &str) -> bool + Send + Sync;

/// Predicate that determines if a transition can execute.
///
/// # Example
///
/// ```rust
/// use statepath::core::{Context, Guard, StateEvent};
/// use serde_json::json;
///
/// let has_ticket = Guard::new(|ctx: &Context, _event_type: &str, _active: &str| {
///     ctx.get("ticket") == Some(&json!(true))
/// });
///
/// let mut ctx = Context::new();
/// ctx.insert("ticket".into(), json!(true));
///
/// assert!(has_ticket.check(&StateEvent::new("enter", "lobby", ctx)));
/// assert!(!has_ticket.check(&StateEvent::new("enter", "lobby", Context::new())));
/// ```
#[derive(Clone)]
pub struct Guard {
    predicate: Arc<Predicate>,
}

impl Guard {
    /// Create a guard from a predicate over `(context, event_type, active_state)`.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Context, &str, &str) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// Evaluate the guard against an event.
    pub fn check(&self, event: &StateEvent) -> bool {
        (self.predicate)(event.context(), event.event_type(), event.active_state())
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard(..)")
    }
}
