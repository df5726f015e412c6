//! Statepath: a hierarchical state machine engine
//!
//! Statepath tracks a single active path through a tree of named states,
//! bubbles events from the innermost active state outwards, picks at most
//! one transition per event and moves the active path through an ordered
//! exit/enter protocol. Hooks may complete asynchronously and transitions
//! may be deferred to an injected scheduler.
//!
//! # Core Concepts
//!
//! - **State**: a named node owning child states, transitions and hooks
//! - **Transition**: event type(s), a target full name, a guard, a delay and
//!   propagation flags
//! - **Active path**: the chain of states from a root down to the active leaf;
//!   absent while a transition is in flight, so events fired then are dropped
//! - **Hooks**: enter/exit callbacks, `Sync` or `Async` (completed via `Done`)
//!
//! # Example
//!
//! ```rust
//! use statepath::builder::simple_transition;
//! use statepath::core::State;
//! use statepath::StateMachine;
//! use std::sync::{Arc, Mutex};
//!
//! let machine = StateMachine::builder(vec![State::new("root")
//!     .child(State::new("idle").transition(simple_transition("start", "root.active")))
//!     .child(State::new("active").transition(simple_transition("stop", "root.idle")))])
//!     .build()
//!     .unwrap();
//!
//! let changes = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&changes);
//! let _subscription = machine.on_change(move |change| {
//!     sink.lock().unwrap().push((change.old_state.clone(), change.new_state.clone()));
//! });
//!
//! machine.init("root.idle", None, None).unwrap();
//! machine.fire_state_event("start", None).unwrap();
//!
//! assert_eq!(machine.active_state(), "root.active");
//! assert_eq!(
//!     *changes.lock().unwrap(),
//!     vec![("root.idle".to_string(), "root.active".to_string())]
//! );
//! ```

pub mod builder;
pub mod core;
pub mod effects;
pub mod error;
pub mod validation;

// Re-export commonly used types
pub use crate::builder::{BuildError, StateMachineBuilder, TransitionBuilder};
pub use crate::core::{Context, Delay, Done, Guard, Hook, State, StateEvent, Transition};
pub use crate::effects::{EventKind, MachineEvent, StateChange, StateMachine, Subscription};
pub use crate::error::MachineError;

#[doc(hidden)]
pub mod __private {
    pub use serde_json::Value;
}
