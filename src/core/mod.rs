//! Core state machine types and logic.
//!
//! This module contains the pure part of the engine:
//! - State definitions and per-state transition selection
//! - Guard predicates and transition rules
//! - The per-dispatch `StateEvent`
//! - The state tree arena with name resolution
//!
//! Nothing here schedules work or holds locks; that lives in
//! [`effects`](crate::effects).

mod event;
mod guard;
mod hook;
mod state;
mod transition;
mod tree;

pub use event::{merge_context, Context, Delay, StateEvent};
pub use guard::Guard;
pub use hook::{Done, Hook};
pub use state::State;
pub use transition::Transition;
pub use tree::{ActivePath, StateId, StateNode, StateTree};
