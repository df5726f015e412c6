//! The imperative shell around the pure core.
//!
//! This module owns everything with side effects: the active path and its
//! locking, ordered hook execution, deferred scheduling and listener
//! notification.
//!
//! # Key Concepts
//!
//! - **State Machine**: tracks the active path and runs the transition protocol
//! - **Scheduler**: injected capability for next-tick and timed execution
//! - **Listeners**: typed change notifications with idempotent disposers

mod hooks;
mod listeners;
mod machine;
mod scheduler;

pub use listeners::{EventKind, Listener, ListenerRegistry, MachineEvent, StateChange, Subscription};
pub use machine::{InitCallback, MachineOptions, StateMachine, WeakStateMachine, INIT_EVENT};
#[cfg(feature = "tokio")]
pub use scheduler::TokioScheduler;
pub use scheduler::{ManualScheduler, Scheduler, Task};
