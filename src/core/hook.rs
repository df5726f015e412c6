//! Enter/exit hooks and their completion handle.
//!
//! A hook is tagged when it is registered: `Sync` hooks are finished when
//! they return, `Async` hooks receive a [`Done`] and are finished when they
//! call [`Done::complete`]. The machine does not advance to the next state
//! of the path until then.
//!
//! An async hook that never completes stalls the machine: no timeout is
//! enforced. Dropping a `Done` without completing it is logged.

use super::event::Context;
use std::fmt;
use std::sync::Arc;

type SyncFn = dyn Fn(&Context, &str, &str) + Send + Sync;
type AsyncFn = dyn Fn(&Context, &str, &str, Done) + Send + Sync;

/// Callback invoked when a state becomes active (enter) or stops being
/// active (exit).
///
/// Arguments are the merged context, the triggering event type and a state
/// name: the dispatch-time active state for enter hooks, the target state
/// for exit hooks.
#[derive(Clone)]
pub enum Hook {
    Sync(Arc<SyncFn>),
    Async(Arc<AsyncFn>),
}

impl Hook {
    /// A hook that is complete as soon as it returns.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&Context, &str, &str) + Send + Sync + 'static,
    {
        Hook::Sync(Arc::new(f))
    }

    /// A hook that signals completion through the trailing [`Done`].
    ///
    /// ```rust
    /// use statepath::core::Hook;
    ///
    /// let hook = Hook::asynchronous(|_ctx, _event_type, _state, done| {
    ///     std::thread::spawn(move || done.complete());
    /// });
    /// assert!(hook.is_async());
    /// ```
    pub fn asynchronous<F>(f: F) -> Self
    where
        F: Fn(&Context, &str, &str, Done) + Send + Sync + 'static,
    {
        Hook::Async(Arc::new(f))
    }

    /// `true` if the machine waits for a [`Done`] from this hook.
    pub fn is_async(&self) -> bool {
        matches!(self, Hook::Async(_))
    }

    /// Call the hook. `done` is completed here for sync hooks and handed to
    /// the callback for async ones.
    pub fn invoke(&self, context: &Context, event_type: &str, state: &str, done: Done) {
        match self {
            Hook::Sync(f) => {
                f(context, event_type, state);
                done.complete();
            }
            Hook::Async(f) => f(context, event_type, state, done),
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::Sync(_) => f.write_str("Hook::Sync(..)"),
            Hook::Async(_) => f.write_str("Hook::Async(..)"),
        }
    }
}

/// Single-use completion signal for an asynchronous hook.
pub struct Done {
    next: Option<Box<dyn FnOnce() + Send>>,
}

impl Done {
    /// Wrap the continuation to run on completion.
    pub fn new<F>(next: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Done {
            next: Some(Box::new(next)),
        }
    }

    /// Signal completion and let the machine continue.
    pub fn complete(mut self) {
        if let Some(next) = self.next.take() {
            next();
        }
    }
}

impl Drop for Done {
    fn drop(&mut self) {
        if self.next.is_some() {
            tracing::warn!("hook completion dropped without being called, state machine is stalled");
        }
    }
}

impl fmt::Debug for Done {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Done")
            .field("pending", &self.next.is_some())
            .finish()
    }
}
