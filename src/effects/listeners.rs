//! Listener registry for machine notifications.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Kinds of notification a machine emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// The active state changed.
    Change,
}

/// Payload of a [`EventKind::Change`] notification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    /// Full name of the state that was exited.
    pub old_state: String,
    /// Full name of the state that is now active.
    pub new_state: String,
    /// Event type that triggered the transition.
    pub event_type: String,
    /// Correlates diagnostics of one transition.
    pub transition_id: Uuid,
    /// When the new path was installed.
    pub at: DateTime<Utc>,
}

/// A notification delivered to listeners.
#[derive(Clone, Debug, PartialEq)]
pub enum MachineEvent {
    Change(StateChange),
}

impl MachineEvent {
    /// Kind this event is delivered under.
    pub fn kind(&self) -> EventKind {
        match self {
            MachineEvent::Change(_) => EventKind::Change,
        }
    }
}

/// Shared listener callback. Registering the same `Arc` twice for one kind
/// is a no-op.
pub type Listener = Arc<dyn Fn(&MachineEvent) + Send + Sync>;

type Table = HashMap<EventKind, Vec<Listener>>;

/// Listeners keyed by event kind, in registration order.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    table: Arc<Mutex<Table>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `kind` and return its disposer.
    pub fn register(&self, kind: EventKind, listener: Listener) -> Subscription {
        {
            let mut table = self.table.lock();
            let entries = table.entry(kind).or_default();
            if !entries.iter().any(|l| Arc::ptr_eq(l, &listener)) {
                entries.push(Arc::clone(&listener));
            }
        }
        Subscription {
            table: Arc::downgrade(&self.table),
            kind,
            listener,
        }
    }

    /// Number of listeners registered for `kind`.
    pub fn count(&self, kind: EventKind) -> usize {
        self.table.lock().get(&kind).map_or(0, Vec::len)
    }

    /// Deliver `event` to the listeners of its kind.
    ///
    /// Listeners are called on a snapshot taken before the first call, so
    /// they may register or cancel listeners themselves.
    pub fn emit(&self, event: &MachineEvent) {
        let snapshot: Vec<Listener> = self
            .table
            .lock()
            .get(&event.kind())
            .cloned()
            .unwrap_or_default();
        for listener in snapshot {
            listener(event);
        }
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table.lock();
        let counts: HashMap<&EventKind, usize> = table.iter().map(|(k, v)| (k, v.len())).collect();
        f.debug_struct("ListenerRegistry").field("listeners", &counts).finish()
    }
}

/// Disposer returned by `on`. Cancelling removes exactly the registered
/// listener for its kind; cancelling twice is harmless.
pub struct Subscription {
    table: Weak<Mutex<Table>>,
    kind: EventKind,
    listener: Listener,
}

impl Subscription {
    /// Kind the listener was registered for.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn cancel(&self) {
        let Some(table) = self.table.upgrade() else {
            return;
        };
        let mut table = table.lock();
        if let Some(entries) = table.get_mut(&self.kind) {
            entries.retain(|l| !Arc::ptr_eq(l, &self.listener));
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("kind", &self.kind).finish()
    }
}
