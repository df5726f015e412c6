//! State machine that tracks the active path and executes transitions.

use super::hooks::{run_phase, Dispatch, Phase};
use super::listeners::{EventKind, Listener, ListenerRegistry, MachineEvent, StateChange, Subscription};
use super::scheduler::{Scheduler, Task};
use crate::builder::StateMachineBuilder;
use crate::core::{merge_context, ActivePath, Context, Delay, State, StateEvent, StateId, StateTree};
use crate::error::MachineError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Event type of the synthetic event used by `init`.
pub const INIT_EVENT: &str = "init";

/// Machine options.
///
/// ```rust
/// use statepath::effects::MachineOptions;
///
/// let options = MachineOptions::from_json(r#"{"debug": true}"#).unwrap();
/// assert!(options.debug);
/// assert!(!MachineOptions::from_json("{}").unwrap().debug);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineOptions {
    /// Emit advisory diagnostics (init, enter, exit, delays, dropped events).
    pub debug: bool,
}

impl MachineOptions {
    /// Parse options from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Called once `init` has entered the initial path.
pub type InitCallback = Box<dyn FnOnce() + Send + 'static>;

/// Where the machine stands. Events are only dispatched in `Active`.
#[derive(Debug, Default)]
enum Activity {
    /// Uninitialized, or hooks of a transition are running.
    #[default]
    Absent,
    Active(ActivePath),
    /// A deferred transition has claimed the machine but not started yet.
    /// The old path is still reported, events are dropped.
    Scheduled(ActivePath),
}

#[derive(Debug, Default)]
struct ActiveSlot {
    activity: Activity,
    /// Bumped whenever the active path changes hands.
    generation: u64,
    initialized: bool,
}

impl ActiveSlot {
    fn reported(&self) -> Option<&ActivePath> {
        match &self.activity {
            Activity::Active(path) | Activity::Scheduled(path) => Some(path),
            Activity::Absent => None,
        }
    }

    fn dispatchable(&self) -> Option<&ActivePath> {
        match &self.activity {
            Activity::Active(path) => Some(path),
            _ => None,
        }
    }
}

struct Shared {
    tree: Arc<StateTree>,
    context: Context,
    options: MachineOptions,
    scheduler: Option<Arc<dyn Scheduler>>,
    slot: Mutex<ActiveSlot>,
    listeners: ListenerRegistry,
}

/// A transition that has claimed the machine and waits to run.
struct PendingTransition {
    id: Uuid,
    old: ActivePath,
    new: ActivePath,
    dispatch: Arc<Dispatch>,
    resolved_at: DateTime<Utc>,
}

/// Hierarchical state machine.
///
/// Cloning yields another handle to the same machine. Hooks that need the
/// machine should capture a [`WeakStateMachine`] to avoid a reference cycle.
///
/// # Example
///
/// ```rust
/// use statepath::builder::simple_transition;
/// use statepath::core::State;
/// use statepath::effects::StateMachine;
///
/// let machine = StateMachine::builder(vec![State::new("root")
///     .child(State::new("idle").transition(simple_transition("start", "root.active")))
///     .child(State::new("active").transition(simple_transition("stop", "root.idle")))])
///     .build()
///     .unwrap();
///
/// machine.init("root.idle", None, None).unwrap();
/// machine.fire_state_event("start", None).unwrap();
/// assert_eq!(machine.active_state(), "root.active");
/// ```
#[derive(Clone)]
pub struct StateMachine {
    shared: Arc<Shared>,
}

/// Non-owning handle to a [`StateMachine`].
#[derive(Clone, Default)]
pub struct WeakStateMachine {
    shared: Weak<Shared>,
}

impl WeakStateMachine {
    /// Get a strong handle if the machine is still alive.
    pub fn upgrade(&self) -> Option<StateMachine> {
        self.shared.upgrade().map(|shared| StateMachine { shared })
    }
}

impl StateMachine {
    /// Start building a machine from its root states.
    pub fn builder(states: Vec<State>) -> StateMachineBuilder {
        StateMachineBuilder::new(states)
    }

    pub(crate) fn from_parts(
        tree: StateTree,
        context: Context,
        options: MachineOptions,
        scheduler: Option<Arc<dyn Scheduler>>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                tree: Arc::new(tree),
                context,
                options,
                scheduler,
                slot: Mutex::new(ActiveSlot::default()),
                listeners: ListenerRegistry::new(),
            }),
        }
    }

    /// Non-owning handle, for capture inside hooks and listeners.
    pub fn downgrade(&self) -> WeakStateMachine {
        WeakStateMachine {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// The state tree (read-only).
    pub fn states(&self) -> &StateTree {
        &self.shared.tree
    }

    /// Default context merged into every event.
    pub fn context(&self) -> &Context {
        &self.shared.context
    }

    /// Options the machine was built with.
    pub fn options(&self) -> &MachineOptions {
        &self.shared.options
    }

    /// Full name of the active state, or an empty string when the machine is
    /// uninitialized or the hooks of a transition are running.
    ///
    /// A deferred transition that has not started yet still reports the
    /// state it leaves, although events fired meanwhile are dropped.
    pub fn active_state(&self) -> String {
        self.shared
            .slot
            .lock()
            .reported()
            .map(|path| path.name().to_string())
            .unwrap_or_default()
    }

    /// Ids of the reported active path, outermost first.
    pub fn active_path(&self) -> Option<Vec<StateId>> {
        self.shared.slot.lock().reported().map(|path| path.ids().to_vec())
    }

    /// `true` once `init` has been accepted, even if its hooks are still running.
    pub fn is_initialized(&self) -> bool {
        self.shared.slot.lock().initialized
    }

    /// `true` between target resolution and installation of the new path,
    /// and while `init` is entering. Events fired now are dropped.
    pub fn is_transitioning(&self) -> bool {
        let slot = self.shared.slot.lock();
        slot.initialized && slot.dispatchable().is_none()
    }

    /// Register a listener for `kind`. Registering the same `Arc` twice is a
    /// no-op.
    pub fn on(&self, kind: EventKind, listener: Listener) -> Subscription {
        self.shared.listeners.register(kind, listener)
    }

    /// Register a closure for change notifications.
    pub fn on_change<F>(&self, f: F) -> Subscription
    where
        F: Fn(&StateChange) + Send + Sync + 'static,
    {
        self.on(
            EventKind::Change,
            Arc::new(move |event: &MachineEvent| match event {
                MachineEvent::Change(change) => f(change),
            }),
        )
    }

    /// Enter the initial state.
    ///
    /// Enter hooks run outermost-first with an `"init"` event and an empty
    /// active state name. Once they are all complete the path becomes active
    /// and `callback` runs. No change notification is emitted.
    pub fn init(
        &self,
        state_name: &str,
        context: Option<Context>,
        callback: Option<InitCallback>,
    ) -> Result<(), MachineError> {
        if state_name.is_empty() {
            return Err(MachineError::InvalidStateName(state_name.to_string()));
        }
        let shared = &self.shared;
        let path = {
            let mut slot = shared.slot.lock();
            if slot.initialized || slot.reported().is_some() {
                return Err(MachineError::AlreadyInitialized);
            }
            let ids = shared.tree.resolve(state_name);
            if ids.is_empty() {
                return Err(MachineError::StateNotFound(state_name.to_string()));
            }
            let path = shared.tree.active_path(ids)?;
            slot.initialized = true;
            path
        };

        if shared.options.debug {
            tracing::debug!(state = %path.name(), "init state");
        }
        let dispatch = Arc::new(Dispatch {
            event_type: INIT_EVENT.to_string(),
            context: merge_context(&shared.context, context),
            active_state: String::new(),
            target_state: path.name().to_string(),
        });
        let ids: Arc<[StateId]> = path.ids().into();
        let installer = Arc::clone(shared);
        run_phase(
            Arc::clone(&shared.tree),
            Phase::Enter,
            ids,
            0,
            dispatch,
            Box::new(move || {
                {
                    let mut slot = installer.slot.lock();
                    slot.activity = Activity::Active(path);
                    slot.generation += 1;
                }
                if let Some(callback) = callback {
                    callback();
                }
            }),
        );
        Ok(())
    }

    /// Dispatch an event to the active path.
    ///
    /// Only an empty `event_type` is an error. An event that finds no active
    /// path (uninitialized, or a transition in flight) or resolves no target
    /// is dropped.
    pub fn fire_state_event(&self, event_type: &str, context: Option<Context>) -> Result<(), MachineError> {
        if event_type.is_empty() {
            return Err(MachineError::InvalidEventType(event_type.to_string()));
        }
        let shared = &self.shared;
        let debug = shared.options.debug;

        let (snapshot, generation) = {
            let slot = shared.slot.lock();
            (slot.dispatchable().cloned(), slot.generation)
        };
        let Some(snapshot) = snapshot else {
            if debug {
                tracing::warn!(event_type = %event_type, "no current state, event dropped");
            }
            return Ok(());
        };

        let mut event = StateEvent::new(event_type, snapshot.name(), merge_context(&shared.context, context));
        for &id in snapshot.ids().iter().rev() {
            if event.is_cancelled() {
                break;
            }
            shared.tree.state(id).handle_event(&mut event);
        }

        let (event_type, context, active_state, target_state, delay) = event.into_parts();
        let Some(target_state) = target_state else {
            if debug {
                tracing::debug!(event_type = %event_type, state = %snapshot.name(), "no target state");
            }
            return Ok(());
        };
        let target_ids = shared.tree.resolve(&target_state);
        if target_ids.is_empty() {
            if debug {
                tracing::debug!(event_type = %event_type, target = %target_state, "no target state");
            }
            return Ok(());
        }
        let target = shared.tree.active_path(target_ids)?;

        {
            let mut slot = shared.slot.lock();
            if slot.generation != generation || slot.dispatchable().is_none() {
                if debug {
                    tracing::warn!(event_type = %event_type, "active state changed during dispatch, event dropped");
                }
                return Ok(());
            }
            slot.activity = if delay.is_immediate() {
                Activity::Absent
            } else {
                Activity::Scheduled(snapshot.clone())
            };
            slot.generation += 1;
        }

        let pending = PendingTransition {
            id: Uuid::new_v4(),
            old: snapshot,
            new: target,
            dispatch: Arc::new(Dispatch {
                event_type,
                context,
                active_state,
                target_state,
            }),
            resolved_at: Utc::now(),
        };
        Shared::schedule(Arc::clone(shared), pending, delay);
        Ok(())
    }
}

impl Shared {
    fn schedule(self: Arc<Self>, pending: PendingTransition, delay: Delay) {
        if self.options.debug && !delay.is_immediate() {
            tracing::debug!(
                transition_id = %pending.id,
                delay_ms = delay.as_millis(),
                "async transition"
            );
        }
        let scheduler = match (delay, &self.scheduler) {
            (Delay::Immediate, _) => None,
            (_, Some(scheduler)) => Some(Arc::clone(scheduler)),
            (_, None) => {
                tracing::error!(
                    transition_id = %pending.id,
                    "no scheduler configured for a delayed transition, running it inline"
                );
                None
            }
        };
        let Some(scheduler) = scheduler else {
            self.exit_old(pending);
            return;
        };
        let task: Task = Box::new(move || self.exit_old(pending));
        match delay {
            Delay::After(duration) => scheduler.after(duration, task),
            _ => scheduler.next_tick(task),
        }
    }

    fn exit_old(self: Arc<Self>, pending: PendingTransition) {
        self.slot.lock().activity = Activity::Absent;
        if self.options.debug {
            tracing::debug!(transition_id = %pending.id, state = %pending.old.name(), "exit state");
        }
        let ids: Arc<[StateId]> = pending.old.ids().into();
        let dispatch = Arc::clone(&pending.dispatch);
        let tree = Arc::clone(&self.tree);
        run_phase(tree, Phase::Exit, ids, 0, dispatch, Box::new(move || self.enter_new(pending)));
    }

    fn enter_new(self: Arc<Self>, pending: PendingTransition) {
        if self.options.debug {
            tracing::debug!(transition_id = %pending.id, state = %pending.new.name(), "enter state");
        }
        let ids: Arc<[StateId]> = pending.new.ids().into();
        let dispatch = Arc::clone(&pending.dispatch);
        let tree = Arc::clone(&self.tree);
        run_phase(tree, Phase::Enter, ids, 0, dispatch, Box::new(move || self.install(pending)));
    }

    fn install(&self, pending: PendingTransition) {
        let PendingTransition {
            id,
            old,
            new,
            dispatch,
            resolved_at,
        } = pending;
        let at = Utc::now();
        let change = StateChange {
            old_state: old.name().to_string(),
            new_state: new.name().to_string(),
            event_type: dispatch.event_type.clone(),
            transition_id: id,
            at,
        };
        {
            let mut slot = self.slot.lock();
            slot.activity = Activity::Active(new);
            slot.generation += 1;
        }
        if self.options.debug {
            tracing::debug!(
                transition_id = %id,
                from = %change.old_state,
                to = %change.new_state,
                elapsed_ms = (at - resolved_at).num_milliseconds(),
                "transition complete"
            );
        }
        self.listeners.emit(&MachineEvent::Change(change));
    }
}

impl fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("active_state", &self.active_state())
            .field("states", &self.shared.tree.len())
            .field("options", &self.shared.options)
            .finish()
    }
}
