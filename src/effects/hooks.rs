//! Sequential invocation of enter/exit hooks along a state path.

use super::scheduler::Task;
use crate::core::{Context, Done, Hook, StateId, StateTree};
use parking_lot::Mutex;
use std::sync::Arc;

/// Which hook of each state to call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    Enter,
    Exit,
}

/// Frozen data of a dispatched event, shared by every hook of a transition.
#[derive(Debug)]
pub(crate) struct Dispatch {
    pub(crate) event_type: String,
    pub(crate) context: Context,
    /// Active state name at dispatch time; empty for `init`.
    pub(crate) active_state: String,
    pub(crate) target_state: String,
}

impl Dispatch {
    fn state_argument(&self, phase: Phase) -> &str {
        match phase {
            Phase::Enter => &self.active_state,
            Phase::Exit => &self.target_state,
        }
    }
}

/// Hand-over between the walk and the `Done` of an async hook.
enum Handoff {
    /// The hook has not returned yet.
    Running,
    /// `Done` was called before the hook returned; the walk keeps looping.
    Completed,
    /// The hook returned first; `Done` runs the rest of the walk.
    Suspended(Task),
}

/// Call the `phase` hook of every state in `path`, starting at `start`, in
/// path order, then run `then`.
///
/// Sync hooks (and states without a hook) advance immediately. An async hook
/// suspends the walk; its `Done` resumes it at the next state. A `Done`
/// completed before its hook returns continues the same loop, so stack depth
/// does not grow with path length.
pub(crate) fn run_phase(
    tree: Arc<StateTree>,
    phase: Phase,
    path: Arc<[StateId]>,
    start: usize,
    dispatch: Arc<Dispatch>,
    then: Task,
) {
    let mut index = start;
    while let Some(&id) = path.get(index) {
        let state = tree.state(id);
        let hook = match phase {
            Phase::Enter => state.enter_hook(),
            Phase::Exit => state.exit_hook(),
        };
        let argument = dispatch.state_argument(phase);
        match hook {
            None => {}
            Some(Hook::Sync(f)) => f(&dispatch.context, &dispatch.event_type, argument),
            Some(hook @ Hook::Async(_)) => {
                let handoff = Arc::new(Mutex::new(Handoff::Running));
                let resume = {
                    let handoff = Arc::clone(&handoff);
                    Done::new(move || {
                        let previous = std::mem::replace(&mut *handoff.lock(), Handoff::Completed);
                        if let Handoff::Suspended(rest) = previous {
                            rest();
                        }
                    })
                };
                hook.invoke(&dispatch.context, &dispatch.event_type, argument, resume);

                let mut slot = handoff.lock();
                if matches!(*slot, Handoff::Running) {
                    let tree = Arc::clone(&tree);
                    let path = Arc::clone(&path);
                    let dispatch = Arc::clone(&dispatch);
                    *slot = Handoff::Suspended(Box::new(move || {
                        run_phase(tree, phase, path, index + 1, dispatch, then)
                    }));
                    return;
                }
            }
        }
        index += 1;
    }
    then();
}
