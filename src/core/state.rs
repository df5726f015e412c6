//! State definitions and per-state event handling.
//!
//! A `State` is a node of the state tree: a name that is unique among its
//! siblings, owned child states, owned transitions and optional hooks.
//! Trees are built once and handed to the machine, which flattens them into
//! a [`StateTree`](super::StateTree).

use super::event::StateEvent;
use super::hook::Hook;
use super::transition::Transition;

/// A node of the state tree.
///
/// # Example
///
/// ```rust
/// use statepath::builder::simple_transition;
/// use statepath::core::State;
///
/// let root = State::new("root")
///     .child(State::new("idle").transition(simple_transition("start", "root.active")))
///     .child(State::new("active").transition(simple_transition("stop", "root.idle")));
///
/// assert_eq!(root.name(), "root");
/// assert_eq!(root.children().len(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct State {
    name: String,
    pub(crate) children: Vec<State>,
    transitions: Vec<Transition>,
    on_enter: Option<Hook>,
    on_exit: Option<Hook>,
}

impl State {
    /// Create a state without children, transitions or hooks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            transitions: Vec::new(),
            on_enter: None,
            on_exit: None,
        }
    }

    /// Append a child state.
    pub fn child(mut self, state: State) -> Self {
        self.children.push(state);
        self
    }

    /// Append several child states, keeping their order.
    pub fn children_from(mut self, states: impl IntoIterator<Item = State>) -> Self {
        self.children.extend(states);
        self
    }

    /// Append a transition. Declaration order is evaluation order.
    pub fn transition(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Set the hook run when this state becomes part of the active path.
    pub fn on_enter(mut self, hook: Hook) -> Self {
        self.on_enter = Some(hook);
        self
    }

    /// Set the hook run when this state leaves the active path.
    pub fn on_exit(mut self, hook: Hook) -> Self {
        self.on_exit = Some(hook);
        self
    }

    /// Name of this state, unique among its siblings.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Child definitions. Empty once the state is part of a [`StateTree`](super::StateTree).
    pub fn children(&self) -> &[State] {
        &self.children
    }

    /// Transitions in declaration order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Enter hook, if any.
    pub fn enter_hook(&self) -> Option<&Hook> {
        self.on_enter.as_ref()
    }

    /// Exit hook, if any.
    pub fn exit_hook(&self) -> Option<&Hook> {
        self.on_exit.as_ref()
    }

    /// Transitions that handle `event_type`, in declaration order.
    pub fn transitions_for<'a>(&'a self, event_type: &'a str) -> impl Iterator<Item = &'a Transition> + 'a {
        self.transitions.iter().filter(move |t| t.matches(event_type))
    }

    /// Evaluate this state's matching transitions against `event`.
    ///
    /// Every matching transition is evaluated in order. A passing guard
    /// requests the transition (only the first request sticks). A
    /// `stop_propagation` flag cancels bubbling to outer states but lets the
    /// remaining transitions here run; `stop_immediate_propagation` cancels
    /// and stops right away.
    pub fn handle_event(&self, event: &mut StateEvent) {
        let event_type = event.event_type().to_string();
        for transition in self.transitions_for(&event_type) {
            if transition.test(event) {
                event.transition(transition.target(), transition.delay());
            }
            if transition.stops_propagation() {
                event.stop_propagation();
            }
            if transition.stops_immediate_propagation() {
                event.stop_propagation();
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{simple_transition, TransitionBuilder};
    use crate::core::{Context, Delay};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn event(event_type: &str) -> StateEvent {
        StateEvent::new(event_type, "s", Context::new())
    }

    fn counting_guard(
        counter: &Arc<AtomicUsize>,
        result: bool,
    ) -> impl Fn(&Context, &str, &str) -> bool + Send + Sync + 'static {
        let counter = Arc::clone(counter);
        move |_, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            result
        }
    }

    #[test]
    fn unmatched_event_leaves_event_untouched() {
        let state = State::new("s").transition(simple_transition("go", "t"));
        let mut ev = event("other");

        state.handle_event(&mut ev);

        assert_eq!(ev.target_state(), None);
        assert!(!ev.is_cancelled());
    }

    #[test]
    fn first_passing_transition_sets_target() {
        let state = State::new("s")
            .transition(TransitionBuilder::new().on("go").to("blocked").when(|_, _, _| false).build().unwrap())
            .transition(TransitionBuilder::new().on("go").to("first").delay(Delay::NextTick).build().unwrap())
            .transition(simple_transition("go", "second"));
        let mut ev = event("go");

        state.handle_event(&mut ev);

        assert_eq!(ev.target_state(), Some("first"));
        assert_eq!(ev.delay(), Delay::NextTick);
    }

    #[test]
    fn later_transitions_are_still_evaluated() {
        let evaluated = Arc::new(AtomicUsize::new(0));
        let state = State::new("s")
            .transition(simple_transition("go", "first"))
            .transition(
                TransitionBuilder::new()
                    .on("go")
                    .to("second")
                    .when(counting_guard(&evaluated, true))
                    .stop_propagation()
                    .build()
                    .unwrap(),
            );
        let mut ev = event("go");

        state.handle_event(&mut ev);

        assert_eq!(evaluated.load(Ordering::SeqCst), 1);
        assert_eq!(ev.target_state(), Some("first"));
        assert!(ev.is_cancelled());
    }

    #[test]
    fn stop_propagation_flag_applies_even_when_guard_fails() {
        let state = State::new("s").transition(
            TransitionBuilder::new()
                .on("go")
                .to("t")
                .when(|_, _, _| false)
                .stop_propagation()
                .build()
                .unwrap(),
        );
        let mut ev = event("go");

        state.handle_event(&mut ev);

        assert_eq!(ev.target_state(), None);
        assert!(ev.is_cancelled());
    }

    #[test]
    fn stop_immediate_propagation_skips_remaining_transitions() {
        let evaluated = Arc::new(AtomicUsize::new(0));
        let state = State::new("s")
            .transition(
                TransitionBuilder::new()
                    .on("go")
                    .to("t")
                    .when(|_, _, _| false)
                    .stop_immediate_propagation()
                    .build()
                    .unwrap(),
            )
            .transition(
                TransitionBuilder::new()
                    .on("go")
                    .to("u")
                    .when(counting_guard(&evaluated, true))
                    .build()
                    .unwrap(),
            );
        let mut ev = event("go");

        state.handle_event(&mut ev);

        assert_eq!(evaluated.load(Ordering::SeqCst), 0);
        assert_eq!(ev.target_state(), None);
        assert!(ev.is_cancelled());
    }

    #[test]
    fn transitions_for_filters_by_type() {
        let state = State::new("s")
            .transition(simple_transition("a", "x"))
            .transition(TransitionBuilder::new().on("b").on("a").to("y").build().unwrap())
            .transition(simple_transition("b", "z"));

        let targets: Vec<&str> = state.transitions_for("a").map(|t| t.target()).collect();
        assert_eq!(targets, vec!["x", "y"]);
    }
}
