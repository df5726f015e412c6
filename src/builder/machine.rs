//! Builder for constructing state machines.

use crate::builder::error::BuildError;
use crate::core::{Context, State, StateTree};
use crate::effects::{MachineOptions, Scheduler, StateMachine};
use crate::validation;
use std::sync::Arc;
use stillwater::validation::Validation;

/// Builder for constructing state machines with a fluent API.
pub struct StateMachineBuilder {
    states: Vec<State>,
    context: Context,
    options: MachineOptions,
    scheduler: Option<Arc<dyn Scheduler>>,
    validate: bool,
}

impl StateMachineBuilder {
    /// Create a builder over the given root states.
    pub fn new(states: Vec<State>) -> Self {
        Self {
            states,
            context: Context::new(),
            options: MachineOptions::default(),
            scheduler: None,
            validate: false,
        }
    }

    /// Default context merged into every event.
    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn options(mut self, options: MachineOptions) -> Self {
        self.options = options;
        self
    }

    /// Enable advisory diagnostics.
    pub fn debug(mut self, debug: bool) -> Self {
        self.options.debug = debug;
        self
    }

    /// Scheduler for delayed transitions. Required if any transition is not
    /// immediate.
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Reject trees with definition issues (duplicate siblings, unknown
    /// targets, ...) instead of accepting them as-is.
    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Build the state machine.
    pub fn build(self) -> Result<StateMachine, BuildError> {
        let tree = StateTree::new(self.states);

        if self.validate {
            if let Validation::Failure(issues) = validation::validate(&tree) {
                return Err(BuildError::InvalidDefinition(issues.iter().cloned().collect()));
            }
        }

        if self.scheduler.is_none() {
            let delayed = tree.iter().find_map(|(id, node)| {
                node.state()
                    .transitions()
                    .iter()
                    .find(|t| !t.delay().is_immediate())
                    .map(|t| (id, t.target().to_string()))
            });
            if let Some((id, target)) = delayed {
                return Err(BuildError::MissingScheduler {
                    state: tree.full_name(id),
                    target,
                });
            }
        }

        Ok(StateMachine::from_parts(tree, self.context, self.options, self.scheduler))
    }
}
