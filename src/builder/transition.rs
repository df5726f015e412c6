//! Builder for constructing state transitions.

use crate::builder::error::BuildError;
use crate::core::{Context, Delay, Guard, Transition};

/// Builder for constructing transitions with a fluent API.
#[derive(Clone, Debug, Default)]
pub struct TransitionBuilder {
    event_types: Vec<String>,
    target: Option<String>,
    guard: Option<Guard>,
    delay: Delay,
    stop_propagation: bool,
    stop_immediate_propagation: bool,
}

impl TransitionBuilder {
    /// Create a new transition builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event type this transition handles (at least one is required).
    pub fn on(mut self, event_type: impl Into<String>) -> Self {
        self.event_types.push(event_type.into());
        self
    }

    /// Add several event types at once.
    pub fn on_any<I, T>(mut self, event_types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.event_types.extend(event_types.into_iter().map(Into::into));
        self
    }

    /// Set the full name of the target state (required).
    pub fn to(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Add a guard (optional).
    pub fn guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Add a guard using a closure over `(context, event_type, active_state)`.
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Context, &str, &str) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::new(predicate));
        self
    }

    pub fn delay(mut self, delay: Delay) -> Self {
        self.delay = delay;
        self
    }

    /// Set the delay in the integer millisecond convention.
    pub fn delay_ms(self, millis: i64) -> Self {
        self.delay(Delay::from_millis(millis))
    }

    /// Stop the event from reaching outer states once this state is done.
    pub fn stop_propagation(mut self) -> Self {
        self.stop_propagation = true;
        self
    }

    /// Stop the event right after this transition.
    pub fn stop_immediate_propagation(mut self) -> Self {
        self.stop_immediate_propagation = true;
        self
    }

    /// Build the transition.
    pub fn build(self) -> Result<Transition, BuildError> {
        if self.event_types.is_empty() {
            return Err(BuildError::MissingEventType);
        }
        if self.event_types.iter().any(String::is_empty) {
            return Err(BuildError::EmptyEventType);
        }
        let target = self
            .target
            .filter(|t| !t.is_empty())
            .ok_or(BuildError::MissingTarget)?;

        Ok(Transition {
            event_types: self.event_types,
            target,
            guard: self.guard,
            delay: self.delay,
            stop_propagation: self.stop_propagation,
            stop_immediate_propagation: self.stop_immediate_propagation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn builder_validates_required_fields() {
        let result = TransitionBuilder::new().to("a").build();
        assert!(matches!(result, Err(BuildError::MissingEventType)));

        let result = TransitionBuilder::new().on("go").build();
        assert!(matches!(result, Err(BuildError::MissingTarget)));
    }

    #[test]
    fn builder_rejects_empty_strings() {
        let result = TransitionBuilder::new().on("").to("a").build();
        assert!(matches!(result, Err(BuildError::EmptyEventType)));

        let result = TransitionBuilder::new().on("go").to("").build();
        assert!(matches!(result, Err(BuildError::MissingTarget)));
    }

    #[test]
    fn fluent_api_builds_transition() {
        let transition = TransitionBuilder::new()
            .on_any(["start", "resume"])
            .to("root.active")
            .delay_ms(50)
            .stop_propagation()
            .build()
            .unwrap();

        assert_eq!(transition.event_types(), ["start", "resume"]);
        assert_eq!(transition.target(), "root.active");
        assert_eq!(transition.delay(), Delay::After(Duration::from_millis(50)));
        assert!(transition.stops_propagation());
        assert!(!transition.stops_immediate_propagation());
    }

    #[test]
    fn defaults_are_immediate_and_propagating() {
        let transition = TransitionBuilder::new().on("go").to("b").build().unwrap();

        assert!(transition.delay().is_immediate());
        assert!(!transition.stops_propagation());
        assert!(!transition.stops_immediate_propagation());
    }
}
