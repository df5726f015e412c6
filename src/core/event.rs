//! The per-dispatch event value and the data that travels with it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Key/value data bag handed to guards and hooks.
pub type Context = Map<String, Value>;

/// Merge `overrides` on top of `defaults`. Keys in `overrides` win.
pub fn merge_context(defaults: &Context, overrides: Option<Context>) -> Context {
    let mut merged = defaults.clone();
    if let Some(overrides) = overrides {
        merged.extend(overrides);
    }
    merged
}

/// When a resolved transition is executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Delay {
    /// Run the exit/enter sequence inline, before `fire_state_event` returns.
    #[default]
    Immediate,
    /// Defer to the scheduler's next tick.
    NextTick,
    /// Defer by the given duration.
    After(Duration),
}

impl Delay {
    /// Map the integer millisecond convention onto a `Delay`:
    /// negative is immediate, zero is the next tick, positive is a timer.
    ///
    /// ```rust
    /// use statepath::core::Delay;
    /// use std::time::Duration;
    ///
    /// assert_eq!(Delay::from_millis(-1), Delay::Immediate);
    /// assert_eq!(Delay::from_millis(0), Delay::NextTick);
    /// assert_eq!(Delay::from_millis(50), Delay::After(Duration::from_millis(50)));
    /// ```
    pub fn from_millis(millis: i64) -> Self {
        match millis {
            m if m < 0 => Delay::Immediate,
            0 => Delay::NextTick,
            m => Delay::After(Duration::from_millis(m.unsigned_abs())),
        }
    }

    /// `true` for [`Delay::Immediate`].
    pub fn is_immediate(&self) -> bool {
        matches!(self, Delay::Immediate)
    }

    /// Milliseconds in the integer convention, for diagnostics.
    pub fn as_millis(&self) -> i64 {
        match self {
            Delay::Immediate => -1,
            Delay::NextTick => 0,
            Delay::After(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
        }
    }
}

/// Event threaded through the states of the active path during one dispatch.
///
/// Created fresh by `init` and `fire_state_event`, mutated by the states it
/// bubbles through, then consumed by the machine.
#[derive(Clone, Debug, PartialEq)]
pub struct StateEvent {
    event_type: String,
    context: Context,
    active_state: String,
    target_state: Option<String>,
    delay: Delay,
    cancelled: bool,
}

impl StateEvent {
    /// Create an event with no target requested yet.
    pub fn new(event_type: impl Into<String>, active_state: impl Into<String>, context: Context) -> Self {
        Self {
            event_type: event_type.into(),
            context,
            active_state: active_state.into(),
            target_state: None,
            delay: Delay::Immediate,
            cancelled: false,
        }
    }

    /// Type the event was fired with.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Default context merged with the call context.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Full name of the active state when the event was created.
    pub fn active_state(&self) -> &str {
        &self.active_state
    }

    /// Target requested by the first passing transition.
    pub fn target_state(&self) -> Option<&str> {
        self.target_state.as_deref()
    }

    /// Delay of the requested transition.
    pub fn delay(&self) -> Delay {
        self.delay
    }

    /// Whether bubbling has been stopped.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Request a transition. The first request sticks; later ones are ignored
    /// so that the innermost, earliest passing transition wins.
    ///
    /// Returns `true` if this call set the target.
    pub fn transition(&mut self, target: impl Into<String>, delay: Delay) -> bool {
        if self.target_state.is_some() {
            return false;
        }
        self.target_state = Some(target.into());
        self.delay = delay;
        true
    }

    /// Stop bubbling to the remaining (outer) states.
    pub fn stop_propagation(&mut self) {
        self.cancelled = true;
    }

    pub(crate) fn into_parts(self) -> (String, Context, String, Option<String>, Delay) {
        (
            self.event_type,
            self.context,
            self.active_state,
            self.target_state,
            self.delay,
        )
    }
}
