//! Controller lifecycle: Unconfigured → Configured → Running → Stopped.
//!
//! `Stopped` is terminal. A stopped controller is never re-armed; build a
//! new one instead.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a [`FocusController`](crate::controller::FocusController).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ControllerState {
    /// Created, no variables or rules built yet.
    #[default]
    Unconfigured = 0,
    /// `setup()` succeeded, no evaluation performed yet.
    Configured = 1,
    /// At least one evaluation performed.
    Running = 2,
    /// Terminal.
    Stopped = 3,
}

impl ControllerState {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Unconfigured),
            1 => Some(Self::Configured),
            2 => Some(Self::Running),
            3 => Some(Self::Stopped),
            _ => None,
        }
    }

    /// Whether evaluations are permitted.
    #[inline]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Configured | Self::Running)
    }
}

/// Lifecycle operation requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Setup,
    Run,
    Stop,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Setup => "setup",
            Self::Run => "run",
            Self::Stop => "stop",
        })
    }
}

/// Result of a lifecycle transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition succeeded, new state.
    Ok(ControllerState),
    /// Transition rejected, state unchanged.
    Rejected(&'static str),
}

/// Target state of `event` from `state`, or `None` if not permitted.
pub const fn next_state(state: ControllerState, event: LifecycleEvent) -> Option<ControllerState> {
    use ControllerState::*;
    use LifecycleEvent::*;

    match (state, event) {
        (Unconfigured, Setup) => Some(Configured),
        (Configured | Running, Run) => Some(Running),
        (Configured | Running, Stop) => Some(Stopped),
        _ => None,
    }
}

/// Holds the current lifecycle state.
#[derive(Debug, Clone, Default)]
pub struct ControllerStateMachine {
    state: ControllerState,
}

impl ControllerStateMachine {
    pub const fn new() -> Self {
        Self {
            state: ControllerState::Unconfigured,
        }
    }

    #[inline]
    pub const fn state(&self) -> ControllerState {
        self.state
    }

    /// Whether `event` would be accepted, without transitioning.
    #[inline]
    pub const fn permits(&self, event: LifecycleEvent) -> bool {
        next_state(self.state, event).is_some()
    }

    /// Attempt a transition given an event.
    pub fn handle_event(&mut self, event: LifecycleEvent) -> TransitionResult {
        match next_state(self.state, event) {
            Some(next) => {
                self.state = next;
                TransitionResult::Ok(next)
            }
            None => TransitionResult::Rejected(rejection_reason(self.state, event)),
        }
    }
}

fn rejection_reason(state: ControllerState, event: LifecycleEvent) -> &'static str {
    use ControllerState::*;
    use LifecycleEvent::*;

    match (state, event) {
        (Stopped, _) => "controller is stopped; construct a new one",
        (_, Setup) => "setup is only valid once, from Unconfigured",
        (Unconfigured, Run) => "run requires a successful setup",
        (Unconfigured, Stop) => "stop requires a successful setup",
        _ => "invalid lifecycle transition",
    }
}
