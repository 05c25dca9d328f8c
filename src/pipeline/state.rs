//! Dispatch loop lifecycle

use std::time::Instant;

/// Dispatch loop state machine
///
/// A loop runs at most once: Idle -> Running -> Stopping -> Stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Streams are registered, nothing has been read yet
    Idle,

    /// Pulling units from the source
    Running {
        /// When the loop started running
        started_at: Instant,
    },

    /// Pull loop ended, decoders are being closed
    Stopping,

    /// Run finished and cannot be restarted
    Stopped,
}

impl LoopState {
    /// Check if this state transition is valid
    pub fn can_transition_to(&self, target: &LoopState) -> bool {
        use LoopState::*;

        match (self, target) {
            (Idle, Running { .. }) => true,
            // a run can be abandoned before the first pull
            (Idle, Stopping) => true,
            (Running { .. }, Stopping) => true,
            (Stopping, Stopped) => true,
            (Stopped, _) => false,
            _ => false,
        }
    }

    /// Get a human-readable description of this state
    pub fn description(&self) -> &'static str {
        match self {
            LoopState::Idle => "Idle",
            LoopState::Running { .. } => "Running",
            LoopState::Stopping => "Stopping",
            LoopState::Stopped => "Stopped",
        }
    }

    /// Get the duration since the loop started (if running)
    pub fn running_duration(&self) -> Option<std::time::Duration> {
        if let LoopState::Running { started_at } = self {
            Some(started_at.elapsed())
        } else {
            None
        }
    }
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}
