//! Nudge lifecycle: `Idle -> Active -> Idle`.
//!
//! Triggering while active overwrites the payload and stays active. There is
//! no timeout; only an explicit dismissal returns to idle.

use crate::store::types::{NudgePatch, NudgeState};

/// Lifecycle phase of the nudge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NudgePhase {
    Idle,
    Active,
}

/// Owns the nudge payload and the only transitions allowed on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NudgeMachine {
    state: NudgeState,
}

impl NudgeMachine {
    /// Resume from a persisted payload.
    pub fn from_state(state: NudgeState) -> Self {
        Self { state }
    }

    pub fn phase(&self) -> NudgePhase {
        if self.state.active {
            NudgePhase::Active
        } else {
            NudgePhase::Idle
        }
    }

    pub fn state(&self) -> &NudgeState {
        &self.state
    }

    pub fn into_state(self) -> NudgeState {
        self.state
    }

    /// Merge `patch` into the payload and activate.
    pub fn trigger(&mut self, patch: NudgePatch) {
        if let Some(message) = patch.message {
            self.state.message = message;
        }
        if let Some(kind) = patch.kind {
            self.state.kind = kind;
        }
        if let Some(context) = patch.context {
            self.state.context = context;
        }
        self.state.active = true;
    }

    /// Deactivate, keeping the last payload for display history.
    pub fn dismiss(&mut self) {
        self.state.active = false;
    }
}
