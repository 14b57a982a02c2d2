//! Paced breathing: `inhale -> hold-in -> exhale -> hold-out -> inhale ...`.
//!
//! Holds with a zero duration are skipped entirely. Inhale and exhale always
//! last at least one second.

use crate::core::catalog::BreathParams;

/// Phase of a breathing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreathPhase {
    Inhale,
    HoldIn,
    Exhale,
    HoldOut,
}

impl BreathPhase {
    /// On-screen instruction for the phase.
    pub fn instruction(&self) -> &'static str {
        match self {
            BreathPhase::Inhale => "Breathe In",
            BreathPhase::HoldIn | BreathPhase::HoldOut => "Hold",
            BreathPhase::Exhale => "Breathe Out",
        }
    }

    fn seconds(&self, params: &BreathParams) -> u32 {
        match self {
            BreathPhase::Inhale => params.inhale.max(1),
            BreathPhase::HoldIn => params.hold_in,
            BreathPhase::Exhale => params.exhale.max(1),
            BreathPhase::HoldOut => params.hold_out,
        }
    }

    /// The phase after this one, skipping zero-length holds.
    fn next(&self, params: &BreathParams) -> BreathPhase {
        match self {
            BreathPhase::Inhale if params.hold_in > 0 => BreathPhase::HoldIn,
            BreathPhase::Inhale | BreathPhase::HoldIn => BreathPhase::Exhale,
            BreathPhase::Exhale if params.hold_out > 0 => BreathPhase::HoldOut,
            BreathPhase::Exhale | BreathPhase::HoldOut => BreathPhase::Inhale,
        }
    }
}

/// Immutable breathing state. Advance it with [`BreathingState::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreathingState {
    pub phase: BreathPhase,
    /// Seconds left in the current phase
    pub remaining: u32,
    /// Seconds since the exercise started
    pub elapsed: u32,
    /// Completed full cycles
    pub cycles: u32,
}

impl BreathingState {
    pub fn start(params: &BreathParams) -> Self {
        Self {
            phase: BreathPhase::Inhale,
            remaining: BreathPhase::Inhale.seconds(params),
            elapsed: 0,
            cycles: 0,
        }
    }

    /// State after `seconds` one-second ticks.
    pub fn tick(self, params: &BreathParams, seconds: u32) -> Self {
        (0..seconds).fold(self, |state, _| state.step(params))
    }

    fn step(self, params: &BreathParams) -> Self {
        let elapsed = self.elapsed + 1;
        if self.remaining > 1 {
            return Self {
                remaining: self.remaining - 1,
                elapsed,
                ..self
            };
        }

        let phase = self.phase.next(params);
        let cycles = if phase == BreathPhase::Inhale {
            self.cycles + 1
        } else {
            self.cycles
        };
        Self {
            phase,
            remaining: phase.seconds(params),
            elapsed,
            cycles,
        }
    }
}

/// A running breathing exercise. It only ends when the user ends it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreathingSession {
    params: BreathParams,
    state: BreathingState,
}

impl BreathingSession {
    pub fn new(params: BreathParams) -> Self {
        Self {
            params,
            state: BreathingState::start(&params),
        }
    }

    pub fn params(&self) -> &BreathParams {
        &self.params
    }

    pub fn state(&self) -> BreathingState {
        self.state
    }

    pub fn tick(&mut self) {
        self.state = self.state.tick(&self.params, 1);
    }

    /// Total seconds breathed so far; reported when the session ends.
    pub fn elapsed(&self) -> u32 {
        self.state.elapsed
    }

    pub fn instruction(&self) -> &'static str {
        self.state.phase.instruction()
    }
}
