//! Guided intervention sessions.
//!
//! Every session starts with a short pre-roll countdown, then runs one of
//! three exercises picked by the intervention kind:
//!
//! ```text
//! PreRoll(5s) ──▶ Running(Breathing | Grounding | Pause) ──▶ Completed(duration)
//!      │                          │
//!      └──────── cancel ──────────┴──▶ Cancelled
//! ```
//!
//! The pre-roll is never counted in the reported duration. All exercises
//! report completion the same way: one duration in seconds, handed to the
//! completion callback exactly once.

pub mod breathing;
pub mod grounding;
pub mod pause;
pub mod ticker;

pub use breathing::{BreathPhase, BreathingSession, BreathingState};
pub use grounding::{GroundingPrompt, GroundingSession, GroundingStep, GROUNDING_PROMPTS};
pub use pause::{format_clock, PauseTimer, DEFAULT_PAUSE_SECS};
pub use ticker::{spawn_ticker, SharedRunner, TickerHandle};

use crate::core::catalog::{preparation_text, InterventionDef};
use crate::store::types::{InterventionKind, NewInterventionLog};
use chrono::{DateTime, Utc};

/// Length of the pre-roll countdown in seconds.
pub const PREROLL_SECS: u32 = 5;

/// Session errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Breathing exercise '{0}' has no phase timings")]
    MissingBreathParams(String),
    #[error("Unknown intervention '{0}'")]
    UnknownIntervention(String),
}

/// The exercise behind a running session.
#[derive(Debug, Clone, PartialEq)]
pub enum Exercise {
    Breathing(BreathingSession),
    Grounding(GroundingSession),
    Pause(PauseTimer),
}

impl Exercise {
    /// Build the exercise for a catalog entry, starting at `now`.
    pub fn for_intervention(
        def: &InterventionDef,
        pause_secs: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        match def.kind {
            InterventionKind::Breathing => def
                .params
                .map(|params| Exercise::Breathing(BreathingSession::new(params)))
                .ok_or_else(|| SessionError::MissingBreathParams(def.id.to_string())),
            InterventionKind::Grounding => Ok(Exercise::Grounding(GroundingSession::start(now))),
            InterventionKind::Pause => Ok(Exercise::Pause(PauseTimer::new(pause_secs))),
        }
    }

    /// One second passes. Grounding is driven by the user, not the clock.
    pub fn tick(&mut self) {
        match self {
            Exercise::Breathing(session) => session.tick(),
            Exercise::Pause(timer) => timer.tick(),
            Exercise::Grounding(_) => {}
        }
    }
}

/// A finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Catalog id, e.g. `box-breathing`
    pub intervention_id: &'static str,
    pub kind: InterventionKind,
    pub duration_seconds: u32,
}

impl Completion {
    /// The store record for this completion.
    pub fn to_log(&self) -> NewInterventionLog {
        NewInterventionLog {
            kind: self.kind,
            sub_type: Some(self.intervention_id.to_string()),
            duration_seconds: self.duration_seconds,
            completed: true,
        }
    }
}

/// Where a session currently is.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Seconds left before the exercise starts
    PreRoll(u32),
    Running(Exercise),
    Completed(Completion),
    Cancelled,
}

type CompletionCallback = Box<dyn FnMut(&Completion) + Send>;

/// Drives one intervention session from pre-roll to completion.
pub struct SessionRunner {
    def: &'static InterventionDef,
    pause_secs: u32,
    stage: Stage,
    on_complete: Option<CompletionCallback>,
}

impl std::fmt::Debug for SessionRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRunner")
            .field("intervention", &self.def.id)
            .field("stage", &self.stage)
            .finish()
    }
}

impl SessionRunner {
    /// Create a runner in its pre-roll stage. Breathing entries without phase
    /// timings are rejected up front.
    pub fn new(def: &'static InterventionDef, pause_secs: u32) -> Result<Self, SessionError> {
        if def.kind == InterventionKind::Breathing && def.params.is_none() {
            return Err(SessionError::MissingBreathParams(def.id.to_string()));
        }
        Ok(Self {
            def,
            pause_secs,
            stage: Stage::PreRoll(PREROLL_SECS),
            on_complete: None,
        })
    }

    /// Runner for a catalog id.
    pub fn for_id(id: &str, pause_secs: u32) -> Result<Self, SessionError> {
        let def = crate::core::catalog::find_intervention(id)
            .ok_or_else(|| SessionError::UnknownIntervention(id.to_string()))?;
        Self::new(def, pause_secs)
    }

    /// Register the callback that receives the completion.
    pub fn on_complete(mut self, callback: impl FnMut(&Completion) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn intervention(&self) -> &'static InterventionDef {
        self.def
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn completion(&self) -> Option<Completion> {
        match self.stage {
            Stage::Completed(completion) => Some(completion),
            _ => None,
        }
    }

    /// Whether the session reached a terminal stage.
    pub fn is_done(&self) -> bool {
        matches!(self.stage, Stage::Completed(_) | Stage::Cancelled)
    }

    /// Instructions shown during the pre-roll.
    pub fn preparation(&self) -> &'static str {
        preparation_text(self.def.kind)
    }

    /// One second passes.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        let preroll_over = match &mut self.stage {
            Stage::PreRoll(remaining) => {
                *remaining = remaining.saturating_sub(1);
                *remaining == 0
            }
            Stage::Running(exercise) => {
                exercise.tick();
                false
            }
            Stage::Completed(_) | Stage::Cancelled => false,
        };
        if preroll_over {
            self.start_exercise(now);
        }
    }

    /// "End Session" / "Done Early": report what has been done so far. During
    /// the pre-roll this cancels without a completion.
    pub fn end(&mut self, now: DateTime<Utc>) -> Option<Completion> {
        if matches!(self.stage, Stage::PreRoll(_)) {
            self.stage = Stage::Cancelled;
            return None;
        }
        let duration = match &self.stage {
            Stage::PreRoll(_) | Stage::Cancelled => return None,
            Stage::Running(Exercise::Breathing(session)) => session.elapsed(),
            Stage::Running(Exercise::Grounding(session)) => session.elapsed(now),
            Stage::Running(Exercise::Pause(timer)) => timer.done_early(),
            Stage::Completed(completion) => return Some(*completion),
        };
        Some(self.complete(duration))
    }

    /// "Next" for grounding, "Finish" for a pause that reached zero. Other
    /// stages ignore it.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Option<Completion> {
        let duration = match &mut self.stage {
            Stage::Running(Exercise::Grounding(session)) => match session.next(now) {
                GroundingStep::Advanced(_) => return None,
                GroundingStep::Completed(duration) => duration,
            },
            Stage::Running(Exercise::Pause(timer)) => timer.finish()?,
            Stage::Completed(completion) => return Some(*completion),
            _ => return None,
        };
        Some(self.complete(duration))
    }

    /// Pause or resume a timed pause.
    pub fn toggle_pause(&mut self) {
        if let Stage::Running(Exercise::Pause(timer)) = &mut self.stage {
            timer.toggle();
        }
    }

    /// Abandon the session without reporting.
    pub fn cancel(&mut self) {
        if !self.is_done() {
            self.stage = Stage::Cancelled;
        }
    }

    /// One-line description of the current stage.
    pub fn status_line(&self) -> String {
        match &self.stage {
            Stage::PreRoll(remaining) => format!("Starting in {remaining}..."),
            Stage::Running(Exercise::Breathing(session)) => {
                let state = session.state();
                format!(
                    "{} {}s  [{}]",
                    session.instruction(),
                    state.remaining,
                    format_clock(state.elapsed)
                )
            }
            Stage::Running(Exercise::Grounding(session)) => {
                let prompt = session.current();
                format!(
                    "Step {} of {}: Find {} {}",
                    session.step_index() + 1,
                    GROUNDING_PROMPTS.len(),
                    prompt.count,
                    prompt.title.to_lowercase()
                )
            }
            Stage::Running(Exercise::Pause(timer)) => {
                let label = if timer.is_finished() {
                    "Time's up"
                } else if timer.is_running() {
                    "Focus on being present"
                } else {
                    "Paused"
                };
                format!("{}  {label}", format_clock(timer.remaining()))
            }
            Stage::Completed(completion) => {
                format!("Completed in {}", format_clock(completion.duration_seconds))
            }
            Stage::Cancelled => "Cancelled".to_string(),
        }
    }

    fn start_exercise(&mut self, now: DateTime<Utc>) {
        match Exercise::for_intervention(self.def, self.pause_secs, now) {
            Ok(exercise) => {
                tracing::debug!(intervention = self.def.id, "exercise started");
                self.stage = Stage::Running(exercise);
            }
            Err(e) => {
                tracing::warn!("Could not start exercise: {e}");
                self.stage = Stage::Cancelled;
            }
        }
    }

    fn complete(&mut self, duration_seconds: u32) -> Completion {
        let completion = Completion {
            intervention_id: self.def.id,
            kind: self.def.kind,
            duration_seconds,
        };
        self.stage = Stage::Completed(completion);
        if let Some(callback) = self.on_complete.as_mut() {
            callback(&completion);
        }
        completion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::{Arc, Mutex};

    fn run_preroll(runner: &mut SessionRunner, now: DateTime<Utc>) {
        for _ in 0..PREROLL_SECS {
            runner.tick(now);
        }
    }

    #[test]
    fn test_preroll_precedes_exercise() {
        let mut runner = SessionRunner::for_id("box-breathing", 60).unwrap();
        let now = Utc::now();
        assert_eq!(runner.stage(), &Stage::PreRoll(5));
        assert!(runner.preparation().contains("breath"));

        for expected in (1..5).rev() {
            runner.tick(now);
            assert_eq!(runner.stage(), &Stage::PreRoll(expected));
        }
        runner.tick(now);
        assert!(matches!(
            runner.stage(),
            Stage::Running(Exercise::Breathing(_))
        ));
    }

    #[test]
    fn test_breathing_reports_elapsed_on_end_only() {
        let reported = Arc::new(Mutex::new(Vec::new()));
        let sink = reported.clone();
        let mut runner = SessionRunner::for_id("box-breathing", 60)
            .unwrap()
            .on_complete(move |c| sink.lock().unwrap().push(c.duration_seconds));
        let now = Utc::now();

        run_preroll(&mut runner, now);
        for _ in 0..16 {
            runner.tick(now);
        }
        match runner.stage() {
            Stage::Running(Exercise::Breathing(session)) => {
                assert_eq!(session.state().phase, BreathPhase::Inhale);
                assert_eq!(session.state().remaining, 4);
            }
            other => panic!("unexpected stage {other:?}"),
        }
        assert!(reported.lock().unwrap().is_empty());

        let completion = runner.end(now).unwrap();
        assert_eq!(completion.duration_seconds, 16);
        assert_eq!(completion.intervention_id, "box-breathing");
        assert_eq!(*reported.lock().unwrap(), vec![16]);

        // Ending again neither re-reports nor changes the result
        assert_eq!(runner.end(now), Some(completion));
        assert_eq!(reported.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_grounding_uses_wall_clock_after_preroll() {
        let mut runner = SessionRunner::for_id("5-4-3-2-1-grounding", 60).unwrap();
        let start = Utc::now();
        run_preroll(&mut runner, start);

        for _ in 0..4 {
            assert_eq!(runner.advance(start + Duration::seconds(10)), None);
        }
        let completion = runner.advance(start + Duration::seconds(75)).unwrap();
        assert_eq!(completion.kind, InterventionKind::Grounding);
        assert_eq!(completion.duration_seconds, 75);
    }

    #[test]
    fn test_pause_requires_confirmation() {
        let mut runner = SessionRunner::for_id("1-minute-pause", 3).unwrap();
        let now = Utc::now();
        run_preroll(&mut runner, now);

        assert_eq!(runner.advance(now), None);
        for _ in 0..10 {
            runner.tick(now);
        }
        assert!(!runner.is_done());
        assert!(runner.status_line().contains("Time's up"));

        let completion = runner.advance(now).unwrap();
        assert_eq!(completion.duration_seconds, 3);
        assert!(runner.is_done());
    }

    #[test]
    fn test_pause_done_early_excludes_paused_time() {
        let mut runner = SessionRunner::for_id("1-minute-pause", 60).unwrap();
        let now = Utc::now();
        run_preroll(&mut runner, now);

        for _ in 0..5 {
            runner.tick(now);
        }
        runner.toggle_pause();
        for _ in 0..5 {
            runner.tick(now);
        }
        assert!(runner.status_line().contains("Paused"));
        assert_eq!(runner.end(now).unwrap().duration_seconds, 5);
    }

    #[test]
    fn test_end_during_preroll_cancels() {
        let reported = Arc::new(Mutex::new(0));
        let sink = reported.clone();
        let mut runner = SessionRunner::for_id("box-breathing", 60)
            .unwrap()
            .on_complete(move |_| *sink.lock().unwrap() += 1);

        runner.tick(Utc::now());
        assert_eq!(runner.end(Utc::now()), None);
        assert_eq!(runner.stage(), &Stage::Cancelled);
        assert_eq!(*reported.lock().unwrap(), 0);
    }

    #[test]
    fn test_completion_to_log() {
        let completion = Completion {
            intervention_id: "4-7-8-breathing",
            kind: InterventionKind::Breathing,
            duration_seconds: 95,
        };
        let log = completion.to_log();
        assert_eq!(log.sub_type.as_deref(), Some("4-7-8-breathing"));
        assert!(log.completed);
    }

    #[test]
    fn test_unknown_intervention() {
        assert!(matches!(
            SessionRunner::for_id("cold-plunge", 60),
            Err(SessionError::UnknownIntervention(_))
        ));
    }
}
