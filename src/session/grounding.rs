//! 5-4-3-2-1 sensory grounding.

use chrono::{DateTime, Utc};

/// One sensory prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroundingPrompt {
    pub count: u8,
    pub title: &'static str,
    pub description: &'static str,
}

pub const GROUNDING_PROMPTS: [GroundingPrompt; 5] = [
    GroundingPrompt {
        count: 5,
        title: "Things you see",
        description: "Look around and name 5 things you can see right now.",
    },
    GroundingPrompt {
        count: 4,
        title: "Things you can touch",
        description: "Find 4 things you can touch or feel. Notice their texture.",
    },
    GroundingPrompt {
        count: 3,
        title: "Things you hear",
        description: "Listen closely. Name 3 sounds you can hear in the background.",
    },
    GroundingPrompt {
        count: 2,
        title: "Things you can smell",
        description: "Name 2 things you can smell. Or, find a favorite scent.",
    },
    GroundingPrompt {
        count: 1,
        title: "Thing you can taste",
        description: "Name 1 thing you can taste right now, or just take a sip of water.",
    },
];

/// Result of pressing "Next".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundingStep {
    /// Moved on to the prompt at this index
    Advanced(usize),
    /// The last prompt was confirmed; whole seconds since the exercise began
    Completed(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundingSession {
    started_at: DateTime<Utc>,
    step: usize,
    completed: Option<u32>,
}

impl GroundingSession {
    pub fn start(now: DateTime<Utc>) -> Self {
        Self {
            started_at: now,
            step: 0,
            completed: None,
        }
    }

    pub fn current(&self) -> &'static GroundingPrompt {
        &GROUNDING_PROMPTS[self.step]
    }

    pub fn step_index(&self) -> usize {
        self.step
    }

    /// Percentage of prompts reached, counting the current one.
    pub fn progress(&self) -> f64 {
        (self.step + 1) as f64 / GROUNDING_PROMPTS.len() as f64 * 100.0
    }

    pub fn is_last_step(&self) -> bool {
        self.step == GROUNDING_PROMPTS.len() - 1
    }

    /// Advance one prompt, or complete on the last one. Calling again after
    /// completion returns the same duration.
    pub fn next(&mut self, now: DateTime<Utc>) -> GroundingStep {
        if let Some(duration) = self.completed {
            return GroundingStep::Completed(duration);
        }

        if self.is_last_step() {
            let duration = self.elapsed(now);
            self.completed = Some(duration);
            GroundingStep::Completed(duration)
        } else {
            self.step += 1;
            GroundingStep::Advanced(self.step)
        }
    }

    /// Whole wall-clock seconds since the exercise began.
    pub fn elapsed(&self, now: DateTime<Utc>) -> u32 {
        (now - self.started_at).num_seconds().max(0) as u32
    }
}
