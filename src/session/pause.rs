//! Timed pause: a countdown that can be paused and resumed.
//!
//! Reaching zero stops the countdown but does not complete the session; the
//! user still confirms with "Finish". "Done Early" reports at any point.

/// Default pause length in seconds.
pub const DEFAULT_PAUSE_SECS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PauseTimer {
    duration: u32,
    remaining: u32,
    elapsed: u32,
    running: bool,
}

impl PauseTimer {
    /// Start a running countdown of `duration` seconds.
    pub fn new(duration: u32) -> Self {
        Self {
            duration,
            remaining: duration,
            elapsed: 0,
            running: duration > 0,
        }
    }

    pub fn tick(&mut self) {
        if !self.running {
            return;
        }
        self.remaining = self.remaining.saturating_sub(1);
        self.elapsed += 1;
        if self.remaining == 0 {
            self.running = false;
        }
    }

    /// Pause or resume. Has no effect once the countdown reached zero.
    pub fn toggle(&mut self) {
        if !self.is_finished() {
            self.running = !self.running;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_finished(&self) -> bool {
        self.remaining == 0
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Seconds actually counted down (paused time excluded).
    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    /// Percentage of the countdown consumed.
    pub fn progress(&self) -> f64 {
        if self.duration == 0 {
            return 100.0;
        }
        (self.duration - self.remaining) as f64 / self.duration as f64 * 100.0
    }

    /// Confirm completion. Only available once the countdown reached zero.
    pub fn finish(&self) -> Option<u32> {
        self.is_finished().then_some(self.elapsed)
    }

    /// Stop before the end, reporting the seconds counted so far.
    pub fn done_early(&self) -> u32 {
        self.elapsed
    }
}

impl Default for PauseTimer {
    fn default() -> Self {
        Self::new(DEFAULT_PAUSE_SECS)
    }
}

/// `m:ss` rendering used by the countdown display.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
