//! Background one-second clock for a running session.

use crate::session::SessionRunner;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Runner shared between the ticker task and the code handling user input.
pub type SharedRunner = Arc<Mutex<SessionRunner>>;

/// Handle to a spawned ticker. Dropping it stops the ticks.
#[derive(Debug)]
pub struct TickerHandle {
    task: JoinHandle<()>,
}

impl TickerHandle {
    /// Whether the ticker stopped on its own (session done).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Tick `runner` every `period` until the session is done or the handle is
/// dropped. Must be called from within a tokio runtime.
pub fn spawn_ticker(runner: SharedRunner, period: Duration) -> TickerHandle {
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            let done = match runner.lock() {
                Ok(mut runner) => {
                    runner.tick(Utc::now());
                    runner.is_done()
                }
                Err(_) => {
                    tracing::error!("Session runner lock poisoned, stopping ticker");
                    true
                }
            };
            if done {
                tracing::debug!("Session finished, ticker stopped");
                break;
            }
        }
    });

    TickerHandle { task }
}
