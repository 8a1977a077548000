//! Progress and control boundary between a run and its supervisor.
//!
//! The day loop observes externally-set pause/stop flags and emits one-way
//! progress events. Both directions go through this trait so the core never
//! touches a global; supervised deployments back it with their task fabric,
//! while plain CLI runs and tests use [`NoopEngine`].

use chrono::NaiveDate;

pub trait Engine {
    /// The run is underway; `total_steps` days will be simulated.
    fn start(&self, _total_steps: usize) {}

    /// Progress report at a date boundary.
    fn step(&self, _date: NaiveDate, _step: usize) {}

    /// Whether the supervisor asked the run to hold at the next day boundary.
    fn paused(&self) -> bool {
        false
    }

    /// Whether the supervisor asked the run to terminate early.
    fn stopped(&self) -> bool {
        false
    }

    /// The run observed a stop request and is terminating cleanly.
    fn stop(&self) {}

    /// A day's transition failed; the loop is halting with partial results.
    fn error(&self, _message: &str) {}

    /// The run is complete after `step` committed days.
    fn finish(&self, _step: usize) {}
}

/// Engine for unsupervised runs: never pauses, never stops, reports nothing.
pub struct NoopEngine;

impl Engine for NoopEngine {}
