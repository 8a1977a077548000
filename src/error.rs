//! Error taxonomy for resolution, input building, and simulation.
//!
//! Resolution- and input-phase errors are fatal to a run: nothing has been
//! computed yet. Step errors halt the day loop but leave already-computed
//! rows valid and eligible for persistence.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    /// A required node, attribute, or baseline scenario is missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A requested scenario id does not exist in the network.
    #[error("scenario {0} not found in network")]
    NotFound(i64),

    /// A dataset payload could not be interpreted.
    #[error("malformed dataset: {0}")]
    DataFormat(String),

    /// A failure inside one day's transition.
    #[error("day {step} ({date}): {message}")]
    Step {
        step: usize,
        date: NaiveDate,
        message: String,
    },

    /// A failure at the scenario-service boundary.
    #[error("scenario service: {0}")]
    Service(String),
}

pub(crate) fn step_error(step: usize, date: NaiveDate, message: impl Into<String>) -> ModelError {
    ModelError::Step {
        step,
        date,
        message: message.into(),
    }
}
