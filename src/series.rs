//! Date-indexed numeric series and horizon construction.

use chrono::{Months, NaiveDate};

use crate::error::ModelError;

/// Simulation step width, from the baseline scenario's `time_step` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeStep {
    Day,
    Month,
}

impl TimeStep {
    /// Interpret the service's `time_step` tag. Anything other than `month`
    /// falls back to daily, matching the reference behavior.
    pub fn parse(tag: Option<&str>) -> TimeStep {
        match tag {
            Some("month") => TimeStep::Month,
            _ => TimeStep::Day,
        }
    }
}

/// Immutable date-indexed sequence of numeric values, sorted ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    points: Vec<(NaiveDate, f64)>,
}

impl TimeSeries {
    /// Build a series from unordered pairs. Duplicate dates keep the last
    /// value given.
    pub fn from_pairs(mut pairs: Vec<(NaiveDate, f64)>) -> TimeSeries {
        pairs.sort_by_key(|(date, _)| *date);
        let mut points: Vec<(NaiveDate, f64)> = Vec::with_capacity(pairs.len());
        for (date, value) in pairs {
            match points.last_mut() {
                Some(last) if last.0 == date => last.1 = value,
                _ => points.push((date, value)),
            }
        }
        TimeSeries { points }
    }

    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |(d, _)| *d)
            .ok()
            .map(|idx| self.points[idx].1)
    }

    /// Multiply every value by a constant factor (unit conversion).
    pub fn scale(mut self, factor: f64) -> TimeSeries {
        for (_, value) in &mut self.points {
            *value *= factor;
        }
        self
    }

    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Inclusive date sequence from `start` to `end` at the given step width.
///
/// Monthly stepping advances by calendar months from the start date,
/// clamping short months.
pub fn date_range(start: NaiveDate, end: NaiveDate, step: TimeStep) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    match step {
        TimeStep::Day => {
            let mut current = start;
            while current <= end {
                dates.push(current);
                match current.succ_opt() {
                    Some(next) => current = next,
                    None => break,
                }
            }
        }
        TimeStep::Month => {
            let mut offset = 0;
            while let Some(current) = start.checked_add_months(Months::new(offset)) {
                if current > end {
                    break;
                }
                dates.push(current);
                offset += 1;
            }
        }
    }
    dates
}

/// Extract the calendar date from an ISO-8601 timestamp.
///
/// Accepts plain dates, `T`- or space-separated timestamps, and a trailing
/// `Z` suffix, which covers both service payloads and saved results keys.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim().trim_end_matches('Z');
    let date_part = trimmed
        .split_once('T')
        .or_else(|| trimmed.split_once(' '))
        .map(|(date, _)| date)
        .unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Parse a scenario horizon field, naming the field in the error.
pub fn parse_scenario_date(raw: Option<&str>, field: &str) -> Result<NaiveDate, ModelError> {
    let raw = raw.ok_or_else(|| {
        ModelError::Configuration(format!("baseline scenario has no {field}"))
    })?;
    parse_iso_date(raw).ok_or_else(|| {
        ModelError::Configuration(format!("baseline scenario {field} '{raw}' is not a date"))
    })
}
