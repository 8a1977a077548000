//! Daily reservoir-operation state machine.
//!
//! Each day partitions the available water (carry-over storage plus inflow)
//! among instream release, agricultural release, and storage. The run is a
//! strict first-order recurrence: a day's row depends only on the previous
//! row and that day's inputs, and once appended it is never revised.

use chrono::NaiveDate;

use crate::error::{step_error, ModelError};
use crate::inputs::ModelInputs;

/// One committed day of results.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayResult {
    pub date: NaiveDate,
    pub storage: f64,
    pub ag_delivery: f64,
    pub instream_delivery: f64,
    pub outflow: f64,
}

/// The four persisted result columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultField {
    Storage,
    AgDelivery,
    InstreamDelivery,
    Outflow,
}

/// Append-only, date-indexed results table.
#[derive(Debug, Clone, Default)]
pub struct ResultsTable {
    rows: Vec<DayResult>,
}

impl ResultsTable {
    pub fn rows(&self) -> &[DayResult] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|row| row.date)
    }

    /// One column as date/value pairs, in day order.
    pub fn column(&self, field: ResultField) -> Vec<(NaiveDate, f64)> {
        self.rows
            .iter()
            .map(|row| {
                let value = match field {
                    ResultField::Storage => row.storage,
                    ResultField::AgDelivery => row.ag_delivery,
                    ResultField::InstreamDelivery => row.instream_delivery,
                    ResultField::Outflow => row.outflow,
                };
                (row.date, value)
            })
            .collect()
    }
}

/// How one day's available water is split between the river and the canal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Allocation {
    pub river_release: f64,
    pub ag_release: f64,
}

/// Priority allocation for one day. The four cases are ordered and mutually
/// exclusive; ties on a boundary fall into the lower-numbered case.
///
/// 1. Not enough for the instream requirement: everything goes to the river.
/// 2. Requirement met but demand shorted: the river gets the requirement,
///    agriculture the residual.
/// 3. Both served in full, no spill.
/// 4. Spill: agriculture is served in full and the river release is computed
///    from the current inflow only (`inflow - ag_release`), leaving any
///    stored surplus above capacity in place. This is the operating policy
///    as practiced, reproduced as-is.
pub fn allocate(available: f64, inflow: f64, ifr: f64, demand: f64, capacity: f64) -> Allocation {
    if available <= ifr {
        Allocation {
            river_release: available,
            ag_release: 0.0,
        }
    } else if available <= ifr + demand {
        Allocation {
            river_release: ifr,
            ag_release: available - ifr,
        }
    } else if available <= capacity {
        Allocation {
            river_release: ifr,
            ag_release: demand,
        }
    } else {
        Allocation {
            river_release: inflow - demand,
            ag_release: demand,
        }
    }
}

/// Walks the date sequence one day at a time, accumulating the results
/// table. The caller owns the loop so it can check pause/stop flags between
/// days.
pub struct Simulator<'a> {
    inputs: &'a ModelInputs,
    dates: &'a [NaiveDate],
    storage: f64,
    day_index: usize,
    results: ResultsTable,
}

impl<'a> Simulator<'a> {
    pub fn new(inputs: &'a ModelInputs, dates: &'a [NaiveDate]) -> Simulator<'a> {
        Simulator {
            inputs,
            dates,
            storage: inputs.initial_storage,
            day_index: 0,
            results: ResultsTable::default(),
        }
    }

    pub fn total_steps(&self) -> usize {
        self.dates.len()
    }

    pub fn completed_steps(&self) -> usize {
        self.results.len()
    }

    pub fn is_finished(&self) -> bool {
        self.day_index >= self.dates.len()
    }

    /// Run one day's transition and commit the row.
    ///
    /// A missing input value fails the step without touching state, so
    /// already-committed rows stay valid.
    pub fn step(&mut self) -> Result<(), ModelError> {
        let step = self.day_index;
        let date = *self
            .dates
            .get(step)
            .ok_or_else(|| step_error(step, NaiveDate::MAX, "stepped past end of horizon"))?;

        let inflow = self
            .inputs
            .inflow
            .value_on(date)
            .ok_or_else(|| step_error(step, date, "no inflow value"))?;
        let demand = self
            .inputs
            .demand
            .value_on(date)
            .ok_or_else(|| step_error(step, date, "no agricultural demand value"))?;
        let ifr = self
            .inputs
            .ifr
            .value_on(date)
            .ok_or_else(|| step_error(step, date, "no instream flow requirement value"))?;

        let available = self.storage + inflow;
        let allocation = allocate(available, inflow, ifr, demand, self.inputs.capacity);
        let storage =
            self.storage + inflow - (allocation.ag_release + allocation.river_release);

        self.storage = storage;
        self.day_index += 1;
        self.results.rows.push(DayResult {
            date,
            storage,
            ag_delivery: allocation.ag_release,
            instream_delivery: allocation.river_release,
            // Outflow equals river release in this single-reservoir model.
            outflow: allocation.river_release,
        });
        Ok(())
    }

    pub fn results(&self) -> &ResultsTable {
        &self.results
    }

    pub fn into_results(self) -> ResultsTable {
        self.results
    }
}
