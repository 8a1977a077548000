//! Drives one simulation run end to end.
//!
//! A run is strictly sequential: resolve the attribute map, build the input
//! series, then walk the horizon one day at a time. Pause and stop flags are
//! observed only at day boundaries; a stop preserves everything computed so
//! far, and results are saved whether the loop ran to completion, stopped
//! early, or failed mid-horizon.

use std::thread;
use std::time::{Duration, Instant};

use chrono::Datelike;

use crate::engine::Engine;
use crate::error::ModelError;
use crate::inputs::build_inputs;
use crate::network::{Network, ScenarioId};
use crate::resolve::resolve_attributes;
use crate::save::save_results;
use crate::series::{date_range, parse_scenario_date, TimeStep};
use crate::service::ScenarioService;
use crate::sim::Simulator;

/// Horizon length used for quick debug runs.
pub const DEBUG_HORIZON_DAYS: usize = 5;

/// A pause may not stall a run forever; after this long the loop proceeds to
/// the stop check regardless.
const PAUSE_WAIT_CAP: Duration = Duration::from_secs(86_400);
const PAUSE_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub network_id: i64,
    pub scenario_ids: Vec<ScenarioId>,
    pub run_name: String,
    pub debug: bool,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub total_steps: usize,
    pub completed_steps: usize,
    pub stopped_early: bool,
    /// Error message of a failed day, if the loop halted mid-horizon.
    pub step_error: Option<String>,
    pub results_scenario: String,
}

/// Run one scenario combination: resolve, build inputs, simulate, save.
///
/// Resolution and input errors are fatal and reported through the engine
/// error hook before returning. Step errors halt the loop but still save
/// the rows computed so far.
pub fn run_model(
    service: &impl ScenarioService,
    engine: &impl Engine,
    settings: &RunSettings,
) -> Result<RunSummary, ModelError> {
    match run_inner(service, engine, settings) {
        Ok(summary) => Ok(summary),
        Err(err) => {
            engine.error(&err.to_string());
            Err(err)
        }
    }
}

fn run_inner(
    service: &impl ScenarioService,
    engine: &impl Engine,
    settings: &RunSettings,
) -> Result<RunSummary, ModelError> {
    tracing::info!(
        network_id = settings.network_id,
        scenarios = ?settings.scenario_ids,
        run_name = %settings.run_name,
        "starting run"
    );

    let network = service.get_network(settings.network_id)?;
    let template = service.get_template(network.layout.active_template_id)?;

    let baseline = network.baseline_scenario()?;
    let start = parse_scenario_date(baseline.start_time.as_deref(), "start_time")?;
    let end = parse_scenario_date(baseline.end_time.as_deref(), "end_time")?;
    let step = TimeStep::parse(baseline.time_step.as_deref());
    let mut dates = date_range(start, end, step);
    if settings.debug {
        dates.truncate(DEBUG_HORIZON_DAYS);
    }

    let resolved = resolve_attributes(&network, &settings.scenario_ids, service)?;
    let inputs = build_inputs(&network, &resolved)?;

    let mut sim = Simulator::new(&inputs, &dates);
    engine.start(sim.total_steps());

    let mut stopped_early = false;
    let mut step_error = None;
    for &date in &dates {
        if engine.paused() {
            let pause_start = Instant::now();
            while engine.paused() && pause_start.elapsed() < PAUSE_WAIT_CAP {
                thread::sleep(PAUSE_POLL);
            }
        }
        // Checked after the pause so a run can be stopped while paused.
        if engine.stopped() {
            engine.stop();
            stopped_early = true;
            break;
        }

        if let Err(err) = sim.step() {
            tracing::warn!(%err, "day transition failed, halting loop");
            engine.error(&err.to_string());
            step_error = Some(err.to_string());
            break;
        }

        if date.month() == 10 && date.day() == 1 {
            tracing::info!(%date, "entering water year");
        }
        if date.day() == 1 {
            engine.step(date, sim.completed_steps());
        }
    }

    let completed = sim.completed_steps();
    if let Some(last) = sim.results().last_date() {
        // Final report, in case the cadence skipped the last committed day.
        engine.step(last, completed);
    }
    tracing::debug!(completed, total = dates.len(), "loop finished, saving");

    let override_names = override_scenario_names(&network, &settings.scenario_ids);
    let results = sim.into_results();
    let results_scenario = save_results(
        service,
        &network,
        &template,
        &settings.run_name,
        &override_names,
        &results,
    )?;
    engine.finish(completed);

    Ok(RunSummary {
        total_steps: dates.len(),
        completed_steps: completed,
        stopped_early,
        step_error,
        results_scenario,
    })
}

fn override_scenario_names(network: &Network, scenario_ids: &[ScenarioId]) -> Vec<String> {
    scenario_ids
        .iter()
        .filter_map(|id| network.scenario_by_id(*id))
        .map(|scenario| scenario.name.clone())
        .collect()
}
