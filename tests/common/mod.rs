//! Shared test infrastructure: an in-memory scenario service and a
//! recording engine, plus a small basin fixture.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

use chrono::{Days, NaiveDate};

use slop::engine::Engine;
use slop::error::ModelError;
use slop::network::{
    Dataset, Network, NetworkLayout, Node, ResourceAttr, ResourceScenario, ResultsScenario,
    Scenario, ScenarioData, ScenarioId, ScenarioLayout, Template, TemplateType, TypeAttr,
    TypeMembership,
};
use slop::resolve::ScenarioSource;
use slop::service::ScenarioService;

pub const NETWORK_ID: i64 = 1548;
pub const TEMPLATE_ID: i64 = 7;
pub const BASELINE_ID: ScenarioId = 1;
pub const HIGH_DEMAND_ID: ScenarioId = 2;

pub const INFLOW_ATTR: i64 = 101;
pub const DEMAND_ATTR: i64 = 102;
pub const IFR_ATTR: i64 = 103;
pub const CAPACITY_ATTR: i64 = 104;
pub const INITIAL_STORAGE_ATTR: i64 = 105;

pub const HORIZON_DAYS: usize = 30;
pub const INFLOW_RATE: f64 = 100.0;
pub const DEMAND_RATE: f64 = 10.0;
pub const HIGH_DEMAND_RATE: f64 = 30.0;
pub const IFR_RATE: f64 = 5.0;
pub const INITIAL_STORAGE: f64 = 50.0;

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

/// What the service was asked to persist.
#[derive(Debug, Clone)]
pub enum SavedCall {
    Added {
        network_id: i64,
        scenario: ResultsScenario,
    },
    Updated {
        scenario_id: ScenarioId,
        scenario: ResultsScenario,
    },
}

impl SavedCall {
    pub fn scenario(&self) -> &ResultsScenario {
        match self {
            SavedCall::Added { scenario, .. } => scenario,
            SavedCall::Updated { scenario, .. } => scenario,
        }
    }
}

/// In-memory stand-in for the scenario service.
pub struct InMemoryService {
    pub network: Network,
    pub template: Template,
    pub data: HashMap<ScenarioId, ScenarioData>,
    pub saved: RefCell<Vec<SavedCall>>,
    pub created_attrs: RefCell<Vec<(i64, i64)>>,
    next_attr_id: Cell<i64>,
}

impl ScenarioSource for InMemoryService {
    fn scenario_data(&self, id: ScenarioId) -> Result<ScenarioData, ModelError> {
        self.data.get(&id).cloned().ok_or(ModelError::NotFound(id))
    }
}

impl ScenarioService for InMemoryService {
    fn get_network(&self, network_id: i64) -> Result<Network, ModelError> {
        if network_id == self.network.id {
            Ok(self.network.clone())
        } else {
            Err(ModelError::Service(format!("unknown network {network_id}")))
        }
    }

    fn get_template(&self, template_id: i64) -> Result<Template, ModelError> {
        if template_id == self.template.id {
            Ok(self.template.clone())
        } else {
            Err(ModelError::Service(format!("unknown template {template_id}")))
        }
    }

    fn add_resource_attribute(
        &self,
        node_id: i64,
        attr_id: i64,
    ) -> Result<ResourceAttr, ModelError> {
        self.created_attrs.borrow_mut().push((node_id, attr_id));
        let id = self.next_attr_id.get();
        self.next_attr_id.set(id + 1);
        Ok(ResourceAttr {
            id,
            name: format!("attr-{attr_id}"),
            attr_id,
            is_var: true,
        })
    }

    fn add_scenario(
        &self,
        network_id: i64,
        scenario: &ResultsScenario,
    ) -> Result<(), ModelError> {
        self.saved.borrow_mut().push(SavedCall::Added {
            network_id,
            scenario: scenario.clone(),
        });
        Ok(())
    }

    fn update_scenario(
        &self,
        scenario_id: ScenarioId,
        scenario: &ResultsScenario,
    ) -> Result<(), ModelError> {
        self.saved.borrow_mut().push(SavedCall::Updated {
            scenario_id,
            scenario: scenario.clone(),
        });
        Ok(())
    }
}

fn node(id: i64, name: &str, type_name: &str, attrs: &[(i64, &str)]) -> Node {
    Node {
        id,
        name: name.to_string(),
        types: vec![TypeMembership {
            name: type_name.to_string(),
            template_id: TEMPLATE_ID,
        }],
        attributes: attrs
            .iter()
            .map(|(attr_id, attr_name)| ResourceAttr {
                id: *attr_id,
                name: attr_name.to_string(),
                attr_id: *attr_id,
                is_var: false,
            })
            .collect(),
    }
}

fn template_type(name: &str, attrs: &[(i64, &str)]) -> TemplateType {
    TemplateType {
        name: name.to_string(),
        type_attrs: attrs
            .iter()
            .map(|(attr_id, attr_name)| TypeAttr {
                attr_id: *attr_id,
                unit_id: Some(900 + attr_id),
                attr: slop::network::AttrName {
                    name: attr_name.to_string(),
                },
            })
            .collect(),
    }
}

/// Flat ISO-keyed series payload over the fixture horizon, optionally
/// leaving one day out.
pub fn constant_series_json(value: f64, skip_day: Option<usize>) -> String {
    let mut map = serde_json::Map::new();
    for offset in 0..HORIZON_DAYS {
        if skip_day == Some(offset) {
            continue;
        }
        let date = start_date() + Days::new(offset as u64);
        let key = format!("{}T00:00:00.000Z", date.format("%Y-%m-%d"));
        map.insert(key, serde_json::Value::from(value));
    }
    serde_json::Value::Object(map).to_string()
}

pub fn timeseries_dataset(value: String) -> Dataset {
    Dataset {
        kind: "timeseries".to_string(),
        value: Some(value),
        ..Dataset::default()
    }
}

pub fn scalar_dataset(value: &str) -> Dataset {
    Dataset {
        kind: "scalar".to_string(),
        value: Some(value.to_string()),
        ..Dataset::default()
    }
}

pub fn function_dataset(expression: &str) -> Dataset {
    let mut metadata = BTreeMap::new();
    metadata.insert(
        "input_method".to_string(),
        serde_json::Value::String("function".to_string()),
    );
    metadata.insert(
        "data".to_string(),
        serde_json::Value::String(expression.to_string()),
    );
    Dataset {
        kind: "descriptor".to_string(),
        metadata,
        ..Dataset::default()
    }
}

fn entry(resource_attr_id: i64, dataset: Dataset) -> ResourceScenario {
    ResourceScenario {
        resource_attr_id,
        dataset,
    }
}

/// A 30-day single-reservoir basin with a baseline and one override layer.
pub fn basin_service() -> InMemoryService {
    let network = Network {
        id: NETWORK_ID,
        name: "Test basin".to_string(),
        layout: NetworkLayout {
            active_template_id: TEMPLATE_ID,
        },
        nodes: vec![
            node(10, "Headwater", "Inflow", &[(INFLOW_ATTR, "Runoff")]),
            node(11, "Farm", "Agricultural Demand", &[(DEMAND_ATTR, "Demand")]),
            node(
                12,
                "River reach",
                "Instream Demand",
                &[(IFR_ATTR, "Instream Flow Requirement")],
            ),
            node(
                13,
                "Main reservoir",
                "Reservoir",
                &[
                    (CAPACITY_ATTR, "Storage Capacity"),
                    (INITIAL_STORAGE_ATTR, "Initial Storage"),
                ],
            ),
            node(14, "Terminal", "Outflow", &[]),
        ],
        scenarios: vec![
            Scenario {
                id: BASELINE_ID,
                name: "Baseline".to_string(),
                parent_id: None,
                layout: ScenarioLayout {
                    class: "baseline".to_string(),
                },
                start_time: Some("2020-01-01".to_string()),
                end_time: Some("2020-01-30".to_string()),
                time_step: Some("day".to_string()),
            },
            Scenario {
                id: HIGH_DEMAND_ID,
                name: "High demand".to_string(),
                parent_id: Some(BASELINE_ID),
                layout: ScenarioLayout {
                    class: "override".to_string(),
                },
                start_time: None,
                end_time: None,
                time_step: None,
            },
        ],
    };

    let template = Template {
        id: TEMPLATE_ID,
        name: "Single reservoir".to_string(),
        template_types: vec![
            template_type("Reservoir", &[(201, "Storage")]),
            template_type("Agricultural Demand", &[(202, "Delivery")]),
            template_type("Instream Demand", &[(203, "Delivery")]),
            template_type("Outflow", &[(204, "Flow")]),
        ],
    };

    let mut data = HashMap::new();
    data.insert(
        BASELINE_ID,
        ScenarioData {
            id: BASELINE_ID,
            parent_id: None,
            resource_scenarios: vec![
                entry(
                    INFLOW_ATTR,
                    timeseries_dataset(constant_series_json(INFLOW_RATE, None)),
                ),
                entry(
                    DEMAND_ATTR,
                    timeseries_dataset(constant_series_json(DEMAND_RATE, None)),
                ),
                entry(
                    IFR_ATTR,
                    timeseries_dataset(constant_series_json(IFR_RATE, None)),
                ),
                entry(CAPACITY_ATTR, scalar_dataset("1000")),
                entry(INITIAL_STORAGE_ATTR, function_dataset("50.0")),
            ],
        },
    );
    data.insert(
        HIGH_DEMAND_ID,
        ScenarioData {
            id: HIGH_DEMAND_ID,
            parent_id: Some(BASELINE_ID),
            resource_scenarios: vec![entry(
                DEMAND_ATTR,
                timeseries_dataset(constant_series_json(HIGH_DEMAND_RATE, None)),
            )],
        },
    );

    InMemoryService {
        network,
        template,
        data,
        saved: RefCell::new(Vec::new()),
        created_attrs: RefCell::new(Vec::new()),
        next_attr_id: Cell::new(500),
    }
}

/// Engine that records every hook call. It can request a stop after a fixed
/// number of day-boundary polls, hold the run paused at one day boundary for
/// a fixed number of pause checks, and raise the stop flag while that pause
/// holds.
#[derive(Default)]
pub struct RecordingEngine {
    stop_after_polls: Option<usize>,
    pause_at_boundary: Option<usize>,
    pause_polls: usize,
    stop_while_paused: bool,
    boundary_checks: Cell<usize>,
    pause_remaining: Cell<Option<usize>>,
    stop_requested: Cell<bool>,
    pub polls: Cell<usize>,
    pub started: Cell<Option<usize>>,
    pub steps: RefCell<Vec<(NaiveDate, usize)>>,
    pub stop_acked: Cell<bool>,
    pub errors: RefCell<Vec<String>>,
    pub finished: Cell<Option<usize>>,
}

impl RecordingEngine {
    pub fn stopping_after(polls: usize) -> RecordingEngine {
        RecordingEngine {
            stop_after_polls: Some(polls),
            ..RecordingEngine::default()
        }
    }

    /// Pause at the given day boundary for `polls` affirmative pause checks,
    /// then release.
    pub fn pausing_at(boundary: usize, polls: usize) -> RecordingEngine {
        RecordingEngine {
            pause_at_boundary: Some(boundary),
            pause_polls: polls,
            ..RecordingEngine::default()
        }
    }

    /// Like `pausing_at`, but the stop flag goes up while the pause holds.
    pub fn stopping_while_paused_at(boundary: usize, polls: usize) -> RecordingEngine {
        RecordingEngine {
            pause_at_boundary: Some(boundary),
            pause_polls: polls,
            stop_while_paused: true,
            ..RecordingEngine::default()
        }
    }

    pub fn last_step(&self) -> Option<(NaiveDate, usize)> {
        self.steps.borrow().last().copied()
    }

    /// Whether a scheduled pause engaged and ran through all its checks.
    pub fn pause_exhausted(&self) -> bool {
        self.pause_remaining.get() == Some(0)
    }
}

impl Engine for RecordingEngine {
    fn start(&self, total_steps: usize) {
        self.started.set(Some(total_steps));
    }

    fn step(&self, date: NaiveDate, step: usize) {
        self.steps.borrow_mut().push((date, step));
    }

    fn paused(&self) -> bool {
        if let Some(remaining) = self.pause_remaining.get() {
            if remaining == 0 {
                return false;
            }
            self.pause_remaining.set(Some(remaining - 1));
            return true;
        }
        let checks = self.boundary_checks.get() + 1;
        self.boundary_checks.set(checks);
        if self.pause_at_boundary == Some(checks) && self.pause_polls > 0 {
            self.pause_remaining.set(Some(self.pause_polls - 1));
            if self.stop_while_paused {
                self.stop_requested.set(true);
            }
            return true;
        }
        false
    }

    fn stopped(&self) -> bool {
        let polls = self.polls.get() + 1;
        self.polls.set(polls);
        if self.stop_requested.get() {
            return true;
        }
        matches!(self.stop_after_polls, Some(limit) if polls > limit)
    }

    fn stop(&self) {
        self.stop_acked.set(true);
    }

    fn error(&self, message: &str) {
        self.errors.borrow_mut().push(message.to_string());
    }

    fn finish(&self, step: usize) {
        self.finished.set(Some(step));
    }
}
