//! Wire records exchanged with the scenario service.
//!
//! The read side mirrors what the service returns for networks, templates,
//! and per-scenario data. The write side covers the results payload saved
//! back after a run. Field names follow the service's JSON casing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

pub type ScenarioId = i64;
pub type ResourceAttrId = i64;

/// Layout class tag marking the root data layer of a network.
pub const BASELINE_CLASS: &str = "baseline";
/// Layout class tag applied to scenarios written back by a run.
pub const RESULTS_CLASS: &str = "results";

#[derive(Debug, Clone, Deserialize)]
pub struct Network {
    pub id: i64,
    pub name: String,
    pub layout: NetworkLayout,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkLayout {
    pub active_template_id: i64,
}

/// A typed entity in the network (reservoir, inflow point, demand site, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct Node {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub types: Vec<TypeMembership>,
    #[serde(default)]
    pub attributes: Vec<ResourceAttr>,
}

/// Membership of a node in a template type.
#[derive(Debug, Clone, Deserialize)]
pub struct TypeMembership {
    pub name: String,
    pub template_id: i64,
}

/// Binding of a template attribute to a specific node.
///
/// The id is the merge key used throughout resolution: it is unique within a
/// network and identifies one physical attribute on one node.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceAttr {
    pub id: ResourceAttrId,
    pub name: String,
    #[serde(default)]
    pub attr_id: i64,
    #[serde(default)]
    pub is_var: bool,
}

/// Scenario summary as listed on the network record.
///
/// Only the baseline scenario is guaranteed to carry the horizon fields
/// (`start_time`, `end_time`, `time_step`).
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub id: ScenarioId,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<ScenarioId>,
    #[serde(default)]
    pub layout: ScenarioLayout,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub time_step: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioLayout {
    #[serde(default)]
    pub class: String,
}

/// Per-scenario fetch result: the scenario's dataset entries plus its parent.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioData {
    pub id: ScenarioId,
    #[serde(default)]
    pub parent_id: Option<ScenarioId>,
    #[serde(default, rename = "resourcescenarios")]
    pub resource_scenarios: Vec<ResourceScenario>,
}

/// One (attribute reference, dataset) pair within a scenario.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceScenario {
    pub resource_attr_id: ResourceAttrId,
    pub dataset: Dataset,
}

/// The value attached to an attribute reference within one scenario.
///
/// Exactly one interpretation path applies: a `function` input method routes
/// through the literal parser on `metadata.data`, otherwise the `type` tag
/// decides between a timeseries payload and a scalar.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub unit_id: Option<i64>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub value: Option<String>,
}

impl Dataset {
    /// Metadata entry as a string, stringifying non-string JSON values.
    pub fn metadata_str(&self, key: &str) -> Option<String> {
        match self.metadata.get(key)? {
            serde_json::Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Template {
    pub id: i64,
    pub name: String,
    #[serde(default, rename = "templatetypes")]
    pub template_types: Vec<TemplateType>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateType {
    pub name: String,
    #[serde(default, rename = "typeattrs")]
    pub type_attrs: Vec<TypeAttr>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeAttr {
    pub attr_id: i64,
    #[serde(default)]
    pub unit_id: Option<i64>,
    pub attr: AttrName,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttrName {
    pub name: String,
}

/// Results scenario payload written back after a run.
#[derive(Debug, Clone, Serialize)]
pub struct ResultsScenario {
    pub name: String,
    pub description: String,
    pub layout: ResultsLayout,
    pub network_id: i64,
    pub resourcescenarios: Vec<ResultsResourceScenario>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultsLayout {
    pub class: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultsResourceScenario {
    pub resource_attr_id: ResourceAttrId,
    pub dataset: ResultsDataset,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultsDataset {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub unit_id: Option<i64>,
    pub metadata: ResultsMetadata,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultsMetadata {
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "Method")]
    pub method: String,
}

impl Network {
    /// The scenario tagged as the network's root data layer.
    pub fn baseline_scenario(&self) -> Result<&Scenario, ModelError> {
        self.scenarios
            .iter()
            .find(|scenario| scenario.layout.class == BASELINE_CLASS)
            .ok_or_else(|| {
                ModelError::Configuration(format!(
                    "network {} has no baseline scenario",
                    self.id
                ))
            })
    }

    /// First node holding the given type within the active template.
    pub fn node_by_type(&self, template_id: i64, type_name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| {
            node.types
                .iter()
                .any(|membership| membership.name == type_name && membership.template_id == template_id)
        })
    }

    pub fn scenario_by_id(&self, id: ScenarioId) -> Option<&Scenario> {
        self.scenarios.iter().find(|scenario| scenario.id == id)
    }

    pub fn scenario_by_name(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|scenario| scenario.name == name)
    }
}

impl Node {
    pub fn attribute(&self, name: &str) -> Option<&ResourceAttr> {
        self.attributes.iter().find(|attr| attr.name == name)
    }
}
