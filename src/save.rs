//! Persists a results table back to the scenario service.
//!
//! Each results column becomes a timeseries dataset bound to a variable
//! attribute on its node, collected under one results-class scenario. The
//! scenario name is derived deterministically from the run name and the
//! override scenario names, so re-running the same combination updates the
//! existing scenario instead of accumulating duplicates.

use chrono::NaiveDate;

use crate::error::ModelError;
use crate::network::{
    Network, ResultsDataset, ResultsLayout, ResultsMetadata, ResultsResourceScenario,
    ResultsScenario, Template, RESULTS_CLASS,
};
use crate::service::ScenarioService;
use crate::sim::{ResultField, ResultsTable};

const SOURCE_TAG: &str = "slop";
const METHOD_TAG: &str = "slop reservoir operations model";
const DESCRIPTION: &str = "Simulated single-reservoir operations";

struct ResultColumn {
    node_type: &'static str,
    attr_name: &'static str,
    field: ResultField,
}

const RESULT_COLUMNS: [ResultColumn; 4] = [
    ResultColumn {
        node_type: "Reservoir",
        attr_name: "Storage",
        field: ResultField::Storage,
    },
    ResultColumn {
        node_type: "Agricultural Demand",
        attr_name: "Delivery",
        field: ResultField::AgDelivery,
    },
    ResultColumn {
        node_type: "Instream Demand",
        attr_name: "Delivery",
        field: ResultField::InstreamDelivery,
    },
    ResultColumn {
        node_type: "Outflow",
        attr_name: "Flow",
        field: ResultField::Outflow,
    },
];

/// Deterministic name for the results scenario of one run combination.
pub fn results_scenario_name(run_name: &str, override_names: &[String]) -> String {
    if override_names.is_empty() {
        run_name.to_string()
    } else {
        format!("{run_name} - {}", override_names.join(", "))
    }
}

/// Save all result columns under one results scenario, creating or updating
/// it by name. Returns the scenario name used.
pub fn save_results(
    service: &impl ScenarioService,
    network: &Network,
    template: &Template,
    run_name: &str,
    override_names: &[String],
    results: &ResultsTable,
) -> Result<String, ModelError> {
    let template_id = network.layout.active_template_id;
    let mut entries = Vec::with_capacity(RESULT_COLUMNS.len());

    for column in &RESULT_COLUMNS {
        let node = network
            .node_by_type(template_id, column.node_type)
            .ok_or_else(|| {
                ModelError::Configuration(format!(
                    "no '{}' node to attach results to",
                    column.node_type
                ))
            })?;
        let template_type = template
            .template_types
            .iter()
            .find(|t| t.name == column.node_type)
            .ok_or_else(|| {
                ModelError::Configuration(format!(
                    "template has no type '{}'",
                    column.node_type
                ))
            })?;
        let type_attr = template_type
            .type_attrs
            .iter()
            .find(|ta| ta.attr.name == column.attr_name)
            .ok_or_else(|| {
                ModelError::Configuration(format!(
                    "template type '{}' has no attribute '{}'",
                    column.node_type, column.attr_name
                ))
            })?;

        // Result attributes usually do not exist yet on first save; create
        // them as variables bound to the template attribute.
        let resource_attr_id = match node.attribute(column.attr_name) {
            Some(attr) => attr.id,
            None => {
                service
                    .add_resource_attribute(node.id, type_attr.attr_id)?
                    .id
            }
        };

        entries.push(ResultsResourceScenario {
            resource_attr_id,
            dataset: ResultsDataset {
                name: format!("{} for {}", column.attr_name, node.name),
                kind: "timeseries".to_string(),
                unit_id: type_attr.unit_id,
                metadata: ResultsMetadata {
                    source: SOURCE_TAG.to_string(),
                    method: METHOD_TAG.to_string(),
                },
                value: column_value_json(&results.column(column.field)),
            },
        });
    }

    let name = results_scenario_name(run_name, override_names);
    let scenario = ResultsScenario {
        name: name.clone(),
        description: DESCRIPTION.to_string(),
        layout: ResultsLayout {
            class: RESULTS_CLASS.to_string(),
        },
        network_id: network.id,
        resourcescenarios: entries,
    };

    match network.scenario_by_name(&name) {
        Some(existing) => service.update_scenario(existing.id, &scenario)?,
        None => service.add_scenario(network.id, &scenario)?,
    }
    tracing::info!(scenario = %name, rows = results.len(), "results saved");
    Ok(name)
}

/// Serialize one column as a single-column JSON object keyed by ISO-8601
/// timestamps, the same shape the input builder accepts back.
fn column_value_json(points: &[(NaiveDate, f64)]) -> String {
    let mut column = serde_json::Map::with_capacity(points.len());
    for (date, value) in points {
        let key = format!("{}T00:00:00.000Z", date.format("%Y-%m-%d"));
        column.insert(key, serde_json::Value::from(*value));
    }
    let mut wrapper = serde_json::Map::with_capacity(1);
    wrapper.insert("0".to_string(), serde_json::Value::Object(column));
    serde_json::Value::Object(wrapper).to_string()
}
