//! Builds the immutable per-run inputs from resolved attribute data.
//!
//! Five (node type, attribute) pairs feed the simulator: three flow series
//! (inflow, agricultural demand, instream flow requirement) and two
//! reservoir scalars (storage capacity, initial storage). The flow series
//! are unit-converted from a flow rate to a volume per day.

use chrono::NaiveDate;

use crate::error::ModelError;
use crate::literal::{parse_literal, Literal};
use crate::network::{Dataset, Network, Node};
use crate::resolve::ResolvedAttributes;
use crate::series::{parse_iso_date, TimeSeries};

/// Converts a flow rate in m3/s to a volume in thousand m3 per day.
pub const FLOW_TO_VOLUME_PER_DAY: f64 = 0.0864;

/// Everything the simulator consumes, fixed for the whole run.
#[derive(Debug, Clone)]
pub struct ModelInputs {
    pub inflow: TimeSeries,
    pub demand: TimeSeries,
    pub ifr: TimeSeries,
    pub capacity: f64,
    pub initial_storage: f64,
}

/// A dataset interpreted into its numeric form.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Scalar(f64),
    Series(TimeSeries),
}

/// Extract the five required inputs from the resolved attribute map.
pub fn build_inputs(
    network: &Network,
    resolved: &ResolvedAttributes,
) -> Result<ModelInputs, ModelError> {
    let template_id = network.layout.active_template_id;

    let inflow = required_series(network, resolved, template_id, "Inflow", "Runoff")?
        .scale(FLOW_TO_VOLUME_PER_DAY);
    let demand = required_series(network, resolved, template_id, "Agricultural Demand", "Demand")?
        .scale(FLOW_TO_VOLUME_PER_DAY);
    let ifr = required_series(
        network,
        resolved,
        template_id,
        "Instream Demand",
        "Instream Flow Requirement",
    )?
    .scale(FLOW_TO_VOLUME_PER_DAY);

    let reservoir = required_node(network, template_id, "Reservoir")?;
    let capacity = required_scalar(reservoir, resolved, "Storage Capacity")?;
    let initial_storage = required_scalar(reservoir, resolved, "Initial Storage")?;

    Ok(ModelInputs {
        inflow,
        demand,
        ifr,
        capacity,
        initial_storage,
    })
}

/// Interpret a dataset into a scalar or series.
///
/// A `function` input method takes precedence and routes `metadata.data`
/// through the restricted literal parser; otherwise the `type` tag decides.
pub fn dataset_value(dataset: &Dataset) -> Result<AttrValue, ModelError> {
    if dataset.metadata_str("input_method").as_deref() == Some("function") {
        let expression = dataset.metadata_str("data").ok_or_else(|| {
            ModelError::DataFormat("function dataset has no data expression".to_string())
        })?;
        let literal = parse_literal(&expression)
            .map_err(|err| ModelError::DataFormat(err.to_string()))?;
        return literal_value(&literal);
    }

    let value = dataset
        .value
        .as_deref()
        .ok_or_else(|| ModelError::DataFormat("dataset has no value".to_string()))?;
    match dataset.kind.as_str() {
        "timeseries" => Ok(AttrValue::Series(timeseries_from_json(value)?)),
        "scalar" => value
            .trim()
            .parse::<f64>()
            .map(AttrValue::Scalar)
            .map_err(|_| ModelError::DataFormat(format!("scalar value '{value}' is not a number"))),
        other => Err(ModelError::DataFormat(format!(
            "unsupported dataset type '{other}'"
        ))),
    }
}

fn literal_value(literal: &Literal) -> Result<AttrValue, ModelError> {
    match literal {
        Literal::Number(value) => Ok(AttrValue::Scalar(*value)),
        Literal::Dict(entries) => {
            // A single-column wrapper dict nests the date-keyed map one
            // level deeper; unwrap it before reading dates.
            if let [(_, inner @ Literal::Dict(_))] = entries.as_slice() {
                return literal_value(inner);
            }
            let mut pairs: Vec<(NaiveDate, f64)> = Vec::with_capacity(entries.len());
            for (key, value) in entries {
                let Literal::Str(raw_date) = key else {
                    return Err(ModelError::DataFormat(
                        "literal series keys must be date strings".to_string(),
                    ));
                };
                let date = parse_iso_date(raw_date).ok_or_else(|| {
                    ModelError::DataFormat(format!("literal series key '{raw_date}' is not a date"))
                })?;
                let Literal::Number(number) = value else {
                    return Err(ModelError::DataFormat(
                        "literal series values must be numbers".to_string(),
                    ));
                };
                pairs.push((date, *number));
            }
            Ok(AttrValue::Series(TimeSeries::from_pairs(pairs)))
        }
        _ => Err(ModelError::DataFormat(
            "literal must be a number or a date-keyed mapping".to_string(),
        )),
    }
}

/// Parse a timeseries payload: a JSON object keyed by ISO-8601 timestamps,
/// optionally wrapped one level deep in a column object as produced by the
/// results serializer.
fn timeseries_from_json(value: &str) -> Result<TimeSeries, ModelError> {
    let parsed: serde_json::Value = serde_json::from_str(value)
        .map_err(|err| ModelError::DataFormat(format!("timeseries is not valid JSON: {err}")))?;
    let serde_json::Value::Object(object) = parsed else {
        return Err(ModelError::DataFormat(
            "timeseries payload must be a JSON object".to_string(),
        ));
    };

    let column = if object.values().all(|v| v.is_object()) && !object.is_empty() {
        if object.len() > 1 {
            return Err(ModelError::DataFormat(format!(
                "timeseries wrapper has {} columns, expected exactly one",
                object.len()
            )));
        }
        match object.into_iter().next() {
            Some((_, serde_json::Value::Object(inner))) => inner,
            _ => {
                return Err(ModelError::DataFormat(
                    "timeseries column wrapper is empty".to_string(),
                ))
            }
        }
    } else {
        object
    };

    let mut pairs: Vec<(NaiveDate, f64)> = Vec::with_capacity(column.len());
    for (key, value) in column {
        let date = parse_iso_date(&key).ok_or_else(|| {
            ModelError::DataFormat(format!("timeseries key '{key}' is not a date"))
        })?;
        let number = value.as_f64().ok_or_else(|| {
            ModelError::DataFormat(format!("timeseries value for '{key}' is not a number"))
        })?;
        pairs.push((date, number));
    }
    Ok(TimeSeries::from_pairs(pairs))
}

fn required_node<'n>(
    network: &'n Network,
    template_id: i64,
    type_name: &str,
) -> Result<&'n Node, ModelError> {
    network.node_by_type(template_id, type_name).ok_or_else(|| {
        ModelError::Configuration(format!("no '{type_name}' node in the active template"))
    })
}

fn required_value(
    node: &Node,
    resolved: &ResolvedAttributes,
    attr_name: &str,
) -> Result<AttrValue, ModelError> {
    let attr = node.attribute(attr_name).ok_or_else(|| {
        ModelError::Configuration(format!(
            "node '{}' has no attribute '{attr_name}'",
            node.name
        ))
    })?;
    let dataset = resolved.dataset(attr.id).ok_or_else(|| {
        ModelError::Configuration(format!(
            "no dataset resolved for '{}/{attr_name}'",
            node.name
        ))
    })?;
    dataset_value(dataset).map_err(|err| match err {
        ModelError::DataFormat(message) => {
            ModelError::DataFormat(format!("'{}/{attr_name}': {message}", node.name))
        }
        other => other,
    })
}

fn required_series(
    network: &Network,
    resolved: &ResolvedAttributes,
    template_id: i64,
    type_name: &str,
    attr_name: &str,
) -> Result<TimeSeries, ModelError> {
    let node = required_node(network, template_id, type_name)?;
    match required_value(node, resolved, attr_name)? {
        AttrValue::Series(series) => Ok(series),
        AttrValue::Scalar(_) => Err(ModelError::DataFormat(format!(
            "'{}/{attr_name}': expected a time series, got a scalar",
            node.name
        ))),
    }
}

fn required_scalar(
    node: &Node,
    resolved: &ResolvedAttributes,
    attr_name: &str,
) -> Result<f64, ModelError> {
    match required_value(node, resolved, attr_name)? {
        AttrValue::Scalar(value) => Ok(value),
        AttrValue::Series(_) => Err(ModelError::DataFormat(format!(
            "'{}/{attr_name}': expected a scalar, got a time series",
            node.name
        ))),
    }
}
