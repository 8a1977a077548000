//! Layered scenario resolution.
//!
//! A network carries one baseline data layer plus override scenarios, each
//! possibly inheriting from a parent override. Resolution flattens that
//! forest into a single map from attribute reference to the dataset in
//! effect, merging in a deterministic "organized" order: baseline first,
//! then each requested override's not-yet-seen ancestor chain,
//! nearest-root-first. Later entries overwrite earlier ones per attribute,
//! so later requested overrides win for shared attributes.

use std::collections::{HashMap, HashSet};

use crate::error::ModelError;
use crate::network::{Dataset, Network, ResourceAttrId, ScenarioData, ScenarioId};

/// Read access to per-scenario dataset entries.
pub trait ScenarioSource {
    fn scenario_data(&self, id: ScenarioId) -> Result<ScenarioData, ModelError>;
}

/// The flattened result of a merge: one dataset per attribute reference.
#[derive(Debug, Clone)]
pub struct ResolvedAttributes {
    pub(crate) organized: Vec<ScenarioId>,
    pub(crate) map: HashMap<ResourceAttrId, Dataset>,
}

impl ResolvedAttributes {
    pub fn dataset(&self, id: ResourceAttrId) -> Option<&Dataset> {
        self.map.get(&id)
    }

    /// Scenario ids in merge order, baseline first.
    pub fn organized_order(&self) -> &[ScenarioId] {
        &self.organized
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Merge the baseline and the requested override chains into one attribute
/// map.
///
/// Fails with `NotFound` if a requested or walked scenario id is absent from
/// the network's scenario set, and with `Configuration` if the network has
/// no baseline. Input records are not mutated.
pub fn resolve_attributes(
    network: &Network,
    requested: &[ScenarioId],
    source: &impl ScenarioSource,
) -> Result<ResolvedAttributes, ModelError> {
    let arena: HashMap<ScenarioId, &crate::network::Scenario> = network
        .scenarios
        .iter()
        .map(|scenario| (scenario.id, scenario))
        .collect();
    let baseline = network.baseline_scenario()?;

    let mut organized = vec![baseline.id];
    let mut seen: HashSet<ScenarioId> = HashSet::new();
    seen.insert(baseline.id);

    for &requested_id in requested {
        if !arena.contains_key(&requested_id) {
            return Err(ModelError::NotFound(requested_id));
        }
        // Walk up the parent chain until an already-organized scenario (or a
        // root) is reached. The chain.contains check breaks malformed parent
        // loops that would otherwise never terminate.
        let mut chain: Vec<ScenarioId> = Vec::new();
        let mut cursor = Some(requested_id);
        while let Some(id) = cursor {
            if seen.contains(&id) || chain.contains(&id) {
                break;
            }
            let scenario = arena.get(&id).ok_or(ModelError::NotFound(id))?;
            chain.push(id);
            cursor = scenario.parent_id;
        }
        for id in chain.into_iter().rev() {
            seen.insert(id);
            organized.push(id);
        }
    }

    let mut map: HashMap<ResourceAttrId, Dataset> = HashMap::new();
    for &scenario_id in &organized {
        let data = source.scenario_data(scenario_id)?;
        for entry in data.resource_scenarios {
            map.insert(entry.resource_attr_id, entry.dataset);
        }
    }

    tracing::debug!(
        scenarios = organized.len(),
        attributes = map.len(),
        "resolved attribute map"
    );
    Ok(ResolvedAttributes { organized, map })
}
