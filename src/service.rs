//! Scenario service boundary: trait plus the JSON-over-HTTP client.
//!
//! The core only ever talks to [`ScenarioService`]; the HTTP client here is
//! thin plumbing over the service's REST endpoints. Record envelopes mirror
//! the service's response shapes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::network::{Network, ResourceAttr, ResultsScenario, ScenarioData, ScenarioId, Template};
use crate::resolve::ScenarioSource;

pub trait ScenarioService: ScenarioSource {
    fn get_network(&self, network_id: i64) -> Result<Network, ModelError>;
    fn get_template(&self, template_id: i64) -> Result<Template, ModelError>;
    /// Create a variable attribute on a node, bound to a template attribute.
    fn add_resource_attribute(
        &self,
        node_id: i64,
        attr_id: i64,
    ) -> Result<ResourceAttr, ModelError>;
    fn add_scenario(&self, network_id: i64, scenario: &ResultsScenario)
        -> Result<(), ModelError>;
    fn update_scenario(
        &self,
        scenario_id: ScenarioId,
        scenario: &ResultsScenario,
    ) -> Result<(), ModelError>;
}

#[derive(Deserialize)]
struct NetworkEnvelope {
    network: Network,
}

#[derive(Deserialize)]
struct TemplateEnvelope {
    template: Template,
}

#[derive(Deserialize)]
struct ScenarioEnvelope {
    scenario: ScenarioData,
}

#[derive(Serialize)]
struct AddResourceAttr {
    attr_id: i64,
    is_var: bool,
}

/// JSON-over-HTTP implementation of the scenario service.
pub struct HttpService {
    agent: ureq::Agent,
    base_url: String,
    api_key: Option<String>,
}

impl HttpService {
    pub fn new(base_url: &str, api_key: Option<String>) -> HttpService {
        HttpService {
            agent: ureq::Agent::new_with_defaults(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ModelError> {
        let url = format!("{}/{path}", self.base_url);
        let mut request = self.agent.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }
        let mut response = request
            .call()
            .map_err(|err| ModelError::Service(format!("GET {path}: {err}")))?;
        response
            .body_mut()
            .read_json()
            .map_err(|err| ModelError::Service(format!("GET {path}: {err}")))
    }

    fn send_json<B: Serialize>(
        &self,
        method: &str,
        path: &str,
        body: &B,
    ) -> Result<(), ModelError> {
        let url = format!("{}/{path}", self.base_url);
        let mut request = match method {
            "PUT" => self.agent.put(&url),
            _ => self.agent.post(&url),
        };
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }
        request
            .send_json(body)
            .map_err(|err| ModelError::Service(format!("{method} {path}: {err}")))?;
        Ok(())
    }
}

impl ScenarioSource for HttpService {
    fn scenario_data(&self, id: ScenarioId) -> Result<ScenarioData, ModelError> {
        self.get_json::<ScenarioEnvelope>(&format!("scenarios/{id}?include_data=true"))
            .map(|envelope| envelope.scenario)
    }
}

impl ScenarioService for HttpService {
    fn get_network(&self, network_id: i64) -> Result<Network, ModelError> {
        self.get_json::<NetworkEnvelope>(&format!("networks/{network_id}"))
            .map(|envelope| envelope.network)
    }

    fn get_template(&self, template_id: i64) -> Result<Template, ModelError> {
        self.get_json::<TemplateEnvelope>(&format!("templates/{template_id}"))
            .map(|envelope| envelope.template)
    }

    fn add_resource_attribute(
        &self,
        node_id: i64,
        attr_id: i64,
    ) -> Result<ResourceAttr, ModelError> {
        let url = format!("{}/nodes/{node_id}/attributes", self.base_url);
        let mut request = self.agent.post(&url);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }
        let mut response = request
            .send_json(&AddResourceAttr {
                attr_id,
                is_var: true,
            })
            .map_err(|err| {
                ModelError::Service(format!("POST nodes/{node_id}/attributes: {err}"))
            })?;
        response.body_mut().read_json().map_err(|err| {
            ModelError::Service(format!("POST nodes/{node_id}/attributes: {err}"))
        })
    }

    fn add_scenario(
        &self,
        network_id: i64,
        scenario: &ResultsScenario,
    ) -> Result<(), ModelError> {
        self.send_json("POST", &format!("networks/{network_id}/scenarios"), scenario)
    }

    fn update_scenario(
        &self,
        scenario_id: ScenarioId,
        scenario: &ResultsScenario,
    ) -> Result<(), ModelError> {
        self.send_json("PUT", &format!("scenarios/{scenario_id}"), scenario)
    }
}
