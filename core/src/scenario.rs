//! Scenario container: an ordered list of independent named Inputs
//! records, each paired with its last good Metrics.
//!
//! RULES:
//!   - Scenarios never read each other. An edit recomputes only the
//!     scenario it touches.
//!   - Every edit replaces the whole Inputs record, then re-validates
//!     and re-projects it synchronously.
//!   - Invalid input is not an error at this level. The report is stored
//!     next to the previous metrics so a UI can show both.

use crate::{
    config::FunnelConfig,
    error::{FunnelError, FunnelResult},
    inputs::{derive_acquisition_ceiling, InputField, Inputs},
    projection::{project, Metrics},
    types::ScenarioId,
    validation::ValidationReport,
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id:         ScenarioId,
    pub name:       String,
    pub inputs:     Inputs,
    /// Metrics of the most recent valid inputs.
    pub metrics:    Metrics,
    /// Problems with the current inputs. Empty when `metrics` is current.
    pub validation: ValidationReport,
}

impl Scenario {
    fn new(name: String, inputs: Inputs, config: &FunnelConfig) -> FunnelResult<Self> {
        let mut scenario = Self {
            id: Uuid::new_v4().to_string(),
            name,
            inputs,
            metrics: Metrics::empty(),
            validation: ValidationReport::default(),
        };
        scenario.recompute(config)?;
        Ok(scenario)
    }

    pub fn is_current(&self) -> bool {
        self.validation.is_valid()
    }

    fn apply(&mut self, inputs: Inputs, config: &FunnelConfig) -> FunnelResult<()> {
        self.inputs = inputs;
        self.recompute(config)
    }

    fn recompute(&mut self, config: &FunnelConfig) -> FunnelResult<()> {
        match project(&self.inputs, config) {
            Ok(metrics) => {
                self.metrics = metrics;
                self.validation = ValidationReport::default();
                Ok(())
            }
            Err(FunnelError::InvalidInput(report)) => {
                log::warn!(
                    "scenario {} ('{}'): keeping last good metrics: {report}",
                    self.id,
                    self.name
                );
                self.validation = report;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

pub struct ScenarioBook {
    config:    FunnelConfig,
    scenarios: Vec<Scenario>,
}

impl ScenarioBook {
    pub fn new(config: FunnelConfig) -> FunnelResult<Self> {
        config.check()?;
        Ok(Self {
            config,
            scenarios: Vec::new(),
        })
    }

    pub fn config(&self) -> &FunnelConfig {
        &self.config
    }

    /// Append a scenario built from the default inputs.
    /// Unnamed scenarios are called "Scenario N" by position.
    pub fn add(&mut self, name: Option<&str>) -> FunnelResult<&Scenario> {
        let name = match name {
            Some(n) => n.to_string(),
            None => format!("Scenario {}", self.scenarios.len() + 1),
        };
        let inputs = self.config.default_inputs.normalized();
        let scenario = Scenario::new(name, inputs, &self.config)?;
        log::info!("scenario: added {} ('{}')", scenario.id, scenario.name);
        self.scenarios.push(scenario);
        Ok(&self.scenarios[self.scenarios.len() - 1])
    }

    /// Edit one field, applying the acquisition-ceiling clamp, and recompute.
    pub fn set_field(
        &mut self,
        id: &str,
        field: InputField,
        value: f64,
    ) -> FunnelResult<&Scenario> {
        let idx = self.index_of(id)?;
        let next = self.scenarios[idx].inputs.with_field(field, value);
        log::debug!("scenario {id}: {field} = {value}");
        self.scenarios[idx].apply(next, &self.config)?;
        Ok(&self.scenarios[idx])
    }

    /// Replace the whole record, e.g. when restoring persisted state.
    /// `clientSpend` is pulled under the acquisition ceiling on the way in.
    pub fn replace_inputs(&mut self, id: &str, inputs: Inputs) -> FunnelResult<&Scenario> {
        let idx = self.index_of(id)?;
        self.scenarios[idx].apply(inputs.normalized(), &self.config)?;
        Ok(&self.scenarios[idx])
    }

    pub fn rename(&mut self, id: &str, name: &str) -> FunnelResult<&Scenario> {
        let idx = self.index_of(id)?;
        self.scenarios[idx].name = name.to_string();
        Ok(&self.scenarios[idx])
    }

    /// Back to the default inputs with `clientSpend` at the full ceiling.
    /// The scenario keeps its id and name.
    pub fn reset(&mut self, id: &str) -> FunnelResult<&Scenario> {
        let idx = self.index_of(id)?;
        let defaults = self.config.default_inputs;
        let inputs = Inputs {
            client_spend: derive_acquisition_ceiling(defaults.avg_lifetime_value),
            ..defaults
        };
        self.scenarios[idx].apply(inputs, &self.config)?;
        log::info!("scenario: reset {id}");
        Ok(&self.scenarios[idx])
    }

    pub fn remove(&mut self, id: &str) -> FunnelResult<Scenario> {
        let idx = self.index_of(id)?;
        let removed = self.scenarios.remove(idx);
        log::info!("scenario: removed {} ('{}')", removed.id, removed.name);
        Ok(removed)
    }

    pub fn get(&self, id: &str) -> FunnelResult<&Scenario> {
        self.index_of(id).map(|idx| &self.scenarios[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    fn index_of(&self, id: &str) -> FunnelResult<usize> {
        self.scenarios
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| FunnelError::ScenarioNotFound { id: id.to_string() })
    }
}
