use crate::{
    error::{FunnelError, FunnelResult},
    funnel::FunnelTemplate,
    inputs::Inputs,
};
use serde::{Deserialize, Serialize};

/// Whether `estimatedRevenue` is reported gross or net of total spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueBasis {
    #[default]
    Gross,
    Net,
}

/// Knobs that change how a projection is computed, independent of the
/// funnel shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSettings {
    /// Count `managementFee` as spend in ROAS, margin, CPA and payback.
    #[serde(default)]
    pub include_management_fee_in_spend: bool,
    #[serde(default)]
    pub revenue_basis: RevenueBasis,
    /// Horizon of the cumulative ROI series.
    #[serde(default = "default_projection_months")]
    pub projection_months: u32,
}

/// Longest ROI series a configuration may ask for. Validation keeps every
/// monthly figure small enough to be multiplied by this and stay finite.
pub const MAX_PROJECTION_MONTHS: u32 = 120;

fn default_projection_months() -> u32 {
    12
}

impl ProjectionSettings {
    pub fn check(&self) -> FunnelResult<()> {
        if self.projection_months > MAX_PROJECTION_MONTHS {
            return Err(FunnelError::InvalidSettings {
                reason: format!(
                    "projection_months {} exceeds {MAX_PROJECTION_MONTHS}",
                    self.projection_months
                ),
            });
        }
        Ok(())
    }
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            include_management_fee_in_spend: false,
            revenue_basis: RevenueBasis::Gross,
            projection_months: default_projection_months(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TemplatesFile {
    active_template: String,
    templates: Vec<FunnelTemplate>,
    #[serde(default)]
    settings: ProjectionSettings,
}

/// The caller-owned default configuration: the template record new
/// scenarios start from, the available funnel shapes, and projection
/// settings. The engine itself holds no defaults.
#[derive(Debug, Clone)]
pub struct FunnelConfig {
    pub default_inputs:  Inputs,
    pub templates:       Vec<FunnelTemplate>,
    pub active_template: String,
    pub settings:        ProjectionSettings,
}

impl FunnelConfig {
    /// Load from the data/ directory.
    /// In tests, use FunnelConfig::default().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let inputs_path = format!("{data_dir}/defaults/inputs.json");
        let inputs_content = std::fs::read_to_string(&inputs_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {inputs_path}: {e}"))?;
        let default_inputs: Inputs = serde_json::from_str(&inputs_content)?;

        let templates_path = format!("{data_dir}/funnels/templates.json");
        let templates_content = std::fs::read_to_string(&templates_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {templates_path}: {e}"))?;
        let templates_file: TemplatesFile = serde_json::from_str(&templates_content)?;

        let config = Self {
            default_inputs,
            templates: templates_file.templates,
            active_template: templates_file.active_template,
            settings: templates_file.settings,
        };
        config.check()?;

        log::info!(
            "config: loaded {} funnel templates from {data_dir}, active '{}'",
            config.templates.len(),
            config.active_template
        );
        Ok(config)
    }

    /// Every template is well-formed, the active one exists and the
    /// settings are in range.
    pub fn check(&self) -> FunnelResult<()> {
        self.settings.check()?;
        for template in &self.templates {
            template.validate()?;
        }
        self.template().map(|_| ())
    }

    pub fn template(&self) -> FunnelResult<&FunnelTemplate> {
        self.template_by_id(&self.active_template)
    }

    pub fn template_by_id(&self, id: &str) -> FunnelResult<&FunnelTemplate> {
        self.templates
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| FunnelError::TemplateNotFound { id: id.to_string() })
    }

    pub fn with_active_template(mut self, id: &str) -> FunnelResult<Self> {
        self.template_by_id(id)?;
        self.active_template = id.to_string();
        Ok(self)
    }

    pub fn with_settings(mut self, settings: ProjectionSettings) -> Self {
        self.settings = settings;
        self
    }
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            default_inputs: Inputs {
                avg_lifetime_value:      2000.0,
                monthly_marketing_budget: 2000.0,
                cost_per_click:          4.0,
                management_fee:          0.0,
                landing_page_conversion: 5.0,
                discovery_call_rate:     50.0,
                sales_call_rate:         50.0,
                proposal_rate:           50.0,
                client_won_rate:         50.0,
                target_new_clients:      2.0,
                client_spend:            500.0,
            },
            templates: FunnelTemplate::builtin(),
            active_template: FunnelTemplate::FULL.into(),
            settings: ProjectionSettings::default(),
        }
    }
}
