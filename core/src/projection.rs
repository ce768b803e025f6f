//! The funnel projection engine.
//!
//! `project()` maps one `Inputs` snapshot to a complete `Metrics` value:
//! the forward (spend-driven) chain, the reverse (goal-driven) chain,
//! and the derived ratios.
//!
//! RULES:
//!   - Pure. Same inputs, same template, same settings → identical Metrics.
//!   - Total on valid input. Zero budgets, zero rates and zero leads
//!     resolve to guarded values, never NaN or infinity.
//!   - The only failure is structurally invalid input, reported as
//!     `FunnelError::InvalidInput` carrying the full validation report.
//!   - Metrics are recomputed wholesale; there is no partial update.

use crate::{
    config::{FunnelConfig, ProjectionSettings, RevenueBasis},
    error::{FunnelError, FunnelResult},
    funnel::{forward_chain, reverse_chain, FunnelTemplate, Requirement, Stage},
    inputs::Inputs,
    ratios::{ratio, roi_series, BudgetPlan, ProjectionPoint, Ratios},
    types::Percent,
    validation::validate,
};
use serde::{Deserialize, Serialize};

/// Volume at one stage of the funnel diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageVolume {
    pub stage:  Stage,
    pub label:  String,
    pub volume: f64,
    /// Share of the previous stage that reached this one.
    /// `None` for clicks; 0 when the previous stage is empty.
    pub conversion_from_previous: Option<Percent>,
}

/// Result of walking the funnel forward from the marketing budget.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardProjection {
    pub stages:            Vec<StageVolume>,
    pub new_clients:       f64,
    pub gross_revenue:     f64,
    pub estimated_revenue: f64,
    pub total_spend:       f64,
    pub roas:              f64,
}

impl ForwardProjection {
    pub fn volume(&self, stage: Stage) -> Option<f64> {
        self.stages.iter().find(|s| s.stage == stage).map(|s| s.volume)
    }
}

/// Whole-unit requirements upstream of the client goal.
#[derive(Debug, Clone, PartialEq)]
pub struct ReverseProjection {
    pub requirements:   Vec<(Stage, Requirement)>,
    pub required_budget: Option<f64>,
    pub est_revenue:    f64,
}

impl ReverseProjection {
    pub fn requirement(&self, stage: Stage) -> Option<Requirement> {
        self.requirements
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, r)| *r)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    // ── Forward chain ──────────────────────────────────
    pub clicks:            f64,
    pub leads:             f64,
    /// `None` when the active template has no such stage.
    pub discovery_calls:   Option<f64>,
    pub sales_calls:       Option<f64>,
    pub proposals_sent:    Option<f64>,
    pub new_clients:       f64,
    pub estimated_revenue: f64,
    pub roas:              f64,
    pub stages:            Vec<StageVolume>,

    // ── Reverse chain ──────────────────────────────────
    pub est_proposals:       Option<Requirement>,
    pub est_sales_calls:     Option<Requirement>,
    pub est_discovery_calls: Option<Requirement>,
    pub est_leads:           Requirement,
    pub est_clicks:          Requirement,
    /// Budget buying `est_clicks` at the current cost per click.
    /// `None` when the clicks are unreachable or the budget overflows.
    pub required_budget:     Option<f64>,
    pub est_revenue:         f64,

    // ── Derived ────────────────────────────────────────
    pub ratios:      Ratios,
    pub budget_plan: BudgetPlan,
    pub projection:  Vec<ProjectionPoint>,
}

impl Metrics {
    /// All-zero metrics for a record that has never projected successfully.
    pub fn empty() -> Self {
        Self {
            clicks: 0.0,
            leads: 0.0,
            discovery_calls: None,
            sales_calls: None,
            proposals_sent: None,
            new_clients: 0.0,
            estimated_revenue: 0.0,
            roas: 0.0,
            stages: Vec::new(),
            est_proposals: None,
            est_sales_calls: None,
            est_discovery_calls: None,
            est_leads: Requirement::Count(0),
            est_clicks: Requirement::Count(0),
            required_budget: Some(0.0),
            est_revenue: 0.0,
            ratios: Ratios::compute(0.0, 0.0, 0.0, 0.0),
            budget_plan: BudgetPlan::default(),
            projection: Vec::new(),
        }
    }
}

/// Project `inputs` through the config's active template and settings.
pub fn project(inputs: &Inputs, config: &FunnelConfig) -> FunnelResult<Metrics> {
    project_with(inputs, config.template()?, &config.settings)
}

pub fn project_with(
    inputs: &Inputs,
    template: &FunnelTemplate,
    settings: &ProjectionSettings,
) -> FunnelResult<Metrics> {
    let report = validate(inputs);
    if !report.is_valid() {
        return Err(FunnelError::InvalidInput(report));
    }
    template.validate()?;
    settings.check()?;

    let forward = project_forward(inputs, template, settings);
    let reverse = project_reverse(inputs, template);

    let leads = forward.volume(Stage::Leads).unwrap_or(0.0);
    let ratios = Ratios::compute(
        forward.new_clients,
        leads,
        forward.gross_revenue,
        forward.total_spend,
    );
    let est_leads = reverse
        .requirement(Stage::Leads)
        .unwrap_or(Requirement::Count(0));
    let budget_plan = BudgetPlan::compute(inputs, est_leads, ratios.lead_to_sale);
    let projection = roi_series(forward.gross_revenue, forward.total_spend, settings);

    log::debug!(
        "project[{}]: clicks={:.2} new_clients={:.4} roas={:.3} est_leads={:?}",
        template.id,
        forward.volume(Stage::Clicks).unwrap_or(0.0),
        forward.new_clients,
        forward.roas,
        est_leads
    );

    Ok(Metrics {
        clicks: forward.volume(Stage::Clicks).unwrap_or(0.0),
        leads,
        discovery_calls: forward.volume(Stage::DiscoveryCalls),
        sales_calls: forward.volume(Stage::SalesCalls),
        proposals_sent: forward.volume(Stage::ProposalsSent),
        new_clients: forward.new_clients,
        estimated_revenue: forward.estimated_revenue,
        roas: forward.roas,
        est_proposals: reverse.requirement(Stage::ProposalsSent),
        est_sales_calls: reverse.requirement(Stage::SalesCalls),
        est_discovery_calls: reverse.requirement(Stage::DiscoveryCalls),
        est_leads,
        est_clicks: reverse
            .requirement(Stage::Clicks)
            .unwrap_or(Requirement::Count(0)),
        required_budget: reverse.required_budget,
        est_revenue: reverse.est_revenue,
        stages: forward.stages,
        ratios,
        budget_plan,
        projection,
    })
}

/// Spend → clicks → each template stage in turn → revenue and ROAS.
/// Assumes `inputs` passed validation.
pub fn project_forward(
    inputs: &Inputs,
    template: &FunnelTemplate,
    settings: &ProjectionSettings,
) -> ForwardProjection {
    let clicks = inputs.monthly_marketing_budget / inputs.cost_per_click;
    let volumes = forward_chain(clicks, &template.rates(inputs));

    let mut stages = Vec::with_capacity(volumes.len() + 1);
    stages.push(StageVolume {
        stage: Stage::Clicks,
        label: Stage::Clicks.label().to_string(),
        volume: clicks,
        conversion_from_previous: None,
    });
    let mut previous = clicks;
    for (rate, volume) in template.stages.iter().zip(volumes) {
        let stage = rate.produces();
        let conversion = ratio(volume * 100.0, previous).unwrap_or(0.0);
        stages.push(StageVolume {
            stage,
            label: stage.label().to_string(),
            volume,
            conversion_from_previous: Some(conversion),
        });
        previous = volume;
    }

    let new_clients = previous;
    let gross_revenue = new_clients * inputs.avg_lifetime_value;

    let total_spend = if settings.include_management_fee_in_spend {
        inputs.monthly_marketing_budget + inputs.management_fee
    } else {
        inputs.monthly_marketing_budget
    };

    let estimated_revenue = match settings.revenue_basis {
        RevenueBasis::Gross => gross_revenue,
        RevenueBasis::Net => gross_revenue - total_spend,
    };

    let roas = ratio(estimated_revenue, total_spend).unwrap_or(0.0);

    ForwardProjection {
        stages,
        new_clients,
        gross_revenue,
        estimated_revenue,
        total_spend,
        roas,
    }
}

/// Target clients → required volume at every upstream stage, rounded up
/// to whole units stage by stage.
pub fn project_reverse(inputs: &Inputs, template: &FunnelTemplate) -> ReverseProjection {
    let chain = reverse_chain(inputs.target_new_clients, &template.rates(inputs));

    // chain[i] is the volume entering rate i: clicks for the landing page,
    // otherwise whatever the previous rate produces.
    let requirements: Vec<(Stage, Requirement)> = chain
        .into_iter()
        .enumerate()
        .map(|(i, req)| {
            let stage = match i {
                0 => Stage::Clicks,
                _ => template.stages[i - 1].produces(),
            };
            (stage, req)
        })
        .collect();

    let required_budget = requirements
        .iter()
        .find(|(s, _)| *s == Stage::Clicks)
        .and_then(|(_, req)| match req {
            Requirement::Count(n) => Some(*n as f64 * inputs.cost_per_click),
            Requirement::Unreachable => None,
        })
        .filter(|budget| budget.is_finite());

    ReverseProjection {
        requirements,
        required_budget,
        est_revenue: inputs.target_new_clients * inputs.avg_lifetime_value,
    }
}
