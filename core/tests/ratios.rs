//! Derived ratios, budget planner and ROI series.

use funnel_core::{
    config::{FunnelConfig, ProjectionSettings},
    inputs::Inputs,
    projection::project,
    ratios::{BudgetPlan, Ratios},
    Requirement,
};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9 * b.abs().max(1.0)
}

fn reference_inputs() -> Inputs {
    Inputs {
        avg_lifetime_value:      4500.0,
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
    }
}

#[test]
fn ratios_for_reference_scenario() {
    let m = project(&reference_inputs(), &FunnelConfig::default()).unwrap();
    let r = m.ratios;

    // 1.5625 clients from 25 leads, kept as a fraction.
    assert!(approx(r.lead_to_sale, 0.0625), "lead_to_sale = {}", r.lead_to_sale);
    assert!(approx(r.total_spend, 2000.0));
    assert!(approx(r.monthly_profit, 5031.25));
    assert!(approx(r.profit_margin, 5031.25 / 7031.25 * 100.0));
    assert!(approx(r.break_even_point.unwrap(), 2000.0 / 5031.25));
    assert!(approx(r.payback_period, 2000.0 / (7031.25 / 12.0)));
    assert!(approx(r.cost_per_acquisition.unwrap(), 1280.0));
    assert!(approx(r.annual_roi, 251.5625), "annual_roi = {}", r.annual_roi);
}

#[test]
fn unprofitable_funnel_never_breaks_even() {
    let inputs = Inputs {
        avg_lifetime_value: 1000.0,
        ..reference_inputs()
    };
    let m = project(&inputs, &FunnelConfig::default()).unwrap();

    assert!(m.ratios.monthly_profit < 0.0);
    assert_eq!(m.ratios.break_even_point, None);
    assert!(m.ratios.profit_margin < 0.0);
    assert!(m.ratios.annual_roi < 0.0);
}

#[test]
fn zero_denominators_are_guarded() {
    let r = Ratios::compute(0.0, 0.0, 0.0, 0.0);
    assert_eq!(r.lead_to_sale, 0.0);
    assert_eq!(r.profit_margin, 0.0);
    assert_eq!(r.break_even_point, None);
    assert_eq!(r.payback_period, 0.0);
    assert_eq!(r.cost_per_acquisition, None);
    assert_eq!(r.annual_roi, 0.0);

    let no_clients = Ratios::compute(0.0, 25.0, 0.0, 2000.0);
    assert_eq!(no_clients.cost_per_acquisition, None);
    assert_eq!(no_clients.payback_period, 0.0);
    assert!(approx(no_clients.monthly_profit, -2000.0));
}

#[test]
fn budget_plan_spreads_required_leads_over_the_month() {
    let m = project(&reference_inputs(), &FunnelConfig::default()).unwrap();
    let plan = m.budget_plan;

    assert_eq!(m.est_leads, Requirement::Count(32));
    assert_eq!(plan.daily_leads_needed, 2);
    assert!(approx(plan.cost_per_lead_target, 500.0 * 0.0625));
    assert!(approx(plan.daily_budget, 62.5));
    assert!(approx(plan.monthly_budget, 1875.0));
}

#[test]
fn budget_plan_is_zero_without_conversions_or_goal() {
    let inputs = reference_inputs();

    assert_eq!(
        BudgetPlan::compute(&inputs, Requirement::Count(32), 0.0),
        BudgetPlan::default()
    );
    assert_eq!(
        BudgetPlan::compute(&inputs, Requirement::Count(0), 0.0625),
        BudgetPlan::default()
    );
    assert_eq!(
        BudgetPlan::compute(&inputs, Requirement::Unreachable, 0.0625),
        BudgetPlan::default()
    );
}

#[test]
fn roi_series_accumulates_monthly() {
    let m = project(&reference_inputs(), &FunnelConfig::default()).unwrap();

    assert_eq!(m.projection.len(), 12);
    let first = m.projection[0];
    let last = m.projection[11];
    assert_eq!(first.month, 1);
    assert_eq!(last.month, 12);
    assert!(approx(first.revenue, 7031.25));
    assert!(approx(first.cost, 2000.0));
    assert!(approx(last.revenue, 7031.25 * 12.0));
    assert!(approx(last.profit, 5031.25 * 12.0));
}

#[test]
fn roi_series_follows_configured_horizon() {
    let config = FunnelConfig::default().with_settings(ProjectionSettings {
        projection_months: 24,
        ..ProjectionSettings::default()
    });
    let m = project(&reference_inputs(), &config).unwrap();
    assert_eq!(m.projection.len(), 24);
}
