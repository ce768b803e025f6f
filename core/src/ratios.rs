//! Derived financial ratios, the budget planner, and the cumulative
//! ROI series. Everything here is computed from a finished forward
//! and reverse projection; nothing reads `Inputs` rates directly.
//!
//! Every division goes through `ratio()`. A zero denominator or an
//! overflowing quotient resolves to 0, or to `None` where the figure is
//! "unreachable" or "unavailable" rather than merely zero.

use crate::{
    config::ProjectionSettings,
    funnel::Requirement,
    inputs::Inputs,
    types::{Months, Percent, DAYS_PER_MONTH, MONTHS_PER_YEAR},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ratios {
    /// New clients per lead, as a fraction in [0, 1].
    pub lead_to_sale:         f64,
    /// Budget, plus the management fee when it counts as spend.
    pub total_spend:          f64,
    /// Gross revenue minus total spend.
    pub monthly_profit:       f64,
    pub profit_margin:        Percent,
    /// Months to recover spend from profit. `None` when profit ≤ 0.
    pub break_even_point:     Option<Months>,
    /// Months to recover spend from gross revenue.
    pub payback_period:       Months,
    /// `None` when no clients are won.
    pub cost_per_acquisition: Option<f64>,
    pub annual_roi:           Percent,
}

impl Ratios {
    pub fn compute(new_clients: f64, leads: f64, gross_revenue: f64, total_spend: f64) -> Self {
        let monthly_profit = gross_revenue - total_spend;

        Self {
            lead_to_sale: ratio(new_clients, leads).unwrap_or(0.0),
            total_spend,
            monthly_profit,
            profit_margin: ratio(monthly_profit * 100.0, gross_revenue).unwrap_or(0.0),
            break_even_point: if monthly_profit > 0.0 {
                ratio(total_spend, monthly_profit)
            } else {
                None
            },
            payback_period: ratio(total_spend * MONTHS_PER_YEAR, gross_revenue).unwrap_or(0.0),
            cost_per_acquisition: ratio(total_spend, new_clients),
            // Annual profit over annual spend; the twelves cancel.
            annual_roi: ratio(monthly_profit * 100.0, total_spend).unwrap_or(0.0),
        }
    }
}

/// `numerator / denominator`, or `None` when the denominator is not
/// positive or the quotient is not finite.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator > 0.0 {
        Some(numerator / denominator).filter(|q| q.is_finite())
    } else {
        None
    }
}

/// Spend needed to feed the goal-driven lead requirement at the
/// acquisition-cost ceiling the user accepts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetPlan {
    pub daily_leads_needed:   u64,
    /// `clientSpend × leadToSale`.
    pub cost_per_lead_target: f64,
    pub daily_budget:         f64,
    pub monthly_budget:       f64,
}

impl BudgetPlan {
    /// All zero unless some leads are required and leads convert at all,
    /// or when the plan is too large to express.
    pub fn compute(inputs: &Inputs, est_leads: Requirement, lead_to_sale: f64) -> Self {
        let leads = est_leads.count();
        if lead_to_sale <= 0.0 || leads == 0 {
            return Self::default();
        }

        let daily_leads_needed = (leads as f64 / DAYS_PER_MONTH).ceil() as u64;
        let cost_per_lead_target = inputs.client_spend * lead_to_sale;
        let daily_budget = daily_leads_needed as f64 * cost_per_lead_target;
        let monthly_budget = daily_budget * DAYS_PER_MONTH;
        if !monthly_budget.is_finite() {
            log::debug!("budget plan: {leads} leads at {cost_per_lead_target} overflows");
            return Self::default();
        }

        Self {
            daily_leads_needed,
            cost_per_lead_target,
            daily_budget,
            monthly_budget,
        }
    }
}

/// One month of the cumulative ROI series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    pub month:   u32,
    pub revenue: f64,
    pub cost:    f64,
    pub profit:  f64,
}

/// Cumulative revenue, cost and profit for months 1..=horizon,
/// assuming the current month repeats unchanged.
pub fn roi_series(
    gross_revenue: f64,
    total_spend: f64,
    settings: &ProjectionSettings,
) -> Vec<ProjectionPoint> {
    (1..=settings.projection_months)
        .map(|month| {
            let m = f64::from(month);
            ProjectionPoint {
                month,
                revenue: gross_revenue * m,
                cost:    total_spend * m,
                profit:  (gross_revenue - total_spend) * m,
            }
        })
        .collect()
}
