//! Structural validation of an `Inputs` record.
//!
//! Validation is separate from projection so a caller can render
//! field-level errors while still showing the last good metrics.
//! Numerically degenerate values (a zero budget, a 0 % rate) are
//! valid here; the engine resolves them to guarded results. Values whose
//! products would leave the f64 range are not: they are reported as
//! `Overflow` against the field that makes them large.

use crate::{
    config::MAX_PROJECTION_MONTHS,
    inputs::{InputField, Inputs},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    NonFinite,
    Negative,
    PercentOutOfRange,
    NonPositiveCostPerClick,
    /// A derived volume or amount would not be a finite number.
    Overflow,
}

#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{field}: {}", describe(.kind, .value))]
pub struct FieldError {
    pub field: InputField,
    pub kind:  FieldErrorKind,
    pub value: f64,
}

fn describe(kind: &FieldErrorKind, value: &f64) -> String {
    match kind {
        FieldErrorKind::NonFinite => format!("{value} is not a finite number"),
        FieldErrorKind::Negative => format!("{value} must not be negative"),
        FieldErrorKind::PercentOutOfRange => format!("{value} must be between 0 and 100"),
        FieldErrorKind::NonPositiveCostPerClick => {
            format!("{value} must be greater than zero")
        }
        FieldErrorKind::Overflow => format!("{value} makes the projection too large to compute"),
    }
}

/// Per-field error list. Empty when every field is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors_for(&self, field: InputField) -> impl Iterator<Item = &FieldError> {
        self.errors.iter().filter(move |e| e.field == field)
    }

    pub fn has_error(&self, field: InputField) -> bool {
        self.errors_for(field).next().is_some()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        f.write_str(&parts.join("; "))
    }
}

/// Check every field of `inputs`. At most one error is reported per field,
/// the first rule it breaks in the order: finite, non-negative, range.
/// Magnitudes are only checked once every field passes on its own.
pub fn validate(inputs: &Inputs) -> ValidationReport {
    let mut errors: Vec<FieldError> = InputField::ALL
        .into_iter()
        .filter_map(|field| check_field(field, inputs.get(field)))
        .collect();
    if errors.is_empty() {
        errors = check_magnitudes(inputs);
    }

    for err in &errors {
        log::debug!("validation: rejected {err}");
    }

    ValidationReport { errors }
}

fn check_field(field: InputField, value: f64) -> Option<FieldError> {
    let kind = if !value.is_finite() {
        FieldErrorKind::NonFinite
    } else if value < 0.0 {
        FieldErrorKind::Negative
    } else if field.is_percentage() && value > 100.0 {
        FieldErrorKind::PercentOutOfRange
    } else if field == InputField::CostPerClick && value <= 0.0 {
        FieldErrorKind::NonPositiveCostPerClick
    } else {
        return None;
    };
    Some(FieldError { field, kind, value })
}

/// Clicks, the most revenue those clicks can earn, the goal revenue and
/// total spend must stay finite even over the longest ROI series. Every
/// other figure is bounded by one of these or is a guarded ratio.
fn check_magnitudes(inputs: &Inputs) -> Vec<FieldError> {
    let headroom = f64::from(MAX_PROJECTION_MONTHS) * 100.0;
    let fits = |amount: f64| (amount * headroom).is_finite();
    let overflow = |field: InputField| FieldError {
        field,
        kind: FieldErrorKind::Overflow,
        value: inputs.get(field),
    };

    let mut errors = Vec::new();
    let clicks = inputs.monthly_marketing_budget / inputs.cost_per_click;
    if !fits(clicks) {
        errors.push(overflow(InputField::CostPerClick));
    } else if !fits(clicks * inputs.avg_lifetime_value) {
        errors.push(overflow(InputField::AvgLifetimeValue));
    }
    if !fits(inputs.target_new_clients * inputs.avg_lifetime_value) {
        errors.push(overflow(InputField::TargetNewClients));
    }
    if !fits(inputs.monthly_marketing_budget) {
        errors.push(overflow(InputField::MonthlyMarketingBudget));
    } else if !fits(inputs.monthly_marketing_budget + inputs.management_fee) {
        errors.push(overflow(InputField::ManagementFee));
    }
    errors
}
