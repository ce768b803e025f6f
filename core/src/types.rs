//! Shared primitive types used across the entire engine.

/// A stable, unique identifier for a scenario.
pub type ScenarioId = String;

/// A duration expressed in months. Fractional months are allowed.
pub type Months = f64;

/// A percentage stored on the 0–100 scale.
pub type Percent = f64;

/// Calendar approximation used by the budget planner.
pub const DAYS_PER_MONTH: f64 = 30.0;

pub const MONTHS_PER_YEAR: f64 = 12.0;
