//! Funnel templates and the stage-chain reductions.
//!
//! A template is an ordered list of conversion-rate fields. Each rate
//! converts the volume of one stage into the volume of the next:
//!
//!   clicks --landing--> leads --discovery--> discovery calls --> ... --won--> new clients
//!
//! RULES:
//!   - The first rate is always the landing-page conversion (clicks → leads).
//!   - The last rate is always the client-won rate (→ new clients).
//!   - Templates carry 3–5 rates; no rate appears twice.
//!   - Forward chains multiply; a 0 % rate empties every later stage.
//!   - Reverse chains divide and round up to whole units at every stage.

use crate::{
    error::{FunnelError, FunnelResult},
    inputs::{InputField, Inputs},
    types::Percent,
};
use serde::{Deserialize, Serialize};

pub const MIN_TEMPLATE_STAGES: usize = 3;
pub const MAX_TEMPLATE_STAGES: usize = 5;

/// Largest whole-unit requirement the reverse chain reports. Beyond 2^53
/// consecutive integers are no longer representable, so a count could not
/// be shown to be the smallest sufficient one.
pub const MAX_WHOLE_UNITS: f64 = 9_007_199_254_740_992.0;

/// A volume measured at one point of the funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Clicks,
    Leads,
    DiscoveryCalls,
    SalesCalls,
    ProposalsSent,
    NewClients,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Clicks         => "Clicks",
            Self::Leads          => "Leads",
            Self::DiscoveryCalls => "Discovery Calls",
            Self::SalesCalls     => "Sales Calls",
            Self::ProposalsSent  => "Proposals",
            Self::NewClients     => "New Clients",
        }
    }
}

/// A conversion rate between two stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateField {
    LandingPage,
    DiscoveryCall,
    SalesCall,
    Proposal,
    ClientWon,
}

impl RateField {
    pub fn input_field(&self) -> InputField {
        match self {
            Self::LandingPage   => InputField::LandingPageConversion,
            Self::DiscoveryCall => InputField::DiscoveryCallRate,
            Self::SalesCall     => InputField::SalesCallRate,
            Self::Proposal      => InputField::ProposalRate,
            Self::ClientWon     => InputField::ClientWonRate,
        }
    }

    /// The stage whose volume this rate produces.
    pub fn produces(&self) -> Stage {
        match self {
            Self::LandingPage   => Stage::Leads,
            Self::DiscoveryCall => Stage::DiscoveryCalls,
            Self::SalesCall     => Stage::SalesCalls,
            Self::Proposal      => Stage::ProposalsSent,
            Self::ClientWon     => Stage::NewClients,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelTemplate {
    pub id:     String,
    pub label:  String,
    pub stages: Vec<RateField>,
}

impl FunnelTemplate {
    pub const FULL: &'static str = "full";
    pub const NO_PROPOSAL: &'static str = "no_proposal";
    pub const DIRECT: &'static str = "direct";

    /// Clicks → leads → discovery → sales → proposal → won.
    pub fn full() -> Self {
        Self {
            id:    Self::FULL.into(),
            label: "Discovery, sales call and proposal".into(),
            stages: vec![
                RateField::LandingPage,
                RateField::DiscoveryCall,
                RateField::SalesCall,
                RateField::Proposal,
                RateField::ClientWon,
            ],
        }
    }

    pub fn no_proposal() -> Self {
        Self {
            id:    Self::NO_PROPOSAL.into(),
            label: "Discovery and sales call".into(),
            stages: vec![
                RateField::LandingPage,
                RateField::DiscoveryCall,
                RateField::SalesCall,
                RateField::ClientWon,
            ],
        }
    }

    pub fn direct() -> Self {
        Self {
            id:    Self::DIRECT.into(),
            label: "Single sales call".into(),
            stages: vec![
                RateField::LandingPage,
                RateField::SalesCall,
                RateField::ClientWon,
            ],
        }
    }

    pub fn builtin() -> Vec<Self> {
        vec![Self::full(), Self::no_proposal(), Self::direct()]
    }

    pub fn validate(&self) -> FunnelResult<()> {
        let invalid = |reason: String| FunnelError::InvalidTemplate {
            template_id: self.id.clone(),
            reason,
        };

        let n = self.stages.len();
        if !(MIN_TEMPLATE_STAGES..=MAX_TEMPLATE_STAGES).contains(&n) {
            return Err(invalid(format!(
                "expected {MIN_TEMPLATE_STAGES}-{MAX_TEMPLATE_STAGES} stages, got {n}"
            )));
        }
        if self.stages.first() != Some(&RateField::LandingPage) {
            return Err(invalid("first stage must be landing_page".into()));
        }
        if self.stages.last() != Some(&RateField::ClientWon) {
            return Err(invalid("last stage must be client_won".into()));
        }
        for (i, rate) in self.stages.iter().enumerate() {
            if self.stages[..i].contains(rate) {
                return Err(invalid(format!("stage {rate:?} appears more than once")));
            }
        }
        Ok(())
    }

    /// Conversion rates in funnel order, read from `inputs`.
    pub fn rates(&self, inputs: &Inputs) -> Vec<Percent> {
        self.stages
            .iter()
            .map(|r| inputs.get(r.input_field()))
            .collect()
    }

    pub fn has_stage(&self, stage: Stage) -> bool {
        stage == Stage::Clicks || self.stages.iter().any(|r| r.produces() == stage)
    }
}

/// A required whole-unit volume from the reverse chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    Count(u64),
    /// A 0 % rate somewhere downstream makes the goal impossible.
    Unreachable,
}

impl Requirement {
    /// The count, with `Unreachable` reported as 0.
    pub fn count(&self) -> u64 {
        match self {
            Self::Count(n) => *n,
            Self::Unreachable => 0,
        }
    }

    pub fn is_reachable(&self) -> bool {
        matches!(self, Self::Count(_))
    }
}

/// Multiply `start` through each percentage in turn.
/// Returns one volume per rate; a 0 % rate zeroes everything after it.
pub fn forward_chain(start: f64, rates: &[Percent]) -> Vec<f64> {
    rates
        .iter()
        .scan(start, |volume, rate| {
            // Zero, not a product: inf * 0 is NaN.
            *volume = if *rate > 0.0 { *volume * (rate / 100.0) } else { 0.0 };
            Some(*volume)
        })
        .collect()
}

/// Walk `rates` backward from `target`, dividing by each rate and rounding
/// up to whole units before moving to the next upstream stage.
///
/// `result[i]` is the volume required at the stage that rate `i` converts
/// from, so `result[0]` is the clicks needed and `result[n - 1]` the volume
/// entering the final (client-won) conversion.
pub fn reverse_chain(target: f64, rates: &[Percent]) -> Vec<Requirement> {
    let mut result = vec![Requirement::Unreachable; rates.len()];
    let mut required = Some(target);

    for (i, rate) in rates.iter().enumerate().rev() {
        required = match required {
            Some(r) if r <= 0.0 => Some(0.0),
            Some(r) if *rate > 0.0 => covering_units(r, rate / 100.0),
            _ => None,
        };
        result[i] = match required {
            Some(r) => Requirement::Count(r as u64),
            None => Requirement::Unreachable,
        };
    }

    result
}

/// Smallest whole number `n` with `n * fraction >= downstream`.
///
/// The quotient is only a first guess: binary rounding can leave it one
/// unit off in either direction, so the result is nudged until the
/// product itself covers `downstream` and one unit fewer does not.
/// `None` when the count would exceed `MAX_WHOLE_UNITS`.
pub fn covering_units(downstream: f64, fraction: f64) -> Option<f64> {
    let mut n = (downstream / fraction).ceil();
    if !(n <= MAX_WHOLE_UNITS) {
        return None;
    }
    while n >= 1.0 && (n - 1.0) * fraction >= downstream {
        n -= 1.0;
    }
    while n < MAX_WHOLE_UNITS && n * fraction < downstream {
        n += 1.0;
    }
    (n * fraction >= downstream).then_some(n)
}
