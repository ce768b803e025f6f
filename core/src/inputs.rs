//! Inputs: the single mutable record of funnel assumptions.
//!
//! RULE: Inputs are never patched in place by callers.
//! Every edit goes through `with_field()`, which returns a new record
//! and applies the acquisition-ceiling clamp.
//!
//! The flat-record form (`field name → number`) is the only
//! serialization contract the core offers to persistence layers.

use crate::error::{FunnelError, FunnelResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Lifetime value is divided by this to get the most that may be spent
/// acquiring one client.
pub const ACQUISITION_CEILING_DIVISOR: f64 = 3.0;

/// Flat `field name → number` form of an `Inputs` record.
pub type FlatRecord = BTreeMap<String, f64>;

/// Maximum acceptable acquisition cost for one client.
pub fn derive_acquisition_ceiling(avg_lifetime_value: f64) -> f64 {
    avg_lifetime_value / ACQUISITION_CEILING_DIVISOR
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inputs {
    pub avg_lifetime_value:      f64,
    pub monthly_marketing_budget: f64,
    pub cost_per_click:          f64,
    #[serde(default)]
    pub management_fee:          f64,
    pub landing_page_conversion: f64,
    pub discovery_call_rate:     f64,
    pub sales_call_rate:         f64,
    pub proposal_rate:           f64,
    pub client_won_rate:         f64,
    pub target_new_clients:      f64,
    pub client_spend:            f64,
}

impl Inputs {
    pub fn get(&self, field: InputField) -> f64 {
        match field {
            InputField::AvgLifetimeValue      => self.avg_lifetime_value,
            InputField::MonthlyMarketingBudget => self.monthly_marketing_budget,
            InputField::CostPerClick          => self.cost_per_click,
            InputField::ManagementFee         => self.management_fee,
            InputField::LandingPageConversion => self.landing_page_conversion,
            InputField::DiscoveryCallRate     => self.discovery_call_rate,
            InputField::SalesCallRate         => self.sales_call_rate,
            InputField::ProposalRate          => self.proposal_rate,
            InputField::ClientWonRate         => self.client_won_rate,
            InputField::TargetNewClients      => self.target_new_clients,
            InputField::ClientSpend           => self.client_spend,
        }
    }

    fn set_raw(&mut self, field: InputField, value: f64) {
        let slot = match field {
            InputField::AvgLifetimeValue      => &mut self.avg_lifetime_value,
            InputField::MonthlyMarketingBudget => &mut self.monthly_marketing_budget,
            InputField::CostPerClick          => &mut self.cost_per_click,
            InputField::ManagementFee         => &mut self.management_fee,
            InputField::LandingPageConversion => &mut self.landing_page_conversion,
            InputField::DiscoveryCallRate     => &mut self.discovery_call_rate,
            InputField::SalesCallRate         => &mut self.sales_call_rate,
            InputField::ProposalRate          => &mut self.proposal_rate,
            InputField::ClientWonRate         => &mut self.client_won_rate,
            InputField::TargetNewClients      => &mut self.target_new_clients,
            InputField::ClientSpend           => &mut self.client_spend,
        };
        *slot = value;
    }

    /// Copy-on-write edit of a single field.
    ///
    /// - `avgLifetimeValue`: the acquisition ceiling is recomputed and
    ///   `clientSpend` is pulled down to it if it now exceeds it.
    /// - `clientSpend`: the new value is capped at the current ceiling.
    /// - anything else: stored as given.
    pub fn with_field(&self, field: InputField, value: f64) -> Inputs {
        let mut next = *self;
        match field {
            InputField::AvgLifetimeValue => {
                next.avg_lifetime_value = value;
                next.client_spend = self.client_spend.min(derive_acquisition_ceiling(value));
            }
            // NaN passes through so validation can flag it.
            InputField::ClientSpend if !value.is_nan() => {
                next.client_spend = value.min(self.acquisition_ceiling());
            }
            other => next.set_raw(other, value),
        }
        next
    }

    pub fn acquisition_ceiling(&self) -> f64 {
        derive_acquisition_ceiling(self.avg_lifetime_value)
    }

    /// Apply the acquisition ceiling once, as done when a scenario is
    /// created from a template or restored from a record. NaN is left for
    /// validation to report.
    pub fn normalized(&self) -> Inputs {
        if self.client_spend.is_nan() {
            return *self;
        }
        Inputs {
            client_spend: self.client_spend.min(self.acquisition_ceiling()),
            ..*self
        }
    }

    pub fn to_record(&self) -> FlatRecord {
        InputField::ALL
            .iter()
            .map(|f| (f.key().to_string(), self.get(*f)))
            .collect()
    }

    /// Rebuild a record from its flat form. Keys missing from `record`
    /// keep the value from `template`; unknown keys are rejected.
    /// Values are restored verbatim; callers apply `normalized()` to
    /// re-establish the acquisition ceiling.
    pub fn from_record(record: &FlatRecord, template: &Inputs) -> FunnelResult<Inputs> {
        let mut inputs = *template;
        for (key, value) in record {
            let field: InputField = key.parse()?;
            inputs.set_raw(field, *value);
        }
        Ok(inputs)
    }
}

/// Every editable field of `Inputs`, keyed by its camelCase record name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputField {
    AvgLifetimeValue,
    MonthlyMarketingBudget,
    CostPerClick,
    ManagementFee,
    LandingPageConversion,
    DiscoveryCallRate,
    SalesCallRate,
    ProposalRate,
    ClientWonRate,
    TargetNewClients,
    ClientSpend,
}

impl InputField {
    pub const ALL: [InputField; 11] = [
        InputField::AvgLifetimeValue,
        InputField::MonthlyMarketingBudget,
        InputField::CostPerClick,
        InputField::ManagementFee,
        InputField::LandingPageConversion,
        InputField::DiscoveryCallRate,
        InputField::SalesCallRate,
        InputField::ProposalRate,
        InputField::ClientWonRate,
        InputField::TargetNewClients,
        InputField::ClientSpend,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::AvgLifetimeValue      => "avgLifetimeValue",
            Self::MonthlyMarketingBudget => "monthlyMarketingBudget",
            Self::CostPerClick          => "costPerClick",
            Self::ManagementFee         => "managementFee",
            Self::LandingPageConversion => "landingPageConversion",
            Self::DiscoveryCallRate     => "discoveryCallRate",
            Self::SalesCallRate         => "salesCallRate",
            Self::ProposalRate          => "proposalRate",
            Self::ClientWonRate         => "clientWonRate",
            Self::TargetNewClients      => "targetNewClients",
            Self::ClientSpend           => "clientSpend",
        }
    }

    /// Fields stored on the 0–100 percentage scale.
    pub fn is_percentage(&self) -> bool {
        matches!(
            self,
            Self::LandingPageConversion
                | Self::DiscoveryCallRate
                | Self::SalesCallRate
                | Self::ProposalRate
                | Self::ClientWonRate
        )
    }
}

impl fmt::Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for InputField {
    type Err = FunnelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InputField::ALL
            .into_iter()
            .find(|f| f.key() == s)
            .ok_or_else(|| FunnelError::UnknownField { name: s.to_string() })
    }
}
