pub mod config;
pub mod error;
pub mod funnel;
pub mod inputs;
pub mod projection;
pub mod ratios;
pub mod scenario;
pub mod types;
pub mod validation;

pub use config::{FunnelConfig, ProjectionSettings, RevenueBasis};
pub use error::{FunnelError, FunnelResult};
pub use funnel::{FunnelTemplate, Requirement, Stage};
pub use inputs::{derive_acquisition_ceiling, InputField, Inputs};
pub use projection::{project, Metrics};
pub use scenario::{Scenario, ScenarioBook};
pub use validation::{validate, ValidationReport};
