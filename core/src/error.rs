use crate::validation::ValidationReport;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FunnelError {
    #[error("Invalid input: {0}")]
    InvalidInput(ValidationReport),

    #[error("Invalid funnel template '{template_id}': {reason}")]
    InvalidTemplate { template_id: String, reason: String },

    #[error("Invalid projection settings: {reason}")]
    InvalidSettings { reason: String },

    #[error("Funnel template '{id}' not found")]
    TemplateNotFound { id: String },

    #[error("Unknown input field '{name}'")]
    UnknownField { name: String },

    #[error("Scenario '{id}' not found")]
    ScenarioNotFound { id: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type FunnelResult<T> = Result<T, FunnelError>;
