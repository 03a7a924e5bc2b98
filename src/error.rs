//! Error taxonomy for the forecasting core.
//!
//! Every variant is a caller input error detected before the first trial runs.
//! The core never retries: the computation is pure, so the same input fails
//! the same way every time.

/// Errors returned by registry validation, scenario resolution, and simulation setup.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForecastError {
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("invalid trial count {0}: must be a positive integer")]
    InvalidTrialCount(f64),

    #[error("invalid correlation {0}: must lie in [0, 1]")]
    InvalidCorrelation(f64),

    #[error("invalid registry: {0}")]
    InvalidRegistry(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ForecastError {
    /// Stable machine-readable code for the boundary layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidScenario(_) => "INVALID_SCENARIO",
            Self::InvalidTrialCount(_) => "INVALID_TRIAL_COUNT",
            Self::InvalidCorrelation(_) => "INVALID_CORRELATION",
            Self::InvalidRegistry(_) => "INVALID_REGISTRY",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }
}

pub type ForecastResult<T> = Result<T, ForecastError>;
