use thiserror::Error;

/// Failures that can occur while normalizing a payload.
///
/// All variants are recovered before the pipeline boundary: a failed
/// reading is skipped, a failed metric row is dropped, and the pipeline's
/// only observable outcome is how many rows were produced.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("wrapped payload is not valid JSON: {0}")]
    MalformedEncoding(#[from] serde_json::Error),

    #[error("no sensor id could be resolved")]
    UnresolvableIdentity,

    #[error("no timestamp could be resolved and defaulting is disabled")]
    UnresolvableTimestamp,

    #[error("value for metric {metric} cannot be coerced to a number")]
    InvalidMetricValue { metric: String },

    #[error("nested payload exceeds the unwrap depth bound of {max_depth}")]
    RecursionLimitExceeded { max_depth: usize },
}

pub type NormalizeResult<T> = Result<T, NormalizeError>;
