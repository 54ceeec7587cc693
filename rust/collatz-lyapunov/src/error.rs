use num_bigint::BigUint;

/// Errors surfaced by the engine, the batch runner and the CLI layer.
#[derive(Debug, thiserror::Error)]
pub enum CollatzError {
    #[error("starting number must be a positive integer, got {0}")]
    NonPositiveStart(String),

    #[error("invalid range [{start}, {end}]: need 1 <= start <= end")]
    InvalidRange { start: u64, end: u64 },

    #[error("trajectory of {start} exceeded the step cap of {cap}")]
    StepCapExceeded { start: BigUint, cap: u64 },

    #[error("invalid value for --{key}: {value}")]
    InvalidArgument { key: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
