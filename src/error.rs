use thiserror::Error;

/// Top-level error type for the contour trimming pipeline.
#[derive(Debug, Error)]
pub enum TrimError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors related to geometric inputs.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("expected at least {required} vertices, got {actual}")]
    TooFewVertices { required: usize, actual: usize },

    #[error("non-finite coordinate ({x}, {y})")]
    NonFinite { x: f64, y: f64 },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}

/// Errors related to pipeline operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation failed: {0}")]
    Failed(String),
}

/// Errors related to pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Convenience type alias for results using [`TrimError`].
pub type Result<T> = std::result::Result<T, TrimError>;
