#[derive(Debug, PartialEq, thiserror::Error)]
pub enum TriptychTransformError {
    #[error("Unsupported aggregate operation: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid time unit token: {0}")]
    InvalidTimeUnit(String),

    #[error("Bin step must be positive, got {0}")]
    InvalidBinStep(f64),
}
