use triptych_transforms::error::TriptychTransformError;

#[derive(Debug, thiserror::Error)]
pub enum TriptychSpecError {
    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),

    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Duplicate field name: {0}")]
    DuplicateField(String),

    #[error("Transform incompatible with field type: {0}")]
    IncompatibleTransform(String),

    #[error(transparent)]
    Transform(#[from] TriptychTransformError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Compression error: {0}")]
    Compression(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Percent-decoding error: {0}")]
    PercentDecode(#[from] std::string::FromUtf8Error),
}
