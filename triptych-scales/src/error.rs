#[derive(Debug, PartialEq, thiserror::Error)]
pub enum TriptychScaleError {
    #[error("Empty domain")]
    EmptyDomain,

    #[error("Domain value not found: {0}")]
    DomainValueNotFound(String),

    #[error("Unsupported field type for scale construction: {0}")]
    UnsupportedFieldType(String),
}
