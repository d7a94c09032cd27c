use triptych_scales::error::TriptychScaleError;
use triptych_transforms::error::TriptychTransformError;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum TriptychSonifyError {
    #[error(transparent)]
    Transform(#[from] TriptychTransformError),

    #[error(transparent)]
    Scale(#[from] TriptychScaleError),
}
