use triptych_sonify::error::TriptychSonifyError;
use triptych_spec::error::TriptychSpecError;

#[derive(Debug, thiserror::Error)]
pub enum TriptychAppError {
    #[error(transparent)]
    Spec(#[from] TriptychSpecError),

    #[error(transparent)]
    Sonify(#[from] TriptychSonifyError),
}
