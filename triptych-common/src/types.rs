//! Shared vocabulary types used across the workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Measurement type of a field, inferred at load time or assigned by the
/// editor.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MeasureType {
    Nominal,
    Ordinal,
    Quantitative,
    Temporal,
}

impl MeasureType {
    /// Continuous types traverse smoothly and use interval scales.
    pub fn is_continuous(&self) -> bool {
        matches!(self, MeasureType::Quantitative | MeasureType::Temporal)
    }

    /// Discrete types enumerate their domain values directly.
    pub fn is_discrete(&self) -> bool {
        !self.is_continuous()
    }
}

/// The three consuming views of one specification. Selection updates carry
/// their originating view so consumers can ignore their own echo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Visual,
    Text,
    Audio,
}
