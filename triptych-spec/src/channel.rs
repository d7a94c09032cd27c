//! Encoding channels as a tagged sum over the visual and audio planes.
//!
//! Keeping the two planes as distinct enums lets the compiler enforce
//! exhaustive handling wherever a channel is dispatched on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

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
pub enum VisualChannel {
    X,
    Y,
    Color,
    Size,
    Shape,
    Facet,
    Detail,
}

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
pub enum AudioChannel {
    Pitch,
    Duration,
    Volume,
}

/// Any channel of either plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Channel {
    Visual(VisualChannel),
    Audio(AudioChannel),
}

impl Channel {
    pub fn is_audio(&self) -> bool {
        matches!(self, Channel::Audio(_))
    }

    pub fn is_visual(&self) -> bool {
        matches!(self, Channel::Visual(_))
    }
}

impl From<VisualChannel> for Channel {
    fn from(c: VisualChannel) -> Self {
        Channel::Visual(c)
    }
}

impl From<AudioChannel> for Channel {
    fn from(c: AudioChannel) -> Self {
        Channel::Audio(c)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Visual(c) => write!(f, "{c}"),
            Channel::Audio(c) => write!(f, "{c}"),
        }
    }
}

impl FromStr for Channel {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(c) = s.parse::<VisualChannel>() {
            return Ok(Channel::Visual(c));
        }
        s.parse::<AudioChannel>().map(Channel::Audio)
    }
}
