//! Sonification defaults. These are configuration, not protocol: players
//! may tune them without affecting timeline semantics.

use serde::{Deserialize, Serialize};

/// Output range and fallback value for one audio channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelRange {
    /// Value used when no field is assigned to the channel.
    pub default: f64,
    /// Range encoded values scale into.
    pub range: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SonifyConfig {
    /// MIDI note numbers.
    pub pitch: ChannelRange,
    /// Seconds.
    pub duration: ChannelRange,
    /// Decibels.
    pub volume: ChannelRange,
    /// Pause inserted per completed trailing traversal dimension, seconds.
    pub section_pause: f64,
    /// Approximate tick count used for announcement boundaries on
    /// continuous traversal fields.
    pub announce_ticks: f64,
}

impl Default for SonifyConfig {
    fn default() -> Self {
        Self {
            pitch: ChannelRange {
                default: 60.0,
                range: (48.0, 84.0),
            },
            duration: ChannelRange {
                default: 0.2,
                range: (0.1, 0.6),
            },
            volume: ChannelRange {
                default: -15.0,
                range: (-28.0, -6.0),
            },
            section_pause: 0.4,
            announce_ticks: 10.0,
        }
    }
}
