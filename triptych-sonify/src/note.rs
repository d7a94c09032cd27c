//! Scheduled audio events.

use serde::{Deserialize, Serialize};

use crate::traversal::TraversalState;

/// One scheduled unit of audio output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Absolute start time, seconds from timeline origin.
    pub time: f64,
    /// Sounding duration, seconds.
    pub duration: f64,
    /// MIDI pitch; `None` means a noise/percussive event (no data).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    /// Volume in decibels.
    pub volume: f64,
    /// The traversal state this event sounds.
    pub state: TraversalState,
    /// Spoken text, present when a traversal boundary was crossed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub announce: Option<String>,
    /// Section-boundary pause inserted after this event, seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_after: Option<f64>,
    /// Glide from the previous event instead of re-triggering.
    #[serde(default)]
    pub ramp: bool,
}

impl Note {
    /// The moment the next event may start.
    pub fn end_time(&self) -> f64 {
        self.time + self.duration + self.pause_after.unwrap_or(0.0)
    }
}
