//! Visual and audio units and the top-level specification.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::channel::{AudioChannel, VisualChannel};
use crate::field::{EncodingFieldDef, FieldDef};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Point,
    Bar,
    Line,
    Area,
    Rect,
}

impl Mark {
    /// Point-like marks drop the zero baseline on quantitative positions.
    pub fn is_point_mark(&self) -> bool {
        matches!(self, Mark::Point)
    }
}

/// How sibling units compose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Composition {
    #[default]
    Layer,
    Concat,
}

/// One visual mark with its channel encodings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualUnit {
    pub name: String,
    pub mark: Mark,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub encodings: IndexMap<VisualChannel, EncodingFieldDef>,
}

impl VisualUnit {
    pub fn new(name: impl Into<String>, mark: Mark) -> Self {
        Self {
            name: name.into(),
            mark,
            encodings: IndexMap::new(),
        }
    }

    pub fn encode(mut self, channel: VisualChannel, encoding: EncodingFieldDef) -> Self {
        self.encodings.insert(channel, encoding);
        self
    }
}

/// One audio voice: channel encodings plus the ordered traversal fields
/// whose domain values enumerate its playable states, outer to inner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioUnit {
    pub name: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub encodings: IndexMap<AudioChannel, EncodingFieldDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traversal: Vec<EncodingFieldDef>,
}

impl AudioUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            encodings: IndexMap::new(),
            traversal: Vec::new(),
        }
    }

    pub fn encode(mut self, channel: AudioChannel, encoding: EncodingFieldDef) -> Self {
        self.encodings.insert(channel, encoding);
        self
    }

    pub fn traverse(mut self, encoding: EncodingFieldDef) -> Self {
        self.traversal.push(encoding);
        self
    }
}

/// The complete declarative specification for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultimodalSpec {
    /// Name of the dataset in the external store; row data is never inlined.
    pub dataset: String,
    pub fields: Vec<FieldDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visual: Vec<VisualUnit>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audio: Vec<AudioUnit>,
    #[serde(default)]
    pub composition: Composition,
}

impl MultimodalSpec {
    pub fn new(dataset: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            dataset: dataset.into(),
            fields,
            key: Vec::new(),
            visual: Vec::new(),
            audio: Vec::new(),
            composition: Composition::default(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn active_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.active)
    }

    /// Total channel encodings across all visual units.
    pub fn total_visual_encodings(&self) -> usize {
        self.visual.iter().map(|u| u.encodings.len()).sum()
    }
}
