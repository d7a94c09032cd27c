//! Field resolution: merge a field's defaults with channel overrides.

use serde::{Deserialize, Serialize};

use triptych_common::types::MeasureType;
use triptych_transforms::aggregate::AggregateOp;
use triptych_transforms::bin::BinParams;
use triptych_transforms::pipeline::FieldTransform;
use triptych_transforms::timeunit::TimeUnit;

use crate::field::{EncodingFieldDef, FieldDef, ScaleOverride};
use crate::unit::MultimodalSpec;

/// The effective settings for one encoded field. Ephemeral: computed on
/// demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedFieldDef {
    pub field: String,
    #[serde(rename = "type")]
    pub measure_type: MeasureType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin: Option<BinParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_unit: Option<TimeUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<AggregateOp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<ScaleOverride>,
}

impl ResolvedFieldDef {
    /// The per-field settings the transform engine consumes.
    pub fn transform(&self) -> FieldTransform {
        FieldTransform {
            field: self.field.clone(),
            bin: self.bin.clone(),
            time_unit: self.time_unit.clone(),
            aggregate: self.aggregate,
        }
    }

    /// The fully-derived column name for this field.
    pub fn derived_name(&self) -> String {
        self.transform().derived_name()
    }
}

/// Merge a field definition with an optional channel-level override.
///
/// Channel settings win per key; `Suppress` drops the key from the result
/// entirely so a channel can cancel an inherited transform. Pure: equal
/// inputs always produce an equal value, which callers rely on for
/// memoization.
pub fn resolve(field: &FieldDef, encoding: Option<&EncodingFieldDef>) -> ResolvedFieldDef {
    match encoding {
        None => ResolvedFieldDef {
            field: field.name.clone(),
            measure_type: field.measure_type,
            bin: field.bin.clone(),
            time_unit: field.time_unit.clone(),
            aggregate: field.aggregate,
            scale: field.scale.clone(),
        },
        Some(enc) => ResolvedFieldDef {
            field: field.name.clone(),
            measure_type: field.measure_type,
            bin: enc.bin.resolve(field.bin.as_ref()),
            time_unit: enc.time_unit.resolve(field.time_unit.as_ref()),
            aggregate: enc.aggregate.resolve(field.aggregate.as_ref()),
            scale: enc.scale.clone().or_else(|| field.scale.clone()),
        },
    }
}

impl MultimodalSpec {
    /// Resolve an encoding against this spec's field list.
    ///
    /// An encoding pointing at an unknown field is logged and treated as
    /// unresolvable rather than failing the whole view.
    pub fn resolve_encoding(&self, encoding: &EncodingFieldDef) -> Option<ResolvedFieldDef> {
        match self.field(&encoding.field) {
            Some(field) => Some(resolve(field, Some(encoding))),
            None => {
                tracing::warn!(field = %encoding.field, "encoding references missing field");
                None
            }
        }
    }
}
