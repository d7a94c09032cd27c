//! Field definitions and channel-level overrides.

use serde::{Deserialize, Serialize};

use triptych_common::types::MeasureType;
use triptych_common::value::Value;
use triptych_transforms::aggregate::AggregateOp;
use triptych_transforms::bin::BinParams;
use triptych_transforms::timeunit::TimeUnit;

use crate::channel::Channel;
use crate::error::TriptychSpecError;

/// Explicit scale bounds carried by a field or an encoding.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScaleOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<(f64, f64)>,
}

/// A three-state channel-level setting.
///
/// `Inherit` defers to the field's default, `Override` replaces it, and
/// `Suppress` forces the inherited value off, which is distinct from
/// leaving the setting unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Setting<T> {
    #[default]
    Inherit,
    Override(T),
    Suppress,
}

impl<T> Setting<T> {
    pub fn is_inherit(&self) -> bool {
        matches!(self, Setting::Inherit)
    }
}

impl<T: Clone> Setting<T> {
    /// Merge against an inherited value; `Suppress` drops the key entirely.
    pub fn resolve(&self, inherited: Option<&T>) -> Option<T> {
        match self {
            Setting::Inherit => inherited.cloned(),
            Setting::Override(v) => Some(v.clone()),
            Setting::Suppress => None,
        }
    }
}

/// One column of the dataset, with its default transform settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
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
    /// Channels currently using this field, maintained by the editor.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub encodings: Vec<EncodingRef>,
}

fn default_active() -> bool {
    true
}

impl FieldDef {
    pub fn new(name: impl Into<String>, measure_type: MeasureType) -> Self {
        Self {
            name: name.into(),
            active: true,
            measure_type,
            bin: None,
            time_unit: None,
            aggregate: None,
            scale: None,
            encodings: Vec::new(),
        }
    }

    pub fn bin(mut self, params: BinParams) -> Self {
        self.bin = Some(params);
        self
    }

    pub fn time_unit(mut self, unit: TimeUnit) -> Self {
        self.time_unit = Some(unit);
        self
    }

    pub fn aggregate(mut self, op: AggregateOp) -> Self {
        self.aggregate = Some(op);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Check transform/type compatibility: bin and time units apply only to
    /// quantitative or temporal fields, aggregation only to quantitative.
    pub fn validate(&self) -> Result<(), TriptychSpecError> {
        if (self.bin.is_some() || self.time_unit.is_some()) && self.measure_type.is_discrete() {
            return Err(TriptychSpecError::IncompatibleTransform(format!(
                "{}: bin/timeUnit on {} field",
                self.name, self.measure_type
            )));
        }
        if self.aggregate.is_some() && self.measure_type != MeasureType::Quantitative {
            return Err(TriptychSpecError::IncompatibleTransform(format!(
                "{}: aggregate on {} field",
                self.name, self.measure_type
            )));
        }
        Ok(())
    }
}

/// Back-reference from a field to a channel that encodes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingRef {
    pub unit: String,
    pub channel: Channel,
}

/// A field assigned to a channel, with optional per-channel overrides of
/// the field's default transform settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingFieldDef {
    pub field: String,
    #[serde(default, skip_serializing_if = "Setting::is_inherit")]
    pub bin: Setting<BinParams>,
    #[serde(default, skip_serializing_if = "Setting::is_inherit")]
    pub time_unit: Setting<TimeUnit>,
    #[serde(default, skip_serializing_if = "Setting::is_inherit")]
    pub aggregate: Setting<AggregateOp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<ScaleOverride>,
}

impl EncodingFieldDef {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            bin: Setting::Inherit,
            time_unit: Setting::Inherit,
            aggregate: Setting::Inherit,
            scale: None,
        }
    }

    pub fn bin(mut self, setting: Setting<BinParams>) -> Self {
        self.bin = setting;
        self
    }

    pub fn time_unit(mut self, setting: Setting<TimeUnit>) -> Self {
        self.time_unit = setting;
        self
    }

    pub fn aggregate(mut self, setting: Setting<AggregateOp>) -> Self {
        self.aggregate = setting;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_incompatible_transforms() {
        let f = FieldDef::new("region", MeasureType::Nominal).bin(BinParams::default());
        assert!(f.validate().is_err());

        let f = FieldDef::new("region", MeasureType::Nominal).aggregate(AggregateOp::Mean);
        assert!(f.validate().is_err());

        let f = FieldDef::new("sales", MeasureType::Quantitative).aggregate(AggregateOp::Mean);
        assert!(f.validate().is_ok());
    }

    #[test]
    fn test_setting_serde_shapes() {
        let e = EncodingFieldDef::new("sales").aggregate(Setting::Suppress);
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["aggregate"], serde_json::json!("suppress"));
        assert!(json.get("bin").is_none());

        let e = EncodingFieldDef::new("sales").aggregate(Setting::Override(AggregateOp::Sum));
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["aggregate"]["override"], serde_json::json!("sum"));

        let back: EncodingFieldDef = serde_json::from_value(json).unwrap();
        assert_eq!(back.aggregate, Setting::Override(AggregateOp::Sum));
    }
}
