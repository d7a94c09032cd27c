//! Compile the declarative spec into consumer formats: a renderable chart
//! specification (JSON, grammar-of-graphics shaped) and a navigable
//! textual structure.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as Json};

use triptych_common::dataset::Dataset;
use triptych_common::types::MeasureType;
use triptych_scales::domain::{get_domain, DomainColumn};

use crate::channel::VisualChannel;
use crate::describe::describe_field;
use crate::resolve::{resolve, ResolvedFieldDef};
use crate::unit::{Composition, Mark, MultimodalSpec, VisualUnit};

/// Names of the interactive selection constructs attached to the first
/// unit. External views drive filtering/highlighting through these.
pub const BRUSH_PARAM: &str = "brush";
pub const EXTERNAL_STATE_PARAM: &str = "external_state";

/// Compile the visual units into a renderable chart specification.
///
/// Returns `None` when there is nothing to render: no visual units, or no
/// channel encodings across all of them. Callers treat that as a normal
/// state, not a fault.
pub fn compile(spec: &MultimodalSpec, data: &Dataset) -> Option<Json> {
    if spec.visual.is_empty() || spec.total_visual_encodings() == 0 {
        return None;
    }

    let children: Vec<Json> = spec
        .visual
        .iter()
        .enumerate()
        .map(|(i, unit)| compile_unit(spec, unit, data, i == 0))
        .collect();

    let mut root = Map::new();
    root.insert("data".to_string(), json!({ "name": spec.dataset }));

    if children.len() == 1 {
        if let Some(Json::Object(child)) = children.into_iter().next() {
            for (k, v) in child {
                root.insert(k, v);
            }
        }
    } else {
        let key = match spec.composition {
            Composition::Layer => "layer",
            Composition::Concat => "concat",
        };
        root.insert(key.to_string(), Json::Array(children));
    }

    Some(Json::Object(root))
}

fn compile_unit(spec: &MultimodalSpec, unit: &VisualUnit, data: &Dataset, first: bool) -> Json {
    let mut encoding = Map::new();
    let mut columns: Option<u64> = None;

    for (channel, enc) in &unit.encodings {
        let Some(resolved) = spec.resolve_encoding(enc) else {
            // A broken encoding must not blank the whole view.
            continue;
        };

        if *channel == VisualChannel::Facet {
            let domain = get_domain(&resolved.transform(), data, DomainColumn::Raw);
            columns = Some(if domain.len() == 3 { 3 } else { 2 });
        }

        encoding.insert(
            channel.to_string(),
            encoding_json(&resolved, *channel, unit.mark),
        );
    }

    let mut out = Map::new();
    out.insert("mark".to_string(), json!(unit.mark.to_string()));
    out.insert("encoding".to_string(), Json::Object(encoding));
    if let Some(columns) = columns {
        out.insert("columns".to_string(), json!(columns));
    }
    if first {
        out.insert(
            "params".to_string(),
            json!([
                { "name": BRUSH_PARAM, "select": { "type": "interval" } },
                { "name": EXTERNAL_STATE_PARAM, "select": { "type": "point" } },
            ]),
        );
    }
    Json::Object(out)
}

fn encoding_json(resolved: &ResolvedFieldDef, channel: VisualChannel, mark: Mark) -> Json {
    let mut enc = Map::new();
    enc.insert("field".to_string(), json!(resolved.field));
    enc.insert("type".to_string(), json!(resolved.measure_type.to_string()));

    if let Some(bin) = &resolved.bin {
        enc.insert("bin".to_string(), json!({ "maxbins": bin.maxbins }));
    }
    if let Some(unit) = &resolved.time_unit {
        enc.insert("timeUnit".to_string(), json!(unit.token()));
    }
    if let Some(op) = resolved.aggregate {
        enc.insert("aggregate".to_string(), json!(op.to_string()));
    }

    let mut scale = Map::new();
    if let Some(override_) = &resolved.scale {
        if let Some(domain) = &override_.domain {
            scale.insert("domain".to_string(), json!(domain));
        }
        if let Some((lo, hi)) = override_.range {
            scale.insert("range".to_string(), json!([lo, hi]));
        }
    }
    // Point marks on a quantitative position read better without forcing
    // the zero baseline into view.
    if mark.is_point_mark()
        && matches!(channel, VisualChannel::X | VisualChannel::Y)
        && resolved.measure_type == MeasureType::Quantitative
    {
        scale.insert("zero".to_string(), json!(false));
    }
    if !scale.is_empty() {
        enc.insert("scale".to_string(), Json::Object(scale));
    }

    Json::Object(enc)
}

/// One field entry of the textual structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureField {
    pub name: String,
    #[serde(rename = "type")]
    pub measure_type: MeasureType,
    pub description: String,
}

/// The navigable textual form of a specification: the same resolved units,
/// stripped of rendering-only attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureSpec {
    pub dataset: String,
    pub fields: Vec<StructureField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key: Vec<String>,
}

/// Build the textual structure from the encoded fields, then append any
/// active field the encodings missed so no active field is silently
/// dropped from the textual representation.
pub fn structure(spec: &MultimodalSpec) -> StructureSpec {
    let mut fields: Vec<StructureField> = Vec::new();

    let encoded = spec
        .visual
        .iter()
        .flat_map(|u| u.encodings.values())
        .chain(spec.audio.iter().flat_map(|u| u.encodings.values()))
        .chain(spec.audio.iter().flat_map(|u| u.traversal.iter()));
    for enc in encoded {
        if fields.iter().any(|f| f.name == enc.field) {
            continue;
        }
        if let Some(resolved) = spec.resolve_encoding(enc) {
            fields.push(structure_field(&resolved));
        }
    }

    for field in spec.active_fields() {
        if !fields.iter().any(|f| f.name == field.name) {
            fields.push(structure_field(&resolve(field, None)));
        }
    }

    StructureSpec {
        dataset: spec.dataset.clone(),
        fields,
        key: spec.key.clone(),
    }
}

fn structure_field(resolved: &ResolvedFieldDef) -> StructureField {
    StructureField {
        name: resolved.field.clone(),
        measure_type: resolved.measure_type,
        description: describe_field(resolved),
    }
}
