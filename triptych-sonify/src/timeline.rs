//! Timeline construction: linearize the traversal state space into a
//! single time axis of scheduled notes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use triptych_common::dataset::{row_value, Dataset, Row};
use triptych_common::types::MeasureType;
use triptych_common::value::Value;
use triptych_scales::array;
use triptych_scales::domain::{get_domain, DomainColumn};
use triptych_scales::scale::Scale;
use triptych_spec::channel::AudioChannel;
use triptych_spec::predicate::Predicate;
use triptych_spec::resolve::ResolvedFieldDef;
use triptych_spec::unit::{AudioUnit, MultimodalSpec};
use triptych_transforms::pipeline::{apply_transforms, fields_to_transforms, FieldTransform};

use crate::config::SonifyConfig;
use crate::error::TriptychSonifyError;
use crate::note::Note;
use crate::traversal::{enumerate_states, trailing_at_end, TraversalField, TraversalState};

/// The complete schedule for one activation of an audio unit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Timeline {
    pub notes: Vec<Note>,
    /// Traversal dimensions outer to inner: (field name, domain length).
    pub dimensions: Vec<(String, usize)>,
    /// Last note's start plus its duration; scheduling past this point is
    /// undefined.
    pub total_duration: f64,
}

impl Timeline {
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// The note matching a traversal state, with its index.
    pub fn note_matching(&self, state: &TraversalState) -> Option<(usize, &Note)> {
        self.notes.iter().enumerate().find(|(_, n)| &n.state == state)
    }

    /// Elapsed offset to resume playback from a stored state.
    pub fn offset_for(&self, state: &TraversalState) -> Option<f64> {
        self.note_matching(state).map(|(_, n)| n.time)
    }
}

/// Build the event timeline for one audio unit.
///
/// Deterministic: unchanged (spec, data, selection, config) inputs always
/// produce a structurally identical timeline, which playback relies on to
/// distinguish "nothing changed" from "rebuild and reposition".
pub fn build_timeline(
    spec: &MultimodalSpec,
    unit: &AudioUnit,
    data: &Dataset,
    selection: Option<&Predicate>,
    config: &SonifyConfig,
) -> Result<Timeline, TriptychSonifyError> {
    let filtered = match selection {
        Some(predicate) => data.filter(|row| predicate.matches(row)),
        None => data.clone(),
    };

    // Traversal fields derive but never aggregate; their domains enumerate
    // the navigable states.
    let traversal_resolved: Vec<ResolvedFieldDef> = unit
        .traversal
        .iter()
        .filter_map(|enc| spec.resolve_encoding(enc))
        .map(strip_aggregate)
        .collect();

    let channel_resolved: IndexMap<AudioChannel, ResolvedFieldDef> = unit
        .encodings
        .iter()
        .filter_map(|(channel, enc)| spec.resolve_encoding(enc).map(|r| (*channel, r)))
        .collect();

    // Derive once: bins and buckets for every involved field, aggregation
    // deferred to per-state encoding below.
    let mut derivations: IndexMap<String, FieldTransform> = IndexMap::new();
    for resolved in traversal_resolved
        .iter()
        .chain(channel_resolved.values())
    {
        let ft = strip_aggregate(resolved.clone()).transform();
        derivations.entry(ft.derived_name()).or_insert(ft);
    }
    let field_transforms: Vec<FieldTransform> = derivations.values().cloned().collect();
    let derived = apply_transforms(&filtered, &fields_to_transforms(&field_transforms))?;

    let traversal_fields: Vec<TraversalField> = traversal_resolved
        .iter()
        .map(|resolved| TraversalField {
            domain: get_domain(&resolved.transform(), &derived, DomainColumn::Derived),
            resolved: resolved.clone(),
        })
        .collect();

    let dimensions: Vec<(String, usize)> = traversal_fields
        .iter()
        .map(|f| (f.name().to_string(), f.domain.len()))
        .collect();

    let states = enumerate_states(&traversal_fields);
    let subsets: Vec<Vec<&Row>> = states
        .iter()
        .map(|state| select_subset(&derived, &traversal_fields, state))
        .collect();

    let pitch = ChannelPlan::build(
        channel_resolved.get(&AudioChannel::Pitch),
        &subsets,
        &derived,
        config.pitch.default,
        config.pitch.range,
    );
    let duration = ChannelPlan::build(
        channel_resolved.get(&AudioChannel::Duration),
        &subsets,
        &derived,
        config.duration.default,
        config.duration.range,
    );
    let volume = ChannelPlan::build(
        channel_resolved.get(&AudioChannel::Volume),
        &subsets,
        &derived,
        config.volume.default,
        config.volume.range,
    );

    // Consecutive events glide rather than re-trigger when the innermost
    // dimension is continuous.
    let ramp = traversal_fields
        .last()
        .map(|f| f.resolved.measure_type.is_continuous())
        .unwrap_or(false);

    let announcer = Announcer::new(&traversal_fields, config.announce_ticks);

    let mut notes: Vec<Note> = Vec::with_capacity(states.len());
    let mut clock = 0.0;
    for (i, state) in states.iter().enumerate() {
        let note_duration = duration.encode(i).unwrap_or(config.duration.default);
        let trailing = trailing_at_end(state, &traversal_fields);
        let pause_after = if trailing > 0 {
            Some(config.section_pause * trailing as f64)
        } else {
            None
        };
        let announce = announcer.announce(&states, i);

        notes.push(Note {
            time: clock,
            duration: note_duration,
            pitch: pitch.encode(i),
            volume: volume.encode(i).unwrap_or(config.volume.default),
            state: state.clone(),
            announce,
            pause_after,
            ramp: ramp && i > 0,
        });
        clock += note_duration + pause_after.unwrap_or(0.0);
    }

    let total_duration = notes
        .last()
        .map(|n| n.time + n.duration)
        .unwrap_or(0.0);

    Ok(Timeline {
        notes,
        dimensions,
        total_duration,
    })
}

fn strip_aggregate(mut resolved: ResolvedFieldDef) -> ResolvedFieldDef {
    resolved.aggregate = None;
    resolved
}

/// Rows of the derived dataset matching one traversal state, by semantic
/// equality on each traversal field's derived column.
fn select_subset<'a>(
    derived: &'a Dataset,
    fields: &[TraversalField],
    state: &TraversalState,
) -> Vec<&'a Row> {
    let keys: Vec<(String, String)> = fields
        .iter()
        .filter_map(|f| {
            let index = *state.get(f.name())?;
            let value = f.domain.get(index)?;
            Some((f.resolved.transform().derived_name(), value.group_key()))
        })
        .collect();

    derived
        .rows()
        .iter()
        .filter(|row| {
            keys.iter()
                .all(|(column, key)| &row_value(row, column).group_key() == key)
        })
        .collect()
}

/// Per-channel encoding: raw per-state values plus the scale mapping them
/// into the channel's output range.
struct ChannelPlan {
    has_field: bool,
    default: f64,
    values: Vec<Option<Value>>,
    scale: Option<Scale>,
}

impl ChannelPlan {
    fn build(
        resolved: Option<&ResolvedFieldDef>,
        subsets: &[Vec<&Row>],
        derived: &Dataset,
        default: f64,
        range: (f64, f64),
    ) -> Self {
        let Some(resolved) = resolved else {
            return Self {
                has_field: false,
                default,
                values: Vec::new(),
                scale: None,
            };
        };

        let range = resolved
            .scale
            .as_ref()
            .and_then(|s| s.range)
            .unwrap_or(range);
        let value_column = strip_aggregate(resolved.clone()).transform().derived_name();

        let values: Vec<Option<Value>> = subsets
            .iter()
            .map(|rows| match resolved.aggregate {
                // Aggregates re-apply over the state's subset, so filtering
                // always drives the number.
                Some(op) => {
                    let column: Vec<&Value> =
                        rows.iter().map(|r| row_value(r, &value_column)).collect();
                    op.apply(&column).map(Value::Number)
                }
                None => rows
                    .first()
                    .map(|r| row_value(r, &value_column))
                    .filter(|v| !v.is_null())
                    .cloned(),
            })
            .collect();

        let scale_domain: Vec<Value> = match &resolved.scale {
            Some(override_) if override_.domain.is_some() => {
                override_.domain.clone().unwrap_or_default()
            }
            _ => {
                if resolved.aggregate.is_some() {
                    // Aggregated values exist only per state; their extent
                    // is the scale domain.
                    values.iter().flatten().cloned().collect()
                } else {
                    get_domain(
                        &strip_aggregate(resolved.clone()).transform(),
                        derived,
                        DomainColumn::Derived,
                    )
                }
            }
        };

        // Aggregated values are numeric whatever the source field measures.
        let scale_measure = if resolved.aggregate.is_some() {
            MeasureType::Quantitative
        } else {
            resolved.measure_type
        };
        let scale = match Scale::for_measure(scale_measure, &scale_domain, range) {
            Ok(scale) => Some(scale),
            Err(err) => {
                tracing::warn!(field = %resolved.field, %err, "channel scale unavailable");
                None
            }
        };

        Self {
            has_field: true,
            default,
            values,
            scale,
        }
    }

    /// Encoded output for state `i`. `None` means "no data here": pitch
    /// turns that into a noise event, other channels fall back to their
    /// default.
    fn encode(&self, i: usize) -> Option<f64> {
        if !self.has_field {
            return Some(self.default);
        }
        let value = self.values.get(i)?.as_ref()?;
        self.scale.as_ref()?.scale_value(value)
    }
}

/// Boundary-based announcement text.
///
/// A field announces when its value crosses a tick/bucket boundary
/// relative to the previous event: derived axis ticks for continuous
/// fields, the raw domain index for discrete ones. The first event always
/// announces every field.
struct Announcer<'a> {
    fields: &'a [TraversalField],
    /// Tick boundaries per dimension; `None` for discrete dimensions.
    ticks: Vec<Option<Vec<f64>>>,
}

impl<'a> Announcer<'a> {
    fn new(fields: &'a [TraversalField], tick_count: f64) -> Self {
        let ticks = fields
            .iter()
            .map(|f| {
                if !f.resolved.measure_type.is_continuous() {
                    return None;
                }
                let numeric: Vec<f64> =
                    f.domain.iter().filter_map(|v| v.to_numeric()).collect();
                let lo = numeric.iter().cloned().fold(f64::INFINITY, f64::min);
                let hi = numeric.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                if lo.is_finite() && hi.is_finite() {
                    Some(array::ticks(lo, hi, tick_count))
                } else {
                    None
                }
            })
            .collect();
        Self { fields, ticks }
    }

    fn announce(&self, states: &[TraversalState], i: usize) -> Option<String> {
        let state = &states[i];
        let previous = if i == 0 { None } else { states.get(i - 1) };

        let mut parts: Vec<String> = Vec::new();
        for (dim, field) in self.fields.iter().enumerate() {
            let index = *state.get(field.name())?;
            let crossed = match previous {
                None => true,
                Some(prev) => {
                    let prev_index = *prev.get(field.name())?;
                    self.crossed_boundary(dim, field, prev_index, index)
                }
            };
            if crossed {
                if let Some(value) = field.domain.get(index) {
                    parts.push(format!("{} {}", field.name(), format_value(field, value)));
                }
            }
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }

    fn crossed_boundary(
        &self,
        dim: usize,
        field: &TraversalField,
        prev_index: usize,
        index: usize,
    ) -> bool {
        match &self.ticks[dim] {
            // Discrete: any index change is a boundary.
            None => prev_index != index,
            Some(ticks) => {
                let bucket = |i: usize| -> Option<usize> {
                    let v = field.domain.get(i)?.to_numeric()?;
                    Some(ticks.iter().filter(|t| **t <= v).count())
                };
                match (bucket(prev_index), bucket(index)) {
                    (Some(a), Some(b)) => a != b,
                    _ => prev_index != index,
                }
            }
        }
    }
}

fn format_value(field: &TraversalField, value: &Value) -> String {
    match (&field.resolved.time_unit, value) {
        (Some(unit), Value::Date(dt)) => unit.format(dt),
        _ => value.to_string(),
    }
}
