//! Default chart + sonification pairing.
//!
//! An ordered list of (predicate, generator) rules evaluated top-down,
//! first match wins. Several rules can structurally match the same field
//! shape; list order is the tie-break, so the order here is part of the
//! contract.

use lazy_static::lazy_static;

use triptych_common::dataset::Dataset;
use triptych_common::types::MeasureType;
use triptych_transforms::aggregate::AggregateOp;
use triptych_transforms::bin::BinParams;

use crate::channel::{AudioChannel, VisualChannel};
use crate::field::{EncodingFieldDef, FieldDef, Setting};
use crate::infer::detect_key;
use crate::unit::{AudioUnit, Mark, MultimodalSpec, VisualUnit};

/// Field shapes a rule predicate inspects.
pub struct RuleContext<'a> {
    /// Detected key fields, in key order.
    pub key: Vec<&'a FieldDef>,
    /// Active non-key fields.
    pub values: Vec<&'a FieldDef>,
}

impl RuleContext<'_> {
    fn key_of(&self, measure: MeasureType) -> Option<&FieldDef> {
        self.key.iter().find(|f| f.measure_type == measure).copied()
    }

    fn value_of(&self, measure: MeasureType) -> Option<&FieldDef> {
        self.values
            .iter()
            .find(|f| f.measure_type == measure)
            .copied()
    }
}

pub struct SpecRule {
    pub name: &'static str,
    pub matches: fn(&RuleContext<'_>) -> bool,
    pub generate: fn(&RuleContext<'_>) -> (Vec<VisualUnit>, Vec<AudioUnit>),
}

lazy_static! {
    /// Evaluated top-down; do not reorder.
    pub static ref DEFAULT_SPEC_RULES: Vec<SpecRule> = vec![
        SpecRule {
            name: "trend-over-one-key",
            matches: |ctx| {
                ctx.key.len() == 1
                    && matches!(
                        ctx.key[0].measure_type,
                        MeasureType::Temporal | MeasureType::Ordinal
                    )
                    && ctx.value_of(MeasureType::Quantitative).is_some()
            },
            generate: |ctx| {
                let key = ctx.key[0];
                let value = ctx
                    .value_of(MeasureType::Quantitative)
                    .expect("checked by matches");
                let visual = VisualUnit::new("trend", Mark::Line)
                    .encode(VisualChannel::X, EncodingFieldDef::new(&key.name))
                    .encode(VisualChannel::Y, EncodingFieldDef::new(&value.name));
                let audio = AudioUnit::new("trend-voice")
                    .encode(AudioChannel::Pitch, EncodingFieldDef::new(&value.name))
                    .traverse(EncodingFieldDef::new(&key.name));
                (vec![visual], vec![audio])
            },
        },
        SpecRule {
            name: "series-by-category",
            matches: |ctx| {
                ctx.key.len() == 2
                    && ctx.key_of(MeasureType::Temporal).is_some()
                    && ctx.key_of(MeasureType::Nominal).is_some()
                    && ctx.value_of(MeasureType::Quantitative).is_some()
            },
            generate: |ctx| {
                let time = ctx.key_of(MeasureType::Temporal).expect("checked");
                let series = ctx.key_of(MeasureType::Nominal).expect("checked");
                let value = ctx.value_of(MeasureType::Quantitative).expect("checked");
                let visual = VisualUnit::new("series", Mark::Line)
                    .encode(VisualChannel::X, EncodingFieldDef::new(&time.name))
                    .encode(VisualChannel::Y, EncodingFieldDef::new(&value.name))
                    .encode(VisualChannel::Color, EncodingFieldDef::new(&series.name));
                // Outer traversal walks the categories, inner walks time.
                let audio = AudioUnit::new("series-voice")
                    .encode(AudioChannel::Pitch, EncodingFieldDef::new(&value.name))
                    .traverse(EncodingFieldDef::new(&series.name))
                    .traverse(EncodingFieldDef::new(&time.name));
                (vec![visual], vec![audio])
            },
        },
        SpecRule {
            name: "bar-per-category",
            matches: |ctx| {
                ctx.key.len() == 1
                    && ctx.key[0].measure_type.is_discrete()
                    && ctx.value_of(MeasureType::Quantitative).is_some()
            },
            generate: |ctx| {
                let key = ctx.key[0];
                let value = ctx.value_of(MeasureType::Quantitative).expect("checked");
                let visual = VisualUnit::new("bars", Mark::Bar)
                    .encode(VisualChannel::X, EncodingFieldDef::new(&key.name))
                    .encode(VisualChannel::Y, EncodingFieldDef::new(&value.name));
                let audio = AudioUnit::new("bars-voice")
                    .encode(AudioChannel::Pitch, EncodingFieldDef::new(&value.name))
                    .traverse(EncodingFieldDef::new(&key.name));
                (vec![visual], vec![audio])
            },
        },
        SpecRule {
            name: "scatter",
            matches: |ctx| {
                ctx.key.is_empty()
                    && ctx
                        .values
                        .iter()
                        .filter(|f| f.measure_type == MeasureType::Quantitative)
                        .count()
                        >= 2
            },
            generate: |ctx| {
                let mut quants = ctx
                    .values
                    .iter()
                    .filter(|f| f.measure_type == MeasureType::Quantitative);
                let x = quants.next().expect("checked");
                let y = quants.next().expect("checked");
                let visual = VisualUnit::new("scatter", Mark::Point)
                    .encode(VisualChannel::X, EncodingFieldDef::new(&x.name))
                    .encode(VisualChannel::Y, EncodingFieldDef::new(&y.name));
                // Walk bins of x, sounding the mean of y per bin.
                let audio = AudioUnit::new("scatter-voice")
                    .encode(
                        AudioChannel::Pitch,
                        EncodingFieldDef::new(&y.name)
                            .aggregate(Setting::Override(AggregateOp::Mean)),
                    )
                    .traverse(
                        EncodingFieldDef::new(&x.name).bin(Setting::Override(BinParams::default())),
                    );
                (vec![visual], vec![audio])
            },
        },
        SpecRule {
            name: "histogram",
            matches: |ctx| !ctx.values.is_empty() || !ctx.key.is_empty(),
            generate: |ctx| {
                let field = ctx.key.first().or(ctx.values.first()).expect("checked");
                let x = if field.measure_type == MeasureType::Quantitative {
                    EncodingFieldDef::new(&field.name).bin(Setting::Override(BinParams::default()))
                } else {
                    EncodingFieldDef::new(&field.name)
                };
                let count = EncodingFieldDef::new(&field.name)
                    .aggregate(Setting::Override(AggregateOp::Count));
                let visual = VisualUnit::new("histogram", Mark::Bar)
                    .encode(VisualChannel::X, x.clone())
                    .encode(VisualChannel::Y, count.clone());
                let audio = AudioUnit::new("histogram-voice")
                    .encode(AudioChannel::Pitch, count)
                    .traverse(x);
                (vec![visual], vec![audio])
            },
        },
    ];
}

/// Generate a default specification for freshly-loaded fields.
///
/// Returns `None` when no rule matches (e.g. no active fields).
pub fn default_spec(
    dataset: impl Into<String>,
    fields: Vec<FieldDef>,
    data: &Dataset,
) -> Option<MultimodalSpec> {
    let key_names = detect_key(&fields, data);
    let ctx = RuleContext {
        key: key_names
            .iter()
            .filter_map(|n| fields.iter().find(|f| &f.name == n))
            .collect(),
        values: fields
            .iter()
            .filter(|f| f.active && !key_names.contains(&f.name))
            .collect(),
    };

    let rule = DEFAULT_SPEC_RULES.iter().find(|r| (r.matches)(&ctx))?;
    tracing::debug!(rule = rule.name, "default spec rule selected");
    let (visual, audio) = (rule.generate)(&ctx);

    let mut spec = MultimodalSpec::new(dataset, Vec::new());
    spec.key = key_names;
    spec.visual = visual;
    spec.audio = audio;
    spec.fields = fields;
    Some(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use triptych_common::row;

    #[test]
    fn test_first_matching_rule_wins() {
        let data = Dataset::from_rows(vec![
            row! { "year" => 2001, "sales" => 10.0 },
            row! { "year" => 2002, "sales" => 12.0 },
            row! { "year" => 2003, "sales" => 9.0 },
        ]);
        let fields = vec![
            FieldDef::new("year", MeasureType::Ordinal),
            FieldDef::new("sales", MeasureType::Quantitative),
        ];
        let spec = default_spec("sales", fields, &data).unwrap();
        assert_eq!(spec.key, vec!["year"]);
        assert_eq!(spec.visual[0].mark, Mark::Line);
        assert_eq!(spec.audio[0].traversal[0].field, "year");
    }

    #[test]
    fn test_no_fields_yields_no_spec() {
        let data = Dataset::new();
        assert!(default_spec("empty", Vec::new(), &data).is_none());
    }

    #[test]
    fn test_scatter_rule_bins_traversal() {
        let data: Dataset = (0..20)
            .map(|i| row! { "hp" => (i * 10) as f64, "mpg" => (40 - i) as f64 })
            .collect();
        let fields = vec![
            FieldDef::new("hp", MeasureType::Quantitative),
            FieldDef::new("mpg", MeasureType::Quantitative),
        ];
        let spec = default_spec("cars", fields, &data).unwrap();
        assert_eq!(spec.visual[0].mark, Mark::Point);
        let traversal = &spec.audio[0].traversal[0];
        assert!(matches!(traversal.bin, Setting::Override(_)));
    }
}
