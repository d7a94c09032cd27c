//! Timeline construction properties.

use triptych_common::dataset::Dataset;
use triptych_common::row;
use triptych_common::types::MeasureType;
use triptych_sonify::config::SonifyConfig;
use triptych_sonify::timeline::{build_timeline, Timeline};
use triptych_spec::channel::AudioChannel;
use triptych_spec::field::{EncodingFieldDef, FieldDef, Setting};
use triptych_spec::predicate::Predicate;
use triptych_spec::unit::{AudioUnit, MultimodalSpec};
use triptych_transforms::aggregate::AggregateOp;

fn sales_dataset() -> Dataset {
    Dataset::from_rows(vec![
        row! { "month" => "Jan", "sales" => 10.0 },
        row! { "month" => "Jan", "sales" => 20.0 },
        row! { "month" => "Feb", "sales" => 5.0 },
    ])
}

fn sales_spec() -> MultimodalSpec {
    let mut spec = MultimodalSpec::new(
        "sales",
        vec![
            FieldDef::new("month", MeasureType::Nominal),
            FieldDef::new("sales", MeasureType::Quantitative).aggregate(AggregateOp::Sum),
        ],
    );
    spec.audio = vec![AudioUnit::new("voice")
        .encode(AudioChannel::Pitch, EncodingFieldDef::new("sales"))
        .traverse(EncodingFieldDef::new("month"))];
    spec
}

fn build(spec: &MultimodalSpec, data: &Dataset, selection: Option<&Predicate>) -> Timeline {
    build_timeline(
        spec,
        &spec.audio[0],
        data,
        selection,
        &SonifyConfig::default(),
    )
    .unwrap()
}

#[test]
fn test_one_event_per_month_in_domain_order() {
    let spec = sales_spec();
    let timeline = build(&spec, &sales_dataset(), None);

    assert_eq!(timeline.notes.len(), 2);
    assert_eq!(timeline.dimensions, vec![("month".to_string(), 2)]);
    // Domain order is natural (lexicographic): Feb, Jan.
    assert_eq!(timeline.notes[0].state["month"], 0);
    assert_eq!(timeline.notes[1].state["month"], 1);
    // Summed pitches differ across months.
    assert!(timeline.notes[0].pitch.is_some());
    assert!(timeline.notes[1].pitch.is_some());
    assert_ne!(timeline.notes[0].pitch, timeline.notes[1].pitch);
}

#[test]
fn test_timeline_monotonicity() {
    let data: Dataset = (0..4)
        .flat_map(|r| {
            (0..3).map(move |m| {
                row! {
                    "region" => format!("r{r}"),
                    "month" => format!("m{m}"),
                    "sales" => (r * 3 + m) as f64,
                }
            })
        })
        .collect();
    let mut spec = MultimodalSpec::new(
        "sales",
        vec![
            FieldDef::new("region", MeasureType::Nominal),
            FieldDef::new("month", MeasureType::Nominal),
            FieldDef::new("sales", MeasureType::Quantitative).aggregate(AggregateOp::Sum),
        ],
    );
    spec.audio = vec![AudioUnit::new("voice")
        .encode(AudioChannel::Pitch, EncodingFieldDef::new("sales"))
        .traverse(EncodingFieldDef::new("region"))
        .traverse(EncodingFieldDef::new("month"))];

    let timeline = build(&spec, &data, None);
    assert_eq!(timeline.notes.len(), 12);

    for pair in timeline.notes.windows(2) {
        let expected = pair[0].time + pair[0].duration + pair[0].pause_after.unwrap_or(0.0);
        assert!(
            (pair[1].time - expected).abs() < 1e-12,
            "event at {} should start at {}",
            pair[1].time,
            expected
        );
    }

    // A pause follows every completed inner cycle, twice as long when both
    // dimensions complete together.
    let config = SonifyConfig::default();
    let inner_done = &timeline.notes[2];
    assert_eq!(inner_done.pause_after, Some(config.section_pause));
    let all_done = timeline.notes.last().unwrap();
    assert_eq!(all_done.pause_after, Some(config.section_pause * 2.0));
}

#[test]
fn test_cartesian_order_inner_fastest() {
    let data: Dataset = (0..2)
        .flat_map(|a| (0..3).map(move |b| row! { "a" => format!("a{a}"), "b" => format!("b{b}") }))
        .collect();
    let mut spec = MultimodalSpec::new(
        "d",
        vec![
            FieldDef::new("a", MeasureType::Nominal),
            FieldDef::new("b", MeasureType::Nominal),
        ],
    );
    spec.audio = vec![AudioUnit::new("voice")
        .traverse(EncodingFieldDef::new("a"))
        .traverse(EncodingFieldDef::new("b"))];

    let timeline = build(&spec, &data, None);
    let visited: Vec<(usize, usize)> = timeline
        .notes
        .iter()
        .map(|n| (n.state["a"], n.state["b"]))
        .collect();
    assert_eq!(
        visited,
        vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]
    );
}

#[test]
fn test_rebuild_is_idempotent() {
    let spec = sales_spec();
    let data = sales_dataset();
    let a = build(&spec, &data, None);
    let b = build(&spec, &data, None);
    assert_eq!(a, b);
}

#[test]
fn test_empty_state_keeps_slot_as_noise() {
    // No rows for (west, m1): its note still occupies a timeline slot so
    // navigation stays uniform, sounding as noise.
    let data = Dataset::from_rows(vec![
        row! { "region" => "east", "month" => "m0", "sales" => 1.0 },
        row! { "region" => "east", "month" => "m1", "sales" => 2.0 },
        row! { "region" => "west", "month" => "m0", "sales" => 3.0 },
    ]);
    let mut spec = MultimodalSpec::new(
        "sales",
        vec![
            FieldDef::new("region", MeasureType::Nominal),
            FieldDef::new("month", MeasureType::Nominal),
            FieldDef::new("sales", MeasureType::Quantitative).aggregate(AggregateOp::Sum),
        ],
    );
    spec.audio = vec![AudioUnit::new("voice")
        .encode(AudioChannel::Pitch, EncodingFieldDef::new("sales"))
        .traverse(EncodingFieldDef::new("region"))
        .traverse(EncodingFieldDef::new("month"))];

    let timeline = build(&spec, &data, None);
    assert_eq!(timeline.notes.len(), 4);
    let missing = timeline
        .notes
        .iter()
        .find(|n| n.state["region"] == 1 && n.state["month"] == 1)
        .unwrap();
    assert_eq!(missing.pitch, None);
}

#[test]
fn test_selection_filters_domains() {
    let spec = sales_spec();
    let selection = Predicate::equal("month", "Jan");
    let timeline = build(&spec, &sales_dataset(), Some(&selection));
    assert_eq!(timeline.notes.len(), 1);
    assert_eq!(timeline.dimensions, vec![("month".to_string(), 1)]);
}

#[test]
fn test_zero_traversal_fields_single_event() {
    let mut spec = sales_spec();
    spec.audio[0].traversal.clear();
    let timeline = build(&spec, &sales_dataset(), None);
    assert_eq!(timeline.notes.len(), 1);
    assert_eq!(timeline.notes[0].time, 0.0);
    assert!(timeline.notes[0].state.is_empty());
    assert!(timeline.notes[0].pitch.is_some());
}

#[test]
fn test_first_event_announces_and_discrete_steps_announce() {
    let spec = sales_spec();
    let timeline = build(&spec, &sales_dataset(), None);
    assert!(timeline.notes[0].announce.is_some());
    // Discrete traversal: every index change announces.
    assert!(timeline.notes[1].announce.is_some());
}

#[test]
fn test_ramp_only_for_continuous_innermost() {
    let spec = sales_spec();
    let timeline = build(&spec, &sales_dataset(), None);
    assert!(timeline.notes.iter().all(|n| !n.ramp));

    // A binned quantitative innermost traversal glides instead.
    let data: Dataset = (0..30).map(|i| row! { "x" => i as f64, "y" => (i % 7) as f64 }).collect();
    let mut spec = MultimodalSpec::new(
        "d",
        vec![
            FieldDef::new("x", MeasureType::Quantitative),
            FieldDef::new("y", MeasureType::Quantitative),
        ],
    );
    spec.audio = vec![AudioUnit::new("voice")
        .encode(
            AudioChannel::Pitch,
            EncodingFieldDef::new("y").aggregate(Setting::Override(AggregateOp::Mean)),
        )
        .traverse(EncodingFieldDef::new("x").bin(Setting::Override(Default::default())))];
    let timeline = build(&spec, &data, None);
    assert!(timeline.notes.len() > 1);
    assert!(!timeline.notes[0].ramp);
    assert!(timeline.notes[1..].iter().all(|n| n.ramp));
}

#[test]
fn test_total_duration_is_last_end() {
    let spec = sales_spec();
    let timeline = build(&spec, &sales_dataset(), None);
    let last = timeline.notes.last().unwrap();
    assert_eq!(timeline.total_duration, last.time + last.duration);
}
