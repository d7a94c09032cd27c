//! Measure-type inference and candidate-key detection.

use std::collections::HashSet;

use itertools::Itertools;

use triptych_common::dataset::{row_value, Dataset};
use triptych_common::types::MeasureType;
use triptych_common::value::Value;
use triptych_transforms::pipeline::{apply_transforms, fields_to_transforms};

use crate::field::FieldDef;
use crate::resolve::resolve;

/// Primitive type candidates, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeCandidate {
    Boolean,
    Integer,
    Number,
    Date,
}

const ALL_CANDIDATES: [TypeCandidate; 4] = [
    TypeCandidate::Boolean,
    TypeCandidate::Integer,
    TypeCandidate::Number,
    TypeCandidate::Date,
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d", "%m/%d/%Y"];

impl TypeCandidate {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            TypeCandidate::Boolean => match value {
                Value::Boolean(_) => true,
                Value::String(s) => {
                    s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false")
                }
                _ => false,
            },
            TypeCandidate::Integer => match value {
                Value::Number(n) => n.fract() == 0.0,
                Value::String(s) => s.trim().parse::<i64>().is_ok(),
                _ => false,
            },
            TypeCandidate::Number => match value {
                Value::Number(_) => true,
                Value::String(s) => s.trim().parse::<f64>().is_ok(),
                _ => false,
            },
            TypeCandidate::Date => match value {
                Value::Date(_) => true,
                Value::String(s) => {
                    DATE_FORMATS
                        .iter()
                        .any(|f| chrono::NaiveDateTime::parse_from_str(s, f).is_ok())
                        || DATE_FORMATS
                            .iter()
                            .any(|f| chrono::NaiveDate::parse_from_str(s, f).is_ok())
                }
                _ => false,
            },
        }
    }
}

/// Infer a field's measurement type by sampling every value in the column.
///
/// Candidates are eliminated as values reject them; the surviving highest-
/// precedence candidate maps to a measure type, with integer columns
/// refined by cardinality heuristics ("year" columns and low-cardinality
/// codes read as discrete).
pub fn infer_measure_type(data: &Dataset, field: &str) -> MeasureType {
    let mut candidates: Vec<TypeCandidate> = ALL_CANDIDATES.to_vec();
    for value in data.column(field) {
        if value.is_null() {
            continue;
        }
        candidates.retain(|c| c.accepts(value));
        if candidates.is_empty() {
            break;
        }
    }

    let total = data.len();
    let distinct = distinct_count(data, field);

    match candidates.first() {
        None => MeasureType::Nominal,
        Some(TypeCandidate::Boolean) => MeasureType::Nominal,
        Some(TypeCandidate::Integer) => {
            if field == "year" {
                if distinct <= 5 {
                    MeasureType::Ordinal
                } else {
                    MeasureType::Temporal
                }
            } else if distinct < 40 && total > 0 && (distinct as f64 / total as f64) < 0.05 {
                MeasureType::Nominal
            } else {
                MeasureType::Quantitative
            }
        }
        Some(TypeCandidate::Number) => MeasureType::Quantitative,
        Some(TypeCandidate::Date) => MeasureType::Temporal,
    }
}

fn distinct_count(data: &Dataset, field: &str) -> usize {
    let keys: HashSet<String> = data
        .column(field)
        .filter(|v| !v.is_null())
        .map(|v| v.group_key())
        .collect();
    keys.len()
}

/// Find the minimal field subset that uniquely identifies each record.
///
/// Candidates are active fields without an aggregate; raw continuous
/// quantities cannot be keys, so quantitative fields qualify only when
/// binned or time-bucketed. Subsets are enumerated smallest-first, and a
/// key is returned only when it is the unique minimal-size valid key;
/// ambiguity yields an empty key, which callers must not guess around.
pub fn detect_key(fields: &[FieldDef], data: &Dataset) -> Vec<String> {
    let candidates: Vec<&FieldDef> = fields
        .iter()
        .filter(|f| f.active && f.aggregate.is_none())
        .filter(|f| {
            f.measure_type != MeasureType::Quantitative
                || f.bin.is_some()
                || f.time_unit.is_some()
        })
        .collect();

    for size in 1..=candidates.len() {
        let valid: Vec<Vec<&FieldDef>> = candidates
            .iter()
            .copied()
            .combinations(size)
            .filter(|subset| is_unique_key(subset, data))
            .collect();
        match valid.len() {
            0 => continue,
            1 => {
                return valid[0].iter().map(|f| f.name.clone()).collect();
            }
            _ => return Vec::new(),
        }
    }
    Vec::new()
}

fn is_unique_key(subset: &[&FieldDef], data: &Dataset) -> bool {
    let resolved: Vec<_> = subset.iter().map(|f| resolve(f, None).transform()).collect();
    let transforms = fields_to_transforms(&resolved);
    let derived = match apply_transforms(data, &transforms) {
        Ok(d) => d,
        Err(_) => return false,
    };

    let names: Vec<String> = resolved.iter().map(|r| r.derived_name()).collect();
    let mut seen: HashSet<String> = HashSet::with_capacity(derived.len());
    for row in derived.rows() {
        let key = names
            .iter()
            .map(|n| row_value(row, n).group_key())
            .collect::<Vec<_>>()
            .join("\u{1f}");
        if !seen.insert(key) {
            return false;
        }
    }
    true
}
