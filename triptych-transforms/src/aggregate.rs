//! Aggregate operations over a column of values.
//!
//! The op set and definitions are fixed. Median/q1/q3 use index-based
//! selection on the sorted array, not interpolation; downstream numeric
//! comparisons depend on these exact definitions.

use std::collections::HashSet;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use triptych_common::value::Value;

use crate::error::TriptychTransformError;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AggregateOp {
    Count,
    Valid,
    Missing,
    Distinct,
    Sum,
    Mean,
    Average,
    Variance,
    Stdev,
    Min,
    Max,
    Median,
    Q1,
    Q3,
}

impl AggregateOp {
    /// Parse an op name, failing with `UnsupportedOperation` on anything
    /// outside the fixed set.
    pub fn parse_op(name: &str) -> Result<Self, TriptychTransformError> {
        name.parse()
            .map_err(|_| TriptychTransformError::UnsupportedOperation(name.to_string()))
    }

    /// Apply the op over one group's column values.
    ///
    /// Nulls and non-numeric values are excluded from numeric aggregates.
    /// An aggregate over zero valid values yields `None` (the output cell
    /// is left unset, never NaN); `count`, `valid` and `missing` are always
    /// defined.
    pub fn apply(&self, values: &[&Value]) -> Option<f64> {
        if *self == AggregateOp::Count {
            return Some(values.len() as f64);
        }

        let numeric: Vec<f64> = values.iter().filter_map(|v| v.to_numeric()).collect();

        match self {
            AggregateOp::Count => Some(values.len() as f64),
            AggregateOp::Valid => Some(numeric.len() as f64),
            AggregateOp::Missing => Some((values.len() - numeric.len()) as f64),
            AggregateOp::Distinct => {
                let unique: HashSet<OrderedFloat<f64>> =
                    numeric.iter().map(|v| OrderedFloat(*v)).collect();
                Some(unique.len() as f64)
            }
            AggregateOp::Sum => {
                if numeric.is_empty() {
                    None
                } else {
                    Some(numeric.iter().sum())
                }
            }
            AggregateOp::Mean | AggregateOp::Average => {
                if numeric.is_empty() {
                    None
                } else {
                    Some(numeric.iter().sum::<f64>() / numeric.len() as f64)
                }
            }
            AggregateOp::Variance => population_variance(&numeric),
            AggregateOp::Stdev => population_variance(&numeric).map(f64::sqrt),
            AggregateOp::Min => numeric.iter().cloned().reduce(f64::min),
            AggregateOp::Max => numeric.iter().cloned().reduce(f64::max),
            AggregateOp::Median => {
                let sorted = sorted(&numeric);
                let n = sorted.len();
                if n == 0 {
                    None
                } else if n % 2 == 1 {
                    Some(sorted[n / 2])
                } else {
                    Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
                }
            }
            AggregateOp::Q1 => {
                let sorted = sorted(&numeric);
                sorted.get(sorted.len() / 4).copied()
            }
            AggregateOp::Q3 => {
                let sorted = sorted(&numeric);
                if sorted.is_empty() {
                    None
                } else {
                    sorted.get(3 * sorted.len() / 4).copied()
                }
            }
        }
    }
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    out
}

fn population_variance(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    Some(values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vals(nums: &[f64]) -> Vec<Value> {
        nums.iter().map(|n| Value::Number(*n)).collect()
    }

    fn refs(vals: &[Value]) -> Vec<&Value> {
        vals.iter().collect()
    }

    #[test]
    fn test_count_includes_nulls() {
        let owned = vec![Value::Number(1.0), Value::Null, Value::String("x".into())];
        assert_eq!(AggregateOp::Count.apply(&refs(&owned)), Some(3.0));
        assert_eq!(AggregateOp::Valid.apply(&refs(&owned)), Some(1.0));
        assert_eq!(AggregateOp::Missing.apply(&refs(&owned)), Some(2.0));
    }

    #[test]
    fn test_empty_numeric_aggregates_are_undefined() {
        let owned = vec![Value::Null, Value::String("x".into())];
        assert_eq!(AggregateOp::Sum.apply(&refs(&owned)), None);
        assert_eq!(AggregateOp::Mean.apply(&refs(&owned)), None);
        assert_eq!(AggregateOp::Median.apply(&refs(&owned)), None);
        assert_eq!(AggregateOp::Count.apply(&refs(&owned)), Some(2.0));
    }

    #[test]
    fn test_median_even_count_averages_middle_pair() {
        let owned = vals(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(AggregateOp::Median.apply(&refs(&owned)), Some(2.5));
    }

    #[test]
    fn test_quartiles_are_index_based() {
        // n = 5: q1 index = 1, q3 index = 3 on the sorted array
        let owned = vals(&[50.0, 10.0, 40.0, 20.0, 30.0]);
        assert_eq!(AggregateOp::Q1.apply(&refs(&owned)), Some(20.0));
        assert_eq!(AggregateOp::Q3.apply(&refs(&owned)), Some(40.0));
    }

    #[test]
    fn test_population_variance() {
        let owned = vals(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(AggregateOp::Variance.apply(&refs(&owned)), Some(4.0));
        assert_eq!(AggregateOp::Stdev.apply(&refs(&owned)), Some(2.0));
    }

    #[test]
    fn test_distinct_counts_unique_numeric() {
        let owned = vals(&[1.0, 1.0, 2.0, 3.0, 3.0]);
        assert_eq!(AggregateOp::Distinct.apply(&refs(&owned)), Some(3.0));
    }

    #[test]
    fn test_unknown_op_name_is_rejected() {
        assert_eq!(
            AggregateOp::parse_op("mode"),
            Err(TriptychTransformError::UnsupportedOperation(
                "mode".to_string()
            ))
        );
        assert_eq!(AggregateOp::parse_op("mean"), Ok(AggregateOp::Mean));
    }
}
