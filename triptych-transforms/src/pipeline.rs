//! Transform-list construction and application.
//!
//! A set of per-field derivation settings compiles into an ordered transform
//! list: all bins, then all time units, then aggregation. Aggregation groups
//! by the derived names of every non-aggregated field, so binning and
//! bucketing always execute first regardless of declaration order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use triptych_common::dataset::{row_value, Dataset, Row};
use triptych_common::value::Value;

use crate::aggregate::AggregateOp;
use crate::bin::{nice_bins, BinParams, Bins};
use crate::error::TriptychTransformError;
use crate::timeunit::TimeUnit;

/// Derived column name for a bin start.
pub fn bin_start_field(field: &str) -> String {
    format!("{field}_bin_start")
}

/// Derived column name for a bin end.
pub fn bin_end_field(field: &str) -> String {
    format!("{field}_bin_end")
}

/// Derived column name for a time-unit bucket start, e.g. `month_date`.
pub fn time_unit_field(unit: &TimeUnit, field: &str) -> String {
    format!("{}_{}", unit.token(), field)
}

/// Companion column holding the exclusive end of the bucket.
pub fn time_unit_end_field(unit: &TimeUnit, field: &str) -> String {
    format!("{}_{}_end", unit.token(), field)
}

/// Derived column name for an aggregated value, e.g. `sum_sales`.
pub fn aggregate_field(op: AggregateOp, field: &str) -> String {
    format!("{op}_{field}")
}

/// The derivation settings of one resolved field, reduced to what the
/// transform engine needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldTransform {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin: Option<BinParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_unit: Option<TimeUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<AggregateOp>,
}

impl FieldTransform {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Default::default()
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

    /// Column a time-unit transform reads: the bin start when also binned.
    fn time_unit_target(&self) -> String {
        if self.bin.is_some() {
            bin_start_field(&self.field)
        } else {
            self.field.clone()
        }
    }

    /// Column an aggregate reads: the bin start when binned, else raw.
    pub fn aggregate_target(&self) -> String {
        if self.bin.is_some() {
            bin_start_field(&self.field)
        } else {
            self.field.clone()
        }
    }

    /// The fully-derived column name after every applicable transform.
    pub fn derived_name(&self) -> String {
        if let Some(op) = self.aggregate {
            aggregate_field(op, &self.aggregate_target())
        } else if let Some(unit) = &self.time_unit {
            time_unit_field(unit, &self.time_unit_target())
        } else if self.bin.is_some() {
            bin_start_field(&self.field)
        } else {
            self.field.clone()
        }
    }

    /// Groupby columns this field contributes when not aggregated.
    fn groupby_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        if let Some(unit) = &self.time_unit {
            names.push(time_unit_field(unit, &self.time_unit_target()));
        }
        if self.bin.is_some() {
            names.push(bin_start_field(&self.field));
            names.push(bin_end_field(&self.field));
        }
        if names.is_empty() {
            names.push(self.field.clone());
        }
        names
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinTransform {
    pub field: String,
    pub params: BinParams,
    pub start_as: String,
    pub end_as: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeUnitTransform {
    pub field: String,
    pub unit: TimeUnit,
    pub output: String,
    pub output_end: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSpec {
    pub op: AggregateOp,
    pub field: String,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateTransform {
    pub groupby: Vec<String>,
    pub ops: Vec<AggregateSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    Bin(BinTransform),
    TimeUnit(TimeUnitTransform),
    Aggregate(AggregateTransform),
}

/// Compile resolved per-field settings into the ordered transform list.
///
/// Pass one registers groupby columns from every non-aggregated field;
/// pass two emits bins, then time units, then aggregates. Aggregate specs
/// sharing the exact same groupby set merge into one transform.
pub fn fields_to_transforms(fields: &[FieldTransform]) -> Vec<Transform> {
    let mut groupby: Vec<String> = Vec::new();
    for field in fields.iter().filter(|f| f.aggregate.is_none()) {
        for name in field.groupby_names() {
            if !groupby.contains(&name) {
                groupby.push(name);
            }
        }
    }

    let mut transforms: Vec<Transform> = Vec::new();

    for field in fields {
        if let Some(params) = &field.bin {
            transforms.push(Transform::Bin(BinTransform {
                field: field.field.clone(),
                params: params.clone(),
                start_as: bin_start_field(&field.field),
                end_as: bin_end_field(&field.field),
            }));
        }
    }

    for field in fields {
        if let Some(unit) = &field.time_unit {
            let target = field.time_unit_target();
            transforms.push(Transform::TimeUnit(TimeUnitTransform {
                field: target.clone(),
                unit: unit.clone(),
                output: time_unit_field(unit, &target),
                output_end: time_unit_end_field(unit, &target),
            }));
        }
    }

    let mut merged: IndexMap<Vec<String>, Vec<AggregateSpec>> = IndexMap::new();
    for field in fields {
        if let Some(op) = field.aggregate {
            let target = field.aggregate_target();
            merged.entry(groupby.clone()).or_default().push(AggregateSpec {
                op,
                field: target.clone(),
                output: aggregate_field(op, &target),
            });
        }
    }
    for (groupby, ops) in merged {
        transforms.push(Transform::Aggregate(AggregateTransform { groupby, ops }));
    }

    transforms
}

/// Apply transforms to a dataset, producing the derived dataset.
///
/// Bins run first, then time units, then aggregates, independent of the
/// order transforms appear in the list.
pub fn apply_transforms(
    data: &Dataset,
    transforms: &[Transform],
) -> Result<Dataset, TriptychTransformError> {
    let mut derived = data.clone();

    for t in transforms {
        if let Transform::Bin(bin) = t {
            derived = apply_bin(&derived, bin);
        }
    }
    for t in transforms {
        if let Transform::TimeUnit(tu) = t {
            derived = apply_time_unit(&derived, tu);
        }
    }
    for t in transforms {
        if let Transform::Aggregate(agg) = t {
            derived = apply_aggregate(&derived, agg);
        }
    }

    Ok(derived)
}

fn apply_bin(data: &Dataset, transform: &BinTransform) -> Dataset {
    let extent = numeric_extent(data, &transform.field);

    let bins: Option<Bins> = match (extent, &transform.params.extent) {
        (None, None) => {
            tracing::warn!(field = %transform.field, "no numeric values to bin");
            None
        }
        (observed, _) => Some(nice_bins(
            observed.unwrap_or((0.0, 1.0)),
            &transform.params,
        )),
    };

    data.rows()
        .iter()
        .map(|row| {
            let mut row = row.clone();
            let assigned = bins
                .as_ref()
                .and_then(|b| row_value(&row, &transform.field).to_numeric().and_then(|v| b.assign(v)));
            match assigned {
                Some((start, end)) => {
                    row.insert(transform.start_as.clone(), Value::Number(start));
                    row.insert(transform.end_as.clone(), Value::Number(end));
                }
                // Unbinnable values keep their row but derive to null.
                None => {
                    row.insert(transform.start_as.clone(), Value::Null);
                    row.insert(transform.end_as.clone(), Value::Null);
                }
            }
            row
        })
        .collect()
}

fn numeric_extent(data: &Dataset, field: &str) -> Option<(f64, f64)> {
    let mut extent: Option<(f64, f64)> = None;
    for value in data.column(field) {
        if let Some(v) = value.to_numeric() {
            extent = Some(match extent {
                None => (v, v),
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
            });
        }
    }
    extent
}

fn apply_time_unit(data: &Dataset, transform: &TimeUnitTransform) -> Dataset {
    data.rows()
        .iter()
        .map(|row| {
            let mut row = row.clone();
            let bucket = as_datetime(row_value(&row, &transform.field)).map(|dt| {
                let start = transform.unit.floor(&dt);
                let end = transform.unit.interval_end(&start);
                (start, end)
            });
            match bucket {
                Some((start, end)) => {
                    row.insert(transform.output.clone(), Value::Date(start));
                    row.insert(transform.output_end.clone(), Value::Date(end));
                }
                None => {
                    row.insert(transform.output.clone(), Value::Null);
                    row.insert(transform.output_end.clone(), Value::Null);
                }
            }
            row
        })
        .collect()
}

fn as_datetime(value: &Value) -> Option<chrono::NaiveDateTime> {
    match value {
        Value::Date(dt) => Some(*dt),
        // Epoch milliseconds, e.g. a bin start over a date column.
        Value::Number(ms) => {
            chrono::DateTime::from_timestamp_millis(*ms as i64).map(|dt| dt.naive_utc())
        }
        _ => None,
    }
}

const GROUP_KEY_SEPARATOR: char = '\u{1f}';

fn apply_aggregate(data: &Dataset, transform: &AggregateTransform) -> Dataset {
    let mut groups: IndexMap<String, Vec<&Row>> = IndexMap::new();
    for row in data.rows() {
        let key = transform
            .groupby
            .iter()
            .map(|f| row_value(row, f).group_key())
            .collect::<Vec<_>>()
            .join(&GROUP_KEY_SEPARATOR.to_string());
        groups.entry(key).or_default().push(row);
    }

    groups
        .values()
        .map(|rows| {
            let mut out = Row::new();
            let first = rows.first().expect("groups are never empty");
            for field in &transform.groupby {
                out.insert(field.clone(), row_value(first, field).clone());
            }
            for spec in &transform.ops {
                let column: Vec<&Value> = rows.iter().map(|r| row_value(r, &spec.field)).collect();
                if let Some(v) = spec.op.apply(&column) {
                    out.insert(spec.output.clone(), Value::Number(v));
                }
            }
            out
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use triptych_common::row;

    fn sales_data() -> Dataset {
        Dataset::from_rows(vec![
            row! { "month" => "Jan", "sales" => 10.0 },
            row! { "month" => "Jan", "sales" => 20.0 },
            row! { "month" => "Feb", "sales" => 5.0 },
        ])
    }

    #[test]
    fn test_no_transforms_is_identity() {
        let data = sales_data();
        let derived = apply_transforms(&data, &fields_to_transforms(&[])).unwrap();
        assert_eq!(derived, data);
    }

    #[test]
    fn test_grouped_sum() {
        let fields = vec![
            FieldTransform::new("month"),
            FieldTransform::new("sales").aggregate(AggregateOp::Sum),
        ];
        let transforms = fields_to_transforms(&fields);
        let derived = apply_transforms(&sales_data(), &transforms).unwrap();

        assert_eq!(
            derived,
            Dataset::from_rows(vec![
                row! { "month" => "Jan", "sum_sales" => 30.0 },
                row! { "month" => "Feb", "sum_sales" => 5.0 },
            ])
        );
    }

    #[test]
    fn test_bin_only() {
        let data = Dataset::from_rows(vec![
            row! { "x" => 3.0 },
            row! { "x" => 47.0 },
            row! { "x" => 98.0 },
            row! { "x" => "oops" },
        ]);
        let fields = vec![FieldTransform::new("x").bin(BinParams::default())];
        let derived = apply_transforms(&data, &fields_to_transforms(&fields)).unwrap();

        let starts: Vec<&Value> = derived.column("x_bin_start").collect();
        assert_eq!(
            starts,
            vec![
                &Value::Number(0.0),
                &Value::Number(40.0),
                &Value::Number(90.0),
                &Value::Null,
            ]
        );
        let ends: Vec<&Value> = derived.column("x_bin_end").collect();
        assert_eq!(ends[0], &Value::Number(10.0));
    }

    #[test]
    fn test_time_unit_only() {
        let jan_a = chrono::NaiveDate::from_ymd_opt(1999, 1, 5).unwrap();
        let jan_b = chrono::NaiveDate::from_ymd_opt(2003, 1, 20).unwrap();
        let feb = chrono::NaiveDate::from_ymd_opt(1999, 2, 1).unwrap();
        let data = Dataset::from_rows(vec![
            row! { "date" => jan_a },
            row! { "date" => jan_b },
            row! { "date" => feb },
        ]);

        let unit: TimeUnit = "month".parse().unwrap();
        let fields = vec![FieldTransform::new("date").time_unit(unit)];
        let derived = apply_transforms(&data, &fields_to_transforms(&fields)).unwrap();

        let buckets: Vec<String> = derived
            .column("month_date")
            .map(|v| v.group_key())
            .collect();
        // Both January dates collapse to the same reference-year bucket.
        assert_eq!(buckets[0], buckets[1]);
        assert_ne!(buckets[0], buckets[2]);

        let jan_end = derived.column("month_date_end").next().unwrap();
        assert_eq!(
            jan_end.as_date().unwrap(),
            chrono::NaiveDate::from_ymd_opt(2012, 2, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_bin_time_unit_aggregate_together() {
        let d1 = chrono::NaiveDate::from_ymd_opt(2020, 1, 10).unwrap();
        let d2 = chrono::NaiveDate::from_ymd_opt(2020, 1, 25).unwrap();
        let d3 = chrono::NaiveDate::from_ymd_opt(2020, 2, 3).unwrap();
        let data = Dataset::from_rows(vec![
            row! { "date" => d1, "region" => "east", "amount" => 1.0 },
            row! { "date" => d2, "region" => "east", "amount" => 2.0 },
            row! { "date" => d3, "region" => "west", "amount" => 4.0 },
        ]);

        let unit: TimeUnit = "month".parse().unwrap();
        let fields = vec![
            FieldTransform::new("date").time_unit(unit),
            FieldTransform::new("region"),
            FieldTransform::new("amount").aggregate(AggregateOp::Mean),
        ];
        let transforms = fields_to_transforms(&fields);

        // One aggregate, grouping by the derived bucket and the raw region.
        let agg = transforms
            .iter()
            .find_map(|t| match t {
                Transform::Aggregate(a) => Some(a),
                _ => None,
            })
            .unwrap();
        assert_eq!(agg.groupby, vec!["month_date", "region"]);

        let derived = apply_transforms(&data, &transforms).unwrap();
        assert_eq!(derived.len(), 2);
        let means: Vec<&Value> = derived.column("mean_amount").collect();
        assert_eq!(means, vec![&Value::Number(1.5), &Value::Number(4.0)]);
    }

    #[test]
    fn test_aggregate_execution_order_is_fixed() {
        // Aggregate listed first must still run after the bin it groups by.
        let data = Dataset::from_rows(vec![
            row! { "x" => 1.0, "y" => 10.0 },
            row! { "x" => 2.0, "y" => 20.0 },
            row! { "x" => 99.0, "y" => 40.0 },
        ]);
        let fields = vec![
            FieldTransform::new("y").aggregate(AggregateOp::Sum),
            FieldTransform::new("x").bin(BinParams::default()),
        ];
        let derived = apply_transforms(&data, &fields_to_transforms(&fields)).unwrap();

        assert_eq!(derived.len(), 2);
        let sums: Vec<&Value> = derived.column("sum_y").collect();
        assert_eq!(sums, vec![&Value::Number(30.0), &Value::Number(40.0)]);
    }

    #[test]
    fn test_aggregate_empty_group_cell_left_unset() {
        let data = Dataset::from_rows(vec![
            row! { "g" => "a", "v" => "not numeric" },
            row! { "g" => "b", "v" => 2.0 },
        ]);
        let fields = vec![
            FieldTransform::new("g"),
            FieldTransform::new("v").aggregate(AggregateOp::Mean),
        ];
        let derived = apply_transforms(&data, &fields_to_transforms(&fields)).unwrap();

        let a = &derived.rows()[0];
        assert!(!a.contains_key("mean_v"));
        let b = &derived.rows()[1];
        assert_eq!(b.get("mean_v"), Some(&Value::Number(2.0)));
    }
}
