//! Distinct-domain extraction.

use triptych_common::dataset::Dataset;
use triptych_common::value::Value;

use triptych_transforms::pipeline::FieldTransform;

/// Which column of the dataset a domain reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainColumn {
    /// The raw field as loaded.
    Raw,
    /// The fully-derived column named by the field's transforms.
    Derived,
}

/// The ordered set of distinct values a field takes in a dataset.
///
/// Nulls are dropped. Dates deduplicate by their time-unit bucket when the
/// field carries one, otherwise by timestamp. Sorting is ascending natural
/// order; pairs with no natural order keep their relative input order, so
/// the result is deterministic for any input.
pub fn get_domain(field: &FieldTransform, data: &Dataset, column: DomainColumn) -> Vec<Value> {
    let name = match column {
        DomainColumn::Raw => field.field.clone(),
        DomainColumn::Derived => field.derived_name(),
    };

    let mut seen: Vec<String> = Vec::new();
    let mut out: Vec<Value> = Vec::new();
    for value in data.column(&name) {
        if value.is_null() {
            continue;
        }
        let key = dedup_key(field, value);
        if !seen.contains(&key) {
            seen.push(key);
            out.push(value.clone());
        }
    }

    out.sort_by(|a, b| a.natural_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    out
}

fn dedup_key(field: &FieldTransform, value: &Value) -> String {
    match (value, &field.time_unit) {
        (Value::Date(dt), Some(unit)) => unit.format(dt),
        _ => value.group_key(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triptych_common::row;
    use triptych_transforms::timeunit::TimeUnit;

    #[test]
    fn test_domain_dedups_sorts_and_drops_nulls() {
        let data = Dataset::from_rows(vec![
            row! { "x" => 3.0 },
            row! { "x" => 1.0 },
            row! { "x" => 2.0 },
            row! { "x" => 1.0 },
            row! { "x" => Option::<f64>::None },
        ]);
        let field = FieldTransform::new("x");
        assert_eq!(
            get_domain(&field, &data, DomainColumn::Raw),
            vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]
        );
    }

    #[test]
    fn test_domain_collapses_same_month_dates() {
        let jan_a = chrono::NaiveDate::from_ymd_opt(1999, 1, 5).unwrap();
        let jan_b = chrono::NaiveDate::from_ymd_opt(2003, 1, 20).unwrap();
        let feb = chrono::NaiveDate::from_ymd_opt(1999, 2, 1).unwrap();
        let data = Dataset::from_rows(vec![
            row! { "date" => jan_a },
            row! { "date" => jan_b },
            row! { "date" => feb },
        ]);

        let unit: TimeUnit = "month".parse().unwrap();
        let field = FieldTransform::new("date").time_unit(unit);
        let domain = get_domain(&field, &data, DomainColumn::Raw);
        assert_eq!(domain.len(), 2);
    }

    #[test]
    fn test_domain_reads_derived_column() {
        let data = Dataset::from_rows(vec![
            row! { "x" => 1.0, "x_bin_start" => 0.0 },
            row! { "x" => 7.0, "x_bin_start" => 0.0 },
            row! { "x" => 15.0, "x_bin_start" => 10.0 },
        ]);
        let field = FieldTransform::new("x").bin(Default::default());
        assert_eq!(
            get_domain(&field, &data, DomainColumn::Derived),
            vec![Value::Number(0.0), Value::Number(10.0)]
        );
    }

    #[test]
    fn test_mixed_values_keep_relative_order() {
        let data = Dataset::from_rows(vec![
            row! { "x" => "b" },
            row! { "x" => 1.0 },
            row! { "x" => "a" },
        ]);
        let field = FieldTransform::new("x");
        let domain = get_domain(&field, &data, DomainColumn::Raw);
        assert_eq!(domain.len(), 3);
        // Unordered pairs fall back to a stable comparator, so repeated
        // extraction is deterministic.
        assert_eq!(domain, get_domain(&field, &data, DomainColumn::Raw));
    }
}
