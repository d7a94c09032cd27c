//! Ordered row-oriented dataset model.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// One flat record. Insertion order is preserved so derived columns appear
/// after their source columns.
pub type Row = IndexMap<String, Value>;

static NULL: Value = Value::Null;

/// Read a field from a row, treating missing fields as null.
pub fn row_value<'a>(row: &'a Row, field: &str) -> &'a Value {
    row.get(field).unwrap_or(&NULL)
}

/// An ordered sequence of rows. Row order is significant: grouping is
/// first-seen and traversal subsets take "the first row" as representative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    rows: Vec<Row>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut Vec<Row> {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Iterate one column, yielding null for rows missing the field.
    pub fn column<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows.iter().map(move |row| row_value(row, field))
    }

    /// Field names in first-seen order across all rows.
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for row in &self.rows {
            for key in row.keys() {
                if !names.iter().any(|n| n == key) {
                    names.push(key.clone());
                }
            }
        }
        names
    }

    /// Rows satisfying the predicate, in original order.
    pub fn filter(&self, mut predicate: impl FnMut(&Row) -> bool) -> Dataset {
        Dataset {
            rows: self.rows.iter().filter(|r| predicate(r)).cloned().collect(),
        }
    }
}

impl FromIterator<Row> for Dataset {
    fn from_iter<T: IntoIterator<Item = Row>>(iter: T) -> Self {
        Dataset {
            rows: iter.into_iter().collect(),
        }
    }
}

/// Build a [`Row`] from `key => value` pairs.
///
/// ```
/// use triptych_common::row;
/// let r = row! { "month" => "Jan", "sales" => 10.0 };
/// assert_eq!(r.len(), 2);
/// ```
#[macro_export]
macro_rules! row {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut r = $crate::dataset::Row::new();
        $( r.insert($key.to_string(), $crate::value::Value::from($value)); )*
        r
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    #[test]
    fn test_column_yields_null_for_missing() {
        let data = Dataset::from_rows(vec![row! { "a" => 1.0 }, row! { "b" => 2.0 }]);
        let a: Vec<_> = data.column("a").collect();
        assert_eq!(a, vec![&Value::Number(1.0), &Value::Null]);
    }

    #[test]
    fn test_field_names_first_seen_order() {
        let data = Dataset::from_rows(vec![
            row! { "b" => 1.0, "a" => 2.0 },
            row! { "c" => 3.0 },
        ]);
        assert_eq!(data.field_names(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_round_trips_through_json() {
        let data = Dataset::from_rows(vec![row! { "month" => "Jan", "sales" => 10.0 }]);
        let text = serde_json::to_string(&data).unwrap();
        let back: Dataset = serde_json::from_str(&text).unwrap();
        assert_eq!(back, data);
    }
}
