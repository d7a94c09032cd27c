//! Cross-view selection predicates.
//!
//! A selection is a boolean tree over field predicates, produced by
//! whichever view last interacted and consumed by all three.

use serde::{Deserialize, Serialize};
use strum::Display;

use triptych_common::dataset::{row_value, Row};
use triptych_common::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Lt,
    Lte,
    Gt,
    Gte,
    Neq,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Predicate {
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    Equal {
        field: String,
        value: Value,
    },
    /// Half-open `[lo, hi)` interval; `inclusive` closes the upper bound,
    /// which selection stores set only for the last domain entry.
    Range {
        field: String,
        lo: Value,
        hi: Value,
        #[serde(default)]
        inclusive: bool,
    },
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
}

impl Predicate {
    pub fn and(predicates: Vec<Predicate>) -> Predicate {
        Predicate::And(predicates)
    }

    pub fn equal(field: impl Into<String>, value: impl Into<Value>) -> Predicate {
        Predicate::Equal {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn range(
        field: impl Into<String>,
        lo: impl Into<Value>,
        hi: impl Into<Value>,
        inclusive: bool,
    ) -> Predicate {
        Predicate::Range {
            field: field.into(),
            lo: lo.into(),
            hi: hi.into(),
            inclusive,
        }
    }

    /// Evaluate against one row. Null or missing values never match a leaf
    /// predicate; they can still match through `Not`.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Predicate::And(ps) => ps.iter().all(|p| p.matches(row)),
            Predicate::Or(ps) => ps.iter().any(|p| p.matches(row)),
            Predicate::Not(p) => !p.matches(row),
            Predicate::Equal { field, value } => {
                let v = row_value(row, field);
                !v.is_null() && v.group_key() == value.group_key()
            }
            Predicate::Range {
                field,
                lo,
                hi,
                inclusive,
            } => {
                let v = row_value(row, field);
                let above = matches!(
                    v.natural_cmp(lo),
                    Some(std::cmp::Ordering::Greater) | Some(std::cmp::Ordering::Equal)
                );
                let below = match v.natural_cmp(hi) {
                    Some(std::cmp::Ordering::Less) => true,
                    Some(std::cmp::Ordering::Equal) => *inclusive,
                    _ => false,
                };
                above && below
            }
            Predicate::Compare { field, op, value } => {
                let v = row_value(row, field);
                match op {
                    CompareOp::Neq => !v.is_null() && v.group_key() != value.group_key(),
                    _ => match v.natural_cmp(value) {
                        None => false,
                        Some(ord) => match op {
                            CompareOp::Lt => ord == std::cmp::Ordering::Less,
                            CompareOp::Lte => ord != std::cmp::Ordering::Greater,
                            CompareOp::Gt => ord == std::cmp::Ordering::Greater,
                            CompareOp::Gte => ord != std::cmp::Ordering::Less,
                            CompareOp::Neq => unreachable!(),
                        },
                    },
                }
            }
        }
    }
}
