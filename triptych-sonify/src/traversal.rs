//! Traversal state: which domain value each traversal field currently
//! points at, and the enumeration of all reachable states.

use indexmap::IndexMap;
use itertools::Itertools;

use triptych_common::value::Value;
use triptych_spec::resolve::ResolvedFieldDef;

/// Per-field index into the field's current domain.
pub type TraversalState = IndexMap<String, usize>;

/// A traversal field together with its current (filtered, derived) domain.
#[derive(Debug, Clone, PartialEq)]
pub struct TraversalField {
    pub resolved: ResolvedFieldDef,
    pub domain: Vec<Value>,
}

impl TraversalField {
    pub fn name(&self) -> &str {
        &self.resolved.field
    }
}

/// Enumerate the full Cartesian product of traversal states.
///
/// Fields are ordered outer to inner as declared; the innermost field's
/// index increments fastest. Zero traversal fields yield the single empty
/// state; any empty domain yields no states at all.
pub fn enumerate_states(fields: &[TraversalField]) -> Vec<TraversalState> {
    if fields.is_empty() {
        return vec![TraversalState::new()];
    }
    if fields.iter().any(|f| f.domain.is_empty()) {
        return Vec::new();
    }

    fields
        .iter()
        .map(|f| 0..f.domain.len())
        .multi_cartesian_product()
        .map(|indices| {
            fields
                .iter()
                .zip(indices)
                .map(|(f, i)| (f.name().to_string(), i))
                .collect()
        })
        .collect()
}

/// How many trailing traversal dimensions are simultaneously at their last
/// domain index in this state. Drives section-boundary pause length.
pub fn trailing_at_end(state: &TraversalState, fields: &[TraversalField]) -> usize {
    fields
        .iter()
        .rev()
        .take_while(|f| {
            state
                .get(f.name())
                .is_some_and(|i| i + 1 == f.domain.len())
        })
        .count()
}

/// Whether every traversal dimension is at its last domain index.
pub fn at_end(state: &TraversalState, dimensions: &[(String, usize)]) -> bool {
    dimensions
        .iter()
        .all(|(name, len)| state.get(name).is_some_and(|i| i + 1 == *len))
}

/// The all-zero state over the given dimensions.
pub fn zero_state(dimensions: &[(String, usize)]) -> TraversalState {
    dimensions.iter().map(|(name, _)| (name.clone(), 0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use triptych_common::types::MeasureType;

    fn field(name: &str, domain: Vec<Value>) -> TraversalField {
        TraversalField {
            resolved: ResolvedFieldDef {
                field: name.to_string(),
                measure_type: MeasureType::Nominal,
                bin: None,
                time_unit: None,
                aggregate: None,
                scale: None,
            },
            domain,
        }
    }

    #[test]
    fn test_inner_field_varies_fastest() {
        let fields = vec![
            field("a", vec![Value::from("a0"), Value::from("a1")]),
            field("b", vec![Value::from("b0"), Value::from("b1"), Value::from("b2")]),
        ];
        let states = enumerate_states(&fields);
        let pairs: Vec<(usize, usize)> = states.iter().map(|s| (s["a"], s["b"])).collect();
        assert_eq!(
            pairs,
            vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]
        );
    }

    #[test]
    fn test_zero_fields_yield_single_empty_state() {
        let states = enumerate_states(&[]);
        assert_eq!(states, vec![TraversalState::new()]);
    }

    #[test]
    fn test_empty_domain_yields_no_states() {
        let fields = vec![field("a", vec![])];
        assert!(enumerate_states(&fields).is_empty());
    }

    #[test]
    fn test_trailing_at_end_counts() {
        let fields = vec![
            field("a", vec![Value::from("a0"), Value::from("a1")]),
            field("b", vec![Value::from("b0"), Value::from("b1")]),
        ];
        let states = enumerate_states(&fields);
        let counts: Vec<usize> = states
            .iter()
            .map(|s| trailing_at_end(s, &fields))
            .collect();
        // (0,0) none, (0,1) inner done, (1,0) none, (1,1) both done.
        assert_eq!(counts, vec![0, 1, 0, 2]);
    }
}
