//! Human-readable captions for fields and audio units.

use triptych_common::value::Value;

use crate::resolve::ResolvedFieldDef;
use crate::unit::AudioUnit;

/// Caption for one resolved field, e.g. "binned mean of temperature (month)".
pub fn describe_field(resolved: &ResolvedFieldDef) -> String {
    let mut out = String::new();
    if resolved.bin.is_some() {
        out.push_str("binned ");
    }
    if let Some(op) = resolved.aggregate {
        out.push_str(&format!("{op} of "));
    }
    out.push_str(&resolved.field);
    if let Some(unit) = &resolved.time_unit {
        out.push_str(&format!(" ({})", unit.token()));
    }
    out
}

/// Caption for an audio unit's traversal, e.g.
/// "playing year from 2012 to 2023 for each region".
pub fn describe_unit(unit: &AudioUnit, inner_domain: &[Value]) -> String {
    let Some(inner) = unit.traversal.last() else {
        return format!("playing {}", unit.name);
    };

    let mut out = match (inner_domain.first(), inner_domain.last()) {
        (Some(first), Some(last)) if inner_domain.len() > 1 => {
            format!("playing {} from {} to {}", inner.field, first, last)
        }
        _ => format!("playing {}", inner.field),
    };
    for outer in unit.traversal.iter().rev().skip(1) {
        out.push_str(&format!(" for each {}", outer.field));
    }
    out
}
