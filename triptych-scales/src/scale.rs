//! Scales used by the sonification encoder.
//!
//! Continuous fields map through a linear scale over their numeric extent;
//! discrete fields map through a point scale that spaces domain values
//! evenly across the range.

use triptych_common::types::MeasureType;
use triptych_common::value::Value;

use crate::array;
use crate::error::TriptychScaleError;

/// Linear scale from a numeric domain interval to a numeric range.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
    clamp: bool,
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self {
            domain,
            range,
            clamp: true,
        }
    }

    pub fn clamp(mut self, clamp: bool) -> Self {
        self.clamp = clamp;
        self
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn scale(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d0 == d1 {
            return (r0 + r1) / 2.0;
        }
        let mut t = (value - d0) / (d1 - d0);
        if self.clamp {
            t = t.clamp(0.0, 1.0);
        }
        r0 + t * (r1 - r0)
    }

    pub fn invert(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if r0 == r1 {
            return d0;
        }
        d0 + (value - r0) / (r1 - r0) * (d1 - d0)
    }

    /// Nicely-rounded ticks over the domain, used for announcement
    /// boundaries on continuous traversal fields.
    pub fn ticks(&self, count: f64) -> Vec<f64> {
        array::ticks(self.domain.0, self.domain.1, count)
    }
}

/// Point scale: evenly spaced positions for an ordered discrete domain.
#[derive(Debug, Clone, PartialEq)]
pub struct PointScale {
    domain: Vec<Value>,
    range: (f64, f64),
}

impl PointScale {
    pub fn new(domain: Vec<Value>, range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn len(&self) -> usize {
        self.domain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domain.is_empty()
    }

    pub fn index_of(&self, value: &Value) -> Option<usize> {
        let key = value.group_key();
        self.domain.iter().position(|v| v.group_key() == key)
    }

    pub fn scale(&self, value: &Value) -> Result<f64, TriptychScaleError> {
        let index = self
            .index_of(value)
            .ok_or_else(|| TriptychScaleError::DomainValueNotFound(value.to_string()))?;
        Ok(self.scale_index(index))
    }

    pub fn scale_index(&self, index: usize) -> f64 {
        let (r0, r1) = self.range;
        let n = self.domain.len();
        if n <= 1 {
            return (r0 + r1) / 2.0;
        }
        r0 + (index as f64 / (n - 1) as f64) * (r1 - r0)
    }
}

/// A configured scale for one encoding channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Scale {
    Linear(LinearScale),
    Point(PointScale),
}

impl Scale {
    /// Build the default scale for a measure type over an observed domain.
    ///
    /// Continuous types require at least one numeric domain value; an
    /// empty domain is an error surfaced to the caller, since encoding a
    /// channel over nothing indicates a specification defect.
    pub fn for_measure(
        measure: MeasureType,
        domain: &[Value],
        range: (f64, f64),
    ) -> Result<Self, TriptychScaleError> {
        if domain.is_empty() {
            return Err(TriptychScaleError::EmptyDomain);
        }
        if measure.is_continuous() {
            let numeric: Vec<f64> = domain.iter().filter_map(|v| v.to_numeric()).collect();
            if numeric.is_empty() {
                return Err(TriptychScaleError::UnsupportedFieldType(format!(
                    "no numeric values for {measure} scale"
                )));
            }
            let lo = numeric.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = numeric.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            Ok(Scale::Linear(LinearScale::new((lo, hi), range)))
        } else {
            Ok(Scale::Point(PointScale::new(domain.to_vec(), range)))
        }
    }

    /// Scale one value into the range. `None` when the value has no place
    /// on this scale (non-numeric on a linear scale, unseen category on a
    /// point scale).
    pub fn scale_value(&self, value: &Value) -> Option<f64> {
        match self {
            Scale::Linear(scale) => value.to_numeric().map(|v| scale.scale(v)),
            Scale::Point(scale) => scale.scale(value).ok(),
        }
    }
}
