//! Nice numeric binning.
//!
//! Step selection is a base-10 search with 5/2 subdivision: candidate
//! widths are 1/2/5 x 10^n, the largest width that still yields at most
//! `maxbins` bins wins, and the extent is widened outward to step
//! multiples when `nice` is set.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinParams {
    /// Approximate upper bound on the number of bins.
    #[serde(default = "default_maxbins")]
    pub maxbins: f64,
    /// Override for the observed [min, max] extent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent: Option<(f64, f64)>,
    /// Explicit step width; disables the step search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    /// Widen start/stop outward to step multiples.
    #[serde(default = "default_true")]
    pub nice: bool,
}

fn default_maxbins() -> f64 {
    10.0
}

fn default_true() -> bool {
    true
}

impl Default for BinParams {
    fn default() -> Self {
        Self {
            maxbins: default_maxbins(),
            extent: None,
            step: None,
            nice: true,
        }
    }
}

/// A concrete uniform binning of `[start, stop)` into `step`-wide bins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bins {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl Bins {
    pub fn count(&self) -> usize {
        (((self.stop - self.start) / self.step).round() as usize).max(1)
    }

    /// Locate a value's bin, returning its `[start, end)` boundaries.
    ///
    /// A value equal to the extent's max lands in the last bin rather than
    /// opening a new one.
    pub fn assign(&self, value: f64) -> Option<(f64, f64)> {
        if !value.is_finite() {
            return None;
        }
        let n = self.count() as i64;
        let mut i = ((value - self.start) / self.step).floor() as i64;
        if i >= n {
            i = n - 1;
        }
        if i < 0 {
            i = 0;
        }
        let lo = self.start + i as f64 * self.step;
        Some((lo, lo + self.step))
    }
}

/// Compute bin boundaries for the given extent.
pub fn nice_bins(extent: (f64, f64), params: &BinParams) -> Bins {
    let (min, max) = params.extent.unwrap_or(extent);
    let base: f64 = 10.0;

    // Degenerate extents still need a usable span for the step search.
    let span = {
        let raw = max - min;
        if raw > 0.0 {
            raw
        } else if min.abs() > 0.0 {
            min.abs()
        } else {
            1.0
        }
    };

    let step = match params.step {
        Some(step) => step,
        None => {
            let level = (params.maxbins.max(2.0)).log10().ceil();
            let mut step = base.powf(span.log10().round() - level);

            // Increase until the bin count fits under maxbins.
            while (span / step).ceil() > params.maxbins {
                step *= base;
            }

            // Then try finer human-friendly subdivisions that still fit.
            for div in [5.0, 2.0] {
                let candidate = step / div;
                if span / candidate <= params.maxbins {
                    step = candidate;
                }
            }
            step
        }
    };

    let (start, mut stop) = if params.nice {
        ((min / step).floor() * step, (max / step).ceil() * step)
    } else {
        (min, max)
    };
    if stop <= start {
        stop = start + step;
    }

    Bins { start, stop, step }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nice_bins_human_friendly_step() {
        let bins = nice_bins((0.0, 98.0), &BinParams::default());
        assert_eq!(bins.step, 10.0);
        assert_eq!(bins.start, 0.0);
        assert_eq!(bins.stop, 100.0);
        assert_eq!(bins.count(), 10);
    }

    #[test]
    fn test_nice_bins_small_span_picks_subdivision() {
        let bins = nice_bins((0.0, 4.2), &BinParams::default());
        assert_eq!(bins.step, 0.5);
        assert_eq!(bins.start, 0.0);
        assert_eq!(bins.stop, 4.5);
    }

    #[test]
    fn test_assign_clamps_max_into_last_bin() {
        let bins = Bins {
            start: 0.0,
            stop: 100.0,
            step: 10.0,
        };
        assert_eq!(bins.assign(99.9), Some((90.0, 100.0)));
        assert_eq!(bins.assign(100.0), Some((90.0, 100.0)));
        assert_eq!(bins.assign(0.0), Some((0.0, 10.0)));
        assert_eq!(bins.assign(f64::NAN), None);
    }

    #[test]
    fn test_explicit_step_and_extent() {
        let params = BinParams {
            step: Some(25.0),
            extent: Some((0.0, 100.0)),
            ..Default::default()
        };
        let bins = nice_bins((3.0, 42.0), &params);
        assert_eq!(bins.step, 25.0);
        assert_eq!(bins.start, 0.0);
        assert_eq!(bins.stop, 100.0);
        assert_eq!(bins.count(), 4);
    }

    #[test]
    fn test_single_value_extent() {
        let bins = nice_bins((5.0, 5.0), &BinParams::default());
        assert!(bins.step > 0.0);
        assert!(bins.stop > bins.start);
    }
}
