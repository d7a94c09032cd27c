//! Tick generation over numeric intervals, d3-array style.

const E10: f64 = 7.0710678118654755; // sqrt(50)
const E5: f64 = 3.1622776601683795; // sqrt(10)
const E2: f64 = std::f64::consts::SQRT_2;

/// Generate approximately `count` nicely-rounded ticks covering
/// `[start, stop]`.
pub fn ticks(start: f64, stop: f64, count: f64) -> Vec<f64> {
    if !(count > 0.0) || count.is_infinite() {
        return vec![];
    }
    if start == stop {
        return vec![start];
    }

    let reverse = stop < start;
    let (i1, i2, inc) = if reverse {
        tick_spec(stop, start, count)
    } else {
        tick_spec(start, stop, count)
    };
    if !(i2 >= i1) {
        return vec![];
    }

    let n = (i2 - i1 + 1.0) as usize;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let j = if reverse { i2 - i as f64 } else { i1 + i as f64 };
        out.push(if inc < 0.0 { j / -inc } else { j * inc });
    }
    out
}

/// The tick step a `ticks` call would use for this interval.
pub fn tick_increment(start: f64, stop: f64, count: f64) -> f64 {
    if !(count > 0.0) {
        return f64::NAN;
    }
    if start == stop {
        return f64::NEG_INFINITY;
    }
    let step = (stop - start) / count;
    if step == 0.0 {
        return f64::NAN;
    }
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    10f64.powf(power) * tick_factor(error)
}

fn tick_factor(error: f64) -> f64 {
    if error >= E10 {
        10.0
    } else if error >= E5 {
        5.0
    } else if error >= E2 {
        2.0
    } else {
        1.0
    }
}

fn tick_spec(start: f64, stop: f64, count: f64) -> (f64, f64, f64) {
    let step = (stop - start) / count.max(0.0);
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = tick_factor(error);

    let (mut i1, mut i2, inc);
    if power < 0.0 {
        let scaled = 10f64.powf(-power) / factor;
        i1 = (start * scaled).round();
        i2 = (stop * scaled).round();
        if i1 / scaled < start {
            i1 += 1.0;
        }
        if i2 / scaled > stop {
            i2 -= 1.0;
        }
        inc = -scaled;
    } else {
        inc = 10f64.powf(power) * factor;
        i1 = (start / inc).round();
        i2 = (stop / inc).round();
        if i1 * inc < start {
            i1 += 1.0;
        }
        if i2 * inc > stop {
            i2 -= 1.0;
        }
    }

    if i2 < i1 && 0.5 <= count && count < 2.0 {
        return tick_spec(start, stop, count * 2.0);
    }
    (i1, i2, inc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks() {
        assert_eq!(
            ticks(0.0, 1.0, 10.0),
            vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]
        );
        assert_eq!(ticks(0.0, 1.0, 5.0), vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
        assert_eq!(ticks(0.0, 1.0, 2.0), vec![0.0, 0.5, 1.0]);
        assert_eq!(ticks(0.0, 1.0, 1.0), vec![0.0, 1.0]);
        assert_eq!(ticks(0.0, 100.0, 10.0).len(), 11);
    }

    #[test]
    fn test_ticks_edge_cases() {
        assert_eq!(ticks(f64::NAN, 1.0, 1.0), Vec::<f64>::new());
        assert_eq!(ticks(0.0, 1.0, 0.0), Vec::<f64>::new());
        assert_eq!(ticks(0.0, 1.0, -1.0), Vec::<f64>::new());
        assert_eq!(ticks(1.0, 1.0, 10.0), vec![1.0]);
        assert_eq!(ticks(0.0, 1.0, f64::INFINITY), Vec::<f64>::new());
    }

    #[test]
    fn test_tick_increment() {
        assert_eq!(tick_increment(0.0, 1.0, 10.0), 0.1);
        assert_eq!(tick_increment(0.0, 1.0, 5.0), 0.2);
        assert_eq!(tick_increment(0.0, 1.0, 2.0), 0.5);
        assert_eq!(tick_increment(0.0, 1.0, 1.0), 1.0);
        assert!(tick_increment(0.0, 1.0, 0.0).is_nan());
        assert!(tick_increment(1.0, 1.0, 5.0).is_infinite());
    }
}
