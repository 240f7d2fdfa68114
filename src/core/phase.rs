//! Phase arithmetic: 2π ambiguity resolution and wrapping

use std::f64::consts::PI;

use crate::core::grid::Grid;

pub const TWO_PI: f64 = 2.0 * PI;

/// Representative of `sample`'s 2π class nearest to `reference`
///
/// Returns `sample + 2π·k` for the integer `k` minimizing the distance to
/// `reference`. At an exact half-period tie the smaller `|k|` wins, then the
/// non-negative `k`. Non-finite inputs leave `sample` unchanged.
pub fn resolve(sample: f64, reference: f64) -> f64 {
    let k = nearest_multiple(sample, reference);
    sample + TWO_PI * k
}

/// Integer `k` (as f64) chosen by [`resolve`]
pub fn nearest_multiple(sample: f64, reference: f64) -> f64 {
    if !sample.is_finite() || !reference.is_finite() {
        return 0.0;
    }

    let lower = ((reference - sample) / TWO_PI).floor();
    let upper = lower + 1.0;
    let d_lower = (sample + TWO_PI * lower - reference).abs();
    let d_upper = (sample + TWO_PI * upper - reference).abs();

    if d_lower < d_upper {
        lower
    } else if d_upper < d_lower {
        upper
    } else if lower.abs() != upper.abs() {
        if lower.abs() < upper.abs() {
            lower
        } else {
            upper
        }
    } else if lower >= 0.0 {
        lower
    } else {
        upper
    }
}

/// Map `value` into `[0, 2π)`
pub fn wrap_positive(value: f64) -> f64 {
    let wrapped = value.rem_euclid(TWO_PI);
    // rem_euclid can round up to exactly 2π for tiny negative inputs
    if wrapped >= TWO_PI {
        0.0
    } else {
        wrapped
    }
}

/// Elementwise [`wrap_positive`]
pub fn wrap_positive_grid(grid: &Grid<f64>) -> Grid<f64> {
    grid.map(|&v| wrap_positive(v))
}
