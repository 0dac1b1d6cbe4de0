//! Special functions for the spectral continuum tail.

use std::f64::consts::FRAC_PI_2;

/// Switch from the power series to the asymptotic expansion.
const SERIES_LIMIT: f64 = 20.0;

/// Sine integral `Si(x) = ∫_0^x sin(t)/t dt`.
pub fn sine_integral(x: f64) -> f64 {
    let y = x.abs();
    let si = if y < SERIES_LIMIT {
        series(y)
    } else {
        asymptotic(y)
    };
    si.copysign(x)
}

fn series(y: f64) -> f64 {
    let y2 = y * y;
    // term_n = (-1)^n y^(2n+1) / (2n+1)!
    let mut term = y;
    let mut sum = 0.0;
    let mut n = 0.0;
    loop {
        let contribution = term / (2.0 * n + 1.0);
        sum += contribution;
        if contribution.abs() <= f64::EPSILON * sum.abs().max(f64::MIN_POSITIVE) {
            return sum;
        }
        term *= -y2 / ((2.0 * n + 2.0) * (2.0 * n + 3.0));
        n += 1.0;
    }
}

fn asymptotic(y: f64) -> f64 {
    let y2 = y * y;
    let f = alternating_factorial_series(y2, 1.0) / y;
    let g = alternating_factorial_series(y2, 2.0) / y2;
    FRAC_PI_2 - f * y.cos() - g * y.sin()
}

/// `Σ (-1)^n (2n + offset - 1)! / ((offset - 1)! y^(2n))`, truncated at its
/// smallest term.
fn alternating_factorial_series(y2: f64, offset: f64) -> f64 {
    let mut term: f64 = 1.0;
    let mut sum = 0.0;
    let mut k = offset;
    loop {
        sum += term;
        let next = -term * k * (k + 1.0) / y2;
        if next.abs() >= term.abs() || next.abs() < 1e-17 * sum.abs() {
            return sum;
        }
        term = next;
        k += 2.0;
    }
}

/// `∫_x^∞ sin²(t)/t² dt` for `x > 0`.
///
/// Equal to `sin²(x)/x + π/2 − Si(2x)`; tends to `1/(2x)` for large `x`.
pub fn sinc_squared_tail(x: f64) -> f64 {
    let s = x.sin();
    s * s / x + FRAC_PI_2 - sine_integral(2.0 * x)
}

/// `sin(x)/x`, with the removable singularity filled.
pub fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-8 {
        1.0 - x * x / 6.0
    } else {
        x.sin() / x
    }
}
