//! Numerical kernel: descriptive statistics, least squares, unit-root tests.

pub mod adf;
pub mod correlation;
pub mod mackinnon;
pub mod ols;

/// Relative tolerance used by [`allclose`].
pub const ALLCLOSE_RTOL: f64 = 1e-5;
/// Absolute tolerance used by [`allclose`].
pub const ALLCLOSE_ATOL: f64 = 1e-8;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatsError {
    #[error("sample too short: need {needed}, got {got}")]
    TooShort { needed: usize, got: usize },
    #[error("input series is constant")]
    ConstantInput,
    #[error("design matrix is singular")]
    Singular,
    #[error("non-finite result")]
    NonFinite,
}

/// True when every value equals the first (or the slice is empty).
pub fn is_constant(xs: &[f64]) -> bool {
    match xs.first() {
        Some(&x0) => xs.iter().all(|&x| x == x0),
        None => true,
    }
}

/// Arithmetic mean. `0.0` for an empty slice.
pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    if is_constant(xs) {
        return xs[0];
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Population standard deviation (divides by `n`).
///
/// Exactly `0.0` for constant input, so callers can branch on `std > 0`
/// without accumulated rounding leaking through.
pub fn std_pop(xs: &[f64]) -> f64 {
    if is_constant(xs) {
        return 0.0;
    }
    let m = mean(xs);
    let var = xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / xs.len() as f64;
    var.sqrt()
}

/// Element-wise `|a - b| <= atol + rtol * |b|` over equal-length slices.
pub fn allclose(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(x, y)| (x - y).abs() <= ALLCLOSE_ATOL + ALLCLOSE_RTOL * y.abs())
}
