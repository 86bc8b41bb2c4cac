//! Engle-Granger two-step cointegration test.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use crate::stats::adf::{adf_statistic, Regression};
use crate::stats::mackinnon::mackinnonp;
use crate::stats::{ols, StatsError};

/// Integrated series in the test (dependent + one regressor).
const N_SERIES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CointResult {
    pub is_cointegrated: bool,
    pub pvalue: f64,
    pub statistic: f64,
}

impl CointResult {
    /// Result used whenever the test cannot be computed.
    pub const FAIL_CLOSED: CointResult = CointResult {
        is_cointegrated: false,
        pvalue: 1.0,
        statistic: f64::NAN,
    };
}

/// Raw Engle-Granger statistic and MacKinnon p-value for `y0 ~ y1 + c`.
///
/// When the cointegrating regression is (almost) a perfect fit the residual
/// unit-root test is meaningless; the statistic is reported as `-inf`
/// (p-value 0), matching the usual convention.
pub fn engle_granger(y0: &[f64], y1: &[f64]) -> Result<(f64, f64), StatsError> {
    let n = y0.len();
    if y1.len() != n {
        return Err(StatsError::TooShort { needed: n, got: y1.len() });
    }
    let x = DMatrix::from_fn(n, 2, |r, c| if c == 0 { y1[r] } else { 1.0 });
    let y = DVector::from_column_slice(y0);
    let fit = ols::fit(&x, &y)?;

    let collinear_r2 = 1.0 - 100.0 * f64::EPSILON.sqrt();
    let stat = if fit.rsquared < collinear_r2 {
        adf_statistic(fit.resid.as_slice(), Regression::NoConstant)?.statistic
    } else {
        warn!(rsquared = fit.rsquared, "cointegrating regression is almost perfect");
        f64::NEG_INFINITY
    };
    Ok((stat, mackinnonp(stat, N_SERIES)))
}

/// Cointegration gate. Never fails: numerical problems degrade to
/// [`CointResult::FAIL_CLOSED`].
pub fn coint_test(first: &[f64], second: &[f64], significance: f64) -> CointResult {
    match engle_granger(first, second) {
        Ok((statistic, pvalue)) if !pvalue.is_nan() => CointResult {
            is_cointegrated: pvalue < significance,
            pvalue,
            statistic,
        },
        Ok(_) => {
            debug!("cointegration p-value is NaN");
            CointResult::FAIL_CLOSED
        }
        Err(e) => {
            debug!(error = %e, "cointegration test failed");
            CointResult::FAIL_CLOSED
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{noise, random_walk};

    #[test]
    fn cointegrated_pair_is_detected() {
        for seed in 0..10 {
            let a = random_walk(seed, 100.0, 200);
            let e = noise(seed + 1000, 200);
            let b: Vec<f64> = a.iter().zip(&e).map(|(x, e)| 2.0 * x + 5.0 + e).collect();
            let r = coint_test(&a, &b, 0.05);
            assert!(r.is_cointegrated, "seed {seed}");
            assert!(r.pvalue < 0.01, "seed {seed}: p {}", r.pvalue);
        }
    }

    #[test]
    fn independent_walks_are_mostly_not_cointegrated() {
        let kept = (0..20)
            .filter(|&seed| {
                let a = random_walk(seed, 100.0, 200);
                let b = random_walk(seed + 500, 50.0, 200);
                !coint_test(&a, &b, 0.05).is_cointegrated
            })
            .count();
        assert!(kept >= 15, "only {kept}/20 independent pairs passed");
    }

    #[test]
    fn exact_linear_relation_reports_zero_pvalue() {
        let a = random_walk(3, 10.0, 60);
        let b: Vec<f64> = a.iter().map(|x| 0.5 * x - 1.0).collect();
        let (stat, p) = engle_granger(&b, &a).unwrap();
        assert_eq!(stat, f64::NEG_INFINITY);
        assert_eq!(p, 0.0);
    }

    #[test]
    fn failures_are_closed() {
        let r = coint_test(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0], 0.05);
        assert_eq!(r.pvalue, 1.0);
        assert!(!r.is_cointegrated);

        let r = coint_test(&[1.0, 2.0], &[1.0, 2.0, 3.0], 0.05);
        assert_eq!(r.pvalue, 1.0);
    }
}
