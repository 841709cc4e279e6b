//! LMS (Box-Cox power-normal) transform
//!
//! Converts between a raw measurement, its Z-score and the value reached at a
//! given percentile, for one (L, M, S) triple.
//!
//! Global invariants enforced:
//! - `to_zscore(M, L, M, S) == 0`
//! - `to_value` is non-decreasing in the percentile wherever the inversion
//!   succeeds; a median fallback cell can sit above lower-tail neighbours
//! - Inversion failures fall back to the median and are logged

use crate::error::LmsError;
use log::warn;

/// |L| below this is treated as zero (log-normal branch).
pub const L_EPSILON: f64 = 1e-6;

/// Beasley-Springer-Moro central-region numerator coefficients.
const BSM_A: [f64; 4] = [
    2.50662823884,
    -18.61500062529,
    41.39119773534,
    -25.44106049637,
];

/// Beasley-Springer-Moro central-region denominator coefficients.
const BSM_B: [f64; 4] = [
    -8.47351093090,
    23.08336743743,
    -21.06224101826,
    3.13082909833,
];

/// Moro tail coefficients.
const BSM_C: [f64; 9] = [
    0.3374754822726147,
    0.9761690190917186,
    0.1607979714918209,
    0.0276438810333863,
    0.0038405729373609,
    0.0003951896511919,
    0.0000321767881768,
    0.0000002888167364,
    0.0000003960315187,
];

/// Z-score of a raw value.
///
/// Formula:
/// - `|L| < 1e-6`: `Z = ln(raw/M) / S`
/// - otherwise: `Z = ((raw/M)^L - 1) / (L*S)`
pub fn to_zscore(raw: f64, l: f64, m: f64, s: f64) -> f64 {
    let ratio = raw / m;
    if l.abs() < L_EPSILON {
        ratio.ln() / s
    } else {
        (ratio.powf(l) - 1.0) / (l * s)
    }
}

/// Inverse standard normal CDF (Beasley-Springer-Moro).
///
/// `u` must lie in (0, 1); the approximation is symmetric around 0.5.
pub fn inverse_normal_cdf(u: f64) -> f64 {
    let y = u - 0.5;
    if y.abs() < 0.42 {
        let r = y * y;
        let num = ((BSM_A[3] * r + BSM_A[2]) * r + BSM_A[1]) * r + BSM_A[0];
        let den = (((BSM_B[3] * r + BSM_B[2]) * r + BSM_B[1]) * r + BSM_B[0]) * r + 1.0;
        return y * num / den;
    }

    let tail = if y > 0.0 { 1.0 - u } else { u };
    let r = (-tail.ln()).ln();
    let x = BSM_C.iter().rev().fold(0.0, |acc, c| acc * r + c);
    if y < 0.0 {
        -x
    } else {
        x
    }
}

/// Z-score reached at a percentile in (0, 100).
pub fn percentile_to_zscore(percentile: f64) -> Result<f64, LmsError> {
    if !(percentile > 0.0 && percentile < 100.0) {
        return Err(LmsError::InvalidPercentile(percentile));
    }
    Ok(inverse_normal_cdf(percentile / 100.0))
}

/// Measurement value at a given Z-score, or an error when the power base is
/// non-positive or the result is not finite.
pub fn value_for_zscore(z: f64, l: f64, m: f64, s: f64) -> Result<f64, LmsError> {
    let value = if l.abs() < L_EPSILON {
        m * (s * z).exp()
    } else {
        let base = 1.0 + l * s * z;
        if base <= 0.0 {
            return Err(LmsError::NonPositiveBase { base, l, s, z });
        }
        m * base.powf(1.0 / l)
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(LmsError::NonFinite { l, m, s, z })
    }
}

/// Measurement value at a percentile, reporting failures.
pub fn try_to_value(percentile: f64, l: f64, m: f64, s: f64) -> Result<f64, LmsError> {
    let z = percentile_to_zscore(percentile)?;
    value_for_zscore(z, l, m, s)
}

/// Measurement value at a percentile.
///
/// On numerical failure the median `M` is returned and a warning is logged.
pub fn to_value(percentile: f64, l: f64, m: f64, s: f64) -> f64 {
    match try_to_value(percentile, l, m, s) {
        Ok(value) => value,
        Err(e) => {
            warn!(
                "LMS inversion failed at p{} (L={}, M={}, S={}): {}; falling back to median",
                percentile, l, m, s, e
            );
            m
        }
    }
}
