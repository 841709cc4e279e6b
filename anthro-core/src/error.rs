//! Error types for the assessment engine.
//!
//! Recoverable conditions (missing measurement, out-of-range age, LMS
//! inversion failure) are handled where they occur and only logged; these
//! enums cover the failures a caller can observe.

use crate::domain::{AgeUnit, Indicator, Sex};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while loading a reference table.
///
/// Cloneable so a failed load can be cached and handed to every caller.
#[derive(Debug, Clone, Error)]
pub enum TableError {
    #[error("no reference table for {indicator} ({sex})")]
    DataNotFound { indicator: Indicator, sex: Sex },

    #[error("invalid reference table for {indicator} ({sex}): {reason}")]
    InvalidTable {
        indicator: Indicator,
        sex: Sex,
        reason: String,
    },

    #[error("cannot read reference table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error("cannot parse reference table {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: Arc<serde_json::Error>,
    },
}

/// Age outside the span a table covers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("age {age} {unit} is outside table range [{min}, {max}] {unit}")]
    OutOfRange {
        age: f64,
        min: f64,
        max: f64,
        unit: AgeUnit,
    },
}

/// Failures of the inverse LMS transform.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LmsError {
    #[error("percentile must lie strictly between 0 and 100 (got {0})")]
    InvalidPercentile(f64),

    #[error("non-positive base {base} for L={l}, S={s}, z={z}")]
    NonPositiveBase { base: f64, l: f64, s: f64, z: f64 },

    #[error("non-finite result for L={l}, M={m}, S={s}, z={z}")]
    NonFinite { l: f64, m: f64, s: f64, z: f64 },
}

/// Invalid inputs to the energy calculation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequirementError {
    #[error("weight must be positive: {0}")]
    BadWeight(f64),

    #[error("age must be non-negative: {0} days")]
    BadAge(i64),

    #[error("energy requirement is not positive: {0} kcal")]
    NonPositiveEnergy(f64),
}

/// Failures building a growth curve.
#[derive(Debug, Error)]
pub enum CurveError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error("at least one percentile is required")]
    NoPercentiles,

    #[error("stride must be at least 1")]
    ZeroStride,

    #[error("child age must be non-negative: {0} days")]
    BadAge(i64),

    #[error("child measurement must be positive: {0}")]
    BadValue(f64),

    #[error(transparent)]
    Percentile(#[from] LmsError),
}
