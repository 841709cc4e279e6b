//! Z-score calculation for the six anthropometric indicators
//!
//! Each indicator is computed independently: a missing measurement or a
//! missing table only blanks that indicator.

use crate::classification::{classify_with_thresholds, Category, ClassificationThresholds};
use crate::domain::{Indicator, Measurement};
use crate::lms;
use crate::reference::ReferenceStore;
use crate::resolver;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Z-score and band for one indicator; both `None` when not computed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ZScoreResult {
    pub z_score: Option<f64>,
    pub classification: Option<Category>,
}

impl ZScoreResult {
    pub fn missing() -> Self {
        ZScoreResult::default()
    }

    pub fn is_computed(&self) -> bool {
        self.z_score.is_some()
    }
}

/// Z-scores for all six indicators.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ZScores {
    pub weight_for_age: ZScoreResult,
    pub height_for_age: ZScoreResult,
    pub bmi_for_age: ZScoreResult,
    pub head_circumference_for_age: ZScoreResult,
    pub triceps_skinfold_for_age: ZScoreResult,
    pub subscapular_skinfold_for_age: ZScoreResult,
}

impl ZScores {
    pub fn get(&self, indicator: Indicator) -> &ZScoreResult {
        match indicator {
            Indicator::WeightForAge => &self.weight_for_age,
            Indicator::HeightForAge => &self.height_for_age,
            Indicator::BmiForAge => &self.bmi_for_age,
            Indicator::HeadCircumferenceForAge => &self.head_circumference_for_age,
            Indicator::TricepsSkinfoldForAge => &self.triceps_skinfold_for_age,
            Indicator::SubscapularSkinfoldForAge => &self.subscapular_skinfold_for_age,
        }
    }

    fn get_mut(&mut self, indicator: Indicator) -> &mut ZScoreResult {
        match indicator {
            Indicator::WeightForAge => &mut self.weight_for_age,
            Indicator::HeightForAge => &mut self.height_for_age,
            Indicator::BmiForAge => &mut self.bmi_for_age,
            Indicator::HeadCircumferenceForAge => &mut self.head_circumference_for_age,
            Indicator::TricepsSkinfoldForAge => &mut self.triceps_skinfold_for_age,
            Indicator::SubscapularSkinfoldForAge => &mut self.subscapular_skinfold_for_age,
        }
    }

    /// (indicator, result) pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Indicator, &ZScoreResult)> + '_ {
        Indicator::all().iter().map(move |i| (*i, self.get(*i)))
    }
}

/// Z-score of the measurement for one indicator, or `None` when the
/// measurement is absent or the reference table cannot be loaded.
pub fn indicator_zscore(
    store: &ReferenceStore,
    indicator: Indicator,
    measurement: &Measurement,
) -> Option<f64> {
    let value = measurement.value_for(indicator)?;

    let resolution =
        match resolver::resolve(store, indicator, measurement.sex, measurement.age_days) {
            Ok(r) => r,
            Err(e) => {
                // The store already warned when the load failed
                debug!("{} not computed: {}", indicator, e);
                return None;
            }
        };

    let row = resolution.row;
    let z = lms::to_zscore(value, row.l, row.m, row.s);
    if z.is_finite() {
        Some(z)
    } else {
        warn!(
            "{} not computed: non-finite z-score for value {} (L={}, M={}, S={})",
            indicator, value, row.l, row.m, row.s
        );
        None
    }
}

/// Compute every indicator with default cut points
pub fn calculate_zscores(store: &ReferenceStore, measurement: &Measurement) -> ZScores {
    calculate_zscores_with_thresholds(store, measurement, &ClassificationThresholds::default())
}

/// Compute every indicator with custom cut points
pub fn calculate_zscores_with_thresholds(
    store: &ReferenceStore,
    measurement: &Measurement,
    thresholds: &ClassificationThresholds,
) -> ZScores {
    let mut scores = ZScores::default();
    for indicator in Indicator::all() {
        if let Some(z) = indicator_zscore(store, *indicator, measurement) {
            *scores.get_mut(*indicator) = ZScoreResult {
                z_score: Some(z),
                classification: Some(classify_with_thresholds(z, thresholds)),
            };
        }
    }
    scores
}
