//! Nutritional assessment
//!
//! Combines the six Z-scores, their clinical labels and the overall risk
//! level into one immutable record.

use crate::classification::{aggregate_risk, ClassificationThresholds, RiskLevel, StatusLine};
use crate::domain::{Indicator, Measurement, Sex};
use crate::reference::ReferenceStore;
use crate::zscore::{calculate_zscores_with_thresholds, ZScoreResult, ZScores};
use serde::{Deserialize, Serialize};

/// Clinical label per status line; `None` when the source indicator was not
/// computed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NutritionalStatus {
    pub peso_edad: Option<String>,
    pub talla_edad: Option<String>,
    pub peso_talla: Option<String>,
    pub imc_edad: Option<String>,
    pub perimetro_cefalico_edad: Option<String>,
    pub pliegue_triceps: Option<String>,
    pub pliegue_subescapular: Option<String>,
}

impl NutritionalStatus {
    fn from_scores(scores: &ZScores) -> Self {
        let label = |line: StatusLine, result: &ZScoreResult| {
            result.classification.map(|c| line.label(c).to_string())
        };
        NutritionalStatus {
            peso_edad: label(StatusLine::WeightForAge, &scores.weight_for_age),
            talla_edad: label(StatusLine::HeightForAge, &scores.height_for_age),
            peso_talla: label(StatusLine::WeightForHeight, &scores.bmi_for_age),
            imc_edad: label(StatusLine::BmiForAge, &scores.bmi_for_age),
            perimetro_cefalico_edad: label(
                StatusLine::HeadCircumference,
                &scores.head_circumference_for_age,
            ),
            pliegue_triceps: label(StatusLine::TricepsSkinfold, &scores.triceps_skinfold_for_age),
            pliegue_subescapular: label(
                StatusLine::SubscapularSkinfold,
                &scores.subscapular_skinfold_for_age,
            ),
        }
    }

    pub fn get(&self, line: StatusLine) -> Option<&str> {
        match line {
            StatusLine::WeightForAge => self.peso_edad.as_deref(),
            StatusLine::HeightForAge => self.talla_edad.as_deref(),
            StatusLine::WeightForHeight => self.peso_talla.as_deref(),
            StatusLine::BmiForAge => self.imc_edad.as_deref(),
            StatusLine::HeadCircumference => self.perimetro_cefalico_edad.as_deref(),
            StatusLine::TricepsSkinfold => self.pliegue_triceps.as_deref(),
            StatusLine::SubscapularSkinfold => self.pliegue_subescapular.as_deref(),
        }
    }
}

/// Complete anthropometric assessment for one measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub age_days: i64,
    pub sex: Sex,
    pub bmi: Option<f64>,
    pub zscores: ZScores,
    pub nutritional_status: NutritionalStatus,
    pub risk_level: RiskLevel,
}

impl Assessment {
    /// Build an assessment from already computed Z-scores.
    pub fn from_zscores(measurement: &Measurement, zscores: ZScores) -> Self {
        let risk_level = aggregate_risk(zscores.iter().map(|(_, r)| r.classification));
        Assessment {
            age_days: measurement.age_days,
            sex: measurement.sex,
            bmi: measurement.bmi(),
            nutritional_status: NutritionalStatus::from_scores(&zscores),
            zscores,
            risk_level,
        }
    }

    pub fn zscore(&self, indicator: Indicator) -> Option<f64> {
        self.zscores.get(indicator).z_score
    }

    /// Number of indicators that produced a Z-score.
    pub fn computed_count(&self) -> usize {
        self.zscores.iter().filter(|(_, r)| r.is_computed()).count()
    }
}

/// Assess a measurement with the given cut points.
pub fn assess_measurement(
    store: &ReferenceStore,
    measurement: &Measurement,
    thresholds: &ClassificationThresholds,
) -> Assessment {
    let zscores = calculate_zscores_with_thresholds(store, measurement, thresholds);
    Assessment::from_zscores(measurement, zscores)
}
