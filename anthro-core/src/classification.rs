//! Nutritional classification
//!
//! Global invariants enforced:
//! - Cut points are symmetric around zero
//! - Overall risk is the worst severity among computed indicators
//! - Indicators without a Z-score never take part in the aggregation

use serde::{Deserialize, Serialize};

/// Ordinal Z-score band, from most deficient to most excessive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    SevereDeficit,   // z < -3
    ModerateDeficit, // -3 <= z < -2
    RiskOfDeficit,   // -2 <= z < -1
    Normal,          // -1 <= z <= 1
    RiskOfExcess,    // 1 < z <= 2
    ModerateExcess,  // 2 < z <= 3
    SevereExcess,    // z > 3
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::SevereDeficit => "severe_deficit",
            Category::ModerateDeficit => "moderate_deficit",
            Category::RiskOfDeficit => "risk_of_deficit",
            Category::Normal => "normal",
            Category::RiskOfExcess => "risk_of_excess",
            Category::ModerateExcess => "moderate_excess",
            Category::SevereExcess => "severe_excess",
        }
    }

    /// Risk level this band contributes on its own.
    pub fn risk_level(&self) -> RiskLevel {
        match self {
            Category::SevereDeficit | Category::SevereExcess => RiskLevel::High,
            Category::ModerateDeficit | Category::ModerateExcess => RiskLevel::Medium,
            Category::RiskOfDeficit | Category::Normal | Category::RiskOfExcess => RiskLevel::Low,
        }
    }

    pub fn is_deficit(&self) -> bool {
        *self < Category::Normal
    }

    pub fn is_excess(&self) -> bool {
        *self > Category::Normal
    }
}

/// Aggregate clinical severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum RiskLevel {
    #[default]
    #[serde(rename = "Bajo")]
    Low,
    #[serde(rename = "Medio")]
    Medium,
    #[serde(rename = "Alto")]
    High,
}

impl RiskLevel {
    /// Label used in stored evaluations and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Bajo",
            RiskLevel::Medium => "Medio",
            RiskLevel::High => "Alto",
        }
    }

    /// One-line status shown next to the risk level.
    pub fn summary(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Niño aparentemente sano",
            RiskLevel::Medium => "Requiere seguimiento cercano",
            RiskLevel::High => "Requiere atención médica urgente",
        }
    }
}

/// Configurable cut points (in SD units, applied symmetrically)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationThresholds {
    pub risk: f64,
    pub moderate: f64,
    pub severe: f64,
}

impl Default for ClassificationThresholds {
    fn default() -> Self {
        ClassificationThresholds {
            risk: 1.0,
            moderate: 2.0,
            severe: 3.0,
        }
    }
}

/// Classify with default cut points
pub fn classify(z: f64) -> Category {
    classify_with_thresholds(z, &ClassificationThresholds::default())
}

/// Classify with custom cut points
pub fn classify_with_thresholds(z: f64, thresholds: &ClassificationThresholds) -> Category {
    if z < -thresholds.severe {
        Category::SevereDeficit
    } else if z < -thresholds.moderate {
        Category::ModerateDeficit
    } else if z < -thresholds.risk {
        Category::RiskOfDeficit
    } else if z <= thresholds.risk {
        Category::Normal
    } else if z <= thresholds.moderate {
        Category::RiskOfExcess
    } else if z <= thresholds.severe {
        Category::ModerateExcess
    } else {
        Category::SevereExcess
    }
}

/// Worst risk level across the computed categories; `Low` when none.
pub fn aggregate_risk<I>(categories: I) -> RiskLevel
where
    I: IntoIterator<Item = Option<Category>>,
{
    categories
        .into_iter()
        .flatten()
        .map(|c| c.risk_level())
        .max()
        .unwrap_or_default()
}

/// The seven status lines of a nutritional evaluation.
///
/// Weight-for-height is read from the BMI-for-age Z-score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLine {
    WeightForAge,
    HeightForAge,
    WeightForHeight,
    BmiForAge,
    HeadCircumference,
    TricepsSkinfold,
    SubscapularSkinfold,
}

impl StatusLine {
    pub fn all() -> &'static [StatusLine] {
        &[
            StatusLine::WeightForAge,
            StatusLine::HeightForAge,
            StatusLine::WeightForHeight,
            StatusLine::BmiForAge,
            StatusLine::HeadCircumference,
            StatusLine::TricepsSkinfold,
            StatusLine::SubscapularSkinfold,
        ]
    }

    /// Key under which the line is stored (`peso_edad`, `talla_edad`, ...).
    pub fn key(&self) -> &'static str {
        match self {
            StatusLine::WeightForAge => "peso_edad",
            StatusLine::HeightForAge => "talla_edad",
            StatusLine::WeightForHeight => "peso_talla",
            StatusLine::BmiForAge => "imc_edad",
            StatusLine::HeadCircumference => "perimetro_cefalico_edad",
            StatusLine::TricepsSkinfold => "pliegue_triceps",
            StatusLine::SubscapularSkinfold => "pliegue_subescapular",
        }
    }

    /// Clinical label for a category on this line.
    pub fn label(&self, category: Category) -> &'static str {
        use Category::*;
        match self {
            StatusLine::WeightForAge => match category {
                SevereDeficit => "Desnutrición global severa",
                ModerateDeficit => "Desnutrición global",
                RiskOfDeficit => "Riesgo de desnutrición global",
                Normal => "Peso adecuado para la edad",
                RiskOfExcess | ModerateExcess | SevereExcess => {
                    "Peso elevado para la edad (verificar peso para la talla)"
                }
            },
            StatusLine::HeightForAge => match category {
                SevereDeficit => "Talla baja severa para la edad",
                ModerateDeficit => "Talla baja para la edad",
                RiskOfDeficit => "Riesgo de talla baja",
                Normal | RiskOfExcess => "Talla adecuada para la edad",
                ModerateExcess | SevereExcess => "Talla alta para la edad",
            },
            StatusLine::WeightForHeight => match category {
                SevereDeficit => "Desnutrición aguda severa",
                ModerateDeficit => "Desnutrición aguda moderada",
                RiskOfDeficit => "Riesgo de desnutrición aguda",
                Normal => "Peso adecuado para la talla",
                RiskOfExcess => "Riesgo de sobrepeso",
                ModerateExcess => "Sobrepeso",
                SevereExcess => "Obesidad",
            },
            StatusLine::BmiForAge => match category {
                SevereDeficit => "Delgadez severa",
                ModerateDeficit => "Delgadez",
                RiskOfDeficit => "Riesgo de delgadez",
                Normal => "IMC adecuado para la edad",
                RiskOfExcess => "Riesgo de sobrepeso",
                ModerateExcess => "Sobrepeso",
                SevereExcess => "Obesidad",
            },
            StatusLine::HeadCircumference => match category {
                SevereDeficit | ModerateDeficit => {
                    "Factor de riesgo para el neurodesarrollo (perímetro bajo)"
                }
                RiskOfDeficit | Normal | RiskOfExcess => "Normal",
                ModerateExcess | SevereExcess => {
                    "Factor de riesgo para el neurodesarrollo (perímetro alto)"
                }
            },
            StatusLine::TricepsSkinfold | StatusLine::SubscapularSkinfold => match category {
                SevereDeficit => "Reserva grasa muy baja",
                ModerateDeficit => "Reserva grasa baja",
                RiskOfDeficit => "Riesgo de reserva grasa baja",
                Normal => "Reserva grasa adecuada",
                RiskOfExcess => "Riesgo de exceso de grasa",
                ModerateExcess => "Exceso de grasa",
                SevereExcess => "Exceso de grasa severo",
            },
        }
    }
}
