//! Daily energy requirement
//!
//! Infants below the configured age threshold use the FAO/WHO/UNU (2004)
//! per-kilogram requirement for their month of age, scaled by feeding mode.
//! Older children use the WHO/FAO/UNU basal metabolic rate equations scaled
//! by an activity multiplier.
//!
//! Global invariants enforced:
//! - kcal/day is non-decreasing in weight for fixed age, sex, activity and
//!   feeding mode
//! - Invalid inputs are reported, never turned into a zero requirement

use super::AgeBracket;
use crate::domain::{ActivityLevel, FeedingMode, Sex, DAYS_PER_MONTH, DAYS_PER_YEAR};
use crate::error::RequirementError;
use serde::{Deserialize, Serialize};

/// Infant requirement in kcal/kg/day by completed month of age (0-11).
const INFANT_KCAL_PER_KG_MALE: [f64; 12] =
    [113.0, 104.0, 95.0, 82.0, 81.0, 81.0, 79.0, 79.0, 79.0, 80.0, 80.0, 81.0];
const INFANT_KCAL_PER_KG_FEMALE: [f64; 12] =
    [107.0, 101.0, 94.0, 84.0, 82.0, 81.0, 78.0, 78.0, 78.0, 79.0, 79.0, 79.0];

/// BMR = slope * kg + intercept, by age band (0-3, 3-10, 10+ years).
const BMR_MALE: [(f64, f64); 3] = [(60.9, -54.0), (22.7, 495.0), (17.5, 651.0)];
const BMR_FEMALE: [(f64, f64); 3] = [(61.0, -51.0), (22.5, 499.0), (12.2, 746.0)];

/// Activity multipliers applied to BMR
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityFactors {
    pub light: f64,
    pub moderate: f64,
    pub vigorous: f64,
}

impl Default for ActivityFactors {
    fn default() -> Self {
        ActivityFactors {
            light: 1.4,
            moderate: 1.6,
            vigorous: 1.8,
        }
    }
}

impl ActivityFactors {
    pub fn factor(&self, level: ActivityLevel) -> f64 {
        match level {
            ActivityLevel::Light => self.light,
            ActivityLevel::Moderate => self.moderate,
            ActivityLevel::Vigorous => self.vigorous,
        }
    }
}

/// Feeding-mode multipliers applied to the infant baseline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedingFactors {
    pub breast: f64,
    pub formula: f64,
    pub mixed: f64,
}

impl Default for FeedingFactors {
    fn default() -> Self {
        FeedingFactors {
            breast: 0.96,
            formula: 1.04,
            mixed: 1.0,
        }
    }
}

impl FeedingFactors {
    pub fn factor(&self, mode: FeedingMode) -> f64 {
        match mode {
            FeedingMode::Breast => self.breast,
            FeedingMode::Formula => self.formula,
            FeedingMode::Mixed => self.mixed,
        }
    }
}

/// Configurable parts of the energy calculation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergySettings {
    /// Ages below this many days use the infant per-kg baseline.
    pub infant_threshold_days: i64,
    pub activity: ActivityFactors,
    pub feeding: FeedingFactors,
}

impl Default for EnergySettings {
    fn default() -> Self {
        EnergySettings {
            infant_threshold_days: 365,
            activity: ActivityFactors::default(),
            feeding: FeedingFactors::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyMethod {
    InfantPerKg,
    BasalMetabolicRate,
}

/// Share of daily energy by macronutrient source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyBreakdown {
    pub protein_kcal: f64,
    pub fat_kcal: f64,
    pub carbohydrate_kcal: f64,
}

impl EnergyBreakdown {
    /// (protein, fat, carbohydrate) fractions of energy for an age bracket.
    pub fn shares(bracket: AgeBracket) -> (f64, f64, f64) {
        match bracket {
            AgeBracket::Infant0To6Months | AgeBracket::Infant7To12Months => (0.10, 0.45, 0.45),
            AgeBracket::Child1To3Years => (0.12, 0.35, 0.53),
            _ => (0.15, 0.30, 0.55),
        }
    }

    pub fn for_energy(kcal_per_day: f64, bracket: AgeBracket) -> Self {
        let (protein, fat, carbohydrate) = Self::shares(bracket);
        EnergyBreakdown {
            protein_kcal: kcal_per_day * protein,
            fat_kcal: kcal_per_day * fat,
            carbohydrate_kcal: kcal_per_day * carbohydrate,
        }
    }
}

/// Daily energy requirement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyRequirement {
    pub kcal_per_day: f64,
    pub per_kg_kcal: f64,
    pub method: EnergyMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown_by_source: Option<EnergyBreakdown>,
}

/// Energy requirement with default settings
pub fn energy_requirement(
    age_days: i64,
    weight_kg: f64,
    sex: Sex,
    feeding_mode: FeedingMode,
    activity_level: ActivityLevel,
) -> Result<EnergyRequirement, RequirementError> {
    energy_requirement_with_settings(
        age_days,
        weight_kg,
        sex,
        feeding_mode,
        activity_level,
        &EnergySettings::default(),
    )
}

/// Energy requirement with custom settings
pub fn energy_requirement_with_settings(
    age_days: i64,
    weight_kg: f64,
    sex: Sex,
    feeding_mode: FeedingMode,
    activity_level: ActivityLevel,
    settings: &EnergySettings,
) -> Result<EnergyRequirement, RequirementError> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return Err(RequirementError::BadWeight(weight_kg));
    }
    if age_days < 0 {
        return Err(RequirementError::BadAge(age_days));
    }

    let (kcal_per_day, method) = if age_days < settings.infant_threshold_days {
        let month = ((age_days as f64 / DAYS_PER_MONTH) as usize).min(11);
        let per_kg = match sex {
            Sex::Male => INFANT_KCAL_PER_KG_MALE[month],
            Sex::Female => INFANT_KCAL_PER_KG_FEMALE[month],
        };
        (
            per_kg * weight_kg * settings.feeding.factor(feeding_mode),
            EnergyMethod::InfantPerKg,
        )
    } else {
        let bmr = basal_metabolic_rate(age_days, weight_kg, sex);
        (
            bmr * settings.activity.factor(activity_level),
            EnergyMethod::BasalMetabolicRate,
        )
    };

    if !kcal_per_day.is_finite() || kcal_per_day <= 0.0 {
        return Err(RequirementError::NonPositiveEnergy(kcal_per_day));
    }

    Ok(EnergyRequirement {
        kcal_per_day,
        per_kg_kcal: kcal_per_day / weight_kg,
        method,
        breakdown_by_source: Some(EnergyBreakdown::for_energy(
            kcal_per_day,
            AgeBracket::from_age_days(age_days),
        )),
    })
}

/// Basal metabolic rate (kcal/day) from the WHO/FAO/UNU equations
pub fn basal_metabolic_rate(age_days: i64, weight_kg: f64, sex: Sex) -> f64 {
    let years = age_days as f64 / DAYS_PER_YEAR;
    let band = if years < 3.0 {
        0
    } else if years < 10.0 {
        1
    } else {
        2
    };
    let (slope, intercept) = match sex {
        Sex::Male => BMR_MALE[band],
        Sex::Female => BMR_FEMALE[band],
    };
    slope * weight_kg + intercept
}
