//! Domain types shared across the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Days per month used for every age conversion in the engine.
pub const DAYS_PER_MONTH: f64 = 30.4375;

/// Days per year used for every age conversion in the engine.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Unrecognised value for one of the closed domain enums.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct DomainParseError {
    pub kind: &'static str,
    pub value: String,
}

impl DomainParseError {
    fn new(kind: &'static str, value: &str) -> Self {
        DomainParseError {
            kind,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn all() -> &'static [Sex] {
        &[Sex::Male, Sex::Female]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Sex::Male => 0,
            Sex::Female => 1,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = DomainParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" | "boy" | "masculino" => Ok(Sex::Male),
            "female" | "f" | "girl" | "femenino" => Ok(Sex::Female),
            _ => Err(DomainParseError::new("sex", s)),
        }
    }
}

/// Anthropometric indicators backed by an LMS reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    WeightForAge,
    HeightForAge,
    BmiForAge,
    HeadCircumferenceForAge,
    TricepsSkinfoldForAge,
    SubscapularSkinfoldForAge,
}

impl Indicator {
    pub const COUNT: usize = 6;

    /// Returns all indicators in their canonical order.
    pub fn all() -> &'static [Indicator] {
        &[
            Indicator::WeightForAge,
            Indicator::HeightForAge,
            Indicator::BmiForAge,
            Indicator::HeadCircumferenceForAge,
            Indicator::TricepsSkinfoldForAge,
            Indicator::SubscapularSkinfoldForAge,
        ]
    }

    /// Key used for table file names and serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Indicator::WeightForAge => "weight_for_age",
            Indicator::HeightForAge => "height_for_age",
            Indicator::BmiForAge => "bmi_for_age",
            Indicator::HeadCircumferenceForAge => "head_circumference_for_age",
            Indicator::TricepsSkinfoldForAge => "triceps_skinfold_for_age",
            Indicator::SubscapularSkinfoldForAge => "subscapular_skinfold_for_age",
        }
    }

    /// Human-readable name as shown in reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            Indicator::WeightForAge => "Peso para la edad",
            Indicator::HeightForAge => "Talla para la edad",
            Indicator::BmiForAge => "IMC para la edad",
            Indicator::HeadCircumferenceForAge => "Perímetro cefálico para la edad",
            Indicator::TricepsSkinfoldForAge => "Pliegue tricipital para la edad",
            Indicator::SubscapularSkinfoldForAge => "Pliegue subescapular para la edad",
        }
    }

    /// Unit of the raw measurement.
    pub fn unit(&self) -> &'static str {
        match self {
            Indicator::WeightForAge => "kg",
            Indicator::HeightForAge | Indicator::HeadCircumferenceForAge => "cm",
            Indicator::BmiForAge => "kg/m²",
            Indicator::TricepsSkinfoldForAge | Indicator::SubscapularSkinfoldForAge => "mm",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Indicator::WeightForAge => 0,
            Indicator::HeightForAge => 1,
            Indicator::BmiForAge => 2,
            Indicator::HeadCircumferenceForAge => 3,
            Indicator::TricepsSkinfoldForAge => 4,
            Indicator::SubscapularSkinfoldForAge => 5,
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Indicator {
    type Err = DomainParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "weight_for_age" | "weight" | "peso" => Ok(Indicator::WeightForAge),
            "height_for_age" | "height" | "length" | "talla" => Ok(Indicator::HeightForAge),
            "bmi_for_age" | "bmi" | "imc" => Ok(Indicator::BmiForAge),
            "head_circumference_for_age" | "head_circumference" | "perimetro_cefalico" => {
                Ok(Indicator::HeadCircumferenceForAge)
            }
            "triceps_skinfold_for_age" | "triceps_skinfold" | "pliegue_triceps" => {
                Ok(Indicator::TricepsSkinfoldForAge)
            }
            "subscapular_skinfold_for_age" | "subscapular_skinfold" | "pliegue_subescapular" => {
                Ok(Indicator::SubscapularSkinfoldForAge)
            }
            _ => Err(DomainParseError::new("indicator", s)),
        }
    }
}

/// Native age unit of a reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeUnit {
    #[serde(alias = "days")]
    Day,
    #[serde(alias = "months")]
    Month,
    #[serde(alias = "years")]
    Year,
}

impl AgeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeUnit::Day => "day",
            AgeUnit::Month => "month",
            AgeUnit::Year => "year",
        }
    }

    /// Length of one unit in days.
    pub fn days(&self) -> f64 {
        match self {
            AgeUnit::Day => 1.0,
            AgeUnit::Month => DAYS_PER_MONTH,
            AgeUnit::Year => DAYS_PER_YEAR,
        }
    }

    /// Convert an age in days into this unit.
    pub fn from_days(&self, age_days: f64) -> f64 {
        age_days / self.days()
    }
}

impl fmt::Display for AgeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Light,
    #[default]
    Moderate,
    Vigorous,
}

impl ActivityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Vigorous => "vigorous",
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityLevel {
    type Err = DomainParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" | "ligera" => Ok(ActivityLevel::Light),
            "moderate" | "moderada" => Ok(ActivityLevel::Moderate),
            "vigorous" | "intensa" => Ok(ActivityLevel::Vigorous),
            _ => Err(DomainParseError::new("activity level", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedingMode {
    Breast,
    Formula,
    #[default]
    Mixed,
}

impl FeedingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedingMode::Breast => "breast",
            FeedingMode::Formula => "formula",
            FeedingMode::Mixed => "mixed",
        }
    }
}

impl fmt::Display for FeedingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedingMode {
    type Err = DomainParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "breast" | "breastfed" | "materna" => Ok(FeedingMode::Breast),
            "formula" => Ok(FeedingMode::Formula),
            "mixed" | "mixta" => Ok(FeedingMode::Mixed),
            _ => Err(DomainParseError::new("feeding mode", s)),
        }
    }
}

/// Raw measurements for one child at one visit.
///
/// Every measurement is optional: an absent value means the matching
/// indicator is not computed, it is never read as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub age_days: i64,
    pub sex: Sex,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub head_circumference_cm: Option<f64>,
    #[serde(default)]
    pub triceps_skinfold_mm: Option<f64>,
    #[serde(default)]
    pub subscapular_skinfold_mm: Option<f64>,
}

impl Measurement {
    pub fn new(age_days: i64, sex: Sex, weight_kg: f64, height_cm: f64) -> Self {
        Measurement {
            age_days,
            sex,
            weight_kg: Some(weight_kg),
            height_cm: Some(height_cm),
            head_circumference_cm: None,
            triceps_skinfold_mm: None,
            subscapular_skinfold_mm: None,
        }
    }

    pub fn with_head_circumference(mut self, cm: f64) -> Self {
        self.head_circumference_cm = Some(cm);
        self
    }

    pub fn with_triceps_skinfold(mut self, mm: f64) -> Self {
        self.triceps_skinfold_mm = Some(mm);
        self
    }

    pub fn with_subscapular_skinfold(mut self, mm: f64) -> Self {
        self.subscapular_skinfold_mm = Some(mm);
        self
    }

    /// Body mass index in kg/m², or `None` unless both weight and height are
    /// usable positive numbers.
    pub fn bmi(&self) -> Option<f64> {
        let weight = usable(self.weight_kg)?;
        let height_m = usable(self.height_cm)? / 100.0;
        let bmi = weight / (height_m * height_m);
        bmi.is_finite().then_some(bmi)
    }

    /// Raw value feeding the given indicator, if present and usable.
    pub fn value_for(&self, indicator: Indicator) -> Option<f64> {
        match indicator {
            Indicator::WeightForAge => usable(self.weight_kg),
            Indicator::HeightForAge => usable(self.height_cm),
            Indicator::BmiForAge => self.bmi(),
            Indicator::HeadCircumferenceForAge => usable(self.head_circumference_cm),
            Indicator::TricepsSkinfoldForAge => usable(self.triceps_skinfold_mm),
            Indicator::SubscapularSkinfoldForAge => usable(self.subscapular_skinfold_mm),
        }
    }
}

/// Non-positive and non-finite measurements count as absent.
fn usable(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}
