//! Anthro core library - pediatric anthropometric assessment against LMS growth references

#![deny(warnings)]

// Global invariants enforced in this crate:
// - Reference tables are immutable once loaded and loaded at most once per store
// - All computation is pure and synchronous; only the table store is shared
// - A missing measurement or table blanks one indicator, never the assessment
// - Identical input yields byte-for-byte identical output

pub mod assessment;
pub mod classification;
pub mod config;
pub mod domain;
pub mod error;
pub mod growth_curve;
pub mod lms;
pub mod recommendations;
pub mod reference;
pub mod report;
pub mod requirements;
pub mod resolver;
pub mod zscore;

pub use assessment::{Assessment, NutritionalStatus};
pub use classification::{Category, ClassificationThresholds, RiskLevel, StatusLine};
pub use config::ResolvedConfig;
pub use domain::{ActivityLevel, AgeUnit, FeedingMode, Indicator, Measurement, Sex};
pub use error::{CurveError, LmsError, RequirementError, ResolveError, TableError};
pub use growth_curve::{
    chart_data, growth_curve, ChartData, GrowthCurve, GrowthCurvePoint, STANDARD_PERCENTILES,
};
pub use recommendations::{recommendations, RecommendationSet};
pub use reference::{
    global_store, install_global_store, DirectorySource, MemorySource, ReferenceRow,
    ReferenceStore, ReferenceTable, TableSource,
};
pub use report::{render_json, render_jsonl, render_text, NutritionReport};
pub use requirements::{
    energy_requirement, nutrient_requirements, EnergyRequirement, EnergySettings,
    NutrientRequirement,
};
pub use zscore::{ZScoreResult, ZScores};

use log::warn;
use rayon::prelude::*;

/// Assess a measurement with default configuration
pub fn assess(store: &ReferenceStore, measurement: &Measurement) -> Assessment {
    assess_with_config(store, measurement, &ResolvedConfig::default())
}

/// Assess a measurement with resolved configuration
pub fn assess_with_config(
    store: &ReferenceStore,
    measurement: &Measurement,
    config: &ResolvedConfig,
) -> Assessment {
    assessment::assess_measurement(store, measurement, &config.thresholds)
}

/// Assess many measurements in parallel; output order matches input order
pub fn assess_batch(
    store: &ReferenceStore,
    measurements: &[Measurement],
    config: &ResolvedConfig,
) -> Vec<Assessment> {
    measurements
        .par_iter()
        .map(|m| assess_with_config(store, m, config))
        .collect()
}

/// Energy requirement with resolved configuration
pub fn energy_requirement_with_config(
    age_days: i64,
    weight_kg: f64,
    sex: Sex,
    feeding_mode: FeedingMode,
    activity_level: ActivityLevel,
    config: &ResolvedConfig,
) -> Result<EnergyRequirement, RequirementError> {
    requirements::energy_requirement_with_settings(
        age_days,
        weight_kg,
        sex,
        feeding_mode,
        activity_level,
        &config.energy,
    )
}

/// Full evaluation: assessment, energy, nutrients and recommendations
///
/// Energy and nutrients are left empty when the measurement carries no
/// usable weight.
pub fn evaluate(
    store: &ReferenceStore,
    measurement: &Measurement,
    feeding_mode: FeedingMode,
    activity_level: ActivityLevel,
    config: &ResolvedConfig,
) -> NutritionReport {
    let assessment = assess_with_config(store, measurement, config);

    let energy = measurement.weight_kg.and_then(|weight| {
        match energy_requirement_with_config(
            measurement.age_days,
            weight,
            measurement.sex,
            feeding_mode,
            activity_level,
            config,
        ) {
            Ok(e) => Some(e),
            Err(e) => {
                warn!("energy requirement not computed: {}", e);
                None
            }
        }
    });

    let nutrients = nutrient_requirements(
        measurement.age_days,
        measurement.sex,
        measurement.weight_kg.unwrap_or(0.0),
        energy.map(|e| e.kcal_per_day),
    );
    let recommendations = recommendations(&assessment);

    NutritionReport {
        assessment,
        energy_requirements: energy,
        nutrient_requirements: nutrients,
        recommendations,
    }
}

/// Evaluate many measurements in parallel; output order matches input order
pub fn evaluate_batch(
    store: &ReferenceStore,
    measurements: &[Measurement],
    feeding_mode: FeedingMode,
    activity_level: ActivityLevel,
    config: &ResolvedConfig,
) -> Vec<NutritionReport> {
    measurements
        .par_iter()
        .map(|m| evaluate(store, m, feeding_mode, activity_level, config))
        .collect()
}

/// Growth curve using the configured percentiles and stride
pub fn growth_curve_with_config(
    store: &ReferenceStore,
    indicator: Indicator,
    sex: Sex,
    config: &ResolvedConfig,
) -> Result<GrowthCurve, CurveError> {
    growth_curve(store, indicator, sex, &config.percentiles, Some(config.stride))
}

/// Chart payload for one child using the configured percentiles and stride
pub fn chart_data_with_config(
    store: &ReferenceStore,
    indicator: Indicator,
    sex: Sex,
    age_days: i64,
    value: f64,
    config: &ResolvedConfig,
) -> Result<ChartData, CurveError> {
    growth_curve_with_config(store, indicator, sex, config)?.chart(age_days, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ReferenceStore {
        let rows = (0..=24)
            .map(|month| ReferenceRow::new(month as f64, AgeUnit::Month, 1.0, 9.0, 0.1))
            .collect();
        ReferenceStore::new(MemorySource::new().with_table(
            Indicator::WeightForAge,
            Sex::Female,
            rows,
        ))
    }

    #[test]
    fn test_evaluate_fills_every_section() {
        let m = Measurement::new(400, Sex::Female, 10.0, 75.0);
        let report = evaluate(
            &store(),
            &m,
            FeedingMode::Mixed,
            ActivityLevel::Moderate,
            &ResolvedConfig::default(),
        );
        assert_eq!(
            report.assessment.zscores.weight_for_age.classification,
            Some(Category::RiskOfExcess)
        );
        let energy = report.energy_requirements.unwrap();
        assert!(energy.kcal_per_day > 0.0);
        assert_eq!(report.nutrient_requirements[0].nutrient_name, "Energía");
        assert!(!report.recommendations.caregiver_instructions.is_empty());
    }

    #[test]
    fn test_evaluate_without_weight() {
        let mut m = Measurement::new(400, Sex::Female, 10.0, 75.0);
        m.weight_kg = None;
        let report = evaluate(
            &store(),
            &m,
            FeedingMode::Mixed,
            ActivityLevel::Moderate,
            &ResolvedConfig::default(),
        );
        assert!(report.energy_requirements.is_none());
        assert!(report.nutrient_requirements.is_empty());
        assert_eq!(report.assessment.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_batch_preserves_order() {
        let measurements: Vec<Measurement> = (0..50)
            .map(|i| Measurement::new(100 + i * 10, Sex::Female, 5.0 + i as f64 * 0.1, 60.0))
            .collect();
        let assessments = assess_batch(&store(), &measurements, &ResolvedConfig::default());
        assert_eq!(assessments.len(), 50);
        for (a, m) in assessments.iter().zip(&measurements) {
            assert_eq!(a.age_days, m.age_days);
        }
    }

    #[test]
    fn test_evaluate_batch_degrades_per_item() {
        let mut missing_weight = Measurement::new(400, Sex::Female, 10.0, 75.0);
        missing_weight.weight_kg = None;
        let measurements = vec![
            Measurement::new(400, Sex::Female, 10.0, 75.0),
            missing_weight,
            Measurement::new(-3, Sex::Female, 3.0, 50.0),
        ];
        let reports = evaluate_batch(
            &store(),
            &measurements,
            FeedingMode::Breast,
            ActivityLevel::Light,
            &ResolvedConfig::default(),
        );
        assert_eq!(reports.len(), 3);
        assert!(reports[0].energy_requirements.is_some());
        assert!(reports[1].energy_requirements.is_none());
        // Negative age: energy rejected, assessment still produced
        assert!(reports[2].energy_requirements.is_none());
        assert!(reports[2].nutrient_requirements.is_empty());
    }

    #[test]
    fn test_config_thresholds_are_applied() {
        let config = ResolvedConfig {
            thresholds: ClassificationThresholds {
                risk: 1.5,
                moderate: 2.5,
                severe: 3.5,
            },
            ..ResolvedConfig::default()
        };
        let m = Measurement::new(400, Sex::Female, 10.0, 75.0);
        let a = assess_with_config(&store(), &m, &config);
        assert_eq!(a.zscores.weight_for_age.classification, Some(Category::Normal));
    }
}
