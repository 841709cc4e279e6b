//! Invariant Tests
//!
//! These tests validate properties that must hold for any input.

use anthro_core::lms::{percentile_to_zscore, to_value, to_zscore};
use anthro_core::{
    energy_requirement, global_store, install_global_store, nutrient_requirements,
    ActivityLevel, FeedingMode, Indicator, ReferenceStore, Sex,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn who_store() -> ReferenceStore {
    ReferenceStore::from_dir(fixture_path("tables"))
}

#[test]
fn test_median_has_zero_zscore_for_every_row() {
    let store = who_store();
    for (indicator, sex) in [
        (Indicator::WeightForAge, Sex::Male),
        (Indicator::WeightForAge, Sex::Female),
        (Indicator::HeightForAge, Sex::Male),
    ] {
        let table = store.load(indicator, sex).unwrap();
        for row in table.rows() {
            let z = to_zscore(row.m, row.l, row.m, row.s);
            assert!(z.abs() < 1e-12, "{} {}: z={}", indicator, sex, z);
        }
    }
}

#[test]
fn test_percentile_round_trip() {
    let store = who_store();
    let table = store.load(Indicator::WeightForAge, Sex::Female).unwrap();
    for row in table.rows() {
        for p in [1.0, 3.0, 15.0, 50.0, 85.0, 97.0, 99.0] {
            let value = to_value(p, row.l, row.m, row.s);
            let z = to_zscore(value, row.l, row.m, row.s);
            let expected = percentile_to_zscore(p).unwrap();
            assert!((z - expected).abs() < 1e-6, "p{}: {} vs {}", p, z, expected);
        }
    }
}

#[test]
fn test_to_value_monotone_in_percentile() {
    let store = who_store();
    let table = store.load(Indicator::WeightForAge, Sex::Male).unwrap();
    for row in table.rows() {
        let mut previous = f64::MIN;
        for tenth in 1..1000 {
            let value = to_value(tenth as f64 / 10.0, row.l, row.m, row.s);
            assert!(value > previous);
            previous = value;
        }
    }
}

#[test]
fn test_energy_monotone_in_weight() {
    for age_days in [0, 45, 200, 364, 365, 800, 2000, 4500, 6000] {
        for sex in [Sex::Male, Sex::Female] {
            for activity in [ActivityLevel::Light, ActivityLevel::Vigorous] {
                let mut previous = 0.0;
                for tenth in 30..700 {
                    let weight = tenth as f64 / 10.0;
                    if let Ok(e) =
                        energy_requirement(age_days, weight, sex, FeedingMode::Formula, activity)
                    {
                        assert!(e.kcal_per_day >= previous);
                        previous = e.kcal_per_day;
                    }
                }
            }
        }
    }
}

#[test]
fn test_nutrients_without_energy_are_empty() {
    for age_days in [0, 400, 3000, 6000] {
        assert!(nutrient_requirements(age_days, Sex::Female, 12.0, None).is_empty());
    }
}

#[test]
fn test_concurrent_first_load_shares_one_table() {
    let store = Arc::new(who_store());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.load(Indicator::WeightForAge, Sex::Male).unwrap())
        })
        .collect();
    let tables: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for table in &tables[1..] {
        assert!(Arc::ptr_eq(&tables[0], table));
    }
}

#[test]
fn test_global_store_installs_once() {
    assert!(install_global_store(who_store()).is_ok());
    assert!(install_global_store(who_store()).is_err());

    let store = global_store().unwrap();
    let first = store.load(Indicator::WeightForAge, Sex::Female).unwrap();
    let second = global_store()
        .unwrap()
        .load(Indicator::WeightForAge, Sex::Female)
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}
