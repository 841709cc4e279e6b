//! Age/table resolution
//!
//! Picks the reference row for a child's age. Selection is nearest-row with
//! no interpolation between rows; ages outside the table are clamped to the
//! edge row and logged.

use crate::domain::{Indicator, Sex};
use crate::error::{ResolveError, TableError};
use crate::reference::{ReferenceRow, ReferenceStore, ReferenceTable};
use log::warn;

/// Row chosen for an age, with the out-of-range condition that was
/// recovered by clamping (if any).
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub row: ReferenceRow,
    /// Query age expressed in the table's unit.
    pub age: f64,
    pub clamped: Option<ResolveError>,
}

/// Locate the nearest row index, or report an out-of-range age.
///
/// An age below the first row, or more than one full unit beyond the last
/// row, is out of range. Exact ties between two rows pick the earlier row.
pub fn locate(table: &ReferenceTable, age: f64) -> Result<usize, ResolveError> {
    let rows = table.rows();
    let (min, max) = (table.min_age(), table.max_age());
    if !age.is_finite() || age < min || age > max + 1.0 {
        return Err(ResolveError::OutOfRange {
            age,
            min,
            max,
            unit: table.unit(),
        });
    }

    // First row whose age is >= the query
    let upper = rows.partition_point(|row| row.age_value < age);
    if upper == 0 {
        return Ok(0);
    }
    if upper == rows.len() {
        return Ok(rows.len() - 1);
    }

    let below = age - rows[upper - 1].age_value;
    let above = rows[upper].age_value - age;
    Ok(if above < below { upper } else { upper - 1 })
}

/// Resolve a row within an already-loaded table.
pub fn resolve_in(table: &ReferenceTable, age_days: i64) -> Resolution {
    let age = table.unit().from_days(age_days as f64);
    match locate(table, age) {
        Ok(index) => Resolution {
            row: table.rows()[index],
            age,
            clamped: None,
        },
        Err(e) => {
            let rows = table.rows();
            // NaN cannot occur here: age comes from an integer day count.
            let row = if age < table.min_age() {
                rows[0]
            } else {
                rows[rows.len() - 1]
            };
            warn!(
                "{} ({}): {}; clamping to row at {} {}",
                table.indicator(),
                table.sex(),
                e,
                row.age_value,
                table.unit()
            );
            Resolution {
                row,
                age,
                clamped: Some(e),
            }
        }
    }
}

/// Load the table for the pair and resolve the row for the age.
pub fn resolve(
    store: &ReferenceStore,
    indicator: Indicator,
    sex: Sex,
    age_days: i64,
) -> Result<Resolution, TableError> {
    let table = store.load(indicator, sex)?;
    Ok(resolve_in(&table, age_days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AgeUnit;
    use crate::reference::MemorySource;

    fn monthly() -> ReferenceTable {
        let rows = (0..=24)
            .map(|m| ReferenceRow::new(m as f64, AgeUnit::Month, 1.0, 3.0 + m as f64 * 0.5, 0.1))
            .collect();
        ReferenceTable::new(Indicator::WeightForAge, Sex::Male, rows).unwrap()
    }

    fn daily() -> ReferenceTable {
        let rows = (0..=10)
            .map(|d| ReferenceRow::new(d as f64, AgeUnit::Day, 1.0, 3.0 + d as f64 * 0.01, 0.1))
            .collect();
        ReferenceTable::new(Indicator::HeadCircumferenceForAge, Sex::Female, rows).unwrap()
    }

    #[test]
    fn test_exact_match() {
        let table = daily();
        let r = resolve_in(&table, 7);
        assert_eq!(r.row.age_value, 7.0);
        assert!(r.clamped.is_none());
    }

    #[test]
    fn test_nearest_month() {
        let table = monthly();
        // 400 days = 13.14 months -> month 13
        assert_eq!(resolve_in(&table, 400).row.age_value, 13.0);
        // 410 days = 13.47 months -> month 13
        assert_eq!(resolve_in(&table, 410).row.age_value, 13.0);
        // 411 days = 13.50 months (just above) -> month 14
        assert_eq!(resolve_in(&table, 411).row.age_value, 14.0);
    }

    #[test]
    fn test_tie_prefers_earlier_row() {
        let rows = vec![
            ReferenceRow::new(0.0, AgeUnit::Day, 1.0, 3.0, 0.1),
            ReferenceRow::new(2.0, AgeUnit::Day, 1.0, 4.0, 0.1),
        ];
        let table = ReferenceTable::new(Indicator::WeightForAge, Sex::Male, rows).unwrap();
        assert_eq!(locate(&table, 1.0), Ok(0));
    }

    #[test]
    fn test_within_one_unit_past_end_is_not_clamped() {
        let table = monthly();
        // 24.9 months
        let days = (24.9 * 30.4375) as i64;
        let r = resolve_in(&table, days);
        assert_eq!(r.row.age_value, 24.0);
        assert!(r.clamped.is_none());
    }

    #[test]
    fn test_far_beyond_end_clamps_to_last_row() {
        let table = monthly();
        let r = resolve_in(&table, 10_000);
        assert_eq!(r.row.age_value, 24.0);
        assert!(matches!(r.clamped, Some(ResolveError::OutOfRange { .. })));
    }

    #[test]
    fn test_negative_age_clamps_to_first_row() {
        let table = monthly();
        let r = resolve_in(&table, -30);
        assert_eq!(r.row.age_value, 0.0);
        assert!(r.clamped.is_some());
    }

    #[test]
    fn test_below_table_start_clamps() {
        let rows = (61..=228)
            .map(|m| ReferenceRow::new(m as f64, AgeUnit::Month, -1.0, 15.0, 0.08))
            .collect();
        let table = ReferenceTable::new(Indicator::BmiForAge, Sex::Female, rows).unwrap();
        let r = resolve_in(&table, 365);
        assert_eq!(r.row.age_value, 61.0);
        assert!(r.clamped.is_some());
    }

    #[test]
    fn test_resolve_through_store() {
        let rows = monthly().rows().to_vec();
        let store = ReferenceStore::new(MemorySource::new().with_table(
            Indicator::WeightForAge,
            Sex::Male,
            rows,
        ));
        let r = resolve(&store, Indicator::WeightForAge, Sex::Male, 61).unwrap();
        assert_eq!(r.row.age_value, 2.0);
        assert!(resolve(&store, Indicator::WeightForAge, Sex::Female, 61).is_err());
    }
}
