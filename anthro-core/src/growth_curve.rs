//! Percentile growth curves
//!
//! Samples the LMS table of one indicator and sex at a set of percentiles,
//! producing the series a growth chart draws.
//!
//! Global invariants enforced:
//! - Points come out in strictly increasing age order
//! - Percentile columns are sorted ascending with no duplicates
//! - A curve can be iterated any number of times without reloading its table
//! - Chart payloads carry ages in months whatever the table's native unit

use crate::domain::{AgeUnit, Indicator, Sex};
use crate::error::CurveError;
use crate::lms;
use crate::reference::{ReferenceRow, ReferenceStore, ReferenceTable};
use crate::resolver;
use log::warn;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::iter::StepBy;
use std::slice;
use std::sync::Arc;

/// Percentile set drawn on standard growth charts.
pub const STANDARD_PERCENTILES: [f64; 5] = [3.0, 15.0, 50.0, 85.0, 97.0];

/// One age on a growth curve with the value at each percentile.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthCurvePoint {
    pub age: f64,
    pub age_unit: AgeUnit,
    /// (percentile, measurement value) pairs in ascending percentile order.
    pub values: Vec<(f64, f64)>,
}

impl GrowthCurvePoint {
    /// Value at a percentile that is part of the curve.
    pub fn value_at(&self, percentile: f64) -> Option<f64> {
        self.values
            .iter()
            .find(|(p, _)| *p == percentile)
            .map(|(_, v)| *v)
    }

    pub fn p3(&self) -> Option<f64> {
        self.value_at(3.0)
    }

    pub fn p15(&self) -> Option<f64> {
        self.value_at(15.0)
    }

    pub fn p50(&self) -> Option<f64> {
        self.value_at(50.0)
    }

    pub fn p85(&self) -> Option<f64> {
        self.value_at(85.0)
    }

    pub fn p97(&self) -> Option<f64> {
        self.value_at(97.0)
    }

    /// The same point with its age expressed in months.
    pub fn in_months(self) -> Self {
        if self.age_unit == AgeUnit::Month {
            return self;
        }
        GrowthCurvePoint {
            age: AgeUnit::Month.from_days(self.age * self.age_unit.days()),
            age_unit: AgeUnit::Month,
            values: self.values,
        }
    }
}

/// Column key for a percentile: 3 -> "p3", 2.5 -> "p2.5".
pub fn percentile_key(percentile: f64) -> String {
    format!("p{}", percentile)
}

impl Serialize for GrowthCurvePoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry("age", &self.age)?;
        for (percentile, value) in &self.values {
            map.serialize_entry(&percentile_key(*percentile), value)?;
        }
        map.end()
    }
}

/// A validated, restartable percentile curve over one reference table.
///
/// Where the LMS inversion fails for a percentile (large `L * S` in the
/// lower tail), that cell holds the median instead, so the columns of such
/// a row are not in ascending order. [`GrowthCurve::fallback_rows`] counts
/// the affected rows.
#[derive(Debug, Clone)]
pub struct GrowthCurve {
    table: Arc<ReferenceTable>,
    percentiles: Vec<f64>,
    stride: usize,
    fallback_rows: usize,
}

impl GrowthCurve {
    /// Build a curve from a loaded table.
    ///
    /// Percentiles must lie strictly between 0 and 100; they are sorted and
    /// deduplicated. `stride` keeps every n-th row and defaults to 1.
    pub fn new(
        table: Arc<ReferenceTable>,
        percentiles: &[f64],
        stride: Option<usize>,
    ) -> Result<Self, CurveError> {
        if percentiles.is_empty() {
            return Err(CurveError::NoPercentiles);
        }
        for p in percentiles {
            lms::percentile_to_zscore(*p)?;
        }
        let stride = stride.unwrap_or(1);
        if stride == 0 {
            return Err(CurveError::ZeroStride);
        }

        let mut percentiles = percentiles.to_vec();
        percentiles.sort_by(|a, b| a.total_cmp(b));
        percentiles.dedup();

        let mut fallback_rows = 0;
        for row in table.rows().iter().step_by(stride) {
            let failed: Vec<f64> = percentiles
                .iter()
                .copied()
                .filter(|p| lms::try_to_value(*p, row.l, row.m, row.s).is_err())
                .collect();
            if !failed.is_empty() {
                warn!(
                    "{} ({}) at {} {}: percentiles {:?} fall back to the median",
                    table.indicator(),
                    table.sex(),
                    row.age_value,
                    row.age_unit,
                    failed
                );
                fallback_rows += 1;
            }
        }

        Ok(GrowthCurve {
            table,
            percentiles,
            stride,
            fallback_rows,
        })
    }

    pub fn indicator(&self) -> Indicator {
        self.table.indicator()
    }

    pub fn sex(&self) -> Sex {
        self.table.sex()
    }

    pub fn unit(&self) -> AgeUnit {
        self.table.unit()
    }

    pub fn percentiles(&self) -> &[f64] {
        &self.percentiles
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Rows where at least one percentile fell back to the median.
    pub fn fallback_rows(&self) -> usize {
        self.fallback_rows
    }

    /// Number of points the curve yields.
    pub fn len(&self) -> usize {
        self.table.rows().len().div_ceil(self.stride)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> Points<'_> {
        Points {
            rows: self.table.rows().iter().step_by(self.stride),
            percentiles: &self.percentiles,
        }
    }

    /// Collect every point.
    pub fn points(&self) -> Vec<GrowthCurvePoint> {
        self.iter().collect()
    }

    /// Chart payload placing a child's measurement on this curve.
    ///
    /// The child's Z-score is read from the row nearest its age; it is
    /// `None` when the transform does not give a finite value.
    pub fn chart(&self, age_days: i64, value: f64) -> Result<ChartData, CurveError> {
        if age_days < 0 {
            return Err(CurveError::BadAge(age_days));
        }
        if !value.is_finite() || value <= 0.0 {
            return Err(CurveError::BadValue(value));
        }

        let row = resolver::resolve_in(&self.table, age_days).row;
        let z = lms::to_zscore(value, row.l, row.m, row.s);

        Ok(ChartData {
            indicator: self.indicator(),
            indicator_name: self.indicator().display_name(),
            gender: self.sex(),
            child_age_months: AgeUnit::Month.from_days(age_days as f64),
            child_value: value,
            child_z_score: z.is_finite().then_some(z),
            percentiles: self.percentiles.clone(),
            chart_data: self.iter().map(GrowthCurvePoint::in_months).collect(),
        })
    }
}

/// Growth chart payload: percentile series in months plus the child's point.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ChartData {
    pub indicator: Indicator,
    pub indicator_name: &'static str,
    pub gender: Sex,
    pub child_age_months: f64,
    pub child_value: f64,
    pub child_z_score: Option<f64>,
    #[serde(skip)]
    pub percentiles: Vec<f64>,
    pub chart_data: Vec<GrowthCurvePoint>,
}

impl<'a> IntoIterator for &'a GrowthCurve {
    type Item = GrowthCurvePoint;
    type IntoIter = Points<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator over the points of a [`GrowthCurve`].
#[derive(Debug, Clone)]
pub struct Points<'a> {
    rows: StepBy<slice::Iter<'a, ReferenceRow>>,
    percentiles: &'a [f64],
}

impl Iterator for Points<'_> {
    type Item = GrowthCurvePoint;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        Some(GrowthCurvePoint {
            age: row.age_value,
            age_unit: row.age_unit,
            values: self
                .percentiles
                .iter()
                .map(|p| (*p, lms::try_to_value(*p, row.l, row.m, row.s).unwrap_or(row.m)))
                .collect(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for Points<'_> {}

/// Load the table for (indicator, sex) and build its percentile curve.
pub fn growth_curve(
    store: &ReferenceStore,
    indicator: Indicator,
    sex: Sex,
    percentiles: &[f64],
    stride: Option<usize>,
) -> Result<GrowthCurve, CurveError> {
    let table = store.load(indicator, sex)?;
    GrowthCurve::new(table, percentiles, stride)
}

/// Chart payload on the standard percentiles for one child's measurement.
pub fn chart_data(
    store: &ReferenceStore,
    indicator: Indicator,
    sex: Sex,
    age_days: i64,
    value: f64,
) -> Result<ChartData, CurveError> {
    growth_curve(store, indicator, sex, &STANDARD_PERCENTILES, None)?.chart(age_days, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::MemorySource;

    fn table() -> Arc<ReferenceTable> {
        let rows = (0..=10)
            .map(|month| {
                ReferenceRow::new(
                    month as f64,
                    AgeUnit::Month,
                    0.2 - month as f64 * 0.01,
                    3.3 + month as f64 * 0.6,
                    0.14 - month as f64 * 0.003,
                )
            })
            .collect();
        Arc::new(ReferenceTable::new(Indicator::WeightForAge, Sex::Male, rows).unwrap())
    }

    #[test]
    fn test_standard_curve_shape() {
        let curve = GrowthCurve::new(table(), &STANDARD_PERCENTILES, None).unwrap();
        let points = curve.points();
        assert_eq!(points.len(), 11);
        assert_eq!(curve.len(), 11);
        for pair in points.windows(2) {
            assert!(pair[0].age < pair[1].age);
        }
        for point in &points {
            let values: Vec<f64> = point.values.iter().map(|(_, v)| *v).collect();
            for pair in values.windows(2) {
                assert!(pair[0] < pair[1]);
            }
        }
        assert!((points[0].p50().unwrap() - 3.3).abs() < 1e-9);
    }

    #[test]
    fn test_stride_keeps_first_row() {
        let curve = GrowthCurve::new(table(), &[50.0], Some(3)).unwrap();
        let ages: Vec<f64> = curve.iter().map(|p| p.age).collect();
        assert_eq!(ages, vec![0.0, 3.0, 6.0, 9.0]);
        assert_eq!(curve.len(), 4);
    }

    #[test]
    fn test_percentiles_sorted_and_deduplicated() {
        let curve = GrowthCurve::new(table(), &[97.0, 3.0, 50.0, 3.0], None).unwrap();
        assert_eq!(curve.percentiles(), &[3.0, 50.0, 97.0]);
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(matches!(
            GrowthCurve::new(table(), &[], None),
            Err(CurveError::NoPercentiles)
        ));
        assert!(matches!(
            GrowthCurve::new(table(), &[0.0, 50.0], None),
            Err(CurveError::Percentile(_))
        ));
        assert!(matches!(
            GrowthCurve::new(table(), &[50.0], Some(0)),
            Err(CurveError::ZeroStride)
        ));
    }

    #[test]
    fn test_restartable() {
        let curve = GrowthCurve::new(table(), &STANDARD_PERCENTILES, Some(2)).unwrap();
        let first: Vec<GrowthCurvePoint> = (&curve).into_iter().collect();
        let second: Vec<GrowthCurvePoint> = curve.iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_point_serializes_with_percentile_keys() {
        let point = GrowthCurvePoint {
            age: 2.0,
            age_unit: AgeUnit::Month,
            values: vec![(3.0, 4.5), (2.5, 4.4)],
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["age"], 2.0);
        assert_eq!(json["p3"], 4.5);
        assert_eq!(json["p2.5"], 4.4);
    }

    #[test]
    fn test_median_fallback_is_counted() {
        // p3 needs 1 + L*S*z > 0, which fails for L=1, S=0.6
        let rows = vec![
            ReferenceRow::new(0.0, AgeUnit::Month, 1.0, 10.0, 0.6),
            ReferenceRow::new(1.0, AgeUnit::Month, 1.0, 11.0, 0.1),
        ];
        let table = ReferenceTable::new(Indicator::TricepsSkinfoldForAge, Sex::Male, rows).unwrap();
        let curve = GrowthCurve::new(Arc::new(table), &STANDARD_PERCENTILES, None).unwrap();
        assert_eq!(curve.fallback_rows(), 1);

        let points = curve.points();
        assert_eq!(points[0].p3(), Some(10.0));
        assert!(points[0].p15().unwrap() < points[0].p3().unwrap());
        assert!(points[1].p3().unwrap() < points[1].p15().unwrap());
    }

    #[test]
    fn test_regular_curve_has_no_fallback() {
        let curve = GrowthCurve::new(table(), &STANDARD_PERCENTILES, None).unwrap();
        assert_eq!(curve.fallback_rows(), 0);
    }

    #[test]
    fn test_chart_places_child_on_curve() {
        let curve = GrowthCurve::new(table(), &STANDARD_PERCENTILES, None).unwrap();
        // 61 days is nearest the 2-month row: M = 4.5
        let chart = curve.chart(61, 4.5).unwrap();
        assert_eq!(chart.indicator, Indicator::WeightForAge);
        assert_eq!(chart.indicator_name, "Peso para la edad");
        assert!((chart.child_age_months - 61.0 / 30.4375).abs() < 1e-12);
        assert!(chart.child_z_score.unwrap().abs() < 1e-9);
        assert_eq!(chart.chart_data.len(), 11);

        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["gender"], "male");
        assert_eq!(json["child_value"], 4.5);
        assert_eq!(json["chart_data"][2]["age"], 2.0);
        assert!(json.get("percentiles").is_none());
    }

    #[test]
    fn test_chart_converts_ages_to_months() {
        let rows = (0..3)
            .map(|week| {
                ReferenceRow::new(week as f64 * 7.0, AgeUnit::Day, 1.0, 34.0 + week as f64, 0.03)
            })
            .collect();
        let table = ReferenceTable::new(Indicator::HeadCircumferenceForAge, Sex::Female, rows)
            .unwrap();
        let curve = GrowthCurve::new(Arc::new(table), &[50.0], None).unwrap();
        let chart = curve.chart(14, 36.0).unwrap();
        let ages: Vec<f64> = chart.chart_data.iter().map(|p| p.age).collect();
        assert_eq!(ages[0], 0.0);
        assert!((ages[2] - 14.0 / 30.4375).abs() < 1e-12);
        assert!(chart.chart_data.iter().all(|p| p.age_unit == AgeUnit::Month));
    }

    #[test]
    fn test_chart_rejects_bad_child_point() {
        let curve = GrowthCurve::new(table(), &STANDARD_PERCENTILES, None).unwrap();
        assert!(matches!(curve.chart(-1, 4.5), Err(CurveError::BadAge(-1))));
        assert!(matches!(curve.chart(30, 0.0), Err(CurveError::BadValue(_))));
        assert!(matches!(curve.chart(30, f64::NAN), Err(CurveError::BadValue(_))));
    }

    #[test]
    fn test_missing_table_from_store() {
        let store = ReferenceStore::new(MemorySource::new());
        assert!(matches!(
            growth_curve(&store, Indicator::BmiForAge, Sex::Female, &[50.0], None),
            Err(CurveError::Table(_))
        ));
    }
}
