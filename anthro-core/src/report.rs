//! Reporting and output generation
//!
//! Global invariants enforced:
//! - Deterministic output ordering
//! - Byte-for-byte identical output across runs

use crate::assessment::Assessment;
use crate::classification::StatusLine;
use crate::domain::Indicator;
use crate::growth_curve::{percentile_key, ChartData, GrowthCurve};
use crate::recommendations::RecommendationSet;
use crate::requirements::{EnergyRequirement, NutrientRequirement};
use serde::{Deserialize, Serialize};

/// Complete nutritional evaluation for one measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionReport {
    pub assessment: Assessment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_requirements: Option<EnergyRequirement>,
    pub nutrient_requirements: Vec<NutrientRequirement>,
    pub recommendations: RecommendationSet,
}

/// Render a report as text output
pub fn render_text(report: &NutritionReport) -> String {
    let a = &report.assessment;
    let mut output = String::new();

    output.push_str(&format!(
        "Edad: {} días  Sexo: {}  IMC: {}\n",
        a.age_days,
        a.sex,
        a.bmi.map_or("-".to_string(), |b| format!("{:.2}", b))
    ));
    output.push_str(&format!(
        "Riesgo: {} ({})\n\n",
        a.risk_level.as_str(),
        a.risk_level.summary()
    ));

    output.push_str(&format!(
        "{:<36} {:>8} {}\n",
        "INDICADOR", "Z", "CATEGORÍA"
    ));
    for indicator in Indicator::all() {
        let result = a.zscores.get(*indicator);
        let z = result.z_score.map_or("-".to_string(), |z| format!("{:.2}", z));
        let category = result.classification.map_or("-", |c| c.as_str());
        output.push_str(&format!(
            "{:<36} {:>8} {}\n",
            truncate_or_pad(indicator.display_name(), 36),
            z,
            category
        ));
    }

    output.push_str("\nEstado nutricional:\n");
    for line in StatusLine::all() {
        if let Some(label) = a.nutritional_status.get(*line) {
            output.push_str(&format!("  {:<24} {}\n", line.key(), label));
        }
    }

    if let Some(ref energy) = report.energy_requirements {
        output.push_str(&format!(
            "\nEnergía: {:.0} kcal/día ({:.1} kcal/kg)\n",
            energy.kcal_per_day, energy.per_kg_kcal
        ));
    }

    if !report.nutrient_requirements.is_empty() {
        output.push_str("\nRequerimientos:\n");
        for n in &report.nutrient_requirements {
            output.push_str(&format!(
                "  {:<16} {:>10.2} {}\n",
                n.nutrient_name, n.recommended_amount, n.unit
            ));
        }
    }

    let recs = &report.recommendations;
    for (title, lines) in [
        ("Recomendaciones nutricionales", &recs.nutritional_recommendations),
        ("Recomendaciones generales", &recs.general_recommendations),
        ("Indicaciones para el cuidador", &recs.caregiver_instructions),
    ] {
        if lines.is_empty() {
            continue;
        }
        output.push_str(&format!("\n{}:\n", title));
        for line in lines {
            output.push_str(&format!("  - {}\n", line));
        }
    }

    output
}

/// Render reports as JSON output
pub fn render_json(reports: &[NutritionReport]) -> String {
    serde_json::to_string_pretty(reports).unwrap_or_else(|_| "[]".to_string())
}

/// Render reports as JSON lines, one report per line
pub fn render_jsonl(reports: &[NutritionReport]) -> String {
    let mut output = String::new();
    for report in reports {
        if let Ok(line) = serde_json::to_string(report) {
            output.push_str(&line);
            output.push('\n');
        }
    }
    output
}

/// Render a growth curve as a text table
pub fn render_curve_text(curve: &GrowthCurve) -> String {
    let mut output = format!(
        "{} ({}), edad en {}\n",
        curve.indicator().display_name(),
        curve.sex(),
        curve.unit()
    );

    output.push_str(&format!("{:>8}", "age"));
    for p in curve.percentiles() {
        output.push_str(&format!(" {:>10}", percentile_key(*p)));
    }
    output.push('\n');

    for point in curve {
        output.push_str(&format!("{:>8}", point.age));
        for (_, value) in &point.values {
            output.push_str(&format!(" {:>10.3}", value));
        }
        output.push('\n');
    }
    output
}

/// Render a growth curve as a JSON array of points
pub fn render_curve_json(curve: &GrowthCurve) -> String {
    serde_json::to_string_pretty(&curve.points()).unwrap_or_else(|_| "[]".to_string())
}

/// Render a chart payload: the curve in months and the child's point
pub fn render_chart_text(chart: &ChartData) -> String {
    let mut output = format!(
        "{} ({}), edad en meses\n",
        chart.indicator_name, chart.gender
    );

    output.push_str(&format!("{:>8}", "age"));
    for p in &chart.percentiles {
        output.push_str(&format!(" {:>10}", percentile_key(*p)));
    }
    output.push('\n');

    for point in &chart.chart_data {
        output.push_str(&format!("{:>8.2}", point.age));
        for (_, value) in &point.values {
            output.push_str(&format!(" {:>10.3}", value));
        }
        output.push('\n');
    }

    let z = chart
        .child_z_score
        .map(|z| format!("{:.2}", z))
        .unwrap_or_else(|| "-".to_string());
    output.push_str(&format!(
        "\nNiño: {:.1} meses, {} {}, z = {}\n",
        chart.child_age_months,
        chart.child_value,
        chart.indicator.unit(),
        z
    ));
    output
}

/// Render a chart payload as JSON
pub fn render_chart_json(chart: &ChartData) -> String {
    serde_json::to_string_pretty(chart).unwrap_or_else(|_| "{}".to_string())
}

/// Truncate or pad string to fixed width
fn truncate_or_pad(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let kept: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        format!("{:<width$}", s, width = width)
    }
}
