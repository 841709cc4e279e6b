//! Recommendation generation
//!
//! Turns an assessment into three lists of guidance text. Output is a pure
//! function of the assessment.
//!
//! Global invariants enforced:
//! - Lines are emitted in a fixed order: indicators in canonical order, then
//!   risk level, then age
//! - Each list contains no duplicates; the first occurrence is kept

use crate::assessment::Assessment;
use crate::classification::{Category, RiskLevel};
use crate::domain::{Indicator, DAYS_PER_MONTH};
use serde::{Deserialize, Serialize};

/// Guidance derived from one assessment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub nutritional_recommendations: Vec<String>,
    pub general_recommendations: Vec<String>,
    pub caregiver_instructions: Vec<String>,
}

impl RecommendationSet {
    pub fn is_empty(&self) -> bool {
        self.nutritional_recommendations.is_empty()
            && self.general_recommendations.is_empty()
            && self.caregiver_instructions.is_empty()
    }
}

/// Append-only list that drops repeated lines.
#[derive(Default)]
struct Lines(Vec<String>);

impl Lines {
    fn push(&mut self, line: &str) {
        if !self.0.iter().any(|l| l == line) {
            self.0.push(line.to_string());
        }
    }

    fn extend(&mut self, lines: &[&str]) {
        for line in lines {
            self.push(line);
        }
    }
}

fn nutritional_lines(indicator: Indicator, category: Category) -> &'static [&'static str] {
    use Category::*;
    match (indicator, category) {
        (_, Normal) => &[],
        (Indicator::WeightForAge | Indicator::BmiForAge, SevereDeficit | ModerateDeficit) => &[
            "Aumentar la densidad energética de las comidas con aceite vegetal, mantequilla de maní o leche entera",
            "Ofrecer 5 a 6 comidas pequeñas al día",
            "Incluir una fuente de proteína de origen animal en cada comida",
        ],
        (Indicator::WeightForAge | Indicator::BmiForAge, RiskOfDeficit) => &[
            "Ofrecer 5 a 6 comidas pequeñas al día",
            "Agregar una merienda nutritiva entre comidas",
        ],
        (Indicator::HeightForAge, SevereDeficit | ModerateDeficit | RiskOfDeficit) => &[
            "Incluir una fuente de proteína de origen animal en cada comida",
            "Asegurar el consumo diario de alimentos ricos en zinc y calcio",
        ],
        (Indicator::HeightForAge, _) => &[],
        (Indicator::WeightForAge, _) => &[
            "Evaluar el peso para la talla antes de modificar la dieta",
        ],
        (Indicator::BmiForAge, RiskOfExcess) => &[
            "Reducir bebidas azucaradas y jugos industrializados",
        ],
        (Indicator::BmiForAge, ModerateExcess | SevereExcess) => &[
            "Reducir bebidas azucaradas y jugos industrializados",
            "Reemplazar frituras y snacks por frutas y verduras",
            "Controlar el tamaño de las porciones sin suprimir comidas",
        ],
        (Indicator::HeadCircumferenceForAge, _) => &[],
        (
            Indicator::TricepsSkinfoldForAge | Indicator::SubscapularSkinfoldForAge,
            SevereDeficit | ModerateDeficit | RiskOfDeficit,
        ) => &["Incluir grasas saludables como aceite vegetal y aguacate"],
        (Indicator::TricepsSkinfoldForAge | Indicator::SubscapularSkinfoldForAge, _) => &[
            "Reemplazar frituras y snacks por frutas y verduras",
        ],
    }
}

fn general_lines(indicator: Indicator, category: Category) -> &'static [&'static str] {
    use Category::*;
    match (indicator, category) {
        (_, Normal) => &[],
        (
            Indicator::HeadCircumferenceForAge,
            SevereDeficit | ModerateDeficit | ModerateExcess | SevereExcess,
        ) => &["Derivar a evaluación de neurodesarrollo"],
        (Indicator::HeightForAge, SevereDeficit | ModerateDeficit) => &[
            "Descartar enfermedades crónicas o infecciones recurrentes",
        ],
        (Indicator::BmiForAge, ModerateExcess | SevereExcess) => &[
            "Promover al menos 60 minutos diarios de actividad física",
            "Limitar el tiempo frente a pantallas a menos de 2 horas al día",
        ],
        _ => &[],
    }
}

fn risk_lines(risk: RiskLevel) -> &'static [&'static str] {
    match risk {
        RiskLevel::Low => &[
            "Continuar con controles de crecimiento y desarrollo según calendario",
        ],
        RiskLevel::Medium => &[
            "Programar control de seguimiento en 30 días",
            "Registrar el peso y la talla en cada visita",
        ],
        RiskLevel::High => &[
            "Referir a valoración médica y nutricional de inmediato",
            "Programar control de seguimiento en 7 días",
        ],
    }
}

fn caregiver_lines(age_days: i64) -> &'static [&'static str] {
    let months = age_days.max(0) as f64 / DAYS_PER_MONTH;
    if months < 6.0 {
        &[
            "Mantener lactancia materna exclusiva a libre demanda",
            "No ofrecer agua, jugos ni otros alimentos antes de los 6 meses",
        ]
    } else if months < 12.0 {
        &[
            "Continuar la lactancia materna junto a la alimentación complementaria",
            "Introducir alimentos nuevos de uno en uno y en consistencia de puré",
            "Ofrecer alimentos ricos en hierro como hígado, carnes y legumbres",
        ]
    } else if months < 24.0 {
        &[
            "Continuar la lactancia materna hasta los 2 años o más",
            "Integrar al niño a la alimentación familiar con porciones adecuadas",
        ]
    } else if months < 60.0 {
        &[
            "Ofrecer tres comidas principales y dos meriendas al día",
            "Evitar golosinas y bebidas azucaradas",
        ]
    } else {
        &[
            "Asegurar un desayuno completo antes de la escuela",
            "Involucrar al niño en la preparación de comidas saludables",
        ]
    }
}

/// Guidance for an assessment.
pub fn recommendations(assessment: &Assessment) -> RecommendationSet {
    let mut nutritional = Lines::default();
    let mut general = Lines::default();

    for (indicator, result) in assessment.zscores.iter() {
        if let Some(category) = result.classification {
            nutritional.extend(nutritional_lines(indicator, category));
            general.extend(general_lines(indicator, category));
        }
    }
    general.extend(risk_lines(assessment.risk_level));

    let mut caregiver = Lines::default();
    caregiver.extend(caregiver_lines(assessment.age_days));
    caregiver.push("Acudir a los controles programados con el carné de crecimiento");

    RecommendationSet {
        nutritional_recommendations: nutritional.0,
        general_recommendations: general.0,
        caregiver_instructions: caregiver.0,
    }
}
