//! Daily nutrient requirements
//!
//! Macronutrients are derived from the energy requirement and the
//! age-bracket energy shares. Micronutrients come from the dietary reference
//! intake table for the child's bracket and sex.

use super::energy::EnergyBreakdown;
use super::AgeBracket;
use crate::domain::Sex;
use serde::{Deserialize, Serialize};

const KCAL_PER_GRAM_FAT: f64 = 9.0;
const KCAL_PER_GRAM_CARBOHYDRATE: f64 = 4.0;
const FIBER_GRAMS_PER_1000_KCAL: f64 = 14.0;

/// One row of the nutrient table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientRequirement {
    pub nutrient_name: String,
    pub recommended_amount: f64,
    pub unit: String,
}

impl NutrientRequirement {
    fn new(name: &str, amount: f64, unit: &str) -> Self {
        NutrientRequirement {
            nutrient_name: name.to_string(),
            recommended_amount: amount,
            unit: unit.to_string(),
        }
    }
}

/// Micronutrient intake by bracket:
/// 0-6m, 7-12m, 1-3y, 4-8y, 9-13y, 14-18y male, 14-18y female.
struct Micronutrient {
    name: &'static str,
    unit: &'static str,
    values: [f64; 7],
}

const MICRONUTRIENTS: &[Micronutrient] = &[
    Micronutrient {
        name: "Hierro",
        unit: "mg",
        values: [0.27, 11.0, 7.0, 10.0, 8.0, 11.0, 15.0],
    },
    Micronutrient {
        name: "Calcio",
        unit: "mg",
        values: [200.0, 260.0, 700.0, 1000.0, 1300.0, 1300.0, 1300.0],
    },
    Micronutrient {
        name: "Vitamina A",
        unit: "µg RAE",
        values: [400.0, 500.0, 300.0, 400.0, 600.0, 900.0, 700.0],
    },
    Micronutrient {
        name: "Vitamina C",
        unit: "mg",
        values: [40.0, 50.0, 15.0, 25.0, 45.0, 75.0, 65.0],
    },
    Micronutrient {
        name: "Zinc",
        unit: "mg",
        values: [2.0, 3.0, 3.0, 5.0, 8.0, 11.0, 9.0],
    },
    Micronutrient {
        name: "Vitamina D",
        unit: "µg",
        values: [10.0, 10.0, 15.0, 15.0, 15.0, 15.0, 15.0],
    },
    Micronutrient {
        name: "Folato",
        unit: "µg DFE",
        values: [65.0, 80.0, 150.0, 200.0, 300.0, 400.0, 400.0],
    },
    Micronutrient {
        name: "Vitamina B12",
        unit: "µg",
        values: [0.4, 0.5, 0.9, 1.2, 1.8, 2.4, 2.4],
    },
];

fn column(bracket: AgeBracket, sex: Sex) -> usize {
    match (bracket, sex) {
        (AgeBracket::Infant0To6Months, _) => 0,
        (AgeBracket::Infant7To12Months, _) => 1,
        (AgeBracket::Child1To3Years, _) => 2,
        (AgeBracket::Child4To8Years, _) => 3,
        (AgeBracket::Child9To13Years, _) => 4,
        (AgeBracket::Adolescent14To18Years, Sex::Male) => 5,
        (AgeBracket::Adolescent14To18Years, Sex::Female) => 6,
    }
}

/// Protein reference intake in g/kg/day.
fn protein_grams_per_kg(bracket: AgeBracket) -> f64 {
    match bracket {
        AgeBracket::Infant0To6Months => 1.52,
        AgeBracket::Infant7To12Months => 1.2,
        AgeBracket::Child1To3Years => 1.05,
        AgeBracket::Child4To8Years | AgeBracket::Child9To13Years => 0.95,
        AgeBracket::Adolescent14To18Years => 0.85,
    }
}

/// Nutrient table for a child; empty when no usable energy requirement is
/// available.
pub fn nutrient_requirements(
    age_days: i64,
    sex: Sex,
    weight_kg: f64,
    kcal_per_day: Option<f64>,
) -> Vec<NutrientRequirement> {
    let kcal = match kcal_per_day {
        Some(k) if k.is_finite() && k > 0.0 => k,
        _ => return Vec::new(),
    };

    let bracket = AgeBracket::from_age_days(age_days);
    let (_, fat_share, carbohydrate_share) = EnergyBreakdown::shares(bracket);

    let mut table = Vec::with_capacity(5 + MICRONUTRIENTS.len());
    table.push(NutrientRequirement::new("Energía", kcal, "kcal"));
    if weight_kg.is_finite() && weight_kg > 0.0 {
        table.push(NutrientRequirement::new(
            "Proteína",
            protein_grams_per_kg(bracket) * weight_kg,
            "g",
        ));
    }
    table.push(NutrientRequirement::new(
        "Grasa total",
        fat_share * kcal / KCAL_PER_GRAM_FAT,
        "g",
    ));
    table.push(NutrientRequirement::new(
        "Carbohidratos",
        carbohydrate_share * kcal / KCAL_PER_GRAM_CARBOHYDRATE,
        "g",
    ));
    if !bracket.is_infant() {
        table.push(NutrientRequirement::new(
            "Fibra",
            FIBER_GRAMS_PER_1000_KCAL * kcal / 1000.0,
            "g",
        ));
    }

    let col = column(bracket, sex);
    table.extend(
        MICRONUTRIENTS
            .iter()
            .map(|m| NutrientRequirement::new(m.name, m.values[col], m.unit)),
    );
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(table: &[NutrientRequirement], name: &str) -> Option<f64> {
        table
            .iter()
            .find(|n| n.nutrient_name == name)
            .map(|n| n.recommended_amount)
    }

    #[test]
    fn test_no_energy_gives_empty_table() {
        assert!(nutrient_requirements(400, Sex::Male, 10.0, None).is_empty());
        assert!(nutrient_requirements(400, Sex::Male, 10.0, Some(0.0)).is_empty());
        assert!(nutrient_requirements(400, Sex::Male, 10.0, Some(f64::NAN)).is_empty());
    }

    #[test]
    fn test_toddler_table() {
        let table = nutrient_requirements(800, Sex::Female, 11.0, Some(1000.0));
        assert_eq!(table[0].nutrient_name, "Energía");
        assert_eq!(amount(&table, "Energía"), Some(1000.0));
        assert!((amount(&table, "Proteína").unwrap() - 11.55).abs() < 1e-9);
        assert!((amount(&table, "Fibra").unwrap() - 14.0).abs() < 1e-9);
        assert_eq!(amount(&table, "Hierro"), Some(7.0));
        assert_eq!(amount(&table, "Calcio"), Some(700.0));
    }

    #[test]
    fn test_infants_have_no_fiber_row() {
        let table = nutrient_requirements(60, Sex::Male, 5.0, Some(500.0));
        assert!(amount(&table, "Fibra").is_none());
        assert_eq!(amount(&table, "Hierro"), Some(0.27));
    }

    #[test]
    fn test_adolescent_values_depend_on_sex() {
        let age = 15 * 365;
        let boys = nutrient_requirements(age, Sex::Male, 55.0, Some(2800.0));
        let girls = nutrient_requirements(age, Sex::Female, 52.0, Some(2300.0));
        assert_eq!(amount(&boys, "Hierro"), Some(11.0));
        assert_eq!(amount(&girls, "Hierro"), Some(15.0));
        assert_eq!(amount(&boys, "Zinc"), Some(11.0));
        assert_eq!(amount(&girls, "Zinc"), Some(9.0));
    }
}
