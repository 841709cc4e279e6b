//! Energy and nutrient requirements

pub mod energy;
pub mod nutrients;

pub use energy::{
    energy_requirement, energy_requirement_with_settings, ActivityFactors, EnergyBreakdown,
    EnergyMethod, EnergyRequirement, EnergySettings, FeedingFactors,
};
pub use nutrients::{nutrient_requirements, NutrientRequirement};

use crate::domain::{DAYS_PER_MONTH, DAYS_PER_YEAR};
use serde::{Deserialize, Serialize};

/// Dietary reference intake age bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeBracket {
    Infant0To6Months,
    Infant7To12Months,
    Child1To3Years,
    Child4To8Years,
    Child9To13Years,
    Adolescent14To18Years,
}

impl AgeBracket {
    /// Bracket for an age in days; negative ages fall in the first bracket.
    pub fn from_age_days(age_days: i64) -> Self {
        let days = age_days.max(0) as f64;
        let months = days / DAYS_PER_MONTH;
        let years = days / DAYS_PER_YEAR;
        if months < 6.0 {
            AgeBracket::Infant0To6Months
        } else if months < 12.0 {
            AgeBracket::Infant7To12Months
        } else if years < 4.0 {
            AgeBracket::Child1To3Years
        } else if years < 9.0 {
            AgeBracket::Child4To8Years
        } else if years < 14.0 {
            AgeBracket::Child9To13Years
        } else {
            AgeBracket::Adolescent14To18Years
        }
    }

    pub fn is_infant(&self) -> bool {
        matches!(
            self,
            AgeBracket::Infant0To6Months | AgeBracket::Infant7To12Months
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeBracket::Infant0To6Months => "0-6 meses",
            AgeBracket::Infant7To12Months => "7-12 meses",
            AgeBracket::Child1To3Years => "1-3 años",
            AgeBracket::Child4To8Years => "4-8 años",
            AgeBracket::Child9To13Years => "9-13 años",
            AgeBracket::Adolescent14To18Years => "14-18 años",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracket_boundaries() {
        assert_eq!(AgeBracket::from_age_days(0), AgeBracket::Infant0To6Months);
        assert_eq!(AgeBracket::from_age_days(182), AgeBracket::Infant0To6Months);
        assert_eq!(AgeBracket::from_age_days(183), AgeBracket::Infant7To12Months);
        assert_eq!(AgeBracket::from_age_days(365), AgeBracket::Infant7To12Months);
        assert_eq!(AgeBracket::from_age_days(366), AgeBracket::Child1To3Years);
        assert_eq!(AgeBracket::from_age_days(4 * 365 + 1), AgeBracket::Child4To8Years);
        assert_eq!(AgeBracket::from_age_days(10 * 365), AgeBracket::Child9To13Years);
        assert_eq!(AgeBracket::from_age_days(15 * 365), AgeBracket::Adolescent14To18Years);
        assert_eq!(AgeBracket::from_age_days(-5), AgeBracket::Infant0To6Months);
    }
}
