//! Unit modes and rounding precision
//!
//! A food declares its nutrients either per 100 grams or per discrete
//! serving. Entry quantities are read in the same unit as their food.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reference amount for `per100g` foods, in grams
pub const REFERENCE_GRAMS: f64 = 100.0;

/// Smallest serving size a `perServing` food may declare, in grams
pub const MIN_SERVING_SIZE: f64 = 1.0;

/// Decimal places kept for kcal
pub const KCAL_PRECISION: u32 = 1;

/// Decimal places kept for fat, carbs and protein
pub const MACRO_PRECISION: u32 = 2;

/// Decimal places kept for serving counts produced by unit conversion
pub const SERVING_PRECISION: u32 = 2;

/// How a food's nutrient values are expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UnitMode {
    /// Values per 100 grams; entry quantity is grams
    #[default]
    #[serde(rename = "per100g")]
    Per100g,
    /// Values per serving; entry quantity is a serving count
    #[serde(rename = "perServing")]
    PerServing,
}

impl UnitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitMode::Per100g => "per100g",
            UnitMode::PerServing => "perServing",
        }
    }

    /// Parse a stored or user-supplied unit tag
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['_', '-', ' '], "").as_str() {
            "per100g" | "100g" | "g" | "grams" => Some(UnitMode::Per100g),
            "perserving" | "serving" | "servings" => Some(UnitMode::PerServing),
            _ => None,
        }
    }

    /// Label for the quantity field of an entry under this unit
    pub fn quantity_label(&self) -> &'static str {
        match self {
            UnitMode::Per100g => "g",
            UnitMode::PerServing => "servings",
        }
    }
}

impl fmt::Display for UnitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Round half away from zero to a fixed number of decimal places
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

pub fn round_kcal(value: f64) -> f64 {
    round_to(value, KCAL_PRECISION)
}

pub fn round_macro(value: f64) -> f64 {
    round_to(value, MACRO_PRECISION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_mode_parsing() {
        assert_eq!(UnitMode::from_str("per100g"), Some(UnitMode::Per100g));
        assert_eq!(UnitMode::from_str("perServing"), Some(UnitMode::PerServing));
        assert_eq!(UnitMode::from_str("per_serving"), Some(UnitMode::PerServing));
        assert_eq!(UnitMode::from_str("cup"), None);
    }

    #[test]
    fn test_unit_mode_serde_tags() {
        let json = serde_json::to_string(&UnitMode::PerServing).unwrap();
        assert_eq!(json, "\"perServing\"");
        let parsed: UnitMode = serde_json::from_str("\"per100g\"").unwrap();
        assert_eq!(parsed, UnitMode::Per100g);
    }

    #[test]
    fn test_rounding_precision() {
        assert_eq!(round_kcal(247.54), 247.5);
        assert_eq!(round_macro(5.3999999), 5.4);
        assert_eq!(round_macro(0.005), 0.01);
        assert_eq!(round_to(2.5, 0), 3.0);
    }
}
