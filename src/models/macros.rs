//! Shared macro-nutrient data structure
//!
//! Used for food profiles, scaled entries, totals and goals.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::nutrition::units::{round_kcal, round_macro};

/// Calories and the three macro-nutrients
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub kcal: f64,
    pub fat: f64,     // grams
    pub carbs: f64,   // grams
    pub protein: f64, // grams
}

/// One of the four tracked nutrients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nutrient {
    Kcal,
    Fat,
    Carbs,
    Protein,
}

impl Nutrient {
    pub const ALL: [Nutrient; 4] = [Nutrient::Kcal, Nutrient::Fat, Nutrient::Carbs, Nutrient::Protein];

    pub fn as_str(&self) -> &'static str {
        match self {
            Nutrient::Kcal => "kcal",
            Nutrient::Fat => "fat",
            Nutrient::Carbs => "carbs",
            Nutrient::Protein => "protein",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "kcal" | "calories" | "energy" => Some(Nutrient::Kcal),
            "fat" => Some(Nutrient::Fat),
            "carbs" | "carbohydrates" => Some(Nutrient::Carbs),
            "protein" => Some(Nutrient::Protein),
            _ => None,
        }
    }

    /// Display unit
    pub fn unit(&self) -> &'static str {
        match self {
            Nutrient::Kcal => "kcal",
            _ => "g",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Nutrient::Kcal => "Calories",
            Nutrient::Fat => "Fat",
            Nutrient::Carbs => "Carbs",
            Nutrient::Protein => "Protein",
        }
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Macros {
    pub fn new(kcal: f64, fat: f64, carbs: f64, protein: f64) -> Self {
        Self { kcal, fat, carbs, protein }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Multiply every field, without rounding
    pub fn scale(&self, multiplier: f64) -> Self {
        Self {
            kcal: self.kcal * multiplier,
            fat: self.fat * multiplier,
            carbs: self.carbs * multiplier,
            protein: self.protein * multiplier,
        }
    }

    pub fn add(&self, other: &Macros) -> Self {
        Self {
            kcal: self.kcal + other.kcal,
            fat: self.fat + other.fat,
            carbs: self.carbs + other.carbs,
            protein: self.protein + other.protein,
        }
    }

    /// kcal to 1 decimal place, macros to 2
    pub fn rounded(&self) -> Self {
        Self {
            kcal: round_kcal(self.kcal),
            fat: round_macro(self.fat),
            carbs: round_macro(self.carbs),
            protein: round_macro(self.protein),
        }
    }

    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Kcal => self.kcal,
            Nutrient::Fat => self.fat,
            Nutrient::Carbs => self.carbs,
            Nutrient::Protein => self.protein,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.kcal == 0.0 && self.fat == 0.0 && self.carbs == 0.0 && self.protein == 0.0
    }
}

impl std::ops::Add for Macros {
    type Output = Macros;

    fn add(self, other: Macros) -> Macros {
        Macros::add(&self, &other)
    }
}

impl std::ops::Mul<f64> for Macros {
    type Output = Macros;

    fn mul(self, multiplier: f64) -> Macros {
        self.scale(multiplier)
    }
}

impl std::iter::Sum for Macros {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Macros::zero(), |acc, n| acc + n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_and_round() {
        let total: Macros = vec![Macros::new(100.04, 1.111, 2.0, 3.0), Macros::new(0.1, 0.006, 0.0, 0.5)]
            .into_iter()
            .sum();
        let r = total.rounded();
        assert_eq!(r.kcal, 100.1);
        assert_eq!(r.fat, 1.12);
        assert_eq!(r.protein, 3.5);
    }

    #[test]
    fn test_get_by_nutrient() {
        let m = Macros::new(1.0, 2.0, 3.0, 4.0);
        let values: Vec<f64> = Nutrient::ALL.iter().map(|n| m.get(*n)).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(Nutrient::from_str("Calories"), Some(Nutrient::Kcal));
        assert_eq!(Nutrient::from_str("fiber"), None);
    }
}
