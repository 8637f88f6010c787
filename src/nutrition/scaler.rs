//! Macro scaler
//!
//! Turns a food's per-unit nutrient profile and a logged quantity into the
//! absolute amounts consumed.

use crate::models::{Food, Macros};

use super::units::{UnitMode, REFERENCE_GRAMS};

/// Multiplier applied to a food's per-unit values for `quantity`
pub fn scale_factor(unit: UnitMode, quantity: f64) -> f64 {
    match unit {
        UnitMode::Per100g => quantity / REFERENCE_GRAMS,
        // Serving size is only used for unit conversion
        UnitMode::PerServing => quantity,
    }
}

/// Absolute nutrients for `quantity` of `food`, kcal rounded to 1 decimal
/// place and macros to 2
pub fn scale(food: &Food, quantity: f64) -> Macros {
    food.nutrients
        .scale(scale_factor(food.unit, quantity))
        .rounded()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FoodCategory;

    fn food(unit: UnitMode, serving_size: Option<f64>, nutrients: Macros) -> Food {
        Food {
            id: 1,
            name: "Test".to_string(),
            brand: None,
            category: FoodCategory::Other,
            unit,
            serving_size,
            nutrients,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_per_100g_scaling() {
        let chicken = food(UnitMode::Per100g, None, Macros::new(165.0, 3.6, 0.0, 31.0));
        let result = scale(&chicken, 150.0);
        assert_eq!(result, Macros::new(247.5, 5.4, 0.0, 46.5));
    }

    #[test]
    fn test_per_100g_at_reference_amount_is_identity() {
        let oats = food(UnitMode::Per100g, None, Macros::new(389.0, 6.9, 66.27, 16.89));
        assert_eq!(scale(&oats, 100.0), oats.nutrients);
    }

    #[test]
    fn test_per_serving_single_serving_is_identity() {
        let whey = food(UnitMode::PerServing, Some(30.0), Macros::new(120.0, 1.5, 3.0, 24.0));
        let result = scale(&whey, 1.0);
        assert_eq!(result.protein, 24.0);
        assert_eq!(result, whey.nutrients);
    }

    #[test]
    fn test_per_serving_ignores_serving_size() {
        let whey = food(UnitMode::PerServing, Some(30.0), Macros::new(120.0, 1.5, 3.0, 24.0));
        let result = scale(&whey, 2.5);
        assert_eq!(result.kcal, 300.0);
        assert_eq!(result.protein, 60.0);
    }

    #[test]
    fn test_rounding_precision() {
        let f = food(UnitMode::Per100g, None, Macros::new(333.33, 1.234, 0.0, 0.0));
        let result = scale(&f, 10.0);
        assert_eq!(result.kcal, 33.3);
        assert_eq!(result.fat, 0.12);
    }
}
