//! Quantity conversion between unit modes
//!
//! When an entry moves to another food, or a food switches between
//! `per100g` and `perServing`, the stored quantity is rewritten so the
//! logged amount of substance stays the same.

use crate::models::Food;

use super::units::{round_to, UnitMode, REFERENCE_GRAMS, SERVING_PRECISION};

/// Smallest serving count a conversion may produce
pub const MIN_CONVERTED_SERVINGS: f64 = 0.01;

/// Smallest gram amount a conversion may produce
pub const MIN_CONVERTED_GRAMS: f64 = 1.0;

/// Convert `quantity`, recorded against `from`, into the unit of `to`.
///
/// Same-unit moves leave the numeral alone even when the serving size
/// differs. A missing food on either side passes the quantity through.
pub fn convert_quantity(quantity: f64, from: Option<&Food>, to: Option<&Food>) -> f64 {
    let (from, to) = match (from, to) {
        (Some(from), Some(to)) => (from, to),
        _ => {
            tracing::warn!(quantity, "Food unavailable, quantity kept as is");
            return quantity;
        }
    };

    match (from.unit, to.unit) {
        (UnitMode::Per100g, UnitMode::PerServing) => {
            let serving = to.serving_size.unwrap_or(REFERENCE_GRAMS);
            grams_to_servings(quantity, serving)
        }
        (UnitMode::PerServing, UnitMode::Per100g) => {
            let serving = from.serving_size.unwrap_or(REFERENCE_GRAMS);
            servings_to_grams(quantity, serving)
        }
        _ => quantity,
    }
}

/// Grams to serving count, rounded to 2 decimals
pub fn grams_to_servings(grams: f64, serving_size: f64) -> f64 {
    if serving_size.is_nan() || serving_size <= 0.0 {
        return grams;
    }
    round_to(grams / serving_size, SERVING_PRECISION).max(MIN_CONVERTED_SERVINGS)
}

/// Serving count to whole grams, at least 1
pub fn servings_to_grams(servings: f64, serving_size: f64) -> f64 {
    (servings * serving_size).round().max(MIN_CONVERTED_GRAMS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FoodCategory, Macros};

    fn food(unit: UnitMode, serving_size: Option<f64>) -> Food {
        Food {
            id: 1,
            name: "Test".to_string(),
            brand: None,
            category: FoodCategory::Other,
            unit,
            serving_size,
            nutrients: Macros::new(100.0, 1.0, 1.0, 1.0),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_grams_to_servings() {
        let grams = food(UnitMode::Per100g, None);
        let bar = food(UnitMode::PerServing, Some(40.0));
        assert_eq!(convert_quantity(100.0, Some(&grams), Some(&bar)), 2.5);
        assert_eq!(convert_quantity(10.0, Some(&grams), Some(&bar)), 0.25);
    }

    #[test]
    fn test_servings_to_grams() {
        let whey = food(UnitMode::PerServing, Some(30.0));
        let grams = food(UnitMode::Per100g, None);
        assert_eq!(convert_quantity(1.0, Some(&whey), Some(&grams)), 30.0);
        assert_eq!(convert_quantity(0.01, Some(&whey), Some(&grams)), 1.0);
    }

    #[test]
    fn test_round_trip_preserves_grams() {
        let grams = food(UnitMode::Per100g, None);
        let whey = food(UnitMode::PerServing, Some(30.0));

        for original in [30.0, 45.0, 100.0, 250.0] {
            let servings = convert_quantity(original, Some(&grams), Some(&whey));
            let back = convert_quantity(servings, Some(&whey), Some(&grams));
            assert!((back - original).abs() <= 1.0, "{} -> {} -> {}", original, servings, back);
        }
    }

    #[test]
    fn test_whey_reassigned_and_back() {
        let whey = food(UnitMode::PerServing, Some(30.0));
        let grams = food(UnitMode::Per100g, None);
        let grams_qty = convert_quantity(1.0, Some(&whey), Some(&grams));
        assert_eq!(grams_qty, 30.0);
        assert_eq!(convert_quantity(grams_qty, Some(&grams), Some(&whey)), 1.0);
    }

    #[test]
    fn test_same_unit_is_unchanged() {
        let small = food(UnitMode::PerServing, Some(30.0));
        let large = food(UnitMode::PerServing, Some(60.0));
        assert_eq!(convert_quantity(2.0, Some(&small), Some(&large)), 2.0);

        let a = food(UnitMode::Per100g, None);
        let b = food(UnitMode::Per100g, Some(50.0));
        assert_eq!(convert_quantity(150.0, Some(&a), Some(&b)), 150.0);
    }

    #[test]
    fn test_missing_food_passes_through() {
        let whey = food(UnitMode::PerServing, Some(30.0));
        assert_eq!(convert_quantity(3.0, None, Some(&whey)), 3.0);
        assert_eq!(convert_quantity(3.0, Some(&whey), None), 3.0);
        assert_eq!(convert_quantity(3.0, None, None), 3.0);
    }

    #[test]
    fn test_tiny_amounts_stay_positive() {
        assert_eq!(grams_to_servings(0.1, 500.0), MIN_CONVERTED_SERVINGS);
        assert_eq!(servings_to_grams(0.001, 30.0), MIN_CONVERTED_GRAMS);
    }
}
