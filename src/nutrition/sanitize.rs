//! Numeric sanitization boundary
//!
//! Raw numbers coming from imports or loosely typed callers are coerced
//! here, so the scaler and aggregator only ever see finite values.

use serde_json::Value;

/// Coerce an arbitrary JSON value to a number; anything unusable becomes 0
pub fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// Coerce an optional field of a JSON object
pub fn coerce_field(object: &Value, key: &str) -> f64 {
    object.get(key).map(coerce_number).unwrap_or(0.0)
}

/// Nutrient values are never negative or non-finite
pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// A loggable quantity is positive and finite
pub fn valid_quantity(value: f64) -> Option<f64> {
    if value.is_finite() && value > 0.0 {
        Some(value)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(&json!(12.5)), 12.5);
        assert_eq!(coerce_number(&json!("  30 ")), 30.0);
        assert_eq!(coerce_number(&json!("abc")), 0.0);
        assert_eq!(coerce_number(&json!(null)), 0.0);
        assert_eq!(coerce_number(&json!(true)), 0.0);
        assert_eq!(coerce_number(&json!("NaN")), 0.0);
        assert_eq!(coerce_number(&json!("inf")), 0.0);
    }

    #[test]
    fn test_coerce_missing_field() {
        let obj = json!({ "kcal": "120" });
        assert_eq!(coerce_field(&obj, "kcal"), 120.0);
        assert_eq!(coerce_field(&obj, "fat"), 0.0);
    }

    #[test]
    fn test_non_negative_and_quantity() {
        assert_eq!(non_negative(-3.0), 0.0);
        assert_eq!(non_negative(f64::NAN), 0.0);
        assert_eq!(non_negative(4.2), 4.2);

        assert_eq!(valid_quantity(150.0), Some(150.0));
        assert_eq!(valid_quantity(0.0), None);
        assert_eq!(valid_quantity(-1.0), None);
        assert_eq!(valid_quantity(f64::INFINITY), None);
    }
}
