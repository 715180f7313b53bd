//! Lenient serde helpers for client-supplied transaction fields
//!
//! Mobile clients send the same field as a number, a numeric string, or
//! null depending on app version. These helpers accept all of them.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value as JsonValue;

/// Parse a decimal amount from a JSON value
pub fn decimal_from_value(value: &JsonValue) -> Option<Decimal> {
    match value {
        JsonValue::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        JsonValue::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            // "Rs. 1,250" leaves a stray leading dot
            let cleaned = cleaned.trim_start_matches('.');
            if cleaned.is_empty() {
                None
            } else {
                Decimal::from_str(cleaned).ok()
            }
        }
        _ => None,
    }
}

/// Amount: number, numeric string ("₹1,250.50"), or null (zero)
pub fn decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    let value = JsonValue::deserialize(deserializer)?;
    Ok(decimal_from_value(&value).unwrap_or(Decimal::ZERO))
}

/// Whole number, also accepted as a float or numeric string
pub fn integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = JsonValue::deserialize(deserializer)?;
    Ok(match &value {
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(0),
        JsonValue::String(s) => s.trim().parse::<f64>().map(|f| f.trunc() as i64).unwrap_or(0),
        _ => 0,
    })
}

/// Boolean flag: true/false, 1/0, "true"/"yes"/"1"
pub fn flag_from_value(value: &JsonValue) -> bool {
    match value {
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        JsonValue::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "yes" | "y" | "1"
        ),
        _ => false,
    }
}

/// Optional trimmed string; numbers are stringified, blanks become `None`
pub fn text_from_value(value: JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = JsonValue::deserialize(deserializer)?;
    Ok(text_from_value(value))
}

/// Serialize money as a JSON integer when whole, else as a float
pub fn serialize_amount<S: Serializer>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    if amount.fract().is_zero() {
        if let Some(whole) = amount.to_i64() {
            return serializer.serialize_i64(whole);
        }
    }
    serializer.serialize_f64(amount.to_f64().unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decimal_from_value() {
        assert_eq!(decimal_from_value(&json!(100)), Some(Decimal::new(100, 0)));
        assert_eq!(decimal_from_value(&json!(12.5)), Some(Decimal::new(125, 1)));
        assert_eq!(decimal_from_value(&json!("₹1,250.50")), Some(Decimal::new(125050, 2)));
        assert_eq!(decimal_from_value(&json!("-40")), Some(Decimal::new(-40, 0)));
        assert_eq!(decimal_from_value(&json!("Rs. 99")), Some(Decimal::new(99, 0)));
        assert_eq!(decimal_from_value(&json!("n/a")), None);
        assert_eq!(decimal_from_value(&json!(null)), None);
    }

    #[test]
    fn test_flag_and_text_from_value() {
        assert!(flag_from_value(&json!("Yes")));
        assert!(flag_from_value(&json!(1)));
        assert!(!flag_from_value(&json!(null)));
        assert_eq!(text_from_value(json!("  Rent ")), Some("Rent".to_string()));
        assert_eq!(text_from_value(json!(42)), Some("42".to_string()));
        assert_eq!(text_from_value(json!("   ")), None);
    }

    #[test]
    fn test_serialize_amount_integral_and_fractional() {
        let whole = serde_json::to_value(Wrapper(Decimal::new(15000, 2))).unwrap();
        assert_eq!(whole, json!(150));

        let fractional = serde_json::to_value(Wrapper(Decimal::new(1505, 1))).unwrap();
        assert_eq!(fractional, json!(150.5));
    }

    struct Wrapper(Decimal);

    impl serde::Serialize for Wrapper {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serialize_amount(&self.0, serializer)
        }
    }
}
