//! Shared utilities for the cluster profiling pipeline.

use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Column names of a DataFrame as owned strings, in frame order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// Numeric Formatting Utilities
// =============================================================================

/// Round a value to a fixed number of decimal places.
///
/// Exact halves round to the nearest even digit, so `0.125` becomes `0.12`.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Keep a statistic only if it is a real number.
#[inline]
pub fn defined(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

// =============================================================================
// String Utilities
// =============================================================================

/// Title-case a phrase: the first letter of every alphabetic run is upper-cased
/// and the rest are lower-cased.
///
/// ```rust,ignore
/// assert_eq!(title_case("prefer SMS"), "Prefer Sms");
/// assert_eq!(title_case("first-time donors"), "First-Time Donors");
/// ```
pub fn title_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut in_word = false;

    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            result.push(c);
            in_word = false;
        }
    }

    result
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_column_names() {
        let df = df!("b" => [1i64], "a" => [2i64]).unwrap();
        assert_eq!(column_names(&df), vec!["b", "a"]);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(2.0 / 3.0, 3), 0.667);
        assert_eq!(round_to(0.456, 2), 0.46);
        assert_eq!(round_to(0.1, 2), 0.1);
        assert_eq!(round_to(0.0, 3), 0.0);
    }

    #[test]
    fn test_round_to_ties_even() {
        assert_eq!(round_to(0.0625, 3), 0.062);
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.375, 2), 0.38);
        assert_eq!(round_to(0.5, 0), 0.0);
    }

    #[test]
    fn test_defined() {
        assert_eq!(defined(Some(1.5)), Some(1.5));
        assert_eq!(defined(Some(f64::NAN)), None);
        assert_eq!(defined(None), None);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("Prefer SMS"), "Prefer Sms");
        assert_eq!(title_case("young first-time donors"), "Young First-Time Donors");
        assert_eq!(title_case("Older Frequent Donors Prefer Email"), "Older Frequent Donors Prefer Email");
        assert_eq!(title_case(""), "");
    }
}
