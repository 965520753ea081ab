/// Filters operating on numbers
#[cfg(feature = "builtins")]
use humansize::{format_size, DECIMAL};
use serde_json::value::Value;

use crate::errors::{Error, Result};

/// Returns the absolute value of the argument.
pub fn abs(value: &Value, _: &[Value]) -> Result<Value> {
    if value.as_u64().is_some() {
        Ok(value.clone())
    } else if let Some(num) = value.as_i64() {
        Ok(Value::from(num.unsigned_abs()))
    } else if let Some(num) = value.as_f64() {
        Ok(Value::from(num.abs()))
    } else {
        Err(Error::msg("Filter `abs` was used on a value that isn't a number."))
    }
}

/// Returns a plural suffix if the value is not equal to 1 or -1, or a singular
/// suffix otherwise. The plural suffix defaults to `s` and the singular suffix
/// defaults to the empty string (i.e nothing).
pub fn pluralize(value: &Value, args: &[Value]) -> Result<Value> {
    let num = try_get_value!("pluralize", "value", f64, value);

    let plural = try_get_arg!("pluralize", "plural", String, args, 0).unwrap_or_else(|| "s".to_string());
    let singular = try_get_arg!("pluralize", "singular", String, args, 1).unwrap_or_default();

    // English uses plural when it isn't one
    if (num.abs() - 1.).abs() > f64::EPSILON {
        Ok(Value::String(plural))
    } else {
        Ok(Value::String(singular))
    }
}

/// Returns a number rounded to `precision` decimals, `0` by default.
/// Rounding to `0` decimals gives back an integer.
pub fn round(value: &Value, args: &[Value]) -> Result<Value> {
    let num = try_get_value!("round", "value", f64, value);
    // f64 has no decimal digits outside of that range anyway
    let precision = try_get_arg!("round", "precision", i32, args, 0).unwrap_or(0).clamp(-308, 308);

    if precision <= 0 {
        let multiplier = 10.0_f64.powi(-precision);
        let rounded = (num / multiplier).round() * multiplier;
        if rounded.abs() < i64::MAX as f64 {
            return Ok(Value::from(rounded as i64));
        }
        return Ok(Value::from(rounded));
    }

    let multiplier = 10.0_f64.powi(precision);
    let rounded = (multiplier * num).round() / multiplier;
    if rounded.is_finite() {
        Ok(Value::from(rounded))
    } else {
        Ok(Value::from(num))
    }
}

/// Formats a number with exactly `digits` decimals, `2` by default, returning a string.
pub fn fixed(value: &Value, args: &[Value]) -> Result<Value> {
    let num = try_get_value!("fixed", "value", f64, value);
    let digits = try_get_arg!("fixed", "digits", usize, args, 0).unwrap_or(2);

    Ok(Value::String(format!("{:.*}", digits, num)))
}

/// Returns a human-readable file size (i.e. '110 MB') from an integer
#[cfg(feature = "builtins")]
pub fn file_size(value: &Value, _: &[Value]) -> Result<Value> {
    let num = try_get_value!("fileSize", "value", u64, value);
    Ok(Value::String(format_size(num, DECIMAL)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_abs() {
        let tests = vec![(json!(1), json!(1)), (json!(-1), json!(1)), (json!(-1.5), json!(1.5))];
        for (input, expected) in tests {
            assert_eq!(abs(&input, &[]).unwrap(), expected);
        }
    }

    #[test]
    fn test_abs_non_number() {
        let err = abs(&json!("nan"), &[]).unwrap_err();
        assert_eq!(err.to_string(), "Filter `abs` was used on a value that isn't a number.");
    }

    #[test]
    fn test_pluralize_single() {
        assert_eq!(pluralize(&json!(1), &[]).unwrap(), json!(""));
        assert_eq!(pluralize(&json!(-1), &[]).unwrap(), json!(""));
    }

    #[test]
    fn test_pluralize_multiple() {
        assert_eq!(pluralize(&json!(2), &[]).unwrap(), json!("s"));
        assert_eq!(pluralize(&json!(0), &[]).unwrap(), json!("s"));
        assert_eq!(pluralize(&json!(1.5), &[]).unwrap(), json!("s"));
    }

    #[test]
    fn test_pluralize_custom_suffixes() {
        assert_eq!(pluralize(&json!(2), &[json!("es")]).unwrap(), json!("es"));
        assert_eq!(pluralize(&json!(1), &[json!("ies"), json!("y")]).unwrap(), json!("y"));
    }

    #[test]
    fn test_round() {
        assert_eq!(round(&json!(2.6), &[]).unwrap(), json!(3));
        assert_eq!(round(&json!(2.4), &[]).unwrap(), json!(2));
        assert_eq!(round(&json!(-2.6), &[]).unwrap(), json!(-3));
        assert_eq!(round(&json!(2.1234), &[json!(2)]).unwrap(), json!(2.12));
        assert_eq!(round(&json!(1250), &[json!(-2)]).unwrap(), json!(1300));
        assert_eq!(round(&json!(1), &[json!(i32::MIN)]).unwrap(), json!(0));
        assert_eq!(round(&json!(-1.5), &[json!(-400)]).unwrap(), json!(0));
        assert_eq!(round(&json!(2.5), &[json!(i32::MAX)]).unwrap(), json!(2.5));
        assert_eq!(round(&json!(1e300), &[json!(300)]).unwrap(), json!(1e300));
    }

    #[test]
    fn test_fixed() {
        assert_eq!(fixed(&json!(2), &[]).unwrap(), json!("2.00"));
        assert_eq!(fixed(&json!(3.14159), &[json!(3)]).unwrap(), json!("3.142"));
        assert_eq!(fixed(&json!(2.7), &[json!(0)]).unwrap(), json!("3"));
    }

    #[cfg(feature = "builtins")]
    #[test]
    fn test_file_size() {
        assert_eq!(file_size(&json!(123456789), &[]).unwrap(), json!("123.46 MB"));
        assert_eq!(file_size(&json!(100), &[]).unwrap(), json!("100 B"));
    }
}
