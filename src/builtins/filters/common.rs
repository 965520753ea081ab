/// Filters operating on multiple types
#[cfg(feature = "builtins")]
use std::fmt::Write;

use serde_json::value::Value;
use serde_json::{to_string, to_string_pretty};

#[cfg(feature = "builtins")]
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
#[cfg(feature = "builtins")]
use chrono_tz::Tz;

use crate::context::ValueRender;
#[cfg(feature = "builtins")]
use crate::errors::Error;
use crate::errors::Result;

/// Returns the fallback given as argument if the value is null or an empty string
pub fn default(value: &Value, args: &[Value]) -> Result<Value> {
    match value {
        Value::Null => Ok(args.first().cloned().unwrap_or(Value::Null)),
        Value::String(s) if s.is_empty() => Ok(args.first().cloned().unwrap_or(Value::Null)),
        _ => Ok(value.clone()),
    }
}

/// Encodes a value of any type into json, optionally `pretty`-printing it
/// `pretty` can be true to enable pretty-print, or omitted for compact printing
pub fn json(value: &Value, args: &[Value]) -> Result<Value> {
    let pretty = args.first().and_then(Value::as_bool).unwrap_or(false);

    if pretty {
        Ok(Value::String(to_string_pretty(value)?))
    } else {
        Ok(Value::String(to_string(value)?))
    }
}

/// Returns a formatted time according to the given `format` argument.
/// `format` defaults to the ISO 8601 `YYYY-MM-DD` format. An optional
/// second argument names the timezone to convert to, eg `Europe/Paris`.
///
/// Input can be an i64 timestamp (seconds since epoch), an RFC3339 string,
/// a naive datetime string or a `YYYY-MM-DD` date.
///
/// a full reference for the time formatting syntax is available
/// on [chrono docs](https://docs.rs/chrono/latest/chrono/format/strftime/index.html)
#[cfg(feature = "builtins")]
pub fn date_format(value: &Value, args: &[Value]) -> Result<Value> {
    let format =
        try_get_arg!("dateFormat", "format", String, args, 0).unwrap_or_else(|| "%Y-%m-%d".to_string());

    let timezone = match try_get_arg!("dateFormat", "timezone", String, args, 1) {
        Some(timezone) => match timezone.parse::<Tz>() {
            Ok(timezone) => Some(timezone),
            Err(_) => {
                return Err(Error::msg(format!("Error parsing `{}` as a timezone", timezone)))
            }
        },
        None => None,
    };

    let formatted = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => {
                let date = match Utc.timestamp_opt(i, 0).single() {
                    Some(date) => date,
                    None => {
                        return Err(Error::msg(format!(
                            "Filter `dateFormat` received an out of range timestamp: {}",
                            i
                        )))
                    }
                };
                match timezone {
                    Some(timezone) => date.with_timezone(&timezone).format(&format),
                    None => date.naive_utc().format(&format),
                }
            }
            None => {
                return Err(Error::msg(format!("Filter `dateFormat` was invoked on a float: {}", n)))
            }
        },
        Value::String(s) => {
            if s.contains('T') {
                match s.parse::<DateTime<FixedOffset>>() {
                    Ok(val) => match timezone {
                        Some(timezone) => val.with_timezone(&timezone).format(&format),
                        None => val.naive_local().format(&format),
                    },
                    Err(_) => match s.parse::<NaiveDateTime>() {
                        Ok(val) => val.format(&format),
                        Err(_) => {
                            return Err(Error::msg(format!(
                                "Error parsing `{:?}` as rfc3339 date or naive datetime",
                                s
                            )));
                        }
                    },
                }
            } else {
                match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    Ok(val) => match val.and_hms_opt(0, 0, 0) {
                        Some(midnight) => midnight.format(&format),
                        None => return Err(Error::msg(format!("Invalid date `{}`", s))),
                    },
                    Err(_) => {
                        return Err(Error::msg(format!(
                            "Error parsing `{:?}` as YYYY-MM-DD date",
                            s
                        )));
                    }
                }
            }
        }
        _ => {
            return Err(Error::msg(format!(
                "Filter `dateFormat` received an incorrect type for arg `value`: \
                 got `{:?}` but expected i64|u64|String",
                value
            )));
        }
    };

    // an invalid format string only shows up when writing
    let mut output = String::new();
    write!(output, "{}", formatted)
        .map_err(|_| Error::msg(format!("Invalid date format `{}`", format)))?;
    Ok(Value::String(output))
}

/// Returns the given value as a string.
pub fn string(value: &Value, _: &[Value]) -> Result<Value> {
    Ok(Value::String(value.render().into_owned()))
}
