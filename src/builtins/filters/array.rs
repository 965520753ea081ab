/// Filters operating on array
use std::cmp::Ordering;
use std::mem::discriminant;

use crate::context::{dotted_pointer, ValueRender};
use crate::errors::{Error, Result};
use serde_json::value::Value;

/// Returns the number of items in an array or an object, or the number of characters in a string
pub fn length(value: &Value, _: &[Value]) -> Result<Value> {
    match value {
        Value::Array(arr) => Ok(Value::from(arr.len())),
        Value::Object(map) => Ok(Value::from(map.len())),
        Value::String(s) => Ok(Value::from(s.chars().count())),
        Value::Null => Ok(Value::from(0)),
        _ => Err(Error::msg(format!(
            "Filter `length` was used on a value that isn't an array, an object or a string: `{}`",
            value
        ))),
    }
}

/// Returns the first value of an array
/// If the array is empty, returns null
pub fn first(value: &Value, _: &[Value]) -> Result<Value> {
    let arr = try_get_value!("first", "value", Vec<Value>, value);

    Ok(arr.into_iter().next().unwrap_or(Value::Null))
}

/// Returns the last value of an array
/// If the array is empty, returns null
pub fn last(value: &Value, _: &[Value]) -> Result<Value> {
    let mut arr = try_get_value!("last", "value", Vec<Value>, value);

    Ok(arr.pop().unwrap_or(Value::Null))
}

/// Joins all values in the array by the separator given, `""` if there is none
pub fn join(value: &Value, args: &[Value]) -> Result<Value> {
    let arr = try_get_value!("join", "value", Vec<Value>, value);
    let sep = try_get_arg!("join", "separator", String, args, 0).unwrap_or_default();

    let rendered = arr.iter().map(|v| v.render().into_owned()).collect::<Vec<_>>();
    Ok(Value::String(rendered.join(&sep)))
}

/// Returns a reversed array, or a reversed string
pub fn reverse(value: &Value, _: &[Value]) -> Result<Value> {
    match value {
        Value::Array(arr) => Ok(Value::Array(arr.iter().rev().cloned().collect())),
        Value::String(s) => Ok(Value::String(s.chars().rev().collect())),
        _ => Err(Error::msg(format!(
            "Filter `reverse` received an incorrect type for arg `value`: got `{}` but expected Array|String",
            value
        ))),
    }
}

fn compare_keys(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or(0.0);
            let b = b.as_f64().unwrap_or(0.0);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

/// Sorts the array in ascending order.
/// The optional argument is a dotted path to the field to sort by.
pub fn sort(value: &Value, args: &[Value]) -> Result<Value> {
    let arr = try_get_value!("sort", "value", Vec<Value>, value);
    if arr.is_empty() {
        return Ok(Value::Array(arr));
    }

    let attribute = try_get_arg!("sort", "attribute", String, args, 0).unwrap_or_default();

    let mut keyed = Vec::with_capacity(arr.len());
    for v in &arr {
        let key = dotted_pointer(v, &attribute).ok_or_else(|| {
            Error::msg(format!("attribute '{}' does not reference a field", attribute))
        })?;
        keyed.push((key.clone(), v.clone()));
    }

    let disc = discriminant(&keyed[0].0);
    match keyed[0].0 {
        Value::Number(_) | Value::String(_) | Value::Bool(_) => (),
        ref other => {
            return Err(Error::msg(format!(
                "Filter `sort` can only sort numbers, strings or booleans, got `{}`",
                other
            )))
        }
    }
    if keyed.iter().any(|(key, _)| discriminant(key) != disc) {
        return Err(Error::msg("Filter `sort` can't compare multiple types"));
    }

    keyed.sort_by(|a, b| compare_keys(&a.0, &b.0));
    Ok(Value::Array(keyed.into_iter().map(|(_, v)| v).collect()))
}

/// Remove duplicates from an array, keeping the first occurrence.
pub fn unique(value: &Value, _: &[Value]) -> Result<Value> {
    let arr = try_get_value!("unique", "value", Vec<Value>, value);

    let mut seen: Vec<Value> = Vec::with_capacity(arr.len());
    for v in arr {
        if !seen.contains(&v) {
            seen.push(v);
        }
    }
    Ok(Value::Array(seen))
}

#[inline]
fn get_index(i: i64, len: usize) -> usize {
    if i >= 0 {
        (i as usize).min(len)
    } else {
        len.saturating_sub(i.unsigned_abs() as usize)
    }
}

/// Slice the array
/// The first argument is where to start (inclusive, default to `0`)
/// and the second where to stop (exclusive, default to the length of the array).
/// Negative indices count from the end.
pub fn slice(value: &Value, args: &[Value]) -> Result<Value> {
    let arr = try_get_value!("slice", "value", Vec<Value>, value);
    if arr.is_empty() {
        return Ok(Value::Array(arr));
    }

    let start = get_index(try_get_arg!("slice", "start", i64, args, 0).unwrap_or(0), arr.len());
    let end = match try_get_arg!("slice", "end", i64, args, 1) {
        Some(end) => get_index(end, arr.len()),
        None => arr.len(),
    };

    if start >= end {
        return Ok(Value::Array(Vec::new()));
    }
    Ok(Value::Array(arr[start..end].to_vec()))
}

/// Returns the keys of an object, in the object's order
pub fn keys(value: &Value, _: &[Value]) -> Result<Value> {
    match value {
        Value::Object(map) => Ok(Value::Array(map.keys().cloned().map(Value::String).collect())),
        _ => Err(Error::msg(format!(
            "Filter `keys` was used on a value that isn't an object: `{}`",
            value
        ))),
    }
}

/// Returns the values of an object, in the object's order
pub fn values(value: &Value, _: &[Value]) -> Result<Value> {
    match value {
        Value::Object(map) => Ok(Value::Array(map.values().cloned().collect())),
        _ => Err(Error::msg(format!(
            "Filter `values` was used on a value that isn't an object: `{}`",
            value
        ))),
    }
}
