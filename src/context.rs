use std::borrow::Cow;

use serde::ser::Serialize;
use serde_json::value::{to_value, Map, Value};

use crate::errors::{Error, Result as TemplateResult};

/// The struct that holds the data given to a template on render
///
/// Keys are iterated in sorted order unless the `preserve_order` feature is enabled.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Context {
    data: Map<String, Value>,
}

impl Context {
    /// Initializes an empty context
    pub fn new() -> Self {
        Context { data: Map::new() }
    }

    /// Converts the `val` parameter to `Value` and insert it into the context.
    ///
    /// Panics if the serialization fails.
    ///
    /// ```rust
    /// # use stencil::Context;
    /// let mut context = Context::new();
    /// context.insert("number_users", &42);
    /// ```
    pub fn insert<T: Serialize + ?Sized, S: Into<String>>(&mut self, key: S, val: &T) {
        self.data.insert(key.into(), to_value(val).unwrap());
    }

    /// Converts the `val` parameter to `Value` and insert it into the context.
    ///
    /// Returns an error if the serialization fails.
    pub fn try_insert<T: Serialize + ?Sized, S: Into<String>>(
        &mut self,
        key: S,
        val: &T,
    ) -> TemplateResult<()> {
        self.data.insert(key.into(), to_value(val)?);

        Ok(())
    }

    /// Appends the data of the `source` parameter to `self`, overwriting existing keys.
    pub fn extend(&mut self, mut source: Context) {
        self.data.append(&mut source.data);
    }

    /// Converts the context to a `serde_json::Value` consuming the context.
    pub fn into_json(self) -> Value {
        Value::Object(self.data)
    }

    /// Borrows the underlying map of the context
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Takes a serde-json `Value` and convert it into a `Context` with no overhead/cloning.
    pub fn from_value(obj: Value) -> TemplateResult<Self> {
        match obj {
            Value::Object(data) => Ok(Context { data }),
            _ => Err(Error::msg(
                "Creating a Context from a Value/Serialize requires it being a JSON object",
            )),
        }
    }

    /// Takes something that impl Serialize and create a context with it.
    /// Meant to be used if you have a hashmap or a struct and don't want to insert values
    /// one by one in the context.
    pub fn from_serialize(value: impl Serialize) -> TemplateResult<Self> {
        let obj = to_value(value).map_err(Error::json)?;
        Context::from_value(obj)
    }

    /// Returns the value at a given key index.
    pub fn get(&self, index: &str) -> Option<&Value> {
        self.data.get(index)
    }

    /// Remove a key from the context, returning the value at the key if the key was previously inserted into the context.
    pub fn remove(&mut self, index: &str) -> Option<Value> {
        self.data.remove(index)
    }

    /// Checks if a value exists at a specific index.
    pub fn contains_key(&self, index: &str) -> bool {
        self.data.contains_key(index)
    }
}

/// Converts a value to the text written in a template
pub trait ValueRender {
    fn render(&self) -> Cow<'_, str>;
}

impl ValueRender for Value {
    fn render(&self) -> Cow<'_, str> {
        match *self {
            Value::String(ref s) => Cow::Borrowed(s),
            Value::Number(ref i) => {
                if let Some(v) = i.as_i64() {
                    Cow::Owned(v.to_string())
                } else if let Some(v) = i.as_u64() {
                    Cow::Owned(v.to_string())
                } else if let Some(v) = i.as_f64() {
                    Cow::Owned(v.to_string())
                } else {
                    unreachable!()
                }
            }
            Value::Bool(i) => Cow::Owned(i.to_string()),
            Value::Null => Cow::Borrowed(""),
            Value::Array(ref a) => {
                let mut buf = String::new();
                buf.push('[');
                for (i, item) in a.iter().enumerate() {
                    if i > 0 {
                        buf.push_str(", ");
                    }
                    buf.push_str(item.render().as_ref());
                }
                buf.push(']');
                Cow::Owned(buf)
            }
            Value::Object(_) => Cow::Borrowed("[object]"),
        }
    }
}

/// Converts a value to a f64 if it is a number or a string holding one
pub trait ValueNumber {
    fn to_number(&self) -> Option<f64>;
}

impl ValueNumber for Value {
    fn to_number(&self) -> Option<f64> {
        match *self {
            Value::Number(ref n) => n.as_f64(),
            Value::String(ref s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

/// Whether a value is considered true in a condition
pub trait ValueTruthy {
    fn is_truthy(&self) -> bool;
}

impl ValueTruthy for Value {
    fn is_truthy(&self) -> bool {
        match *self {
            Value::Number(ref i) => {
                if let Some(v) = i.as_i64() {
                    return v != 0;
                }
                if let Some(v) = i.as_u64() {
                    return v != 0;
                }
                let f = i.as_f64().unwrap_or(0.0);
                f != 0.0 && !f.is_nan()
            }
            Value::Bool(ref i) => *i,
            Value::Null => false,
            Value::String(ref i) => !i.is_empty(),
            Value::Array(ref i) => !i.is_empty(),
            Value::Object(ref i) => !i.is_empty(),
        }
    }
}

/// Reads `key` out of a value: object field, array index, or the `length` of an array/string.
pub fn get_property<'a>(value: &'a Value, key: &str) -> Option<Cow<'a, Value>> {
    match value {
        Value::Object(map) => map.get(key).map(Cow::Borrowed),
        Value::Array(arr) => match key.parse::<usize>() {
            Ok(index) => arr.get(index).map(Cow::Borrowed),
            Err(_) if key == "length" => Some(Cow::Owned(Value::from(arr.len()))),
            Err(_) => None,
        },
        Value::String(s) if key == "length" => Some(Cow::Owned(Value::from(s.chars().count()))),
        _ => None,
    }
}

/// Lookups a dotted path in a json value
/// contrary to the json slash pointer it's not allowed to begin with a dot
#[inline]
pub fn dotted_pointer<'a>(value: &'a Value, pointer: &str) -> Option<&'a Value> {
    if pointer.is_empty() {
        return Some(value);
    }

    pointer.split('.').try_fold(value, |target, token| match target {
        Value::Object(map) => map.get(token),
        Value::Array(list) => token.parse::<usize>().ok().and_then(|i| list.get(i)),
        _ => None,
    })
}
