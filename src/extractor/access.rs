//! Tolerant access into loosely structured JSON
//!
//! The page payload changes shape without notice. Every lookup here returns
//! `None` for a missing key, a wrong container type, an out-of-range index or
//! a `null`, so one absent field never stops the others from being read.

use serde_json::{Map, Value};

/// Type check applied to a projected value
pub trait Expected<'a>: Sized {
    fn expect(value: &'a Value) -> Option<Self>;
}

impl<'a> Expected<'a> for &'a Value {
    fn expect(value: &'a Value) -> Option<Self> {
        Some(value)
    }
}

impl<'a> Expected<'a> for &'a Map<String, Value> {
    fn expect(value: &'a Value) -> Option<Self> {
        value.as_object()
    }
}

impl<'a> Expected<'a> for &'a Vec<Value> {
    fn expect(value: &'a Value) -> Option<Self> {
        value.as_array()
    }
}

impl<'a> Expected<'a> for &'a str {
    fn expect(value: &'a Value) -> Option<Self> {
        value.as_str()
    }
}

impl<'a> Expected<'a> for String {
    fn expect(value: &'a Value) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
}

/// Strict integer: numeric strings and floats are rejected
impl<'a> Expected<'a> for i64 {
    fn expect(value: &'a Value) -> Option<Self> {
        value.as_i64()
    }
}

/// Resolve one JSON pointer (`/a/b/0`), treating `null` as absent
pub fn project<'a>(src: &'a Value, pointer: &str) -> Option<&'a Value> {
    src.pointer(pointer).filter(|v| !v.is_null())
}

/// Return the first pointer whose value exists and passes the type check
pub fn try_get<'a, T: Expected<'a>>(src: &'a Value, pointers: &[&str]) -> Option<T> {
    pointers
        .iter()
        .filter_map(|pointer| project(src, pointer))
        .find_map(T::expect)
}

/// Like [`try_get`] but with arbitrary getter functions
pub fn try_get_with<'a, T>(
    src: &'a Value,
    getters: &[&dyn Fn(&'a Value) -> Option<T>],
) -> Option<T> {
    getters.iter().find_map(|get| get(src))
}

/// Like [`try_get`] with a fallback value
pub fn try_get_or<'a, T: Expected<'a>>(src: &'a Value, pointers: &[&str], default: T) -> T {
    try_get(src, pointers).unwrap_or(default)
}

/// Render a scalar as text; `null` and absent values stay absent
pub fn str_or_none(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        other => Some(other.to_string()),
    }
}

/// Coerce a scalar to an integer
///
/// Accepts integers, floats (truncated) and numeric strings. Empty strings,
/// non-numeric text and containers yield `None`.
pub fn int_or_none(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<i64>().ok()
            }
        }
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

/// Collect the string members of an array, skipping anything else
pub fn string_list(value: Option<&Vec<Value>>) -> Option<Vec<String>> {
    value.map(|items| {
        items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_owned))
            .collect()
    })
}
