//! Cell value conversion.
//!
//! A data cell is an arbitrary string; the server stores attribute values as
//! JSON objects with a top-level `value` key. The converter inspects the
//! string and produces the best-typed value it can, falling back to a plain
//! string whenever a more specific parse fails. For example the cell
//! `[0,1], [2,3]` holds two separate values and cannot be parsed as one
//! array, so it is kept as the string `"[0,1], [2,3]"`.

use serde_json::{json, Map, Value};
use thiserror::Error;

/// A typed cell value; the closed set of shapes the converter can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Object(Map<String, Value>),
    Array(Vec<Value>),
}

impl CellValue {
    /// The bare JSON value.
    pub fn json_value(&self) -> Value {
        match self {
            CellValue::Int(v) => json!(v),
            CellValue::Float(v) => json!(v),
            CellValue::Bool(v) => json!(v),
            CellValue::Str(v) => json!(v),
            CellValue::Object(v) => Value::Object(v.clone()),
            CellValue::Array(v) => Value::Array(v.clone()),
        }
    }

    /// The `{"value": ...}` envelope stored on the server.
    pub fn envelope(&self) -> Value {
        json!({ "value": self.json_value() })
    }
}

/// The cell could not be represented as JSON at all.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConvertError(pub String);

/// Convert a trimmed, non-blank cell string into a typed value.
///
/// The cascade tries object, array, float (a string containing exactly one
/// `.`), 64-bit int, bool, then string. Failed intermediate parses fall back
/// to the string case rather than erroring; only a cell whose raw text cannot
/// be embedded in a JSON document (unescaped quotes, control characters)
/// produces a [`ConvertError`].
pub fn convert(cell: &str) -> Result<CellValue, ConvertError> {
    if cell.starts_with('{') && cell.ends_with('}') {
        return match serde_json::from_str::<Value>(cell) {
            Ok(Value::Object(map)) => Ok(CellValue::Object(map)),
            _ => as_string(cell),
        };
    }
    if cell.starts_with('[') && cell.ends_with(']') {
        return match serde_json::from_str::<Value>(cell) {
            Ok(Value::Array(items)) => Ok(CellValue::Array(items)),
            _ => as_string(cell),
        };
    }
    if cell.matches('.').count() == 1 {
        return match cell.parse::<f64>() {
            Ok(v) => Ok(CellValue::Float(v)),
            Err(_) => as_string(cell),
        };
    }
    if let Ok(v) = cell.parse::<i64>() {
        return Ok(CellValue::Int(v));
    }
    if let Some(v) = parse_bool(cell) {
        return Ok(CellValue::Bool(v));
    }
    as_string(cell)
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell.to_lowercase().as_str() {
        "1" | "t" | "true" => Some(true),
        "0" | "f" | "false" => Some(false),
        _ => None,
    }
}

/// Last-resort string wrapping. The raw cell is embedded in a JSON document
/// and parsed back, so a cell the server could never store surfaces here.
fn as_string(cell: &str) -> Result<CellValue, ConvertError> {
    let doc = format!("{{\"value\": \"{}\"}}", cell);
    match serde_json::from_str::<Value>(&doc) {
        Ok(_) => Ok(CellValue::Str(cell.to_string())),
        Err(e) => Err(ConvertError(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int() {
        assert_eq!(convert("42").unwrap(), CellValue::Int(42));
        assert_eq!(convert("-7").unwrap(), CellValue::Int(-7));
    }

    #[test]
    fn test_float() {
        assert_eq!(convert("3.14").unwrap(), CellValue::Float(3.14));
        assert_eq!(convert("-0.5").unwrap(), CellValue::Float(-0.5));
        assert_eq!(convert(".5").unwrap(), CellValue::Float(0.5));
    }

    #[test]
    fn test_bool() {
        assert_eq!(convert("true").unwrap(), CellValue::Bool(true));
        assert_eq!(convert("FALSE").unwrap(), CellValue::Bool(false));
        assert_eq!(convert("t").unwrap(), CellValue::Bool(true));
        assert_eq!(convert("f").unwrap(), CellValue::Bool(false));
    }

    #[test]
    fn test_one_and_zero_are_ints_not_bools() {
        assert_eq!(convert("1").unwrap(), CellValue::Int(1));
        assert_eq!(convert("0").unwrap(), CellValue::Int(0));
    }

    #[test]
    fn test_array() {
        assert_eq!(
            convert("[1,2]").unwrap(),
            CellValue::Array(vec![json!(1), json!(2)])
        );
    }

    #[test]
    fn test_object() {
        let value = convert(r#"{"a":1}"#).unwrap();
        assert_eq!(value.envelope(), json!({"value": {"a": 1}}));
    }

    #[test]
    fn test_string() {
        assert_eq!(convert("hello").unwrap(), CellValue::Str("hello".into()));
        assert_eq!(convert("mg 20").unwrap(), CellValue::Str("mg 20".into()));
    }

    #[test]
    fn test_malformed_object_falls_back_to_string() {
        assert_eq!(
            convert("{not json}").unwrap(),
            CellValue::Str("{not json}".into())
        );
    }

    #[test]
    fn test_multiple_arrays_fall_back_to_string() {
        assert_eq!(
            convert("[0,1], [2,3]").unwrap(),
            CellValue::Str("[0,1], [2,3]".into())
        );
    }

    #[test]
    fn test_two_dots_is_not_a_float() {
        assert_eq!(convert("1.2.3").unwrap(), CellValue::Str("1.2.3".into()));
    }

    #[test]
    fn test_scientific_notation_without_dot_is_a_string() {
        assert_eq!(convert("1e3").unwrap(), CellValue::Str("1e3".into()));
    }

    #[test]
    fn test_unescaped_quote_is_a_conversion_error() {
        assert!(convert("say \"hi\"").is_err());
    }

    #[test]
    fn test_envelope_shapes() {
        assert_eq!(convert("42").unwrap().envelope(), json!({"value": 42}));
        assert_eq!(convert("3.14").unwrap().envelope(), json!({"value": 3.14}));
        assert_eq!(convert("true").unwrap().envelope(), json!({"value": true}));
        assert_eq!(convert("[1,2]").unwrap().envelope(), json!({"value": [1, 2]}));
        assert_eq!(
            convert("hello").unwrap().envelope(),
            json!({"value": "hello"})
        );
    }

    #[test]
    fn test_round_trip_through_stringified_forms() {
        // stringify -> convert returns the original typed value
        assert_eq!(convert(&42.to_string()).unwrap(), CellValue::Int(42));
        assert_eq!(convert(&3.25f64.to_string()).unwrap(), CellValue::Float(3.25));
        assert_eq!(convert(&true.to_string()).unwrap(), CellValue::Bool(true));
        let arr = json!([1, "two", 3.0]);
        assert_eq!(
            convert(&arr.to_string()).unwrap().json_value(),
            json!([1, "two", 3.0])
        );
        let obj = json!({"edge": 1, "angle": 2});
        assert_eq!(convert(&obj.to_string()).unwrap().json_value(), obj);
    }
}
