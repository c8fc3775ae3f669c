use crate::{core::value::Value, execution::errors::ParamError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A caller-supplied runtime parameter.
///
/// JSON arrays become [`ParamValue::List`] and JSON objects become
/// [`ParamValue::Range`] built from their `min` / `max` keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum ParamValue {
    String(String),
    Number(serde_json::Number),
    Bool(bool),
    Null,
    List(Vec<ParamValue>),
    Range {
        min: Option<Box<ParamValue>>,
        max: Option<Box<ParamValue>>,
    },
}

impl ParamValue {
    pub fn range(min: Option<ParamValue>, max: Option<ParamValue>) -> Self {
        ParamValue::Range {
            min: min.map(Box::new),
            max: max.map(Box::new),
        }
    }

    /// Text form of a scalar, as it is bound into a compiled condition.
    ///
    /// `Null`, lists and ranges have no scalar text.
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            ParamValue::String(s) => Some(s.clone()),
            ParamValue::Number(n) => Some(n.to_string()),
            ParamValue::Bool(b) => Some(b.to_string()),
            ParamValue::Null | ParamValue::List(_) | ParamValue::Range { .. } => None,
        }
    }

    /// Text form used for any non-null parameter; lists and ranges render as JSON.
    pub fn text(&self) -> Option<String> {
        match self {
            ParamValue::Null => None,
            ParamValue::List(_) | ParamValue::Range { .. } => Some(self.to_json().to_string()),
            scalar => scalar.scalar_text(),
        }
    }

    /// Numeric params truncated to an integer, the way paging overrides read them.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            _ => None,
        }
    }

    /// Converts into a driver value, keeping the scalar type.
    pub fn to_value(&self) -> Value {
        match self {
            ParamValue::String(s) => Value::String(s.clone()),
            ParamValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Uint(u)
                } else {
                    n.as_f64().map_or(Value::Null, Value::Float)
                }
            }
            ParamValue::Bool(b) => Value::Boolean(*b),
            ParamValue::Null => Value::Null,
            ParamValue::List(_) | ParamValue::Range { .. } => Value::Json(self.to_json()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            ParamValue::String(s) => J::String(s.clone()),
            ParamValue::Number(n) => J::Number(n.clone()),
            ParamValue::Bool(b) => J::Bool(*b),
            ParamValue::Null => J::Null,
            ParamValue::List(items) => J::Array(items.iter().map(ParamValue::to_json).collect()),
            ParamValue::Range { min, max } => {
                let mut obj = serde_json::Map::new();
                if let Some(min) = min {
                    obj.insert("min".into(), min.to_json());
                }
                if let Some(max) = max {
                    obj.insert("max".into(), max.to_json());
                }
                J::Object(obj)
            }
        }
    }
}

impl From<serde_json::Value> for ParamValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as J;
        match value {
            J::String(s) => ParamValue::String(s),
            J::Number(n) => ParamValue::Number(n),
            J::Bool(b) => ParamValue::Bool(b),
            J::Null => ParamValue::Null,
            J::Array(items) => ParamValue::List(items.into_iter().map(ParamValue::from).collect()),
            J::Object(mut obj) => ParamValue::range(
                obj.remove("min").map(ParamValue::from),
                obj.remove("max").map(ParamValue::from),
            ),
        }
    }
}

impl From<ParamValue> for serde_json::Value {
    fn from(value: ParamValue) -> Self {
        value.to_json()
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_string())
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Number(v.into())
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Number(v.into())
    }
}

/// Runtime parameters keyed by name. Read-only during compilation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON object such as `{"status": "active", "age": {"min": 20}}`.
    pub fn from_json(text: &str) -> Result<Self, ParamError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        match value {
            serde_json::Value::Object(obj) => Ok(Params(
                obj.into_iter()
                    .map(|(k, v)| (k, ParamValue::from(v)))
                    .collect(),
            )),
            serde_json::Value::Null => Ok(Params::new()),
            other => Err(ParamError::NotAnObject(other.to_string())),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }
}

impl FromIterator<(String, ParamValue)> for Params {
    fn from_iter<T: IntoIterator<Item = (String, ParamValue)>>(iter: T) -> Self {
        Params(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_shapes_map_to_variants() {
        let params = Params::from_json(
            r#"{"status":"active","ids":[1,2],"age":{"min":20,"max":35},"limit":20.0,"gone":null}"#,
        )
        .unwrap();

        assert_eq!(params.get("status"), Some(&ParamValue::from("active")));
        assert_eq!(
            params.get("ids"),
            Some(&ParamValue::List(vec![ParamValue::from(1), ParamValue::from(2)]))
        );
        assert_eq!(
            params.get("age"),
            Some(&ParamValue::range(Some(20.into()), Some(35.into())))
        );
        assert_eq!(params.get("limit").and_then(ParamValue::as_i64), Some(20));
        assert_eq!(params.get("gone"), Some(&ParamValue::Null));
    }

    #[test]
    fn test_range_with_one_bound() {
        let p = ParamValue::from(json!({"max": "2024-12-31"}));
        assert_eq!(p, ParamValue::range(None, Some("2024-12-31".into())));
        assert_eq!(p.to_json(), json!({"max": "2024-12-31"}));
    }

    #[test]
    fn test_scalar_text_and_value() {
        assert_eq!(ParamValue::from(20).scalar_text().as_deref(), Some("20"));
        assert_eq!(ParamValue::Bool(true).scalar_text().as_deref(), Some("true"));
        assert_eq!(ParamValue::Null.scalar_text(), None);
        assert_eq!(ParamValue::from(5).to_value(), Value::Int(5));
        assert_eq!(
            ParamValue::from(json!(1.5)).to_value(),
            Value::Float(1.5)
        );
    }

    #[test]
    fn test_non_object_params_rejected() {
        assert!(matches!(
            Params::from_json("[1,2]"),
            Err(ParamError::NotAnObject(_))
        ));
        assert!(Params::from_json("null").unwrap().is_empty());
        assert!(matches!(Params::from_json("{"), Err(ParamError::Json(_))));
    }
}
