//! Triplet attribute values
//!
//! Edge metadata attached to knowledge-graph triplets. Attributes are kept in
//! a sorted map so a triplet always renders to the same text.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Ordered attribute collection
pub type Attributes = BTreeMap<String, AttributeValue>;

/// A scalar attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// UTF-8 string
    Text(String),

    /// 64-bit signed integer
    Integer(i64),

    /// 64-bit floating point
    Float(f64),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Convert a JSON scalar. Arrays, objects and null have no attribute form.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(AttributeValue::Text(s.clone())),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(AttributeValue::Integer)
                .or_else(|| n.as_f64().map(AttributeValue::Float)),
            serde_json::Value::Bool(b) => Some(AttributeValue::Text(b.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Text(s) => f.write_str(s),
            AttributeValue::Integer(i) => write!(f, "{}", i),
            AttributeValue::Float(v) => write!(f, "{}", v),
        }
    }
}

// Convenience From implementations
impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Integer(v)
    }
}

impl From<i32> for AttributeValue {
    fn from(v: i32) -> Self {
        AttributeValue::Integer(v as i64)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Text(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display() {
        assert_eq!(AttributeValue::from("2019-2021").to_string(), "2019-2021");
        assert_eq!(AttributeValue::from(1924).to_string(), "1924");
        assert_eq!(AttributeValue::from(16.5).to_string(), "16.5");
    }

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(AttributeValue::from_json(&json!(2006)), Some(AttributeValue::Integer(2006)));
        assert_eq!(AttributeValue::from_json(&json!(0.25)), Some(AttributeValue::Float(0.25)));
        assert_eq!(
            AttributeValue::from_json(&json!("high")),
            Some(AttributeValue::Text("high".to_string()))
        );
        assert_eq!(AttributeValue::from_json(&json!(null)), None);
        assert_eq!(AttributeValue::from_json(&json!([1, 2])), None);
    }

    #[test]
    fn test_float_accessor_widens_integers() {
        assert_eq!(AttributeValue::Integer(3).as_float(), Some(3.0));
        assert_eq!(AttributeValue::Text("x".into()).as_float(), None);
    }
}
