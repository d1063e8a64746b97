use serde::{Deserialize, Serialize};
use std::fmt;

/// Data type tag accepted by every field regardless of the value's shape.
pub const ANY_TYPE: &str = "any";

/// Runtime value held by a field instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Vector(Vec<f64>),
}

impl FieldValue {
    /// The data type tag this value satisfies.
    pub fn type_tag(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "boolean",
            FieldValue::Number(_) => "number",
            FieldValue::Text(_) => "string",
            FieldValue::Vector(_) => "vector",
        }
    }

    /// Whether this value may be stored in a field declared with `data_type`.
    pub fn conforms_to(&self, data_type: &str) -> bool {
        data_type == ANY_TYPE || self.type_tag() == data_type
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Text(s) => write!(f, "\"{}\"", s),
            FieldValue::Vector(v) => {
                write!(f, "[")?;
                for (i, n) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", n)?;
                }
                write!(f, "]")
            }
            FieldValue::Null => write!(f, "null"),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}
