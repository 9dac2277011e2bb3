//! Leaf values and their declared types.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A leaf value in either tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// String value.
    String(String),
}

/// Declared type of a scalar attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    /// UTF-8 string.
    #[default]
    String,
    /// Boolean.
    Bool,
    /// 64-bit signed integer.
    Int,
    /// 32-bit signed integer on the backend side.
    Int32,
    /// Floating point number.
    Float,
}

impl Scalar {
    /// Creates a string scalar.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Renders the value the way key strategies and sort fields see it.
    #[must_use]
    pub fn key_string(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => s.clone(),
        }
    }

    /// Borrows the string payload, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true when the value has the declared type.
    ///
    /// Integers are accepted for float attributes.
    #[must_use]
    pub const fn matches(&self, scalar_type: ScalarType) -> bool {
        matches!(
            (self, scalar_type),
            (Self::String(_), ScalarType::String)
                | (Self::Bool(_), ScalarType::Bool)
                | (Self::Int(_), ScalarType::Int | ScalarType::Int32 | ScalarType::Float)
                | (Self::Float(_), ScalarType::Float)
        )
    }

    /// Name of the runtime type, used in diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }

    /// Equality that treats `Int(2)` and `Float(2.0)` as the same value.
    #[must_use]
    pub fn same_value(&self, other: &Self) -> bool {
        match (self.as_number(), other.as_number()) {
            (Some(x), Some(y)) => x.total_cmp(&y) == Ordering::Equal,
            _ => self == other,
        }
    }

    /// Total order used for sort fields: booleans, then numbers, then strings.
    #[must_use]
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => a.rank().cmp(&b.rank()),
            },
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Bool(_) => 0,
            Self::Int(_) | Self::Float(_) => 1,
            Self::String(_) => 2,
        }
    }

    /// Converts to a JSON value.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::String(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Reads a JSON leaf. Returns `None` for null, arrays and objects.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float)),
            serde_json::Value::String(s) => Some(Self::String(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "\"{s}\""),
            other => write!(f, "{}", other.key_string()),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Int32 => "int32",
            Self::Float => "float",
        };
        write!(f, "{name}")
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_yaml_defaults() {
        let values: Vec<Scalar> = serde_yaml::from_str("[true, 110, 1.5, latest]").unwrap();
        assert_eq!(
            values,
            vec![
                Scalar::Bool(true),
                Scalar::Int(110),
                Scalar::Float(1.5),
                Scalar::string("latest"),
            ]
        );
    }

    #[test]
    fn test_int_matches_float_but_not_string() {
        assert!(Scalar::Int(3).matches(ScalarType::Float));
        assert!(Scalar::Int(3).matches(ScalarType::Int32));
        assert!(!Scalar::Int(3).matches(ScalarType::String));
        assert!(!Scalar::string("3").matches(ScalarType::Int));
    }

    #[test]
    fn test_sort_cmp_orders_numbers_numerically() {
        assert_eq!(Scalar::Int(9).sort_cmp(&Scalar::Int(10)), Ordering::Less);
        assert_eq!(Scalar::Float(2.5).sort_cmp(&Scalar::Int(2)), Ordering::Greater);
        assert_eq!(Scalar::Bool(true).sort_cmp(&Scalar::string("a")), Ordering::Less);
    }

    #[test]
    fn test_same_value_across_number_kinds() {
        assert!(Scalar::Int(2).same_value(&Scalar::Float(2.0)));
        assert!(!Scalar::Int(2).same_value(&Scalar::Float(2.5)));
        assert!(!Scalar::string("2").same_value(&Scalar::Int(2)));
        assert!(Scalar::Bool(false).same_value(&Scalar::Bool(false)));
    }
}
