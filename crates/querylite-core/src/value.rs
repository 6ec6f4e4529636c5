//! Scalar values flowing through tables and expressions.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A typed scalar held in a table cell or produced by an expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit float
    Float(f64),
    /// UTF-8 text
    String(String),
    /// `true` or `false`
    Boolean(bool),
    /// Missing value
    Null,
}

impl Value {
    /// Name of the value's type, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Null => "null",
        }
    }

    /// Whether the value is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether the value is an integer or a float
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// Numeric view of the value, widening integers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Tagged byte encoding; equal values of the same type encode identically.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Value::Integer(i) => {
                let mut out = vec![1];
                out.extend_from_slice(&i.to_le_bytes());
                out
            }
            Value::Float(f) => {
                let mut out = vec![2];
                out.extend_from_slice(&f.to_bits().to_le_bytes());
                out
            }
            Value::String(s) => {
                let mut out = vec![3];
                out.extend_from_slice(&(s.len() as u64).to_le_bytes());
                out.extend_from_slice(s.as_bytes());
                out
            }
            Value::Boolean(b) => vec![4, u8::from(*b)],
            Value::Null => vec![0],
        }
    }

    /// Orders two values of the same family.
    ///
    /// Returns `Ok(None)` when either side is null, and a type error when the
    /// values belong to different families (e.g. string vs number).
    pub fn compare(&self, other: &Value) -> Result<Option<Ordering>> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => Ok(None),
            (Value::Integer(a), Value::Integer(b)) => Ok(Some(a.cmp(b))),
            (Value::String(a), Value::String(b)) => Ok(Some(a.cmp(b))),
            (Value::Boolean(a), Value::Boolean(b)) => Ok(Some(a.cmp(b))),
            (a, b) if a.is_numeric() && b.is_numeric() => {
                let (x, y) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
                Ok(Some(x.partial_cmp(&y).unwrap_or(Ordering::Equal)))
            }
            (a, b) => Err(Error::TypeMismatch(format!(
                "cannot compare {} with {}",
                a.type_name(),
                b.type_name()
            ))),
        }
    }

    /// Structural equality across compatible families.
    ///
    /// Integers and floats compare numerically, null equals only null, and
    /// anything else of a different family is a type error.
    pub fn equals(&self, other: &Value) -> Result<bool> {
        match (self, other) {
            (Value::Null, Value::Null) => Ok(true),
            (Value::Null, _) | (_, Value::Null) => Ok(false),
            _ => Ok(self.compare(other)? == Some(Ordering::Equal)),
        }
    }

    /// Ordering used for sorting, where null sorts before everything else.
    pub fn sort_cmp(&self, other: &Value) -> Result<Ordering> {
        match (self.is_null(), other.is_null()) {
            (true, true) => Ok(Ordering::Equal),
            (true, false) => Ok(Ordering::Less),
            (false, true) => Ok(Ordering::Greater),
            (false, false) => Ok(self.compare(other)?.unwrap_or(Ordering::Equal)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "NULL"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_compare_widens() {
        assert_eq!(
            Value::Integer(2).compare(&Value::Float(2.5)).unwrap(),
            Some(Ordering::Less)
        );
        assert!(Value::Integer(1).equals(&Value::Float(1.0)).unwrap());
    }

    #[test]
    fn test_cross_family_compare_fails() {
        let err = Value::String("a".into()).compare(&Value::Integer(1)).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(_)));
    }

    #[test]
    fn test_null_handling() {
        assert_eq!(Value::Null.compare(&Value::Integer(1)).unwrap(), None);
        assert!(Value::Null.equals(&Value::Null).unwrap());
        assert!(!Value::Null.equals(&Value::Integer(0)).unwrap());
        assert_eq!(
            Value::Null.sort_cmp(&Value::String("a".into())).unwrap(),
            Ordering::Less
        );
    }

    #[test]
    fn test_to_bytes_distinguishes_types() {
        assert_ne!(Value::Integer(1).to_bytes(), Value::Boolean(true).to_bytes());
        assert_ne!(
            Value::String("ab".into()).to_bytes(),
            Value::String("a".into()).to_bytes()
        );
    }
}
