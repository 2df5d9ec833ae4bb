// =============================================================================
//  Astra HTN - Tagged Values
//  File: value.rs
//
//  Description:
//      The opaque tagged union stored in fact triples, entity capabilities,
//      and todo arguments. Equality is value-equality within a tag; an Int
//      never equals a Float even when numerically identical.
//
//  Author:      Alex Roussinov
//  Created:     2026-07-10
//
//  License:
//      Dual licensed under the MIT and Apache 2.0 licenses.
//      See LICENSE-MIT and LICENSE-APACHE at the repository root for details.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// A fact value, argument, or capability value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Plain text.
    Str(String),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean flag.
    Bool(bool),
    /// Reference to another identifier (entity id, node name, ...).
    Ref(String),
    /// Ordered composite of values.
    Tuple(Vec<Value>),
    /// Explicitly absent value.
    Unset,
}

impl Value {
    /// Returns the contained string for `Str`, `None` otherwise.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the referenced identifier for `Ref`, `None` otherwise.
    pub fn as_ref_id(&self) -> Option<&str> {
        match self {
            Value::Ref(id) => Some(id),
            _ => None,
        }
    }

    /// Returns the contained integer for `Int`, `None` otherwise.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the contained float for `Float`, `None` otherwise.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the contained boolean for `Bool`, `None` otherwise.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the contained tuple for `Tuple`, `None` otherwise.
    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// True unless the value is `Unset`.
    pub fn is_set(&self) -> bool {
        !matches!(self, Value::Unset)
    }

    /// A capability counts as possessed when it is present and neither
    /// `Unset` nor `Bool(false)`.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Unset | Value::Bool(false))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Ref(id) => write!(f, "#{id}"),
            Value::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Value::Unset => write!(f, "unset"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Tuple(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_per_tag() {
        assert_eq!(Value::Int(3), Value::Int(3));
        assert_ne!(Value::Int(3), Value::Float(3.0));
        assert_ne!(Value::Str("3".into()), Value::Int(3));
        assert_ne!(Value::Str("x".into()), Value::Ref("x".into()));
        assert_eq!(Value::Unset, Value::Unset);
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Int(0).is_truthy());
        assert!(Value::Str(String::new()).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Unset.is_truthy());
    }

    #[test]
    fn test_display() {
        let tuple = Value::Tuple(vec![Value::Int(1), Value::Str("a".into())]);
        assert_eq!(tuple.to_string(), "(1, a)");
        assert_eq!(Value::Ref("boat".into()).to_string(), "#boat");
    }
}
