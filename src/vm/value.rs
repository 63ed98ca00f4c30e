//! Script values.
//!
//! A minimal dynamically typed value, used for frame locals and for the output-result slot a
//! dispatch writes into. Object values compare by instance identity, matching how the host VM
//! compares object references.

use std::sync::Arc;

use crate::vm::InstanceRc;

/// A dynamically typed script value
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// No value
    #[default]
    None,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// String
    Str(String),
    /// Reference to a spawned instance
    Object(InstanceRc),
}

impl Value {
    /// True for [`Value::None`]
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Returns the integer payload, if this is an [`Value::Int`]
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the instance payload, if this is an [`Value::Object`]
    #[must_use]
    pub fn as_object(&self) -> Option<&InstanceRc> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
