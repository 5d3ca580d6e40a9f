//! Attribute value definitions.
//!
//! `Value` is what a feature attribute or a filter literal holds.

use crate::crs::Crs;
use crate::geometry::{Envelope, Geometry};
use crate::types::DataType;
use alloc::string::String;
use core::cmp::Ordering;

/// A value stored in a feature attribute or used as a filter literal.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit floating point
    Float64(f64),
    /// UTF-8 string
    String(String),
    /// Geometry value
    Geometry(Geometry),
    /// Envelope literal
    Envelope(Envelope),
}

impl Value {
    /// Returns the data type of this value, or None if it's Null.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Int64(_) => Some(DataType::Int64),
            Value::Float64(_) => Some(DataType::Float64),
            Value::String(_) => Some(DataType::String),
            Value::Geometry(_) => Some(DataType::Geometry),
            Value::Envelope(_) => Some(DataType::Envelope),
        }
    }

    /// Returns true if this value is Null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for geometries and envelopes.
    #[inline]
    pub fn is_spatial(&self) -> bool {
        matches!(self, Value::Geometry(_) | Value::Envelope(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the numeric value as f64, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(v) => Some(*v),
            Value::Int64(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_geometry(&self) -> Option<&Geometry> {
        match self {
            Value::Geometry(g) => Some(g),
            _ => None,
        }
    }

    /// Returns the bounding envelope of a spatial value.
    pub fn envelope(&self) -> Option<Envelope> {
        match self {
            Value::Geometry(g) => g.envelope(),
            Value::Envelope(e) => Some(e.clone()),
            _ => None,
        }
    }

    /// Returns the reference system tag of a spatial value.
    pub fn crs(&self) -> Option<&Crs> {
        match self {
            Value::Geometry(g) => g.crs(),
            Value::Envelope(e) => e.crs(),
            _ => None,
        }
    }

    /// Compares two values of compatible types.
    ///
    /// Integers and floats compare numerically. Nulls, spatial values and
    /// mismatched types are unordered.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => None,
            },
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Geometry> for Value {
    fn from(v: Geometry) -> Self {
        Value::Geometry(v)
    }
}

impl From<Envelope> for Value {
    fn from(v: Envelope) -> Self {
        Value::Envelope(v)
    }
}
