//! Attribute values

use serde::{Deserialize, Serialize};

/// Value of an element attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Fixed- or variable-length numeric tuple (pos, quat, rgba, qpos, ...)
    Vector(Vec<f64>),
}

impl AttrValue {
    /// Human-readable kind, used in type errors
    pub fn kind(&self) -> &'static str {
        match self {
            AttrValue::Bool(_) => "bool",
            AttrValue::Int(_) => "int",
            AttrValue::Float(_) => "float",
            AttrValue::Text(_) => "text",
            AttrValue::Vector(_) => "vector",
        }
    }

    /// Numeric scalar (integers widen to float)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            AttrValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Numeric tuple; a scalar reads as a one-element tuple
    pub fn as_vector(&self) -> Option<Vec<f64>> {
        match self {
            AttrValue::Vector(v) => Some(v.clone()),
            AttrValue::Float(_) | AttrValue::Int(_) => self.as_f64().map(|v| vec![v]),
            _ => None,
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Int(value.into())
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        AttrValue::Int(value.into())
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(value: Vec<f64>) -> Self {
        AttrValue::Vector(value)
    }
}

impl From<&[f64]> for AttrValue {
    fn from(value: &[f64]) -> Self {
        AttrValue::Vector(value.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for AttrValue {
    fn from(value: [f64; N]) -> Self {
        AttrValue::Vector(value.to_vec())
    }
}

impl From<glam::DVec3> for AttrValue {
    fn from(value: glam::DVec3) -> Self {
        AttrValue::Vector(value.to_array().to_vec())
    }
}
