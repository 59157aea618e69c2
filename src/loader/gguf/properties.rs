//! Property extraction from GGUF metadata fields
//!
//! Every field becomes exactly one property. Strings are decoded as UTF-8,
//! scalars are widened into portable [`PropertyValue`]s and one level of
//! array is expanded into an ordered list. The first field that cannot be
//! converted aborts the extraction.

use super::field::ReaderField;
use super::value_type::{GgufValueType, RawScalar};
use crate::error::{GgufError, GgufResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Key of the schema marker present in every property mapping
pub const SCHEMA_KEY: &str = "schema";

/// Schema marker value identifying GGUF-sourced properties
pub const GGUF_SCHEMA: &str = "GGUF";

/// Property mapping of a dataset
pub type Properties = BTreeMap<String, PropertyValue>;

/// A portable metadata value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Array(Vec<PropertyValue>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer value as `u64`, for either signedness when non-negative
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            PropertyValue::UInt(v) => Some(v),
            PropertyValue::Int(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Integer value as `i64`, for either signedness when in range
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            PropertyValue::Int(v) => Some(v),
            PropertyValue::UInt(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            PropertyValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(v) => write!(f, "{}", v),
            PropertyValue::Int(v) => write!(f, "{}", v),
            PropertyValue::UInt(v) => write!(f, "{}", v),
            PropertyValue::Float(v) => write!(f, "{}", v),
            PropertyValue::String(v) => write!(f, "{:?}", v),
            PropertyValue::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

/// Conversion of native scalars into portable property values
///
/// Values that are already portable pass through unchanged.
pub trait SanitizeScalar {
    fn sanitize(self) -> PropertyValue;
}

impl SanitizeScalar for RawScalar {
    fn sanitize(self) -> PropertyValue {
        match self {
            RawScalar::U8(v) => PropertyValue::UInt(v.into()),
            RawScalar::U16(v) => PropertyValue::UInt(v.into()),
            RawScalar::U32(v) => PropertyValue::UInt(v.into()),
            RawScalar::U64(v) => PropertyValue::UInt(v),
            RawScalar::I8(v) => PropertyValue::Int(v.into()),
            RawScalar::I16(v) => PropertyValue::Int(v.into()),
            RawScalar::I32(v) => PropertyValue::Int(v.into()),
            RawScalar::I64(v) => PropertyValue::Int(v),
            RawScalar::F32(v) => PropertyValue::Float(v.into()),
            RawScalar::F64(v) => PropertyValue::Float(v),
            RawScalar::Bool(v) => PropertyValue::Bool(v),
        }
    }
}

impl SanitizeScalar for PropertyValue {
    fn sanitize(self) -> PropertyValue {
        self
    }
}

/// Normalize a scalar into a portable property value
pub fn sanitize_scalar<S: SanitizeScalar>(scalar: S) -> PropertyValue {
    scalar.sanitize()
}

/// Build the property mapping for `fields`
///
/// # Errors
///
/// - [`GgufError::InvalidFieldType`] for a single-tag field that is neither a
///   string nor a known scalar, or a multi-tag field that is not an array
/// - [`GgufError::UnsupportedArrayType`] for an array without exactly two tags
/// - [`GgufError::UnsupportedArrayElementType`] for arrays of other types
/// - [`GgufError::InvalidUtf8`] for undecodable strings
pub fn extract_properties(fields: &[ReaderField]) -> GgufResult<Properties> {
    let mut properties = Properties::new();
    properties.insert(SCHEMA_KEY.to_string(), GGUF_SCHEMA.into());

    for field in fields {
        let value = match field.types.as_slice() {
            [GgufValueType::String] => {
                let bytes = field.last_bytes().ok_or_else(|| invalid_field(field))?;
                PropertyValue::String(decode_utf8(bytes, &field.name)?)
            }
            [ty] if ty.is_scalar() => {
                let scalar = field.last_scalar().ok_or_else(|| invalid_field(field))?;
                sanitize_scalar(scalar)
            }
            [_] => return Err(invalid_field(field)),
            [GgufValueType::Array, ..] => load_array(field)?,
            _ => return Err(invalid_field(field)),
        };
        properties.insert(field.name.clone(), value);
    }

    Ok(properties)
}

fn load_array(field: &ReaderField) -> GgufResult<PropertyValue> {
    let element_type = match field.types.as_slice() {
        [_, element_type] => *element_type,
        _ => {
            return Err(GgufError::UnsupportedArrayType {
                types: field.types.clone(),
            })
        }
    };

    let items = if element_type == GgufValueType::String {
        field
            .data
            .iter()
            .map(|&i| {
                let bytes = field
                    .part(i)
                    .and_then(|p| p.bytes())
                    .ok_or_else(|| invalid_field(field))?;
                decode_utf8(bytes, &field.name).map(PropertyValue::String)
            })
            .collect::<GgufResult<Vec<_>>>()?
    } else if element_type.is_scalar() {
        field
            .data
            .iter()
            .map(|&i| {
                field
                    .part(i)
                    .and_then(|p| p.scalar())
                    .map(sanitize_scalar)
                    .ok_or_else(|| invalid_field(field))
            })
            .collect::<GgufResult<Vec<_>>>()?
    } else {
        return Err(GgufError::UnsupportedArrayElementType(element_type));
    };

    Ok(PropertyValue::Array(items))
}

fn decode_utf8(bytes: &[u8], name: &str) -> GgufResult<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|source| GgufError::InvalidUtf8 {
            name: name.to_string(),
            source,
        })
}

fn invalid_field(field: &ReaderField) -> GgufError {
    GgufError::InvalidFieldType {
        name: field.name.clone(),
    }
}
