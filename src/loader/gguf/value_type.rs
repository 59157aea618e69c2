//! GGUF metadata value types
//!
//! Type tags as stored in the KV section (official ggml/gguf.h numbering):
//! 0=UINT8, 1=INT8, 2=UINT16, 3=INT16, 4=UINT32, 5=INT32,
//! 6=FLOAT32, 7=BOOL, 8=STRING, 9=ARRAY, 10=UINT64, 11=INT64, 12=FLOAT64

use crate::error::{GgufError, GgufResult};
use serde::Serialize;
use std::fmt;
use std::io::Read;

/// GGUF metadata value type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u32)]
pub enum GgufValueType {
    Uint8 = 0,
    Int8 = 1,
    Uint16 = 2,
    Int16 = 3,
    Uint32 = 4,
    Int32 = 5,
    Float32 = 6,
    Bool = 7,
    String = 8,
    Array = 9,
    Uint64 = 10,
    Int64 = 11,
    Float64 = 12,
}

impl GgufValueType {
    /// Parse a value type tag
    pub fn from_u32(value: u32) -> GgufResult<Self> {
        Ok(match value {
            0 => GgufValueType::Uint8,
            1 => GgufValueType::Int8,
            2 => GgufValueType::Uint16,
            3 => GgufValueType::Int16,
            4 => GgufValueType::Uint32,
            5 => GgufValueType::Int32,
            6 => GgufValueType::Float32,
            7 => GgufValueType::Bool,
            8 => GgufValueType::String,
            9 => GgufValueType::Array,
            10 => GgufValueType::Uint64,
            11 => GgufValueType::Int64,
            12 => GgufValueType::Float64,
            _ => return Err(crate::invalid_file!("Unknown GGUF value type: {}", value)),
        })
    }

    /// Whether this tag denotes a fixed-width numeric (or boolean) scalar
    ///
    /// This is the set of "known scalar" tags the metadata extractor accepts
    /// for single-valued fields and array elements.
    pub fn is_scalar(&self) -> bool {
        self.scalar_width().is_some()
    }

    /// Encoded width of a scalar of this type, `None` for STRING and ARRAY
    pub fn scalar_width(&self) -> Option<usize> {
        match self {
            GgufValueType::Uint8 | GgufValueType::Int8 | GgufValueType::Bool => Some(1),
            GgufValueType::Uint16 | GgufValueType::Int16 => Some(2),
            GgufValueType::Uint32 | GgufValueType::Int32 | GgufValueType::Float32 => Some(4),
            GgufValueType::Uint64 | GgufValueType::Int64 | GgufValueType::Float64 => Some(8),
            GgufValueType::String | GgufValueType::Array => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GgufValueType::Uint8 => "UINT8",
            GgufValueType::Int8 => "INT8",
            GgufValueType::Uint16 => "UINT16",
            GgufValueType::Int16 => "INT16",
            GgufValueType::Uint32 => "UINT32",
            GgufValueType::Int32 => "INT32",
            GgufValueType::Float32 => "FLOAT32",
            GgufValueType::Bool => "BOOL",
            GgufValueType::String => "STRING",
            GgufValueType::Array => "ARRAY",
            GgufValueType::Uint64 => "UINT64",
            GgufValueType::Int64 => "INT64",
            GgufValueType::Float64 => "FLOAT64",
        }
    }
}

impl fmt::Display for GgufValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A scalar exactly as it was encoded in the file
///
/// The metadata extractor turns these into portable property values; the
/// reader keeps the native width so nothing is lost before that step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawScalar {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    Bool(bool),
}

impl RawScalar {
    /// Read one little-endian scalar of type `ty`
    pub fn read<R: Read>(reader: &mut R, ty: GgufValueType) -> GgufResult<Self> {
        let scalar = match ty {
            GgufValueType::Uint8 => RawScalar::U8(u8::from_le_bytes(read_array(reader)?)),
            GgufValueType::Int8 => RawScalar::I8(i8::from_le_bytes(read_array(reader)?)),
            GgufValueType::Uint16 => RawScalar::U16(u16::from_le_bytes(read_array(reader)?)),
            GgufValueType::Int16 => RawScalar::I16(i16::from_le_bytes(read_array(reader)?)),
            GgufValueType::Uint32 => RawScalar::U32(u32::from_le_bytes(read_array(reader)?)),
            GgufValueType::Int32 => RawScalar::I32(i32::from_le_bytes(read_array(reader)?)),
            GgufValueType::Float32 => RawScalar::F32(f32::from_le_bytes(read_array(reader)?)),
            GgufValueType::Bool => {
                let [b] = read_array::<R, 1>(reader)?;
                RawScalar::Bool(b != 0)
            }
            GgufValueType::Uint64 => RawScalar::U64(u64::from_le_bytes(read_array(reader)?)),
            GgufValueType::Int64 => RawScalar::I64(i64::from_le_bytes(read_array(reader)?)),
            GgufValueType::Float64 => RawScalar::F64(f64::from_le_bytes(read_array(reader)?)),
            GgufValueType::String | GgufValueType::Array => {
                return Err(crate::invalid_file!("{} is not a scalar type", ty));
            }
        };
        Ok(scalar)
    }

    /// The type tag this scalar was read as
    pub fn value_type(&self) -> GgufValueType {
        match self {
            RawScalar::U8(_) => GgufValueType::Uint8,
            RawScalar::I8(_) => GgufValueType::Int8,
            RawScalar::U16(_) => GgufValueType::Uint16,
            RawScalar::I16(_) => GgufValueType::Int16,
            RawScalar::U32(_) => GgufValueType::Uint32,
            RawScalar::I32(_) => GgufValueType::Int32,
            RawScalar::U64(_) => GgufValueType::Uint64,
            RawScalar::I64(_) => GgufValueType::Int64,
            RawScalar::F32(_) => GgufValueType::Float32,
            RawScalar::F64(_) => GgufValueType::Float64,
            RawScalar::Bool(_) => GgufValueType::Bool,
        }
    }

    /// Unsigned integer value, if this scalar is an unsigned integer
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            RawScalar::U8(v) => Some(v as u64),
            RawScalar::U16(v) => Some(v as u64),
            RawScalar::U32(v) => Some(v as u64),
            RawScalar::U64(v) => Some(v),
            _ => None,
        }
    }
}

pub(crate) fn read_array<R: Read, const N: usize>(reader: &mut R) -> GgufResult<[u8; N]> {
    let mut bytes = [0u8; N];
    reader.read_exact(&mut bytes)?;
    Ok(bytes)
}

pub(crate) fn read_u32<R: Read>(reader: &mut R) -> GgufResult<u32> {
    Ok(u32::from_le_bytes(read_array(reader)?))
}

pub(crate) fn read_u64<R: Read>(reader: &mut R) -> GgufResult<u64> {
    Ok(u64::from_le_bytes(read_array(reader)?))
}
