//! GGUF Metadata Parsing
//!
//! This module reads the key-value section of a GGUF file into
//! [`ReaderField`] records. Values are kept as raw parts (see
//! [`super::field`]) so the metadata extractor can decide how to interpret
//! them.

use super::field::{FieldPart, ReaderField};
use super::value_type::{read_u32, read_u64, GgufValueType, RawScalar};
use crate::error::{GgufError, GgufResult};
use std::io::{Read, Seek};

/// Longest key accepted before the file is considered corrupt
pub const MAX_KEY_LEN: u64 = 100_000;

/// Longest string value accepted before the file is considered corrupt
pub const MAX_STRING_LEN: u64 = 100_000_000;

/// Deepest array-of-array nesting the reader will follow
pub const MAX_ARRAY_DEPTH: usize = 8;

/// Upper bound on up-front allocation for array parts
const ARRAY_PREALLOC_LIMIT: u64 = 1 << 16;

/// Parse `kv_count` key-value pairs starting at the reader's position
///
/// # Arguments
///
/// * `reader` - Reader positioned right after the GGUF header
/// * `kv_count` - Number of KV pairs to read
pub fn parse_kv_pairs<R: Read + Seek>(reader: &mut R, kv_count: u64) -> GgufResult<Vec<ReaderField>> {
    let mut fields = Vec::with_capacity(kv_count.min(ARRAY_PREALLOC_LIMIT) as usize);
    for _ in 0..kv_count {
        let field = parse_kv_field(reader)?;
        tracing::trace!(key = %field.name, types = ?field.types, "parsed GGUF field");
        fields.push(field);
    }
    Ok(fields)
}

/// Parse a single key-value pair
pub fn parse_kv_field<R: Read + Seek>(reader: &mut R) -> GgufResult<ReaderField> {
    let offset = reader.stream_position()?;

    let key_len = read_u64(reader)?;
    if key_len > MAX_KEY_LEN {
        return Err(crate::invalid_file!(
            "key_len too large: {} at offset {}",
            key_len,
            offset
        ));
    }
    let key_bytes = read_bytes(reader, key_len, "key")?;
    let name = std::str::from_utf8(&key_bytes)
        .map_err(|source| GgufError::InvalidUtf8 {
            name: format!("<key at offset {}>", offset),
            source,
        })?
        .to_string();

    let raw_type = read_u32(reader)?;
    let value_type = GgufValueType::from_u32(raw_type)?;

    let mut parts = vec![
        FieldPart::Scalar(RawScalar::U64(key_len)),
        FieldPart::Bytes(key_bytes),
        FieldPart::Scalar(RawScalar::U32(raw_type)),
    ];
    let (data, types) = read_value_parts(reader, value_type, &mut parts, &name, 0)?;

    Ok(ReaderField {
        offset,
        name,
        types,
        parts,
        data,
    })
}

/// Append the parts of one value of type `ty` to `parts`
///
/// Returns the indices of the value-carrying parts and the type tags that
/// describe the value (`[ty]`, or `[ARRAY, elem...]` for arrays).
fn read_value_parts<R: Read>(
    reader: &mut R,
    ty: GgufValueType,
    parts: &mut Vec<FieldPart>,
    key: &str,
    depth: usize,
) -> GgufResult<(Vec<usize>, Vec<GgufValueType>)> {
    match ty {
        GgufValueType::String => {
            let len = read_u64(reader)?;
            if len > MAX_STRING_LEN {
                return Err(crate::invalid_file!(
                    "value_len too large: {} for key '{}'",
                    len,
                    key
                ));
            }
            let bytes = read_bytes(reader, len, key)?;
            parts.push(FieldPart::Scalar(RawScalar::U64(len)));
            parts.push(FieldPart::Bytes(bytes));
            Ok((vec![parts.len() - 1], vec![GgufValueType::String]))
        }
        GgufValueType::Array => {
            if depth >= MAX_ARRAY_DEPTH {
                return Err(crate::invalid_file!(
                    "array nesting deeper than {} for key '{}'",
                    MAX_ARRAY_DEPTH,
                    key
                ));
            }
            let raw_elem = read_u32(reader)?;
            let elem_type = GgufValueType::from_u32(raw_elem)?;
            let count = read_u64(reader)?;
            parts.push(FieldPart::Scalar(RawScalar::U32(raw_elem)));
            parts.push(FieldPart::Scalar(RawScalar::U64(count)));

            let mut data = Vec::with_capacity(count.min(ARRAY_PREALLOC_LIMIT) as usize);
            let mut types = vec![GgufValueType::Array];
            if count == 0 {
                types.push(elem_type);
            }
            for i in 0..count {
                let (elem_data, elem_types) =
                    read_value_parts(reader, elem_type, parts, key, depth + 1)?;
                if i == 0 {
                    types.extend(elem_types);
                }
                data.extend(elem_data);
            }
            Ok((data, types))
        }
        scalar => {
            parts.push(FieldPart::Scalar(RawScalar::read(reader, scalar)?));
            Ok((vec![parts.len() - 1], vec![scalar]))
        }
    }
}

/// Read exactly `len` bytes without trusting `len` for the allocation
fn read_bytes<R: Read>(reader: &mut R, len: u64, what: &str) -> GgufResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(len.min(ARRAY_PREALLOC_LIMIT) as usize);
    reader.by_ref().take(len).read_to_end(&mut buf)?;
    if buf.len() as u64 != len {
        return Err(crate::invalid_file!(
            "truncated string for '{}': expected {} bytes, got {}",
            what,
            len,
            buf.len()
        ));
    }
    Ok(buf)
}

/// Read a length-prefixed GGUF string (used for tensor names)
pub(crate) fn read_string<R: Read>(reader: &mut R, what: &str) -> GgufResult<String> {
    let len = read_u64(reader)?;
    if len > MAX_KEY_LEN {
        return Err(crate::invalid_file!("{} length too large: {}", what, len));
    }
    let bytes = read_bytes(reader, len, what)?;
    String::from_utf8(bytes).map_err(|e| GgufError::InvalidUtf8 {
        name: what.to_string(),
        source: e.utf8_error(),
    })
}
