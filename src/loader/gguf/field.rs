//! Parsed metadata field records
//!
//! A [`ReaderField`] keeps every raw segment the reader consumed for one KV
//! entry, in file order, plus the indices of the segments holding the value.
//! For a field `key` the part layout is:
//!
//! | value type | parts | data |
//! |---|---|---|
//! | scalar | `[key_len, key, type, value]` | `[3]` |
//! | string | `[key_len, key, type, str_len, str]` | `[4]` |
//! | array | `[key_len, key, type, elem_type, count, elem parts...]` | one index per element |
//!
//! Header pseudo-fields (`GGUF.version`, `GGUF.tensor_count`,
//! `GGUF.kv_count`) carry a single part, `[value]`, with `data = [0]`.

use super::value_type::{GgufValueType, RawScalar};

/// One raw segment of a field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPart {
    /// Fixed-width scalar (lengths, type tags and scalar values)
    Scalar(RawScalar),
    /// Variable-length byte payload (keys and string values)
    Bytes(Vec<u8>),
}

impl FieldPart {
    /// The scalar held by this part, `None` for byte payloads
    pub fn scalar(&self) -> Option<RawScalar> {
        match self {
            FieldPart::Scalar(s) => Some(*s),
            FieldPart::Bytes(_) => None,
        }
    }

    /// The bytes held by this part, `None` for scalars
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            FieldPart::Bytes(b) => Some(b),
            FieldPart::Scalar(_) => None,
        }
    }
}

/// A metadata field as produced by the container reader
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderField {
    /// Byte offset of the field in the file
    pub offset: u64,
    pub name: String,
    /// `[ty]` for scalars and strings, `[ARRAY, elem...]` for arrays
    pub types: Vec<GgufValueType>,
    pub parts: Vec<FieldPart>,
    /// Indices into `parts` holding the value(s)
    pub data: Vec<usize>,
}

impl ReaderField {
    /// Build a header pseudo-field holding a single scalar
    pub fn header(name: &str, offset: u64, value: RawScalar) -> Self {
        Self {
            offset,
            name: name.to_string(),
            types: vec![value.value_type()],
            parts: vec![FieldPart::Scalar(value)],
            data: vec![0],
        }
    }

    /// First scalar of the last part, for single-valued scalar fields
    pub fn last_scalar(&self) -> Option<RawScalar> {
        self.parts.last().and_then(FieldPart::scalar)
    }

    /// Bytes of the last part, for single-valued string fields
    pub fn last_bytes(&self) -> Option<&[u8]> {
        self.parts.last().and_then(FieldPart::bytes)
    }

    /// Part referenced by a `data` index
    pub fn part(&self, index: usize) -> Option<&FieldPart> {
        self.parts.get(index)
    }
}
