//! GGUF container reader
//!
//! [`GgufReader::open`] maps the whole file and produces the field list and a
//! tensor list whose data views point into the mapping. [`read_fields`]
//! parses only the header and KV section through a buffered file reader and
//! never maps the file.

use super::field::ReaderField;
use super::header::{parse_gguf_header, GgufHeader};
use super::metadata::parse_kv_pairs;
use super::tensor_info::{align_offset, parse_tensor_infos, raw_view_layout, TensorInfo};
use super::value_type::{GgufValueType, RawScalar};
use crate::error::{GgufError, GgufResult};
use crate::loader::mmap::MmapGguf;
use crate::loader::tensor_type::GgmlType;
use crate::tensor::PrimitiveTensor;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Alignment of the data section when `general.alignment` is absent
pub const GGUF_DEFAULT_ALIGNMENT: u64 = 32;

/// Metadata key overriding the data alignment
pub const ALIGNMENT_KEY: &str = "general.alignment";

/// A tensor of the container with a raw view of its payload
#[derive(Debug, Clone)]
pub struct ReaderTensor {
    pub name: String,
    pub tensor_type: GgmlType,
    /// Dimensions in on-disk order
    pub shape: Vec<u64>,
    pub n_elements: usize,
    pub n_bytes: usize,
    /// Absolute offset of the payload in the file
    pub data_offset: u64,
    /// Raw view of the payload (see [`raw_view_layout`])
    pub data: PrimitiveTensor,
}

/// A parsed GGUF file
#[derive(Debug)]
pub struct GgufReader {
    path: PathBuf,
    header: GgufHeader,
    fields: Vec<ReaderField>,
    tensors: Vec<ReaderTensor>,
    alignment: u64,
    data_offset: u64,
    mmap: Arc<MmapGguf>,
}

impl GgufReader {
    /// Map `path` and parse fields, tensor index and data views
    pub fn open(path: impl AsRef<Path>) -> GgufResult<Self> {
        let path = path.as_ref();
        let mmap = Arc::new(MmapGguf::open(path)?);
        let mut cursor = Cursor::new(mmap.as_bytes());

        let (header, fields) = read_header_and_fields(&mut cursor)?;
        let alignment = alignment_of(&fields)?;
        let infos = parse_tensor_infos(&mut cursor, header.tensor_count)?;
        let data_offset = align_offset(cursor.position(), alignment);

        let tensors = build_tensors(&mmap, infos, data_offset)?;

        tracing::debug!(
            "Loaded GGUF v{} with {} tensors, {} KV pairs",
            header.version,
            header.tensor_count,
            header.kv_count
        );

        Ok(Self {
            path: path.to_path_buf(),
            header,
            fields,
            tensors,
            alignment,
            data_offset,
            mmap,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &GgufHeader {
        &self.header
    }

    /// All fields in file order, starting with the `GGUF.*` header fields
    pub fn fields(&self) -> &[ReaderField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&ReaderField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn tensors(&self) -> &[ReaderTensor] {
        &self.tensors
    }

    /// Tensor names, sorted alphabetically
    pub fn tensor_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tensors.iter().map(|t| t.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn alignment(&self) -> u64 {
        self.alignment
    }

    /// Absolute offset of the data section
    pub fn data_offset(&self) -> u64 {
        self.data_offset
    }

    pub fn mmap(&self) -> &Arc<MmapGguf> {
        &self.mmap
    }

    pub fn into_parts(self) -> (Vec<ReaderField>, Vec<ReaderTensor>) {
        (self.fields, self.tensors)
    }

    /// Fields of `path` without mapping it, see [`read_fields`]
    pub fn read_fields(path: impl AsRef<Path>) -> GgufResult<Vec<ReaderField>> {
        read_fields(path)
    }
}

/// Parse only the header and KV section of `path`
///
/// Reads through a buffered file handle and stops before the tensor index,
/// so no tensor payload is mapped or read.
pub fn read_fields(path: impl AsRef<Path>) -> GgufResult<Vec<ReaderField>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        GgufError::IoError(std::io::Error::new(
            e.kind(),
            format!("Failed to open GGUF file '{}': {}", path.display(), e),
        ))
    })?;
    let mut reader = BufReader::new(file);
    let (_, fields) = read_header_and_fields(&mut reader)?;
    Ok(fields)
}

/// Header, then the three header pseudo-fields followed by every KV field
fn read_header_and_fields<R: Read + Seek>(reader: &mut R) -> GgufResult<(GgufHeader, Vec<ReaderField>)> {
    let header = parse_gguf_header(reader)?;

    let mut fields = Vec::new();
    fields.push(ReaderField::header("GGUF.version", 4, RawScalar::U32(header.version)));
    fields.push(ReaderField::header("GGUF.tensor_count", 8, RawScalar::U64(header.tensor_count)));
    fields.push(ReaderField::header("GGUF.kv_count", 16, RawScalar::U64(header.kv_count)));

    let mut seen: HashSet<String> = fields.iter().map(|f| f.name.clone()).collect();
    for mut field in parse_kv_pairs(reader, header.kv_count)? {
        if !seen.insert(field.name.clone()) {
            tracing::warn!("Duplicate key {} at offset {}", field.name, field.offset);
            field.name = format!("{}_{}", field.name, field.offset);
            seen.insert(field.name.clone());
        }
        fields.push(field);
    }

    Ok((header, fields))
}

fn alignment_of(fields: &[ReaderField]) -> GgufResult<u64> {
    let Some(field) = fields.iter().find(|f| f.name == ALIGNMENT_KEY) else {
        return Ok(GGUF_DEFAULT_ALIGNMENT);
    };
    if field.types != [GgufValueType::Uint32] {
        return Err(crate::invalid_file!("Bad type for {} field", ALIGNMENT_KEY));
    }
    match field.last_scalar() {
        Some(RawScalar::U32(align)) if align > 0 => Ok(align as u64),
        other => Err(crate::invalid_file!("Bad {} value {:?}", ALIGNMENT_KEY, other)),
    }
}

fn build_tensors(
    mmap: &Arc<MmapGguf>,
    infos: Vec<TensorInfo>,
    data_offset: u64,
) -> GgufResult<Vec<ReaderTensor>> {
    let mut names = HashSet::with_capacity(infos.len());
    let mut tensors = Vec::with_capacity(infos.len());

    for info in infos {
        if !names.insert(info.name.clone()) {
            return Err(crate::invalid_file!("Found duplicated tensor with name {}", info.name));
        }

        let dims = info.dims_usize()?;
        let n_elements = info.n_elements()?;
        let n_bytes = info.n_bytes()?;
        let offset = data_offset
            .checked_add(info.offset)
            .ok_or_else(|| crate::invalid_file!("tensor '{}' offset overflows", info.name))?;

        let (dtype, view_dims) = raw_view_layout(info.tensor_type, &dims)?;
        let data = PrimitiveTensor::from_mapped(Arc::clone(mmap), offset, dtype, &view_dims)?;
        debug_assert_eq!(data.nbytes(), n_bytes);

        tensors.push(ReaderTensor {
            name: info.name,
            tensor_type: info.tensor_type,
            shape: info.dims,
            n_elements,
            n_bytes,
            data_offset: offset,
            data,
        });
    }

    Ok(tensors)
}
