//! GGUF Tensor Information Parsing
//!
//! This module handles the tensor index of a GGUF file:
//! - Reading tensor info (name, on-disk dims, type, relative offset)
//! - Calculating element and byte counts
//! - Deciding the dtype and shape of the raw data view

use super::metadata::read_string;
use super::value_type::{read_u32, read_u64};
use crate::error::{GgufError, GgufResult};
use crate::loader::tensor_type::GgmlType;
use crate::tensor::shape::{checked_numel, reversed};
use crate::tensor::DType;
use std::io::Read;

/// Highest rank a GGML tensor can have
pub const GGML_MAX_DIMS: u32 = 4;

/// One entry of the tensor index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorInfo {
    pub name: String,
    /// Dimensions in on-disk order (`ne0` first)
    pub dims: Vec<u64>,
    pub tensor_type: GgmlType,
    /// Offset relative to the start of the data section
    pub offset: u64,
}

impl TensorInfo {
    /// Dimensions as `usize`, still in on-disk order
    pub fn dims_usize(&self) -> GgufResult<Vec<usize>> {
        self.dims
            .iter()
            .map(|&d| {
                usize::try_from(d).map_err(|_| {
                    GgufError::InvalidTensorShape(format!("{}: dimension {} too large", self.name, d))
                })
            })
            .collect()
    }

    /// Total number of elements
    pub fn n_elements(&self) -> GgufResult<usize> {
        checked_numel(&self.dims_usize()?)
            .ok_or_else(|| GgufError::InvalidTensorShape(format!("{}: {:?} overflows", self.name, self.dims)))
    }

    /// Size of the tensor payload in bytes
    pub fn n_bytes(&self) -> GgufResult<usize> {
        let n = self.n_elements()?;
        self.tensor_type.bytes_for(n).ok_or_else(|| {
            GgufError::InvalidTensorShape(format!(
                "{}: {} elements do not fill whole {} blocks of {}",
                self.name,
                n,
                self.tensor_type,
                self.tensor_type.block_size()
            ))
        })
    }
}

/// Parse `tensor_count` entries of the tensor index
pub fn parse_tensor_infos<R: Read>(reader: &mut R, tensor_count: u64) -> GgufResult<Vec<TensorInfo>> {
    let mut infos = Vec::with_capacity(tensor_count.min(1 << 16) as usize);
    for _ in 0..tensor_count {
        infos.push(parse_tensor_info(reader)?);
    }
    Ok(infos)
}

/// Parse a single tensor index entry
pub fn parse_tensor_info<R: Read>(reader: &mut R) -> GgufResult<TensorInfo> {
    let name = read_string(reader, "tensor name")?;

    let n_dims = read_u32(reader)?;
    if n_dims > GGML_MAX_DIMS {
        return Err(crate::invalid_file!(
            "tensor '{}' has {} dimensions (max {})",
            name,
            n_dims,
            GGML_MAX_DIMS
        ));
    }
    let mut dims = Vec::with_capacity(n_dims as usize);
    for _ in 0..n_dims {
        dims.push(read_u64(reader)?);
    }

    let tensor_type = GgmlType::from_u32(read_u32(reader)?)?;
    let offset = read_u64(reader)?;

    Ok(TensorInfo {
        name,
        dims,
        tensor_type,
        offset,
    })
}

/// Dtype and shape of the raw data view over a tensor payload
///
/// Plain element types are viewed as their own dtype with the on-disk dims
/// reversed. BF16 and every block-quantized type are viewed as bytes: the
/// reversed dims with the innermost one replaced by the row length in bytes.
pub fn raw_view_layout(tensor_type: GgmlType, dims: &[usize]) -> GgufResult<(DType, Vec<usize>)> {
    let dtype = match tensor_type {
        GgmlType::F32 => Some(DType::F32),
        GgmlType::F16 => Some(DType::F16),
        GgmlType::F64 => Some(DType::F64),
        GgmlType::I8 => Some(DType::I8),
        GgmlType::I16 => Some(DType::I16),
        GgmlType::I32 => Some(DType::I32),
        GgmlType::I64 => Some(DType::I64),
        _ => None,
    };
    let mut view_dims = reversed(dims);
    if let Some(dtype) = dtype {
        return Ok((dtype, view_dims));
    }

    let row = view_dims.last_mut().ok_or_else(|| {
        GgufError::InvalidTensorShape(format!("0-d {} tensor has no rows", tensor_type))
    })?;
    let elements = *row;
    *row = tensor_type.bytes_for(elements).ok_or_else(|| {
        GgufError::InvalidTensorShape(format!(
            "row of {} elements is not a whole number of {} blocks",
            elements, tensor_type
        ))
    })?;
    Ok((DType::U8, view_dims))
}

/// Round `offset` up to the next multiple of `alignment`
pub fn align_offset(offset: u64, alignment: u64) -> u64 {
    match offset % alignment {
        0 => offset,
        rem => offset + (alignment - rem),
    }
}
