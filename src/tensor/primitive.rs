//! Dense tensors over shared, read-only storage
//!
//! A [`PrimitiveTensor`] is a dtype, a shape and a handle to bytes. The bytes
//! are either a range of a memory-mapped GGUF file or an owned buffer; both
//! are reference counted, so [`PrimitiveTensor::reshape`] and
//! [`PrimitiveTensor::view`] never copy.

use super::dtype::DType;
use super::shape::{checked_numel, TensorShape};
use crate::error::{GgufError, GgufResult};
use crate::loader::MmapGguf;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// Backing bytes of a tensor
#[derive(Clone)]
pub enum Storage {
    /// A byte range of a memory-mapped file
    Mapped {
        mmap: Arc<MmapGguf>,
        range: Range<usize>,
    },
    /// Bytes owned by the process
    Owned(Arc<[u8]>),
}

impl Storage {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Storage::Mapped { mmap, range } => &mmap.as_bytes()[range.clone()],
            Storage::Owned(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Storage::Mapped { range, .. } => range.len(),
            Storage::Owned(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, Storage::Mapped { .. })
    }
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Storage::Mapped { mmap, range } => f
                .debug_struct("Mapped")
                .field("path", &mmap.path())
                .field("range", range)
                .finish(),
            Storage::Owned(bytes) => f.debug_struct("Owned").field("len", &bytes.len()).finish(),
        }
    }
}

/// Dense row-major tensor
#[derive(Debug, Clone)]
pub struct PrimitiveTensor {
    storage: Storage,
    dtype: DType,
    shape: TensorShape,
}

impl PrimitiveTensor {
    /// Wrap `storage` as a tensor, checking that the byte count matches
    pub fn new(storage: Storage, dtype: DType, dims: &[usize]) -> GgufResult<Self> {
        let expected = checked_numel(dims)
            .and_then(|n| n.checked_mul(dtype.size_in_bytes()))
            .ok_or_else(|| GgufError::InvalidTensorShape(format!("{:?} overflows", dims)))?;
        if expected != storage.len() {
            return Err(GgufError::InvalidTensorShape(format!(
                "{} bytes of {} cannot hold shape {:?} ({} bytes)",
                storage.len(),
                dtype,
                dims,
                expected
            )));
        }
        Ok(Self {
            storage,
            dtype,
            shape: TensorShape::from_dims(dims),
        })
    }

    /// Tensor over `mmap[offset..offset + nbytes]` without copying
    pub fn from_mapped(
        mmap: Arc<MmapGguf>,
        offset: u64,
        dtype: DType,
        dims: &[usize],
    ) -> GgufResult<Self> {
        let nbytes = checked_numel(dims)
            .and_then(|n| n.checked_mul(dtype.size_in_bytes()))
            .ok_or_else(|| GgufError::InvalidTensorShape(format!("{:?} overflows", dims)))?;
        let range = mmap.checked_range(offset, nbytes)?;
        Self::new(Storage::Mapped { mmap, range }, dtype, dims)
    }

    /// Tensor over an owned byte buffer
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>, dtype: DType, dims: &[usize]) -> GgufResult<Self> {
        Self::new(Storage::Owned(bytes.into()), dtype, dims)
    }

    /// F32 tensor holding a copy of `values`
    pub fn from_f32(values: &[f32], dims: &[usize]) -> GgufResult<Self> {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::from_bytes(bytes, DType::F32, dims)
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn shape(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn strides(&self) -> &[usize] {
        self.shape.strides()
    }

    pub fn numel(&self) -> usize {
        self.shape.total_elements()
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.storage.as_bytes()
    }

    pub fn nbytes(&self) -> usize {
        self.storage.len()
    }

    pub fn is_mapped(&self) -> bool {
        self.storage.is_mapped()
    }

    /// Whether both tensors read the very same bytes
    pub fn shares_storage_with(&self, other: &PrimitiveTensor) -> bool {
        let (a, b) = (self.as_bytes(), other.as_bytes());
        a.as_ptr() == b.as_ptr() && a.len() == b.len()
    }

    /// Typed view of the bytes, `None` if `T` does not match the dtype width
    /// or the bytes are not suitably aligned
    pub fn try_as_slice<T: bytemuck::Pod>(&self) -> Option<&[T]> {
        if std::mem::size_of::<T>() != self.dtype.size_in_bytes() {
            return None;
        }
        bytemuck::try_cast_slice(self.as_bytes()).ok()
    }

    /// Same bytes under a new shape
    ///
    /// # Errors
    ///
    /// [`GgufError::ShapeMismatch`] if `dims` does not hold exactly
    /// [`Self::numel`] elements.
    pub fn reshape(&self, dims: &[usize]) -> GgufResult<Self> {
        if checked_numel(dims) != Some(self.numel()) {
            return Err(GgufError::ShapeMismatch {
                shape: dims.to_vec(),
                numel: self.numel(),
            });
        }
        Ok(Self {
            storage: self.storage.clone(),
            dtype: self.dtype,
            shape: TensorShape::from_dims(dims),
        })
    }

    /// Reinterpret the bytes as `dtype` without converting values
    ///
    /// When the element width changes, the last dimension is rescaled so the
    /// byte count is unchanged (`[2, 6]` u8 viewed as i16 is `[2, 3]`).
    pub fn view(&self, dtype: DType) -> GgufResult<Self> {
        let (from, to) = (self.dtype.size_in_bytes(), dtype.size_in_bytes());
        if from == to {
            return Ok(Self {
                storage: self.storage.clone(),
                dtype,
                shape: self.shape.clone(),
            });
        }

        let mut dims = self.shape().to_vec();
        let last = dims.last_mut().ok_or_else(|| {
            GgufError::InvalidView(format!("cannot view a 0-d {} tensor as {}", self.dtype, dtype))
        })?;
        let last_bytes = *last * from;
        if last_bytes % to != 0 {
            return Err(GgufError::InvalidView(format!(
                "last dimension of {} bytes is not a multiple of {} ({} bytes)",
                last_bytes, dtype, to
            )));
        }
        *last = last_bytes / to;

        Ok(Self {
            storage: self.storage.clone(),
            dtype,
            shape: TensorShape::from_dims(&dims),
        })
    }

    /// Copy of this tensor whose storage no longer references the mapping
    pub fn to_owned_storage(&self) -> Self {
        let bytes: Arc<[u8]> = Arc::from(self.as_bytes());
        Self {
            storage: Storage::Owned(bytes),
            dtype: self.dtype,
            shape: self.shape.clone(),
        }
    }

    /// Convert every element to f32 in row-major order
    pub fn to_f32_vec(&self) -> GgufResult<Vec<f32>> {
        let bytes = self.as_bytes();
        let values = match self.dtype {
            DType::F32 => bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
            DType::F16 => bytes
                .chunks_exact(2)
                .map(|c| half::f16::from_bits(u16::from_le_bytes([c[0], c[1]])).to_f32())
                .collect(),
            DType::BF16 => bytes
                .chunks_exact(2)
                .map(|c| half::bf16::from_bits(u16::from_le_bytes([c[0], c[1]])).to_f32())
                .collect(),
            DType::F64 => bytes
                .chunks_exact(8)
                .map(|c| f64::from_le_bytes(bytemuck::pod_read_unaligned(c)) as f32)
                .collect(),
            DType::U8 => bytes.iter().map(|&b| b as f32).collect(),
            DType::I8 => bytes.iter().map(|&b| b as i8 as f32).collect(),
            DType::I16 => bytes
                .chunks_exact(2)
                .map(|c| i16::from_le_bytes([c[0], c[1]]) as f32)
                .collect(),
            DType::I32 => bytes
                .chunks_exact(4)
                .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f32)
                .collect(),
            DType::I64 => bytes
                .chunks_exact(8)
                .map(|c| i64::from_le_bytes(bytemuck::pod_read_unaligned(c)) as f32)
                .collect(),
        };
        Ok(values)
    }
}
