//! Quantized tensor layouts
//!
//! A [`QuantizedTensor`] keeps the raw GGUF blocks exactly as stored (flat,
//! never reshaped) together with the logical shape the blocks decode to. The
//! [`QuantizedLayout`] selects the block format.

use super::dequant::{dequantize_blocks, BlockFormat, Q4K, Q4_1, Q5K, Q6K, Q8_0};
use super::external::ExternalTensor;
use super::primitive::PrimitiveTensor;
use super::shape::checked_numel;
use crate::error::{GgufError, GgufResult};
use serde::Serialize;
use std::fmt;

/// Block-quantized layouts with a reconstruction strategy
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum QuantizedLayout {
    Q4_1,
    Q4_K,
    Q5_K,
    Q6_K,
    Q8_0,
}

impl QuantizedLayout {
    pub const ALL: [QuantizedLayout; 5] = [
        QuantizedLayout::Q4_1,
        QuantizedLayout::Q4_K,
        QuantizedLayout::Q5_K,
        QuantizedLayout::Q6_K,
        QuantizedLayout::Q8_0,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            QuantizedLayout::Q4_1 => Q4_1::NAME,
            QuantizedLayout::Q4_K => Q4K::NAME,
            QuantizedLayout::Q5_K => Q5K::NAME,
            QuantizedLayout::Q6_K => Q6K::NAME,
            QuantizedLayout::Q8_0 => Q8_0::NAME,
        }
    }

    /// Elements per block
    pub fn block_size(&self) -> usize {
        match self {
            QuantizedLayout::Q4_1 => Q4_1::BLOCK_SIZE,
            QuantizedLayout::Q4_K => Q4K::BLOCK_SIZE,
            QuantizedLayout::Q5_K => Q5K::BLOCK_SIZE,
            QuantizedLayout::Q6_K => Q6K::BLOCK_SIZE,
            QuantizedLayout::Q8_0 => Q8_0::BLOCK_SIZE,
        }
    }

    /// Bytes per block
    pub fn block_bytes(&self) -> usize {
        match self {
            QuantizedLayout::Q4_1 => Q4_1::BLOCK_BYTES,
            QuantizedLayout::Q4_K => Q4K::BLOCK_BYTES,
            QuantizedLayout::Q5_K => Q5K::BLOCK_BYTES,
            QuantizedLayout::Q6_K => Q6K::BLOCK_BYTES,
            QuantizedLayout::Q8_0 => Q8_0::BLOCK_BYTES,
        }
    }

    /// Decode raw blocks to f32
    pub fn dequantize_bytes(&self, data: &[u8]) -> GgufResult<Vec<f32>> {
        match self {
            QuantizedLayout::Q4_1 => dequantize_blocks::<Q4_1>(data),
            QuantizedLayout::Q4_K => dequantize_blocks::<Q4K>(data),
            QuantizedLayout::Q5_K => dequantize_blocks::<Q5K>(data),
            QuantizedLayout::Q6_K => dequantize_blocks::<Q6K>(data),
            QuantizedLayout::Q8_0 => dequantize_blocks::<Q8_0>(data),
        }
    }

    /// Construct the layout object for `raw` blocks decoding to `shape`
    pub fn build(
        self,
        name: impl Into<String>,
        raw: ExternalTensor,
        shape: Vec<usize>,
    ) -> GgufResult<QuantizedTensor> {
        QuantizedTensor::new(self, name, raw, shape)
    }
}

impl fmt::Display for QuantizedLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A block-quantized tensor
#[derive(Debug, Clone)]
pub struct QuantizedTensor {
    name: String,
    raw: ExternalTensor,
    shape: Vec<usize>,
    layout: QuantizedLayout,
}

impl QuantizedTensor {
    /// Validate that `raw` holds exactly the blocks for `shape`
    pub fn new(
        layout: QuantizedLayout,
        name: impl Into<String>,
        raw: ExternalTensor,
        shape: Vec<usize>,
    ) -> GgufResult<Self> {
        let name = name.into();
        let numel = checked_numel(&shape)
            .ok_or_else(|| GgufError::InvalidTensorShape(format!("{}: {:?} overflows", name, shape)))?;
        if numel % layout.block_size() != 0 {
            return Err(GgufError::InvalidTensorShape(format!(
                "{}: {} elements is not a multiple of the {} block size {}",
                name,
                numel,
                layout,
                layout.block_size()
            )));
        }
        let expected = numel / layout.block_size() * layout.block_bytes();
        let actual = raw.data().nbytes();
        if actual != expected {
            return Err(GgufError::InvalidTensorShape(format!(
                "{}: {} shape {:?} needs {} bytes, raw data has {}",
                name, layout, shape, expected, actual
            )));
        }

        Ok(Self {
            name,
            raw,
            shape,
            layout,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Logical (decoded) shape
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn layout(&self) -> QuantizedLayout {
        self.layout
    }

    /// Raw undecoded blocks
    pub fn raw(&self) -> &ExternalTensor {
        &self.raw
    }

    /// Number of blocks in the raw data
    pub fn block_count(&self) -> usize {
        self.raw.data().nbytes() / self.layout.block_bytes()
    }

    /// Decode into a dense f32 tensor of the logical shape
    pub fn dequantize(&self) -> GgufResult<PrimitiveTensor> {
        let values = self.layout.dequantize_bytes(self.raw.data().as_bytes())?;
        PrimitiveTensor::from_f32(&values, &self.shape)
    }

    pub fn to_owned_storage(&self) -> Self {
        Self {
            name: self.name.clone(),
            raw: self.raw.to_owned_storage(),
            shape: self.shape.clone(),
            layout: self.layout,
        }
    }
}
