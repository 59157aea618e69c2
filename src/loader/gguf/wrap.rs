//! Turning raw tensor views into inference tensors
//!
//! [`wrap_tensor`] reverses the on-disk shape, selects a [`TensorEncoding`]
//! from the declared type name and materializes the raw view through
//! [`externalize_tensor`]. Dense encodings keep the mapped bytes as-is,
//! BF16 is a bit reinterpretation of 16-bit integers and the quantized
//! encodings hand the untouched raw blocks to their [`QuantizedLayout`].

use crate::error::{GgufError, GgufResult};
use crate::tensor::shape::reversed;
use crate::tensor::{
    DType, DefaultPrimitiveTensor, ExternalTensor, InferenceTensor, PrimitiveTensor, QuantizedLayout,
};
use std::fmt;

/// Scope of every tensor stored in a GGUF file
pub const GGUF_EXTERNAL_SCOPE: &str = "";

/// How a declared tensor type is reconstructed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorEncoding {
    F16,
    F32,
    F64,
    BF16,
    Quantized(QuantizedLayout),
}

impl TensorEncoding {
    /// Look up the encoding for a declared type name such as `"F32"` or `"Q4_K"`
    ///
    /// # Errors
    ///
    /// [`GgufError::UnsupportedTensorType`] naming `type_name` when it has no
    /// reconstruction.
    pub fn from_type_name(type_name: &str) -> GgufResult<Self> {
        let encoding = match type_name {
            "F16" => TensorEncoding::F16,
            "F32" => TensorEncoding::F32,
            "F64" => TensorEncoding::F64,
            "BF16" => TensorEncoding::BF16,
            other => QuantizedLayout::ALL
                .iter()
                .find(|layout| layout.name() == other)
                .map(|layout| TensorEncoding::Quantized(*layout))
                .ok_or_else(|| GgufError::UnsupportedTensorType(type_name.to_string()))?,
        };
        Ok(encoding)
    }

    /// Dtype of the dense tensor, `None` for quantized encodings
    pub fn dtype(&self) -> Option<DType> {
        match self {
            TensorEncoding::F16 => Some(DType::F16),
            TensorEncoding::F32 => Some(DType::F32),
            TensorEncoding::F64 => Some(DType::F64),
            TensorEncoding::BF16 => Some(DType::BF16),
            TensorEncoding::Quantized(_) => None,
        }
    }
}

impl fmt::Display for TensorEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TensorEncoding::F16 => f.write_str("F16"),
            TensorEncoding::F32 => f.write_str("F32"),
            TensorEncoding::F64 => f.write_str("F64"),
            TensorEncoding::BF16 => f.write_str("BF16"),
            TensorEncoding::Quantized(layout) => write!(f, "{}", layout),
        }
    }
}

/// Tag `data` as externally stored under `name`
///
/// With a `logical_shape` the view is reshaped first; reshape never copies
/// and a byte count that does not fit fails with
/// [`GgufError::ShapeMismatch`].
pub fn externalize_tensor(
    name: &str,
    data: &PrimitiveTensor,
    logical_shape: Option<&[usize]>,
) -> GgufResult<ExternalTensor> {
    let data = match logical_shape {
        Some(shape) => data.reshape(shape)?,
        None => data.clone(),
    };
    Ok(ExternalTensor::new(name, GGUF_EXTERNAL_SCOPE, data))
}

/// Build the inference tensor for one GGUF tensor
///
/// `shape` is in on-disk order and is reversed for every encoding, so
/// `[a, b, c]` on disk becomes `[c, b, a]`.
///
/// # Panics
///
/// For BF16 tensors whose raw view is not `u8`. The reader always provides
/// byte views for BF16, so anything else is a broken caller.
pub fn wrap_tensor(
    name: &str,
    shape: &[usize],
    type_name: &str,
    data: &PrimitiveTensor,
) -> GgufResult<InferenceTensor> {
    let logical_shape = reversed(shape);

    let tensor = match TensorEncoding::from_type_name(type_name)? {
        TensorEncoding::F16 | TensorEncoding::F32 | TensorEncoding::F64 => {
            let external = externalize_tensor(name, data, Some(&logical_shape))?;
            DefaultPrimitiveTensor::new(name, external).into()
        }
        TensorEncoding::BF16 => {
            assert_eq!(
                data.dtype(),
                DType::U8,
                "BF16 tensor '{}' must be backed by raw bytes",
                name
            );
            let ints = data.view(DType::I16)?;
            let external = externalize_tensor(name, &ints, Some(&logical_shape))?;
            DefaultPrimitiveTensor::new(name, external.view(DType::BF16)?).into()
        }
        TensorEncoding::Quantized(layout) => {
            let raw = externalize_tensor(name, data, None)?;
            layout.build(name, raw, logical_shape)?.into()
        }
    };

    Ok(tensor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f32_raw(values: &[f32], dims: &[usize]) -> PrimitiveTensor {
        PrimitiveTensor::from_f32(values, dims).unwrap()
    }

    fn bytes_raw(bytes: Vec<u8>, dims: &[usize]) -> PrimitiveTensor {
        PrimitiveTensor::from_bytes(bytes, DType::U8, dims).unwrap()
    }

    #[test]
    fn test_encoding_lookup() {
        assert_eq!(TensorEncoding::from_type_name("F32").unwrap(), TensorEncoding::F32);
        assert_eq!(TensorEncoding::from_type_name("BF16").unwrap(), TensorEncoding::BF16);
        for layout in QuantizedLayout::ALL {
            assert_eq!(
                TensorEncoding::from_type_name(layout.name()).unwrap(),
                TensorEncoding::Quantized(layout)
            );
        }
        assert!(TensorEncoding::from_type_name("Q4_0").is_err());
        assert!(TensorEncoding::from_type_name("I32").is_err());
    }

    #[test]
    fn test_unknown_type_names_the_type() {
        let raw = f32_raw(&[0.0], &[1]);
        let err = wrap_tensor("w", &[1], "UNKNOWN_X", &raw).unwrap_err();
        assert!(matches!(err, GgufError::UnsupportedTensorType(ref t) if t == "UNKNOWN_X"));
        assert_eq!(err.to_string(), "Unsupported gguf tensor type: UNKNOWN_X");
    }

    #[test]
    fn test_externalize_reshapes_without_copy() {
        let raw = f32_raw(&[0.0; 6], &[6]);
        let ext = externalize_tensor("a", &raw, Some(&[3, 2])).unwrap();
        assert_eq!(ext.external_name(), "a");
        assert_eq!(ext.external_scope(), "");
        assert_eq!(ext.data().shape(), &[3, 2]);
        assert!(ext.data().shares_storage_with(&raw));

        let flat = externalize_tensor("a", &raw, None).unwrap();
        assert_eq!(flat.data().shape(), &[6]);
    }

    #[test]
    fn test_externalize_propagates_reshape_error() {
        let raw = f32_raw(&[0.0; 6], &[6]);
        let err = externalize_tensor("a", &raw, Some(&[4, 2])).unwrap_err();
        assert!(matches!(err, GgufError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_f32_shape_reversed_values_row_major() {
        let values: Vec<f32> = (0..8).map(|v| v as f32).collect();
        let raw = f32_raw(&values, &[8]);
        let t = wrap_tensor("w", &[4, 2], "F32", &raw).unwrap();
        assert_eq!(t.shape(), &[2, 4]);
        assert_eq!(t.encoding(), "float32");
        assert_eq!(t.as_f32().unwrap(), values);
        assert!(t.external().data().shares_storage_with(&raw));
    }

    #[test]
    fn test_rank_one_and_rank_three() {
        let raw = f32_raw(&[0.0; 5], &[5]);
        assert_eq!(wrap_tensor("v", &[5], "F32", &raw).unwrap().shape(), &[5]);

        let raw = f32_raw(&[0.0; 24], &[24]);
        assert_eq!(wrap_tensor("c", &[2, 3, 4], "F32", &raw).unwrap().shape(), &[4, 3, 2]);
    }

    #[test]
    fn test_f16_and_f64() {
        let f16: Vec<u8> = [1.0f32, 2.0]
            .iter()
            .flat_map(|v| half::f16::from_f32(*v).to_bits().to_le_bytes())
            .collect();
        let raw = PrimitiveTensor::from_bytes(f16, DType::F16, &[2]).unwrap();
        let t = wrap_tensor("h", &[2], "F16", &raw).unwrap();
        assert_eq!(t.encoding(), "float16");
        assert_eq!(t.as_f32().unwrap(), vec![1.0, 2.0]);

        let f64s: Vec<u8> = [1.5f64, 2.5].iter().flat_map(|v| v.to_le_bytes()).collect();
        let raw = PrimitiveTensor::from_bytes(f64s, DType::F64, &[2]).unwrap();
        let t = wrap_tensor("d", &[1, 2], "F64", &raw).unwrap();
        assert_eq!(t.shape(), &[2, 1]);
        assert_eq!(t.encoding(), "float64");
    }

    #[test]
    fn test_bf16_is_bit_reinterpretation() {
        let values = [1.0f32, -2.0, 0.5, 3.0, 8.0, -0.25];
        let bytes: Vec<u8> = values
            .iter()
            .flat_map(|v| half::bf16::from_f32(*v).to_bits().to_le_bytes())
            .collect();
        let raw = bytes_raw(bytes, &[12]);

        let t = wrap_tensor("b", &[2, 3], "BF16", &raw).unwrap();
        assert_eq!(t.shape(), &[3, 2]);
        assert_eq!(t.encoding(), "bfloat16");
        assert_eq!(t.as_f32().unwrap(), values.to_vec());

        let ext = t.external();
        assert_eq!(ext.external_name(), "b");
        assert_eq!(ext.data().dtype(), DType::BF16);
        assert!(ext.data().shares_storage_with(&raw));
    }

    #[test]
    fn test_bf16_from_reader_row_view() {
        // Reader views BF16 [2, 3] as 3 rows of 4 bytes
        let raw = bytes_raw(vec![0u8; 12], &[3, 4]);
        let t = wrap_tensor("b", &[2, 3], "BF16", &raw).unwrap();
        assert_eq!(t.shape(), &[3, 2]);
    }

    #[test]
    #[should_panic(expected = "must be backed by raw bytes")]
    fn test_bf16_requires_byte_storage() {
        let raw = PrimitiveTensor::from_bytes(vec![0u8; 12], DType::I16, &[6]).unwrap();
        let _ = wrap_tensor("b", &[2, 3], "BF16", &raw);
    }

    #[test]
    fn test_quantized_raw_not_reshaped() {
        // Q8_0 [32, 2] on disk: two rows of one block each
        let raw = bytes_raw(vec![0u8; 68], &[2, 34]);
        let t = wrap_tensor("q", &[32, 2], "Q8_0", &raw).unwrap();
        assert!(t.is_quantized());
        assert_eq!(t.shape(), &[2, 32]);
        assert_eq!(t.external().data().shape(), &[2, 34]);
        assert!(t.external().data().shares_storage_with(&raw));

        let flat = bytes_raw(vec![0u8; 68], &[68]);
        let t = wrap_tensor("q", &[32, 2], "Q8_0", &flat).unwrap();
        assert_eq!(t.external().data().shape(), &[68]);
        assert_eq!(t.shape(), &[2, 32]);
    }

    #[test]
    fn test_every_quantized_layout_dispatches() {
        for layout in QuantizedLayout::ALL {
            let n = layout.block_size();
            let raw = bytes_raw(vec![0u8; layout.block_bytes()], &[layout.block_bytes()]);
            let t = wrap_tensor("q", &[n, 1], layout.name(), &raw).unwrap();
            assert_eq!(t.shape(), &[1, n]);
            assert_eq!(t.encoding(), layout.name());
        }
    }
}
