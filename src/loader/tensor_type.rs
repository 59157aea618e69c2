//! GGML tensor type definitions

use crate::error::GgufResult;
use serde::Serialize;
use std::fmt;

/// GGML tensor types (ggml_type enum values from ggml.h)
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u32)]
pub enum GgmlType {
    F32 = 0,
    F16 = 1,
    Q4_0 = 2,
    Q4_1 = 3,
    Q5_0 = 6,
    Q5_1 = 7,
    Q8_0 = 8,
    Q8_1 = 9,
    Q2_K = 10,
    Q3_K = 11,
    Q4_K = 12,
    Q5_K = 13,
    Q6_K = 14,
    Q8_K = 15,
    IQ2_XXS = 16,
    IQ2_XS = 17,
    IQ3_XXS = 18,
    IQ1_S = 19,
    IQ4_NL = 20,
    IQ3_S = 21,
    IQ2_S = 22,
    IQ4_XS = 23,
    I8 = 24,
    I16 = 25,
    I32 = 26,
    I64 = 27,
    F64 = 28,
    IQ1_M = 29,
    BF16 = 30,
}

impl GgmlType {
    /// Parse tensor type from u32 value
    pub fn from_u32(value: u32) -> GgufResult<Self> {
        use GgmlType::*;
        Ok(match value {
            0 => F32,
            1 => F16,
            2 => Q4_0,
            3 => Q4_1,
            6 => Q5_0,
            7 => Q5_1,
            8 => Q8_0,
            9 => Q8_1,
            10 => Q2_K,
            11 => Q3_K,
            12 => Q4_K,
            13 => Q5_K,
            14 => Q6_K,
            15 => Q8_K,
            16 => IQ2_XXS,
            17 => IQ2_XS,
            18 => IQ3_XXS,
            19 => IQ1_S,
            20 => IQ4_NL,
            21 => IQ3_S,
            22 => IQ2_S,
            23 => IQ4_XS,
            24 => I8,
            25 => I16,
            26 => I32,
            27 => I64,
            28 => F64,
            29 => IQ1_M,
            30 => BF16,
            _ => return Err(crate::invalid_file!("Unknown tensor type: {}", value)),
        })
    }

    /// Type name as it appears in ggml (`"F32"`, `"Q4_K"`, ...)
    pub fn name(&self) -> &'static str {
        use GgmlType::*;
        match self {
            F32 => "F32",
            F16 => "F16",
            Q4_0 => "Q4_0",
            Q4_1 => "Q4_1",
            Q5_0 => "Q5_0",
            Q5_1 => "Q5_1",
            Q8_0 => "Q8_0",
            Q8_1 => "Q8_1",
            Q2_K => "Q2_K",
            Q3_K => "Q3_K",
            Q4_K => "Q4_K",
            Q5_K => "Q5_K",
            Q6_K => "Q6_K",
            Q8_K => "Q8_K",
            IQ2_XXS => "IQ2_XXS",
            IQ2_XS => "IQ2_XS",
            IQ3_XXS => "IQ3_XXS",
            IQ1_S => "IQ1_S",
            IQ4_NL => "IQ4_NL",
            IQ3_S => "IQ3_S",
            IQ2_S => "IQ2_S",
            IQ4_XS => "IQ4_XS",
            I8 => "I8",
            I16 => "I16",
            I32 => "I32",
            I64 => "I64",
            F64 => "F64",
            IQ1_M => "IQ1_M",
            BF16 => "BF16",
        }
    }

    /// Number of elements per block (1 for plain element types)
    pub fn block_size(&self) -> usize {
        self.block_layout().0
    }

    /// Number of bytes per block
    pub fn type_size(&self) -> usize {
        self.block_layout().1
    }

    // (elements per block, bytes per block), from GGML_QUANT_SIZES
    fn block_layout(&self) -> (usize, usize) {
        use GgmlType::*;
        match self {
            F32 => (1, 4),
            F16 => (1, 2),
            Q4_0 => (32, 2 + 16),
            Q4_1 => (32, 2 + 2 + 16),
            Q5_0 => (32, 2 + 4 + 16),
            Q5_1 => (32, 2 + 2 + 4 + 16),
            Q8_0 => (32, 2 + 32),
            Q8_1 => (32, 2 + 2 + 32),
            Q2_K => (256, 2 + 2 + 16 + 64),
            Q3_K => (256, 2 + 64 + 32 + 12),
            Q4_K => (256, 2 + 2 + 12 + 128),
            Q5_K => (256, 2 + 2 + 12 + 32 + 128),
            Q6_K => (256, 2 + 16 + 64 + 128),
            Q8_K => (256, 4 + 256 + 32),
            IQ2_XXS => (256, 2 + 64),
            IQ2_XS => (256, 2 + 64 + 8),
            IQ3_XXS => (256, 2 + 64 + 32),
            IQ1_S => (256, 2 + 32 + 16),
            IQ4_NL => (32, 2 + 16),
            IQ3_S => (256, 2 + 64 + 8 + 32 + 4),
            IQ2_S => (256, 2 + 64 + 16),
            IQ4_XS => (256, 2 + 2 + 4 + 128),
            I8 => (1, 1),
            I16 => (1, 2),
            I32 => (1, 4),
            I64 => (1, 8),
            F64 => (1, 8),
            IQ1_M => (256, 32 + 16 + 8),
            BF16 => (1, 2),
        }
    }

    /// Check if this is a block-quantized type
    pub fn is_quantized(&self) -> bool {
        self.block_size() > 1
    }

    /// Bytes occupied by `n_elements` values of this type
    ///
    /// Returns `None` if `n_elements` is not a whole number of blocks or the
    /// size overflows.
    pub fn bytes_for(&self, n_elements: usize) -> Option<usize> {
        let (block_size, type_size) = self.block_layout();
        if n_elements % block_size != 0 {
            return None;
        }
        (n_elements / block_size).checked_mul(type_size)
    }
}

impl fmt::Display for GgmlType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tensor_type_from_u32() {
        assert_eq!(GgmlType::from_u32(0).unwrap(), GgmlType::F32);
        assert_eq!(GgmlType::from_u32(1).unwrap(), GgmlType::F16);
        assert_eq!(GgmlType::from_u32(8).unwrap(), GgmlType::Q8_0);
        assert_eq!(GgmlType::from_u32(30).unwrap(), GgmlType::BF16);
        assert!(GgmlType::from_u32(4).is_err());
        assert!(GgmlType::from_u32(99).is_err());
    }

    #[test]
    fn test_type_sizes_match_ggml() {
        assert_eq!(GgmlType::Q8_0.type_size(), 34);
        assert_eq!(GgmlType::Q4_1.type_size(), 20);
        assert_eq!(GgmlType::Q4_K.type_size(), 144);
        assert_eq!(GgmlType::Q5_K.type_size(), 176);
        assert_eq!(GgmlType::Q6_K.type_size(), 210);
        assert_eq!(GgmlType::Q8_K.type_size(), 292);
        assert_eq!(GgmlType::IQ4_XS.type_size(), 136);
        assert_eq!(GgmlType::IQ1_M.type_size(), 56);
    }

    #[test]
    fn test_block_size() {
        assert_eq!(GgmlType::Q4_0.block_size(), 32);
        assert_eq!(GgmlType::Q2_K.block_size(), 256);
        assert_eq!(GgmlType::F32.block_size(), 1);
        assert_eq!(GgmlType::BF16.block_size(), 1);
    }

    #[test]
    fn test_is_quantized() {
        assert!(GgmlType::Q4_0.is_quantized());
        assert!(GgmlType::Q6_K.is_quantized());
        assert!(!GgmlType::F32.is_quantized());
        assert!(!GgmlType::BF16.is_quantized());
        assert!(!GgmlType::I64.is_quantized());
    }

    #[test]
    fn test_bytes_for() {
        assert_eq!(GgmlType::F32.bytes_for(8), Some(32));
        assert_eq!(GgmlType::Q8_0.bytes_for(64), Some(68));
        assert_eq!(GgmlType::Q4_K.bytes_for(512), Some(288));
        assert_eq!(GgmlType::Q4_K.bytes_for(100), None);
    }

    #[test]
    fn test_round_trip_all_ids() {
        for id in 0..=30u32 {
            if let Ok(ty) = GgmlType::from_u32(id) {
                assert_eq!(ty as u32, id);
                assert_eq!(ty.to_string(), ty.name());
            }
        }
    }
}
