//! GGUF Header Parsing and Validation
//!
//! This module handles GGUF file header parsing:
//! - Magic number validation
//! - Version verification (v2 and v3 share the same layout)
//! - Tensor and KV count reading

use super::value_type::{read_array, read_u32, read_u64};
use crate::error::{GgufError, GgufResult};
use std::io::Read;

/// GGUF file magic number
pub const GGUF_MAGIC: &[u8; 4] = b"GGUF";

/// Oldest GGUF version with 64-bit counts and lengths
pub const GGUF_MIN_VERSION: u32 = 2;

/// Newest GGUF version this reader understands
pub const GGUF_MAX_VERSION: u32 = 3;

/// Size of the fixed header: magic, version, tensor count, KV count
pub const GGUF_HEADER_SIZE: u64 = 4 + 4 + 8 + 8;

/// GGUF header information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GgufHeader {
    pub version: u32,
    pub tensor_count: u64,
    pub kv_count: u64,
}

/// Validate GGUF magic number
///
/// Reads the first 4 bytes and verifies they match "GGUF"
pub fn validate_gguf_magic<R: Read>(reader: &mut R) -> GgufResult<()> {
    let magic: [u8; 4] = read_array(reader)?;
    if &magic != GGUF_MAGIC {
        return Err(crate::invalid_file!(
            "Invalid GGUF magic number: expected {:?}, got {:?}",
            GGUF_MAGIC,
            magic
        ));
    }
    Ok(())
}

/// Read and validate GGUF version
pub fn read_gguf_version<R: Read>(reader: &mut R) -> GgufResult<u32> {
    let version = read_u32(reader)?;
    if !(GGUF_MIN_VERSION..=GGUF_MAX_VERSION).contains(&version) {
        if version.swap_bytes() <= GGUF_MAX_VERSION {
            return Err(GgufError::UnsupportedModelFormat(format!(
                "big-endian GGUF (version {}) is not supported",
                version.swap_bytes()
            )));
        }
        return Err(GgufError::UnsupportedModelFormat(format!(
            "GGUF version {} (supported: {}..={})",
            version, GGUF_MIN_VERSION, GGUF_MAX_VERSION
        )));
    }
    Ok(version)
}

/// Parse complete GGUF header
///
/// Reads magic, version, tensor count, and KV count in sequence
pub fn parse_gguf_header<R: Read>(reader: &mut R) -> GgufResult<GgufHeader> {
    validate_gguf_magic(reader)?;
    let version = read_gguf_version(reader)?;
    let tensor_count = read_u64(reader)?;
    let kv_count = read_u64(reader)?;

    Ok(GgufHeader {
        version,
        tensor_count,
        kv_count,
    })
}
