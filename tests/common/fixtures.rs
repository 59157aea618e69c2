//! GGUF file creation fixtures
//!
//! [`GgufBuilder`] writes small but complete GGUF files: header, KV section,
//! tensor index and an aligned data section. Value and tensor type ids are
//! written as raw numbers so tests can also produce files the loader must
//! reject.

use std::fs::File;
use std::io::Write;
use std::path::Path;

// ============================================================================
// Type ids
// ============================================================================

pub const GGUF_TYPE_UINT8: u32 = 0;
pub const GGUF_TYPE_INT8: u32 = 1;
pub const GGUF_TYPE_UINT16: u32 = 2;
pub const GGUF_TYPE_INT16: u32 = 3;
pub const GGUF_TYPE_UINT32: u32 = 4;
pub const GGUF_TYPE_INT32: u32 = 5;
pub const GGUF_TYPE_FLOAT32: u32 = 6;
pub const GGUF_TYPE_BOOL: u32 = 7;
pub const GGUF_TYPE_STRING: u32 = 8;
pub const GGUF_TYPE_ARRAY: u32 = 9;
pub const GGUF_TYPE_UINT64: u32 = 10;
pub const GGUF_TYPE_INT64: u32 = 11;
pub const GGUF_TYPE_FLOAT64: u32 = 12;

pub const GGML_TYPE_F32: u32 = 0;
pub const GGML_TYPE_F16: u32 = 1;
pub const GGML_TYPE_Q4_0: u32 = 2;
pub const GGML_TYPE_Q4_1: u32 = 3;
pub const GGML_TYPE_Q8_0: u32 = 8;
pub const GGML_TYPE_Q4_K: u32 = 12;
pub const GGML_TYPE_Q5_K: u32 = 13;
pub const GGML_TYPE_Q6_K: u32 = 14;
pub const GGML_TYPE_I32: u32 = 26;
pub const GGML_TYPE_F64: u32 = 28;
pub const GGML_TYPE_BF16: u32 = 30;

// ============================================================================
// Builder
// ============================================================================

struct TensorEntry {
    name: String,
    dims: Vec<u64>,
    ggml_type: u32,
    data: Vec<u8>,
}

/// Builder for synthetic GGUF files
pub struct GgufBuilder {
    version: u32,
    alignment: u64,
    kv_count: u64,
    kv: Vec<u8>,
    tensors: Vec<TensorEntry>,
}

impl Default for GgufBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GgufBuilder {
    pub fn new() -> Self {
        Self {
            version: 3,
            alignment: 32,
            kv_count: 0,
            kv: Vec::new(),
            tensors: Vec::new(),
        }
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Add a `general.alignment` field and lay out data with it
    pub fn alignment(mut self, alignment: u32) -> Self {
        self.alignment = alignment as u64;
        self.kv_raw("general.alignment", GGUF_TYPE_UINT32, &alignment.to_le_bytes())
    }

    /// Add a KV entry whose value bytes are written verbatim after the type id
    pub fn kv_raw(mut self, key: &str, value_type: u32, value: &[u8]) -> Self {
        write_string(&mut self.kv, key.as_bytes());
        self.kv.extend_from_slice(&value_type.to_le_bytes());
        self.kv.extend_from_slice(value);
        self.kv_count += 1;
        self
    }

    pub fn kv_string(self, key: &str, value: &str) -> Self {
        self.kv_string_bytes(key, value.as_bytes())
    }

    pub fn kv_string_bytes(self, key: &str, value: &[u8]) -> Self {
        let mut buf = Vec::new();
        write_string(&mut buf, value);
        self.kv_raw(key, GGUF_TYPE_STRING, &buf)
    }

    pub fn kv_u8(self, key: &str, value: u8) -> Self {
        self.kv_raw(key, GGUF_TYPE_UINT8, &[value])
    }

    pub fn kv_i8(self, key: &str, value: i8) -> Self {
        self.kv_raw(key, GGUF_TYPE_INT8, &value.to_le_bytes())
    }

    pub fn kv_u16(self, key: &str, value: u16) -> Self {
        self.kv_raw(key, GGUF_TYPE_UINT16, &value.to_le_bytes())
    }

    pub fn kv_i16(self, key: &str, value: i16) -> Self {
        self.kv_raw(key, GGUF_TYPE_INT16, &value.to_le_bytes())
    }

    pub fn kv_u32(self, key: &str, value: u32) -> Self {
        self.kv_raw(key, GGUF_TYPE_UINT32, &value.to_le_bytes())
    }

    pub fn kv_i32(self, key: &str, value: i32) -> Self {
        self.kv_raw(key, GGUF_TYPE_INT32, &value.to_le_bytes())
    }

    pub fn kv_u64(self, key: &str, value: u64) -> Self {
        self.kv_raw(key, GGUF_TYPE_UINT64, &value.to_le_bytes())
    }

    pub fn kv_i64(self, key: &str, value: i64) -> Self {
        self.kv_raw(key, GGUF_TYPE_INT64, &value.to_le_bytes())
    }

    pub fn kv_f32(self, key: &str, value: f32) -> Self {
        self.kv_raw(key, GGUF_TYPE_FLOAT32, &value.to_le_bytes())
    }

    pub fn kv_f64(self, key: &str, value: f64) -> Self {
        self.kv_raw(key, GGUF_TYPE_FLOAT64, &value.to_le_bytes())
    }

    pub fn kv_bool(self, key: &str, value: bool) -> Self {
        self.kv_raw(key, GGUF_TYPE_BOOL, &[value as u8])
    }

    pub fn kv_string_array(self, key: &str, values: &[&str]) -> Self {
        let mut buf = array_header(GGUF_TYPE_STRING, values.len());
        for v in values {
            write_string(&mut buf, v.as_bytes());
        }
        self.kv_raw(key, GGUF_TYPE_ARRAY, &buf)
    }

    pub fn kv_f32_array(self, key: &str, values: &[f32]) -> Self {
        let mut buf = array_header(GGUF_TYPE_FLOAT32, values.len());
        for v in values {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        self.kv_raw(key, GGUF_TYPE_ARRAY, &buf)
    }

    pub fn kv_i32_array(self, key: &str, values: &[i32]) -> Self {
        let mut buf = array_header(GGUF_TYPE_INT32, values.len());
        for v in values {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        self.kv_raw(key, GGUF_TYPE_ARRAY, &buf)
    }

    /// Array of `u8` arrays, which properties cannot represent
    pub fn kv_nested_u8_array(self, key: &str, rows: &[&[u8]]) -> Self {
        let mut buf = array_header(GGUF_TYPE_ARRAY, rows.len());
        for row in rows {
            buf.extend_from_slice(&array_header(GGUF_TYPE_UINT8, row.len()));
            buf.extend_from_slice(row);
        }
        self.kv_raw(key, GGUF_TYPE_ARRAY, &buf)
    }

    /// Add a tensor; `dims` are in on-disk order (`ne0` first)
    pub fn tensor(mut self, name: &str, dims: &[u64], ggml_type: u32, data: Vec<u8>) -> Self {
        self.tensors.push(TensorEntry {
            name: name.to_string(),
            dims: dims.to_vec(),
            ggml_type,
            data,
        });
        self
    }

    pub fn tensor_f32(self, name: &str, dims: &[u64], values: &[f32]) -> Self {
        self.tensor(name, dims, GGML_TYPE_F32, f32_bytes(values))
    }

    /// Bytes taken by the header and KV section, where the tensor index starts
    pub fn header_and_kv_len(&self) -> usize {
        24 + self.kv.len()
    }

    /// Serialize the file
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"GGUF");
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&(self.tensors.len() as u64).to_le_bytes());
        out.extend_from_slice(&self.kv_count.to_le_bytes());
        out.extend_from_slice(&self.kv);

        let mut offset = 0u64;
        let mut offsets = Vec::with_capacity(self.tensors.len());
        for t in &self.tensors {
            offset = align(offset, self.alignment);
            offsets.push(offset);
            offset += t.data.len() as u64;
        }

        for (t, offset) in self.tensors.iter().zip(&offsets) {
            write_string(&mut out, t.name.as_bytes());
            out.extend_from_slice(&(t.dims.len() as u32).to_le_bytes());
            for d in &t.dims {
                out.extend_from_slice(&d.to_le_bytes());
            }
            out.extend_from_slice(&t.ggml_type.to_le_bytes());
            out.extend_from_slice(&offset.to_le_bytes());
        }

        let data_start = align(out.len() as u64, self.alignment) as usize;
        out.resize(data_start, 0);
        for (t, offset) in self.tensors.iter().zip(&offsets) {
            out.resize(data_start + *offset as usize, 0);
            out.extend_from_slice(&t.data);
        }
        out
    }

    pub fn write_to(&self, path: &Path) -> anyhow::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(&self.build())?;
        file.flush()?;
        Ok(())
    }

    /// Write to a fresh `.gguf` temp file that lives as long as the handle
    pub fn write_temp(&self) -> anyhow::Result<tempfile::NamedTempFile> {
        let mut file = super::create_temp_file_with_suffix(".gguf")?;
        file.write_all(&self.build())?;
        file.flush()?;
        Ok(file)
    }
}

fn write_string(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    buf.extend_from_slice(bytes);
}

fn array_header(element_type: u32, len: usize) -> Vec<u8> {
    let mut buf = element_type.to_le_bytes().to_vec();
    buf.extend_from_slice(&(len as u64).to_le_bytes());
    buf
}

fn align(offset: u64, alignment: u64) -> u64 {
    offset.div_ceil(alignment) * alignment
}

// ============================================================================
// Payload helpers
// ============================================================================

pub fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn f16_bytes(values: &[f32]) -> Vec<u8> {
    values
        .iter()
        .flat_map(|v| half::f16::from_f32(*v).to_bits().to_le_bytes())
        .collect()
}

pub fn bf16_bytes(values: &[f32]) -> Vec<u8> {
    values
        .iter()
        .flat_map(|v| half::bf16::from_f32(*v).to_bits().to_le_bytes())
        .collect()
}

/// One Q8_0 block: f16 scale followed by 32 signed quants
pub fn q8_0_block(scale: f32, quants: &[i8; 32]) -> Vec<u8> {
    let mut block = half::f16::from_f32(scale).to_bits().to_le_bytes().to_vec();
    block.extend(quants.iter().map(|&q| q as u8));
    block
}

/// A small model-like file: architecture metadata, a tokenizer vocabulary
/// and F32 embedding, norm and output tensors
pub fn create_tiny_model(vocab: usize, dim: usize) -> GgufBuilder {
    let tokens: Vec<String> = (0..vocab).map(|i| format!("tok{}", i)).collect();
    let token_refs: Vec<&str> = tokens.iter().map(String::as_str).collect();
    let embd: Vec<f32> = (0..vocab * dim).map(|i| i as f32 * 0.5).collect();

    GgufBuilder::new()
        .kv_string("general.architecture", "llama")
        .kv_string("general.name", "tiny")
        .kv_u32("llama.embedding_length", dim as u32)
        .kv_u32("llama.block_count", 1)
        .kv_f32("llama.attention.layer_norm_rms_epsilon", 1e-5)
        .kv_string_array("tokenizer.ggml.tokens", &token_refs)
        .tensor_f32("token_embd.weight", &[dim as u64, vocab as u64], &embd)
        .tensor_f32("blk.0.attn_norm.weight", &[dim as u64], &vec![1.0; dim])
        .tensor_f32("output_norm.weight", &[dim as u64], &vec![1.0; dim])
}
