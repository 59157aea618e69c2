//! GGUF (GPT-Generated Unified Format) Loader
//!
//! This module turns a GGUF file into a [`Dataset`]:
//! - Header and KV metadata parsing into reader fields
//! - Property extraction (strings, scalars, one level of arrays)
//! - Tensor index parsing with raw views into the memory-mapped file
//! - Reconstruction of F16/F32/F64, BF16 and the Q4_1/Q4_K/Q5_K/Q6_K/Q8_0
//!   quantized encodings
//!
//! # Module Structure
//!
//! - `value_type`: Metadata value types and raw scalars
//! - `field`: Reader fields (types, parts, data indices)
//! - `header`: GGUF magic validation and header parsing
//! - `metadata`: KV pair parsing
//! - `tensor_info`: Tensor index parsing and raw view layout
//! - `reader`: Container reader over a memory-mapped file
//! - `properties`: Scalar sanitizing and property extraction
//! - `wrap`: Tensor materialization and type dispatch
//!
//! # Example
//!
//! ```ignore
//! use gguf_theta::loader::gguf::{load_file, load_properties};
//!
//! let props = load_properties("model.gguf")?;
//! println!("{}", props["general.architecture"]);
//!
//! let dataset = load_file("model.gguf")?;
//! let embd = dataset.root_theta().tensor("token_embd.weight")?;
//! ```

pub mod field;
pub mod header;
pub mod metadata;
pub mod properties;
pub mod reader;
pub mod tensor_info;
pub mod value_type;
pub mod wrap;

pub use field::{FieldPart, ReaderField};
pub use header::{parse_gguf_header, GgufHeader, GGUF_MAGIC};
pub use properties::{
    extract_properties, sanitize_scalar, Properties, PropertyValue, SanitizeScalar, GGUF_SCHEMA,
    SCHEMA_KEY,
};
pub use reader::{read_fields, GgufReader, ReaderTensor, GGUF_DEFAULT_ALIGNMENT};
pub use tensor_info::TensorInfo;
pub use value_type::{GgufValueType, RawScalar};
pub use wrap::{externalize_tensor, wrap_tensor, TensorEncoding};

use crate::error::{GgufError, GgufResult};
use crate::loader::options::{LoadOptions, StorageMode};
use crate::theta::{Dataset, Theta};
use std::collections::BTreeMap;
use std::path::Path;

/// Load properties and tensors of the GGUF file at `path`
///
/// Tensors stay views into the memory-mapped file.
pub fn load_file(path: impl AsRef<Path>) -> GgufResult<Dataset> {
    load_file_with(path, &LoadOptions::default())
}

/// Load the GGUF file at `path` with explicit options
///
/// Any field or tensor that cannot be converted fails the whole load.
pub fn load_file_with(path: impl AsRef<Path>, options: &LoadOptions) -> GgufResult<Dataset> {
    let path = path.as_ref();
    let reader = GgufReader::open(path)?;
    tracing::info!(
        "Loading gguf file {} ({} fields, {} tensors)",
        path.display(),
        reader.fields().len(),
        reader.tensors().len()
    );

    let (fields, tensors) = reader.into_parts();
    let properties = extract_properties(&fields)?;

    let mut named = BTreeMap::new();
    for tensor in &tensors {
        let shape = tensor
            .shape
            .iter()
            .map(|&d| {
                usize::try_from(d).map_err(|_| {
                    GgufError::InvalidTensorShape(format!("{}: dimension {} too large", tensor.name, d))
                })
            })
            .collect::<GgufResult<Vec<usize>>>()?;
        let wrapped = wrap_tensor(&tensor.name, &shape, tensor.tensor_type.name(), &tensor.data)?;
        named.insert(tensor.name.clone(), wrapped);
    }

    let mut root_theta = Theta::new(named);
    if options.storage_mode == StorageMode::Copied {
        tracing::debug!("Copying {} tensors out of {}", root_theta.len(), path.display());
        root_theta = root_theta.to_owned_storage();
    }

    Ok(Dataset::new(properties, root_theta))
}

/// Load only the properties of the GGUF file at `path`
///
/// The file is read through a buffered handle up to the end of the KV
/// section; the tensor index and payloads are never read or mapped.
pub fn load_properties(path: impl AsRef<Path>) -> GgufResult<Properties> {
    let fields = read_fields(path)?;
    extract_properties(&fields)
}
