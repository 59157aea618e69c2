//! Model file loading
//!
//! `gguf` holds the container reader and the dataset assembler; the
//! remaining modules are shared by it: the file mapping, the ggml tensor
//! type table and the load options.

pub mod gguf;
pub mod mmap;
pub mod options;
pub mod tensor_type;

pub use gguf::{load_file, load_file_with, load_properties, GgufReader, Properties, PropertyValue};
pub use mmap::MmapGguf;
pub use options::{LoadOptions, StorageMode, STORAGE_MODE_ENV};
pub use tensor_type::GgmlType;
