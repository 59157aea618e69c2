//! gguf-theta - GGUF model files as named tensor datasets
//!
//! Loads a GGUF file into a [`Dataset`]: a property mapping built from the
//! file's metadata and a [`Theta`] namespace of inference tensors whose
//! bytes stay in the memory-mapped file. Dense encodings (F16, F32, F64,
//! BF16) are used as stored; Q4_1, Q4_K, Q5_K, Q6_K and Q8_0 tensors keep
//! their raw blocks and decode on demand.

#![allow(clippy::needless_range_loop)] // Clearer for block decoding
#![allow(clippy::manual_slice_size_calculation)] // Common in byte layout code

pub mod error;
pub mod layers;
pub mod loader;
pub mod logging;
pub mod tensor;
pub mod theta;

pub use error::{ErrorCategory, GgufError, GgufResult};
pub use layers::TokenEmbedding;
pub use loader::{load_file, load_file_with, load_properties, LoadOptions, StorageMode};
pub use loader::{Properties, PropertyValue};
pub use logging::{init_logging_default, init_with_config, LoggingConfig};
pub use tensor::{InferenceTensor, QuantizedLayout};
pub use theta::{Dataset, Theta};
