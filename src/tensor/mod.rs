//! Tensor containers produced by the loader
//!
//! # Module Structure
//!
//! - `dtype` - Element types
//! - `shape` - Row-major shapes and the GGUF dimension reversal
//! - `primitive` - Dense tensors over mapped or owned bytes
//! - `external` - External-ownership annotation
//! - `dequant` - Block decoders for the quantized formats
//! - `layouts` - Quantized tensors and their layouts
//! - `inference` - Named tensors handed to model layers

pub mod dequant;
pub mod dtype;
pub mod external;
pub mod inference;
pub mod layouts;
pub mod primitive;
pub mod shape;

pub use dtype::DType;
pub use external::ExternalTensor;
pub use inference::{DefaultPrimitiveTensor, InferenceTensor, TensorSummary};
pub use layouts::{QuantizedLayout, QuantizedTensor};
pub use primitive::{PrimitiveTensor, Storage};
pub use shape::TensorShape;
