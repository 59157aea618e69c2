//! Unified error handling for gguf-theta
//!
//! Every fallible operation in the crate returns [`GgufError`]. Errors are
//! grouped by the stage of a load that produced them:
//! - Metadata errors (field shapes and value types the extractor rejects)
//! - Tensor errors (encoding dispatch, reshape and dtype views)
//! - File errors (container layout, I/O, memory mapping)
//! - Configuration errors (load options from the environment)

use crate::loader::gguf::value_type::GgufValueType;
use std::fmt;

// Re-export thiserror for convenience
pub use thiserror;

/// Unified error type for gguf-theta
#[derive(Debug, thiserror::Error)]
pub enum GgufError {
    // ========== Metadata Errors ==========
    /// Array field whose type tags are not exactly `[ARRAY, element]`
    #[error("Unsupported array type {types:?}")]
    UnsupportedArrayType { types: Vec<GgufValueType> },

    /// Array element type that is neither a string nor a known scalar
    #[error("Unsupported array element type {0}")]
    UnsupportedArrayElementType(GgufValueType),

    /// Field whose type tags cannot be turned into a property
    #[error("Invalid field type for field '{name}'")]
    InvalidFieldType { name: String },

    /// String payload that is not valid UTF-8
    #[error("Invalid UTF-8 in field '{name}': {source}")]
    InvalidUtf8 {
        name: String,
        #[source]
        source: std::str::Utf8Error,
    },

    // ========== Tensor Errors ==========
    /// Declared tensor encoding has no reconstruction strategy
    #[error("Unsupported gguf tensor type: {0}")]
    UnsupportedTensorType(String),

    /// Reshape target does not hold the same number of elements
    #[error("shape {shape:?} is invalid for input of size {numel}")]
    ShapeMismatch { shape: Vec<usize>, numel: usize },

    /// Bit-level dtype view that cannot be expressed over the storage
    #[error("Invalid dtype view: {0}")]
    InvalidView(String),

    /// Invalid tensor shape
    #[error("Invalid tensor shape: {0}")]
    InvalidTensorShape(String),

    /// Tensor not found in the namespace
    #[error("Tensor not found: {0}")]
    TensorNotFound(String),

    /// Token id outside the embedding table
    #[error("Token id {id} out of range for vocabulary of {vocab}")]
    TokenOutOfRange { id: usize, vocab: usize },

    // ========== File Errors ==========
    /// Invalid or corrupted GGUF container
    #[error("Invalid model file: {0}")]
    InvalidModelFile(String),

    /// Container version this reader does not understand
    #[error("Unsupported model format: {0}")]
    UnsupportedModelFormat(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapError(String),

    // ========== Configuration Errors ==========
    /// Invalid load configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl GgufError {
    /// Categorize the error for handling decisions
    ///
    /// ```ignore
    /// match error.category() {
    ///     ErrorCategory::User => eprintln!("check the arguments"),
    ///     ErrorCategory::Model => eprintln!("the file is damaged or unsupported"),
    ///     ErrorCategory::Internal => eprintln!("report this bug"),
    /// }
    /// ```
    pub fn category(&self) -> ErrorCategory {
        match self {
            // User errors - actionable by the caller
            GgufError::TensorNotFound(_)
            | GgufError::TokenOutOfRange { .. }
            | GgufError::ShapeMismatch { .. }
            | GgufError::InvalidView(_)
            | GgufError::InvalidConfiguration(_) => ErrorCategory::User,

            // Model errors - file or format problems
            GgufError::UnsupportedArrayType { .. }
            | GgufError::UnsupportedArrayElementType(_)
            | GgufError::InvalidFieldType { .. }
            | GgufError::InvalidUtf8 { .. }
            | GgufError::UnsupportedTensorType(_)
            | GgufError::InvalidTensorShape(_)
            | GgufError::InvalidModelFile(_)
            | GgufError::UnsupportedModelFormat(_)
            | GgufError::IoError(_) => ErrorCategory::Model,

            GgufError::MmapError(_) => ErrorCategory::Internal,
        }
    }

    /// Check if this is a user-facing error (actionable by users)
    pub fn is_user_error(&self) -> bool {
        matches!(self.category(), ErrorCategory::User)
    }

    /// Check if the file itself is at fault
    pub fn is_model_error(&self) -> bool {
        matches!(self.category(), ErrorCategory::Model)
    }
}

/// Error category for handling decisions
///
/// - User: fix the call or the configuration
/// - Model: the container is malformed or uses an unsupported feature
/// - Internal: system failure underneath the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// User error - invalid input or configuration
    User,
    /// Model error - file or format issue
    Model,
    /// Internal error - system failure
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::User => write!(f, "User"),
            ErrorCategory::Model => write!(f, "Model"),
            ErrorCategory::Internal => write!(f, "Internal"),
        }
    }
}

/// Helper type alias for Results using GgufError
pub type GgufResult<T> = std::result::Result<T, GgufError>;

/// Build an [`GgufError::InvalidModelFile`] from a format string
#[macro_export]
macro_rules! invalid_file {
    ($msg:expr) => {
        $crate::error::GgufError::InvalidModelFile($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::GgufError::InvalidModelFile(format!($fmt, $($arg)*))
    };
}
