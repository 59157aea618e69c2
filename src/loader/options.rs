//! Load options

use crate::error::{GgufError, GgufResult};
use std::fmt;
use std::str::FromStr;

/// Environment variable selecting the storage mode (`mmap` or `copy`)
pub const STORAGE_MODE_ENV: &str = "GGUF_THETA_STORAGE";

/// Where tensor bytes live after a load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// Tensors are views into the memory-mapped file
    #[default]
    Mapped,
    /// Tensor bytes are copied into owned buffers and the mapping is released
    Copied,
}

impl FromStr for StorageMode {
    type Err = GgufError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mmap" | "mapped" => Ok(StorageMode::Mapped),
            "copy" | "copied" | "owned" => Ok(StorageMode::Copied),
            other => Err(GgufError::InvalidConfiguration(format!(
                "unknown storage mode '{}' (expected 'mmap' or 'copy')",
                other
            ))),
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageMode::Mapped => f.write_str("mmap"),
            StorageMode::Copied => f.write_str("copy"),
        }
    }
}

/// Options for [`load_file_with`](crate::loader::gguf::load_file_with)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub storage_mode: StorageMode,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options from `GGUF_THETA_STORAGE`, defaults when unset
    pub fn from_env() -> GgufResult<Self> {
        let mut options = Self::new();
        if let Ok(mode) = std::env::var(STORAGE_MODE_ENV) {
            options.storage_mode = mode.parse()?;
        }
        Ok(options)
    }

    pub fn with_storage_mode(mut self, storage_mode: StorageMode) -> Self {
        self.storage_mode = storage_mode;
        self
    }
}
