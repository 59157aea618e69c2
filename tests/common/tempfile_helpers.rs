//! Helper functions for tempfile/tempdir usage in tests

use anyhow::Context;
use std::path::PathBuf;

pub fn create_temp_file() -> anyhow::Result<tempfile::NamedTempFile> {
    tempfile::NamedTempFile::new().context("Failed to create temporary file for test")
}

pub fn create_temp_dir() -> anyhow::Result<tempfile::TempDir> {
    tempfile::tempdir().context("Failed to create temporary directory for test")
}

/// Temp file with a specific suffix, e.g. ".gguf"
pub fn create_temp_file_with_suffix(suffix: &str) -> anyhow::Result<tempfile::NamedTempFile> {
    tempfile::NamedTempFile::with_suffix(suffix).context("Failed to create temporary file with suffix")
}

/// A path inside `dir` that does not exist yet
pub fn missing_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("does_not_exist.gguf")
}
