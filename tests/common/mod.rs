//! Common test utilities
//!
//! Shared fixtures for integration tests:
//! - `fixtures`: the synthetic GGUF file builder and payload helpers
//! - `tempfile_helpers`: temp files with consistent error context
//!
//! Tests that touch process-wide state (environment variables, the global
//! tracing subscriber) are marked `#[serial]`.
//!
//! # Usage
//!
//! ```ignore
//! mod common;
//! use common::GgufBuilder;
//!
//! let file = GgufBuilder::new().kv_u32("llama.block_count", 2).write_temp()?;
//! let props = gguf_theta::load_properties(file.path())?;
//! ```

#![allow(dead_code)]

mod fixtures;
mod tempfile_helpers;

pub use fixtures::*;
pub use serial_test::serial;
pub use tempfile_helpers::*;
