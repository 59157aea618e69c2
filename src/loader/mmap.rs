//! Memory-mapped GGUF file for zero-copy access
//!
//! Tensor payloads are never read into process memory by the loader. The
//! file is mapped once and every tensor keeps an `Arc<MmapGguf>` plus a byte
//! range, so the mapping stays alive exactly as long as some tensor uses it.

use crate::error::{GgufError, GgufResult};
use memmap2::Mmap;
use std::fs::File;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Memory-mapped GGUF file
///
/// # Thread Safety
///
/// `MmapGguf` is `Send + Sync`: the mapping is read-only and never
/// remapped after construction.
///
/// # Example
///
/// ```rust,ignore
/// use gguf_theta::loader::MmapGguf;
///
/// let mmap = MmapGguf::open(Path::new("model.gguf"))?;
/// let tensor_bytes = mmap.get_slice(offset, size)?;
/// ```
#[derive(Debug)]
pub struct MmapGguf {
    path: PathBuf,
    _file: File,
    mmap: Mmap,
}

impl MmapGguf {
    /// Open and memory-map GGUF file
    pub fn open(path: &Path) -> GgufResult<Self> {
        tracing::debug!("Opening GGUF file for memory-mapping: {:?}", path);

        let file = File::open(path).map_err(|e| {
            GgufError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to open GGUF file '{}': {}", path.display(), e),
            ))
        })?;

        // SAFETY: the mapping is read-only; callers must not truncate the file
        // while tensors from it are alive.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| {
            GgufError::MmapError(format!(
                "Failed to memory-map GGUF file '{}': {}",
                path.display(),
                e
            ))
        })?;

        tracing::debug!("Memory-mapped GGUF file: {} bytes", mmap.len());

        Ok(Self {
            path: path.to_path_buf(),
            _file: file,
            mmap,
        })
    }

    /// Get slice of file bytes without copying
    ///
    /// # Errors
    ///
    /// Returns an error if the requested slice extends beyond the file bounds.
    pub fn get_slice(&self, offset: u64, size: usize) -> GgufResult<&[u8]> {
        let range = self.checked_range(offset, size)?;
        Ok(&self.mmap[range])
    }

    /// Validate that `offset..offset + size` lies within the file
    pub fn checked_range(&self, offset: u64, size: usize) -> GgufResult<Range<usize>> {
        let start = usize::try_from(offset)
            .map_err(|_| crate::invalid_file!("offset {} does not fit in memory", offset))?;
        let end = start.checked_add(size).filter(|&end| end <= self.mmap.len());

        match end {
            Some(end) => Ok(start..end),
            None => Err(crate::invalid_file!(
                "Slice out of bounds: offset={}, size={}, file size={}",
                offset,
                size,
                self.mmap.len()
            )),
        }
    }

    /// Get full file bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get file size in bytes
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Check if file is empty
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }
}
