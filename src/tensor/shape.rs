//! Row-major tensor shapes

use serde::Serialize;

/// Tensor shape with row-major strides
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TensorShape {
    dims: Vec<usize>,
    strides: Vec<usize>,
}

impl TensorShape {
    /// Create tensor shape from dimensions, computing row-major strides
    pub fn from_dims(dims: &[usize]) -> Self {
        // Last dimension varies fastest
        let mut strides = vec![1usize; dims.len()];
        for i in (0..dims.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1].saturating_mul(dims[i + 1]);
        }

        Self {
            dims: dims.to_vec(),
            strides,
        }
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements, `None` on overflow
    pub fn checked_elements(&self) -> Option<usize> {
        checked_numel(&self.dims)
    }

    /// Total number of elements, saturating at `usize::MAX`
    pub fn total_elements(&self) -> usize {
        self.checked_elements().unwrap_or(usize::MAX)
    }
}

/// Product of `dims`, `None` on overflow. The empty shape holds one element.
pub fn checked_numel(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// The on-disk GGUF dimension order reversed into logical order
pub fn reversed<T: Copy>(dims: &[T]) -> Vec<T> {
    dims.iter().rev().copied().collect()
}
