//! Token embedding lookup
//!
//! The weight has logical shape `[vocab, dim]` and may use any encoding the
//! loader produces. It is decoded to f32 once, on the first lookup.

use crate::error::{GgufError, GgufResult};
use crate::tensor::InferenceTensor;
use crate::theta::Theta;
use once_cell::sync::OnceCell;

/// Default weight name inside an embedding namespace
pub const DEFAULT_WEIGHT_NAME: &str = "weight";

#[derive(Debug)]
pub struct TokenEmbedding {
    weight: InferenceTensor,
    vocab_size: usize,
    embedding_dim: usize,
    dense: OnceCell<Vec<f32>>,
}

impl TokenEmbedding {
    /// Embedding over `theta[weight_name]`
    ///
    /// # Errors
    ///
    /// [`GgufError::TensorNotFound`] if the weight is missing and
    /// [`GgufError::InvalidTensorShape`] if it is not 2-d.
    pub fn new(theta: &Theta, weight_name: &str) -> GgufResult<Self> {
        let weight = theta.theta_tensor(weight_name)?.clone();
        let (vocab_size, embedding_dim) = match weight.shape() {
            &[vocab, dim] => (vocab, dim),
            other => {
                return Err(GgufError::InvalidTensorShape(format!(
                    "embedding weight '{}' must be [vocab, dim], got {:?}",
                    weight_name, other
                )))
            }
        };
        tracing::debug!(
            "Token embedding '{}' [{}, {}] ({})",
            weight_name,
            vocab_size,
            embedding_dim,
            weight.encoding()
        );

        Ok(Self {
            weight,
            vocab_size,
            embedding_dim,
            dense: OnceCell::new(),
        })
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    pub fn weight(&self) -> &InferenceTensor {
        &self.weight
    }

    /// One embedding row per token id
    ///
    /// # Errors
    ///
    /// [`GgufError::TokenOutOfRange`] for the first id not below the
    /// vocabulary size; no rows are produced in that case.
    pub fn forward(&self, token_ids: &[u32]) -> GgufResult<Vec<Vec<f32>>> {
        validate_token_ids(token_ids, self.vocab_size)?;
        let dense = self.dense.get_or_try_init(|| self.weight.as_f32())?;

        Ok(token_ids
            .iter()
            .map(|&id| {
                let start = id as usize * self.embedding_dim;
                dense[start..start + self.embedding_dim].to_vec()
            })
            .collect())
    }
}

fn validate_token_ids(token_ids: &[u32], vocab_size: usize) -> GgufResult<()> {
    match token_ids.iter().find(|&&id| id as usize >= vocab_size) {
        Some(&id) => Err(GgufError::TokenOutOfRange {
            id: id as usize,
            vocab: vocab_size,
        }),
        None => Ok(()),
    }
}
