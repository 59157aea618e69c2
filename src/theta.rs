//! Named tensor namespaces and datasets
//!
//! A [`Theta`] maps dotted tensor names (`blk.0.attn_q.weight`) to
//! [`InferenceTensor`]s. A [`Dataset`] pairs the root namespace with the
//! property mapping read from the same file.

use crate::error::{GgufError, GgufResult};
use crate::loader::gguf::Properties;
use crate::tensor::InferenceTensor;
use std::collections::btree_map::{self, BTreeMap};

/// Tensor namespace keyed by dotted name
#[derive(Debug, Clone, Default)]
pub struct Theta {
    tensors: BTreeMap<String, InferenceTensor>,
}

impl Theta {
    pub fn new(tensors: BTreeMap<String, InferenceTensor>) -> Self {
        Self { tensors }
    }

    /// Tensor stored under `name`
    ///
    /// # Errors
    ///
    /// [`GgufError::TensorNotFound`] when no tensor has that name.
    pub fn tensor(&self, name: &str) -> GgufResult<&InferenceTensor> {
        self.tensors
            .get(name)
            .ok_or_else(|| GgufError::TensorNotFound(name.to_string()))
    }

    /// Alias of [`Theta::tensor`]
    pub fn theta_tensor(&self, name: &str) -> GgufResult<&InferenceTensor> {
        self.tensor(name)
    }

    pub fn get(&self, name: &str) -> Option<&InferenceTensor> {
        self.tensors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tensors.contains_key(name)
    }

    /// Names in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, InferenceTensor> {
        self.tensors.iter()
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Namespace of the tensors under `prefix.`, with the prefix stripped
    ///
    /// `sub("blk.0")` maps `attn_q.weight` to the tensor stored as
    /// `blk.0.attn_q.weight`. Storage is shared, not copied.
    pub fn sub(&self, prefix: &str) -> Theta {
        let dotted = format!("{}.", prefix.trim_end_matches('.'));
        let tensors = self
            .tensors
            .range(dotted.clone()..)
            .take_while(|(name, _)| name.starts_with(&dotted))
            .map(|(name, tensor)| (name[dotted.len()..].to_string(), tensor.clone()))
            .collect();
        Theta { tensors }
    }

    /// Same namespace with every tensor copied out of its mapped file
    pub fn to_owned_storage(&self) -> Theta {
        let tensors = self
            .tensors
            .iter()
            .map(|(name, tensor)| (name.clone(), tensor.to_owned_storage()))
            .collect();
        Theta { tensors }
    }

    pub fn into_inner(self) -> BTreeMap<String, InferenceTensor> {
        self.tensors
    }
}

impl<'a> IntoIterator for &'a Theta {
    type Item = (&'a String, &'a InferenceTensor);
    type IntoIter = btree_map::Iter<'a, String, InferenceTensor>;

    fn into_iter(self) -> Self::IntoIter {
        self.tensors.iter()
    }
}

/// Properties and tensors of one loaded file
#[derive(Debug, Clone)]
pub struct Dataset {
    properties: Properties,
    root_theta: Theta,
}

impl Dataset {
    pub fn new(properties: Properties, root_theta: Theta) -> Self {
        Self {
            properties,
            root_theta,
        }
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn root_theta(&self) -> &Theta {
        &self.root_theta
    }

    pub fn into_parts(self) -> (Properties, Theta) {
        (self.properties, self.root_theta)
    }
}
