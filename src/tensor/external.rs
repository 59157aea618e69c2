//! Tensors tagged for external storage
//!
//! An [`ExternalTensor`] pairs a primitive tensor with the name and scope
//! under which its bytes live outside the process image (the GGUF file).
//! The annotation travels with the wrapper: deriving a dtype view produces a
//! new `ExternalTensor` with the same name and scope.

use super::dtype::DType;
use super::primitive::PrimitiveTensor;
use crate::error::GgufResult;

/// A primitive tensor whose bytes are owned by an external archive
#[derive(Debug, Clone)]
pub struct ExternalTensor {
    name: String,
    scope: String,
    data: PrimitiveTensor,
}

impl ExternalTensor {
    pub fn new(name: impl Into<String>, scope: impl Into<String>, data: PrimitiveTensor) -> Self {
        Self {
            name: name.into(),
            scope: scope.into(),
            data,
        }
    }

    /// External name, the tensor name inside the archive
    pub fn external_name(&self) -> &str {
        &self.name
    }

    /// External scope; GGUF tensors use the empty scope
    pub fn external_scope(&self) -> &str {
        &self.scope
    }

    pub fn data(&self) -> &PrimitiveTensor {
        &self.data
    }

    pub fn into_data(self) -> PrimitiveTensor {
        self.data
    }

    /// Bit-level view as `dtype`, keeping the external annotation
    pub fn view(&self, dtype: DType) -> GgufResult<ExternalTensor> {
        Ok(ExternalTensor {
            name: self.name.clone(),
            scope: self.scope.clone(),
            data: self.data.view(dtype)?,
        })
    }

    /// Detach from the mapped file by copying the bytes into owned memory
    pub fn to_owned_storage(&self) -> ExternalTensor {
        ExternalTensor {
            name: self.name.clone(),
            scope: self.scope.clone(),
            data: self.data.to_owned_storage(),
        }
    }
}
