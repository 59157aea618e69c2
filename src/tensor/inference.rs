//! Tensors as handed to model layers

use super::dtype::DType;
use super::external::ExternalTensor;
use super::layouts::QuantizedTensor;
use super::primitive::PrimitiveTensor;
use crate::error::GgufResult;
use serde::Serialize;

/// A dense tensor stored in the archive as-is
#[derive(Debug, Clone)]
pub struct DefaultPrimitiveTensor {
    name: String,
    data: ExternalTensor,
}

impl DefaultPrimitiveTensor {
    pub fn new(name: impl Into<String>, data: ExternalTensor) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ExternalTensor {
        &self.data
    }

    pub fn as_primitive(&self) -> &PrimitiveTensor {
        self.data.data()
    }

    pub fn shape(&self) -> &[usize] {
        self.data.data().shape()
    }

    pub fn dtype(&self) -> DType {
        self.data.data().dtype()
    }
}

/// A named tensor of a loaded dataset
#[derive(Debug, Clone)]
pub enum InferenceTensor {
    Primitive(DefaultPrimitiveTensor),
    Quantized(QuantizedTensor),
}

impl InferenceTensor {
    pub fn name(&self) -> &str {
        match self {
            InferenceTensor::Primitive(t) => t.name(),
            InferenceTensor::Quantized(t) => t.name(),
        }
    }

    /// Logical shape
    pub fn shape(&self) -> &[usize] {
        match self {
            InferenceTensor::Primitive(t) => t.shape(),
            InferenceTensor::Quantized(t) => t.shape(),
        }
    }

    pub fn is_quantized(&self) -> bool {
        matches!(self, InferenceTensor::Quantized(_))
    }

    /// The externally stored tensor backing this one (raw blocks when quantized)
    pub fn external(&self) -> &ExternalTensor {
        match self {
            InferenceTensor::Primitive(t) => t.data(),
            InferenceTensor::Quantized(t) => t.raw(),
        }
    }

    /// Encoding label: the dtype for dense tensors, the layout name otherwise
    pub fn encoding(&self) -> &'static str {
        match self {
            InferenceTensor::Primitive(t) => t.dtype().name(),
            InferenceTensor::Quantized(t) => t.layout().name(),
        }
    }

    /// Dense f32 values in row-major logical order
    pub fn as_f32(&self) -> GgufResult<Vec<f32>> {
        match self {
            InferenceTensor::Primitive(t) => t.as_primitive().to_f32_vec(),
            InferenceTensor::Quantized(t) => t.layout().dequantize_bytes(t.raw().data().as_bytes()),
        }
    }

    /// Same tensor with its bytes copied out of the mapped file
    pub fn to_owned_storage(&self) -> Self {
        match self {
            InferenceTensor::Primitive(t) => InferenceTensor::Primitive(DefaultPrimitiveTensor::new(
                t.name(),
                t.data().to_owned_storage(),
            )),
            InferenceTensor::Quantized(t) => InferenceTensor::Quantized(t.to_owned_storage()),
        }
    }

    pub fn summary(&self) -> TensorSummary {
        TensorSummary {
            name: self.name().to_string(),
            shape: self.shape().to_vec(),
            encoding: self.encoding(),
            nbytes: self.external().data().nbytes(),
        }
    }
}

impl From<DefaultPrimitiveTensor> for InferenceTensor {
    fn from(t: DefaultPrimitiveTensor) -> Self {
        InferenceTensor::Primitive(t)
    }
}

impl From<QuantizedTensor> for InferenceTensor {
    fn from(t: QuantizedTensor) -> Self {
        InferenceTensor::Quantized(t)
    }
}

/// Serializable description of a tensor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TensorSummary {
    pub name: String,
    pub shape: Vec<usize>,
    pub encoding: &'static str,
    pub nbytes: usize,
}
