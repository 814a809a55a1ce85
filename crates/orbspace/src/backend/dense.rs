//! Backends over the crate's dense tensor.

use faer::Par;

use super::{TensorBackend, mode_labels};
use crate::contract::{contract, contract_gemm_with_par};
use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::space::HopDirection;
use crate::tensor::DenseTensor;

/// GEMM-based backend using faer.
#[derive(Debug, Clone, Copy)]
pub struct GemmBackend {
    par: Par,
}

impl GemmBackend {
    pub fn new(par: Par) -> Self {
        Self { par }
    }

    /// A backend running faer's matmul on the calling thread only.
    pub fn sequential() -> Self {
        Self::new(Par::Seq)
    }

    pub fn par(&self) -> Par {
        self.par
    }
}

impl Default for GemmBackend {
    fn default() -> Self {
        Self::sequential()
    }
}

impl<ElT: Scalar> TensorBackend<ElT> for GemmBackend {
    type Tensor = DenseTensor<ElT>;

    fn rank(&self, tensor: &DenseTensor<ElT>) -> usize {
        tensor.ndim()
    }

    fn extent(&self, tensor: &DenseTensor<ElT>, mode: usize) -> Option<usize> {
        tensor.extent(mode)
    }

    fn contract_mode(
        &self,
        tensor: &DenseTensor<ElT>,
        mode: usize,
        matrix: &DenseTensor<ElT>,
        direction: HopDirection,
    ) -> Result<DenseTensor<ElT>, TensorError> {
        let (tensor_labels, matrix_labels) = mode_labels(tensor.ndim(), mode, direction);
        contract_gemm_with_par(tensor, &tensor_labels, matrix, &matrix_labels, self.par)
    }
}

/// Loop-based backend; slow, used to cross-check the GEMM path.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveBackend;

impl<ElT: Scalar> TensorBackend<ElT> for NaiveBackend {
    type Tensor = DenseTensor<ElT>;

    fn rank(&self, tensor: &DenseTensor<ElT>) -> usize {
        tensor.ndim()
    }

    fn extent(&self, tensor: &DenseTensor<ElT>, mode: usize) -> Option<usize> {
        tensor.extent(mode)
    }

    fn contract_mode(
        &self,
        tensor: &DenseTensor<ElT>,
        mode: usize,
        matrix: &DenseTensor<ElT>,
        direction: HopDirection,
    ) -> Result<DenseTensor<ElT>, TensorError> {
        let (tensor_labels, matrix_labels) = mode_labels(tensor.ndim(), mode, direction);
        contract(tensor, &tensor_labels, matrix, &matrix_labels)
    }
}
