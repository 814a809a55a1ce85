//! Tensor backends used by the transform executor.
//!
//! The executor only needs three things from a tensor: its rank, the extent
//! of each mode, and a way to contract one mode against a change-of-basis
//! matrix. [`TensorBackend`] is that seam.
//!
//! # Backends
//!
//! - [`GemmBackend`]: permute + faer matmul, optionally parallel
//! - [`NaiveBackend`]: loop-based reference contraction
//!
//! The `faer_interop` module provides zero-copy views of dense tensors as
//! faer matrices.

mod dense;
mod faer_interop;

pub use dense::{GemmBackend, NaiveBackend};
pub use faer_interop::AsFaerMat;

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::space::HopDirection;
use crate::tensor::DenseTensor;

/// Contraction primitive for a single-mode basis change.
pub trait TensorBackend<ElT: Scalar> {
    /// The tensor type this backend operates on.
    type Tensor;

    fn rank(&self, tensor: &Self::Tensor) -> usize;

    /// Extent of `mode`, `None` if `mode >= rank`.
    fn extent(&self, tensor: &Self::Tensor, mode: usize) -> Option<usize>;

    /// Contract `mode` of `tensor` with `matrix`.
    ///
    /// `ToTarget` sums over the rows of `matrix`, `ToRoot` over its columns.
    /// The new index takes the place of `mode`; other modes keep their order.
    fn contract_mode(
        &self,
        tensor: &Self::Tensor,
        mode: usize,
        matrix: &DenseTensor<ElT>,
        direction: HopDirection,
    ) -> Result<Self::Tensor, TensorError>;
}

/// Contraction labels for transforming one mode of a rank-`rank` tensor.
///
/// The tensor's `mode` gets the contracted label `-1`, every other mode `i`
/// gets `i + 1`, and the matrix's free index gets `mode + 1`, so sorting the
/// output by label keeps the mode order.
pub(crate) fn mode_labels(rank: usize, mode: usize, direction: HopDirection) -> (Vec<i32>, [i32; 2]) {
    let tensor_labels = (0..rank)
        .map(|i| if i == mode { -1 } else { i as i32 + 1 })
        .collect();
    let free = mode as i32 + 1;
    let matrix_labels = match direction {
        HopDirection::ToTarget => [-1, free],
        HopDirection::ToRoot => [free, -1],
    };
    (tensor_labels, matrix_labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_labels() {
        let (t, m) = mode_labels(3, 1, HopDirection::ToTarget);
        assert_eq!(t, vec![1, -1, 3]);
        assert_eq!(m, [-1, 2]);

        let (t, m) = mode_labels(2, 0, HopDirection::ToRoot);
        assert_eq!(t, vec![-1, 2]);
        assert_eq!(m, [1, -1]);
    }
}
