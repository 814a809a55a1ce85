//! Permutation of tensor modes.
//!
//! The output is written in storage order; each element is gathered from the
//! source through the source strides reordered by `perm`. The contraction
//! paths use this to line modes up for GEMM and to restore label order.

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::strides::{for_each_index, offset};
use crate::tensor::DenseTensor;

/// Permute the modes of a tensor, returning a new tensor.
///
/// Mode `i` of the result is mode `perm[i]` of `tensor`.
///
/// # Errors
///
/// Returns `TensorError::InvalidPermutation` if `perm` is not a permutation
/// of `0..ndim`.
///
/// ```
/// use orbspace::DenseTensor;
/// use orbspace::operations::permutedims;
///
/// let t = DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
/// let t2 = permutedims(&t, &[1, 0]).unwrap();
/// assert_eq!(t2.shape(), &[3, 2]);
/// assert_eq!(t.get(&[1, 0]), t2.get(&[0, 1]));
/// ```
pub fn permutedims<T: Scalar>(
    tensor: &DenseTensor<T>,
    perm: &[usize],
) -> Result<DenseTensor<T>, TensorError> {
    check_permutation(perm, tensor.ndim())?;

    let shape: Vec<usize> = perm.iter().map(|&p| tensor.shape()[p]).collect();
    let gather: Vec<usize> = perm.iter().map(|&p| tensor.strides()[p]).collect();
    let src = tensor.data();

    let mut data = Vec::with_capacity(tensor.len());
    for_each_index(&shape, |index| data.push(src[offset(index, &gather)]));
    DenseTensor::from_vec(data, &shape)
}

fn check_permutation(perm: &[usize], ndim: usize) -> Result<(), TensorError> {
    let mut seen = vec![false; ndim];
    let valid = perm.len() == ndim
        && perm
            .iter()
            .all(|&p| p < ndim && !std::mem::replace(&mut seen[p], true));
    if valid {
        Ok(())
    } else {
        Err(TensorError::InvalidPermutation {
            perm: perm.to_vec(),
            ndim,
        })
    }
}
