//! Zero-copy views of dense tensors as faer matrices.
//!
//! Any tensor can be viewed as an `m x n` matrix when `m * n == len()`; the
//! leading modes fuse into rows.

use faer::{MatMut, MatRef};

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;

/// Matrix views of tensor data.
pub trait AsFaerMat<T: Scalar> {
    /// View the data as an immutable `rows x cols` matrix.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::ShapeMismatch` if `rows * cols != len()`.
    ///
    /// ```
    /// use orbspace::Tensor;
    /// use orbspace::backend::AsFaerMat;
    ///
    /// // a [2, 3, 2] tensor seen as 6 x 2
    /// let t = Tensor::<f64>::ones(&[2, 3, 2]);
    /// let mat = t.as_faer_mat(6, 2).unwrap();
    /// assert_eq!((mat.nrows(), mat.ncols()), (6, 2));
    /// ```
    fn as_faer_mat(&self, rows: usize, cols: usize) -> Result<MatRef<'_, T>, TensorError>;

    /// View the data as a mutable `rows x cols` matrix.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::ShapeMismatch` if `rows * cols != len()`.
    fn as_faer_mat_mut(&mut self, rows: usize, cols: usize) -> Result<MatMut<'_, T>, TensorError>;
}

impl<T: Scalar> AsFaerMat<T> for DenseTensor<T> {
    fn as_faer_mat(&self, rows: usize, cols: usize) -> Result<MatRef<'_, T>, TensorError> {
        check_len(rows, cols, self.len())?;
        Ok(MatRef::from_column_major_slice(self.data(), rows, cols))
    }

    fn as_faer_mat_mut(&mut self, rows: usize, cols: usize) -> Result<MatMut<'_, T>, TensorError> {
        check_len(rows, cols, self.len())?;
        Ok(MatMut::from_column_major_slice_mut(self.data_mut(), rows, cols))
    }
}

fn check_len(rows: usize, cols: usize, len: usize) -> Result<(), TensorError> {
    if rows * cols == len {
        Ok(())
    } else {
        Err(TensorError::ShapeMismatch {
            expected: len,
            actual: rows * cols,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_view_shares_memory() {
        let t = DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
        let mat = t.as_faer_mat(2, 3).unwrap();
        assert_relative_eq!(mat[(1, 0)], 2.0);
        assert_relative_eq!(mat[(0, 2)], 5.0);
        assert_eq!(t.data().as_ptr(), mat.as_ptr());
    }

    #[test]
    fn test_mutable_view_writes_through() {
        let mut t: DenseTensor<f64> = DenseTensor::zeros(&[2, 3, 4]);
        {
            // rows fuse modes 0 and 1
            let mut mat = t.as_faer_mat_mut(6, 4).unwrap();
            mat[(5, 3)] = 7.0;
        }
        assert_eq!(t.get(&[1, 2, 3]), Some(&7.0));
    }

    #[test]
    fn test_wrong_size() {
        let mut t: DenseTensor<f64> = DenseTensor::zeros(&[2, 3]);
        assert!(matches!(
            t.as_faer_mat(3, 3),
            Err(TensorError::ShapeMismatch { expected: 6, actual: 9 })
        ));
        assert!(t.as_faer_mat_mut(1, 5).is_err());
    }
}
