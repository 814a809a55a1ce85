//! Dense n-dimensional tensor.
//!
//! ```text
//! Tensor<ElT>
//! ├── data:    Vec<ElT>     flat, column-major
//! ├── shape:   [d0, d1, ...]
//! └── strides: [1, d0, d0*d1, ...]
//! ```
//!
//! Rank-2 tensors double as transformation matrices: rows index the parent
//! space, columns the derived space.

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::strides::{compute_strides, for_each_index, offset};

/// A dense, column-major n-dimensional tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<ElT: Scalar> {
    data: Vec<ElT>,
    shape: Vec<usize>,
    strides: Vec<usize>,
}

/// The dense tensor is the only tensor flavour; the alias keeps call sites
/// explicit about it.
pub type DenseTensor<ElT> = Tensor<ElT>;

impl<ElT: Scalar> Tensor<ElT> {
    /// Create a new tensor with the given shape, zero-initialized.
    ///
    /// # Examples
    ///
    /// ```
    /// use orbspace::Tensor;
    ///
    /// let t: Tensor<f64> = Tensor::zeros(&[2, 3, 4]);
    /// assert_eq!(t.shape(), &[2, 3, 4]);
    /// assert_eq!(t.len(), 24);
    /// ```
    pub fn zeros(shape: &[usize]) -> Self {
        // The empty product makes a rank-0 tensor hold one element.
        let len: usize = shape.iter().product();
        Self {
            data: vec![ElT::zero(); len],
            shape: shape.to_vec(),
            strides: compute_strides(shape),
        }
    }

    /// Create tensor from column-major data and shape.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::ShapeMismatch` if data length doesn't match shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use orbspace::Tensor;
    ///
    /// let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// assert_eq!(t.get(&[1, 0]), Some(&2.0)); // column-major
    /// assert_eq!(t.get(&[0, 1]), Some(&3.0));
    /// ```
    pub fn from_vec(data: Vec<ElT>, shape: &[usize]) -> Result<Self, TensorError> {
        let expected_len: usize = shape.iter().product();
        if data.len() != expected_len {
            return Err(TensorError::ShapeMismatch {
                expected: expected_len,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            shape: shape.to_vec(),
            strides: compute_strides(shape),
        })
    }

    /// Create a matrix from row-major nested rows.
    ///
    /// Convenient for writing transformation matrices literally.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::ShapeMismatch` if the rows are ragged.
    ///
    /// ```
    /// use orbspace::Tensor;
    ///
    /// let c = Tensor::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
    /// assert_eq!(c.shape(), &[2, 3]);
    /// assert_eq!(c.get(&[1, 2]), Some(&6.0));
    /// ```
    pub fn from_rows(rows: &[Vec<ElT>]) -> Result<Self, TensorError> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, Vec::len);
        let mut t = Self::zeros(&[nrows, ncols]);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != ncols {
                return Err(TensorError::ShapeMismatch {
                    expected: ncols,
                    actual: row.len(),
                });
            }
            for (j, &value) in row.iter().enumerate() {
                t.data[i + j * nrows] = value;
            }
        }
        Ok(t)
    }

    /// Create a tensor by evaluating `f` at every cartesian index.
    pub fn from_fn(shape: &[usize], mut f: impl FnMut(&[usize]) -> ElT) -> Self {
        let mut data = Vec::with_capacity(shape.iter().product());
        for_each_index(shape, |index| data.push(f(index)));
        Self {
            data,
            shape: shape.to_vec(),
            strides: compute_strides(shape),
        }
    }

    /// The `n x n` unit matrix.
    pub fn identity(n: usize) -> Self {
        Self::from_fn(&[n, n], |idx| {
            if idx[0] == idx[1] {
                ElT::one()
            } else {
                ElT::zero()
            }
        })
    }

    /// Create a tensor filled with ones.
    pub fn ones(shape: &[usize]) -> Self {
        let mut t = Self::zeros(shape);
        t.fill(ElT::one());
        t
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Extent of a single mode, `None` if `mode >= ndim()`.
    #[inline]
    pub fn extent(&self, mode: usize) -> Option<usize> {
        self.shape.get(mode).copied()
    }

    /// Get the rank (number of dimensions).
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Get total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    #[inline]
    pub fn data(&self) -> &[ElT] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [ElT] {
        &mut self.data
    }

    /// Consume the tensor and return its column-major data.
    pub fn into_vec(self) -> Vec<ElT> {
        self.data
    }

    #[inline]
    pub fn get_linear(&self, i: usize) -> Option<&ElT> {
        self.data.get(i)
    }

    /// Get element by cartesian indices.
    ///
    /// Returns `None` if indices are out of bounds or wrong number of indices.
    pub fn get(&self, indices: &[usize]) -> Option<&ElT> {
        self.checked_linear(indices)
            .ok()
            .and_then(|linear| self.get_linear(linear))
    }

    /// Set element by cartesian indices.
    ///
    /// # Errors
    ///
    /// Returns error if indices are out of bounds or wrong number of indices.
    pub fn set(&mut self, indices: &[usize], value: ElT) -> Result<(), TensorError> {
        let linear = self.checked_linear(indices)?;
        self.data[linear] = value;
        Ok(())
    }

    fn checked_linear(&self, indices: &[usize]) -> Result<usize, TensorError> {
        if indices.len() != self.ndim() {
            return Err(TensorError::WrongNumberOfIndices {
                expected: self.ndim(),
                actual: indices.len(),
            });
        }
        for (&idx, &dim) in indices.iter().zip(self.shape.iter()) {
            if idx >= dim {
                return Err(TensorError::IndexOutOfBounds {
                    index: idx,
                    dim_size: dim,
                });
            }
        }
        Ok(offset(indices, &self.strides))
    }

    /// Fill all elements with a value.
    pub fn fill(&mut self, value: ElT) {
        self.data.fill(value);
    }

    /// Reinterpret the data with a new shape of the same size.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::ShapeMismatch` if the element counts differ.
    pub fn reshape(self, new_shape: &[usize]) -> Result<Self, TensorError> {
        Self::from_vec(self.data, new_shape)
    }

    /// Permute the dimensions of the tensor.
    ///
    /// `perm[i]` gives the source dimension for the i-th dimension of the result.
    ///
    /// # Errors
    ///
    /// Returns error if `perm` is not a valid permutation of `0..ndim`.
    ///
    /// ```
    /// use orbspace::Tensor;
    ///
    /// let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// let t2 = t.permutedims(&[1, 0]).unwrap();
    /// assert_eq!(t2.shape(), &[3, 2]);
    /// assert_eq!(t.get(&[1, 0]), t2.get(&[0, 1]));
    /// ```
    pub fn permutedims(&self, perm: &[usize]) -> Result<Self, TensorError> {
        crate::operations::permutedims(self, perm)
    }

    /// Transpose of a matrix.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::RankMismatch` unless the tensor has rank 2.
    pub fn transpose(&self) -> Result<Self, TensorError> {
        if self.ndim() != 2 {
            return Err(TensorError::RankMismatch {
                expected: 2,
                actual: self.ndim(),
            });
        }
        self.permutedims(&[1, 0])
    }
}
