//! Tensors of tensors and spaces that depend on an outer index.
//!
//! ```text
//! TensorOfTensors
//! ├── outer_shape: [n0, n1, ...]      independent modes, column-major
//! └── inner: [t_0, t_1, ...]          one dense tensor per outer element
//! ```
//!
//! Inner tensors share a rank but their extents may differ from element to
//! element. A [`DependentSpace`] stores one transform per outer element, for
//! example one set of local orbitals per occupied orbital.

use tracing::debug;

use crate::backend::{GemmBackend, TensorBackend};
use crate::contract::contract_gemm;
use crate::error::{SpaceError, TensorError};
use crate::scalar::Scalar;
use crate::space::{HopDirection, Space};
use crate::strides::{compute_strides, for_each_index, offset};
use crate::tensor::DenseTensor;

/// A dense outer array whose elements are dense tensors of a common rank.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorOfTensors<ElT: Scalar> {
    outer_shape: Vec<usize>,
    inner_rank: Option<usize>,
    inner: Vec<DenseTensor<ElT>>,
}

impl<ElT: Scalar> TensorOfTensors<ElT> {
    /// Build from column-major outer elements.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::ShapeMismatch` if the number of elements does not
    /// match `outer_shape` and `TensorError::RankMismatch` if the inner
    /// tensors differ in rank.
    /// With no elements the inner rank is unknown; use
    /// [`with_inner_rank`](Self::with_inner_rank) to keep it.
    pub fn new(outer_shape: &[usize], inner: Vec<DenseTensor<ElT>>) -> Result<Self, TensorError> {
        let inner_rank = inner.first().map(DenseTensor::ndim);
        Self::build(outer_shape, inner_rank, inner)
    }

    /// Build with a fixed inner rank, which an empty outer array keeps.
    ///
    /// ```
    /// use orbspace::hierarchical::TensorOfTensors;
    ///
    /// let empty = TensorOfTensors::<f64>::with_inner_rank(&[0], 2, Vec::new()).unwrap();
    /// assert!(empty.is_empty());
    /// assert_eq!(empty.inner_rank(), Some(2));
    /// ```
    pub fn with_inner_rank(
        outer_shape: &[usize],
        inner_rank: usize,
        inner: Vec<DenseTensor<ElT>>,
    ) -> Result<Self, TensorError> {
        Self::build(outer_shape, Some(inner_rank), inner)
    }

    fn build(
        outer_shape: &[usize],
        inner_rank: Option<usize>,
        inner: Vec<DenseTensor<ElT>>,
    ) -> Result<Self, TensorError> {
        let expected: usize = outer_shape.iter().product();
        if inner.len() != expected {
            return Err(TensorError::ShapeMismatch {
                expected,
                actual: inner.len(),
            });
        }
        if let Some(rank) = inner_rank {
            if let Some(odd) = inner.iter().find(|t| t.ndim() != rank) {
                return Err(TensorError::RankMismatch {
                    expected: rank,
                    actual: odd.ndim(),
                });
            }
        }
        Ok(Self {
            outer_shape: outer_shape.to_vec(),
            inner_rank,
            inner,
        })
    }

    /// Build by evaluating `f` at every outer index.
    pub fn from_fn(
        outer_shape: &[usize],
        mut f: impl FnMut(&[usize]) -> DenseTensor<ElT>,
    ) -> Result<Self, TensorError> {
        let mut inner = Vec::with_capacity(outer_shape.iter().product());
        for_each_index(outer_shape, |outer| inner.push(f(outer)));
        Self::new(outer_shape, inner)
    }

    pub fn outer_shape(&self) -> &[usize] {
        &self.outer_shape
    }

    pub fn outer_rank(&self) -> usize {
        self.outer_shape.len()
    }

    /// Rank of the inner tensors, `None` if there are no elements and none
    /// was given.
    pub fn inner_rank(&self) -> Option<usize> {
        self.inner_rank
    }

    /// Number of outer elements.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Inner tensor at an outer index.
    pub fn get(&self, outer: &[usize]) -> Option<&DenseTensor<ElT>> {
        if outer.len() != self.outer_rank()
            || outer.iter().zip(&self.outer_shape).any(|(&i, &n)| i >= n)
        {
            return None;
        }
        let strides = compute_strides(&self.outer_shape);
        self.inner.get(offset(outer, &strides))
    }

    /// Inner tensors in column-major outer order.
    pub fn elements(&self) -> &[DenseTensor<ElT>] {
        &self.inner
    }

    pub fn into_elements(self) -> Vec<DenseTensor<ElT>> {
        self.inner
    }
}

/// A space whose transform depends on an outer (independent) index.
///
/// Each inner transform is a matrix with rows equal to the parent dimension,
/// or a vector of that length, which collapses the mode it is applied to.
#[derive(Debug, Clone, PartialEq)]
pub struct DependentSpace<ElT: Scalar> {
    transform: TensorOfTensors<ElT>,
    parent: Space<ElT>,
}

impl<ElT: Scalar> DependentSpace<ElT> {
    /// # Errors
    ///
    /// Returns `SpaceError::InvalidTransform` if an inner transform's row
    /// count differs from the parent's dimension, and `SpaceError::Tensor`
    /// if the inner transforms are neither vectors nor matrices.
    pub fn new(transform: TensorOfTensors<ElT>, parent: &Space<ElT>) -> Result<Self, SpaceError> {
        let parent_dim = parent.dimension();
        if let Some(rank) = transform.inner_rank().filter(|r| !matches!(r, 1 | 2)) {
            return Err(TensorError::RankMismatch {
                expected: 2,
                actual: rank,
            }
            .into());
        }
        for c in transform.elements() {
            if !matches!(c.ndim(), 1 | 2) {
                return Err(TensorError::RankMismatch {
                    expected: 2,
                    actual: c.ndim(),
                }
                .into());
            }
            if c.shape()[0] != parent_dim {
                return Err(SpaceError::InvalidTransform {
                    rows: c.shape()[0],
                    parent_dim,
                });
            }
        }
        Ok(Self {
            transform,
            parent: parent.clone(),
        })
    }

    pub fn transform(&self) -> &TensorOfTensors<ElT> {
        &self.transform
    }

    pub fn parent(&self) -> &Space<ElT> {
        &self.parent
    }

    /// True if the inner transforms are vectors.
    pub fn is_collapsing(&self) -> bool {
        self.transform.inner_rank() == Some(1)
    }
}

/// Apply each outer element's transform to the inner modes `modes`.
///
/// For outer element `i`, every listed inner mode of `t_i` is contracted with
/// the rows of `c_i`. A collapsing (vector) transform removes the mode and may
/// only be applied to one mode that is not the tensor's only inner mode.
///
/// # Errors
///
/// - `IndependentRankMismatch` if the outer ranks differ
/// - `ExtentMismatch` if an outer extent or an inner mode's extent differs
/// - `ModeOutOfRange`, `DuplicateMode` for a bad `modes` list
/// - `UnsupportedCollapse` for a collapse of several or all inner modes
pub fn tot_transform<ElT: Scalar>(
    space: &DependentSpace<ElT>,
    tensor: TensorOfTensors<ElT>,
    modes: &[usize],
) -> Result<TensorOfTensors<ElT>, SpaceError> {
    if modes.is_empty() {
        return Ok(tensor);
    }

    let c = space.transform();
    if c.outer_rank() != tensor.outer_rank() {
        return Err(SpaceError::IndependentRankMismatch {
            transform: c.outer_rank(),
            tensor: tensor.outer_rank(),
        });
    }
    for (mode, (&expected, &actual)) in c.outer_shape().iter().zip(tensor.outer_shape()).enumerate() {
        if expected != actual {
            return Err(SpaceError::ExtentMismatch {
                mode,
                expected,
                actual,
            });
        }
    }
    // an empty tensor built without a rank has no inner modes to name
    let inner_rank = tensor.inner_rank().unwrap_or(0);

    let mut seen = vec![false; inner_rank];
    for &mode in modes {
        if mode >= inner_rank {
            return Err(SpaceError::ModeOutOfRange {
                mode,
                rank: inner_rank,
            });
        }
        if seen[mode] {
            return Err(SpaceError::DuplicateMode { mode });
        }
        seen[mode] = true;
    }

    let collapsing = space.is_collapsing();
    if collapsing && modes.len() > 1 {
        return Err(SpaceError::UnsupportedCollapse {
            reason: format!("a vector transform can collapse one mode per call, got {}", modes.len()),
        });
    }
    if collapsing && modes.len() == inner_rank {
        return Err(SpaceError::UnsupportedCollapse {
            reason: "collapsing every inner mode would leave a scalar".to_string(),
        });
    }
    if tensor.is_empty() {
        return Ok(tensor);
    }

    for (t_i, c_i) in tensor.elements().iter().zip(c.elements()) {
        for &mode in modes {
            if t_i.shape()[mode] != c_i.shape()[0] {
                return Err(SpaceError::ExtentMismatch {
                    mode,
                    expected: c_i.shape()[0],
                    actual: t_i.shape()[mode],
                });
            }
        }
    }

    debug!(
        elements = tensor.len(),
        modes = modes.len(),
        collapsing,
        "transforming tensor of tensors"
    );

    let backend = GemmBackend::default();
    let outer_shape = tensor.outer_shape().to_vec();
    let inner = tensor
        .into_elements()
        .into_iter()
        .zip(c.elements())
        .map(|(t_i, c_i)| {
            if collapsing {
                collapse_mode(&t_i, modes[0], c_i)
            } else {
                modes.iter().try_fold(t_i, |t, &mode| {
                    backend.contract_mode(&t, mode, c_i, HopDirection::ToTarget)
                })
            }
        })
        .collect::<Result<Vec<_>, TensorError>>()?;

    let out_rank = if collapsing { inner_rank - 1 } else { inner_rank };
    Ok(TensorOfTensors::with_inner_rank(&outer_shape, out_rank, inner)?)
}

/// Contract `mode` of `t` with the vector `v`, removing the mode.
fn collapse_mode<ElT: Scalar>(
    t: &DenseTensor<ElT>,
    mode: usize,
    v: &DenseTensor<ElT>,
) -> Result<DenseTensor<ElT>, TensorError> {
    let labels: Vec<i32> = (0..t.ndim())
        .map(|i| if i == mode { -1 } else { i as i32 + 1 })
        .collect();
    contract_gemm(t, &labels, v, &[-1])
}
