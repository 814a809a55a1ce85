//! Multi-mode basis transformations.
//!
//! A tensor whose modes live in some spaces is moved into other spaces one
//! hop at a time:
//!
//! ```text
//! TransformRequest → TransformPlan → (HopSelector picks a mode)*
//!                                     → TensorBackend::contract_mode
//! ```
//!
//! The order in which hops of different modes are interleaved does not
//! change the result, only the size of the intermediates. The default
//! [`CostModel`] greedily keeps them small.

mod cost;
mod executor;
mod plan;

pub use cost::{Candidate, CostModel, HopSelector, Schedule};
pub use executor::Transformer;
pub use plan::{ModeRequest, PlannedStep, TransformPlan, TransformRequest};

use crate::backend::GemmBackend;
use crate::error::SpaceError;
use crate::scalar::Scalar;
use crate::space::Space;
use crate::tensor::DenseTensor;

/// Move mode `i` of `tensor` from `current[i]` to `target[i]`.
///
/// Trailing modes beyond the slices pass through. Uses the sequential GEMM
/// backend and the greedy cost model.
///
/// # Errors
///
/// - `WrongNumberOfSpaces` if `current` and `target` differ in length
/// - `ModeOutOfRange` if the slices are longer than the tensor's rank
/// - `ExtentMismatch` or `UnreachableTarget` for an inconsistent mode
///
/// ```
/// use orbspace::{DenseTensor, Space, transform};
///
/// let ao = Space::<f64>::identity(2);
/// let mo = Space::derived(DenseTensor::identity(2), &ao).unwrap();
///
/// let t = DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
/// let out = transform(t.clone(), &[ao.clone(), ao], &[mo.clone(), mo]).unwrap();
/// assert_eq!(out, t);
/// ```
pub fn transform<ElT: Scalar>(
    tensor: DenseTensor<ElT>,
    current: &[Space<ElT>],
    target: &[Space<ElT>],
) -> Result<DenseTensor<ElT>, SpaceError> {
    let request = TransformRequest::from_slices(current, target)?;
    Transformer::new(GemmBackend::default()).run(tensor, &request)
}

/// Move every mode in `modes` from the root of `space` into `space`.
pub fn transform_from_root<ElT: Scalar>(
    tensor: DenseTensor<ElT>,
    space: &Space<ElT>,
    modes: &[usize],
) -> Result<DenseTensor<ElT>, SpaceError> {
    Transformer::new(GemmBackend::default()).run(tensor, &TransformRequest::from_root(space, modes))
}

/// Move every mode in `modes` from `space` back to its root.
pub fn transform_to_root<ElT: Scalar>(
    tensor: DenseTensor<ElT>,
    space: &Space<ElT>,
    modes: &[usize],
) -> Result<DenseTensor<ElT>, SpaceError> {
    Transformer::new(GemmBackend::default()).run(tensor, &TransformRequest::to_root(space, modes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_slices_longer_than_rank() {
        let ao = Space::<f64>::identity(2);
        let t = DenseTensor::<f64>::ones(&[2]);
        let spaces = vec![ao.clone(), ao.clone()];
        assert!(matches!(
            transform(t, &spaces, &spaces),
            Err(SpaceError::ModeOutOfRange { mode: 1, rank: 1 })
        ));
    }

    #[test]
    fn test_trailing_modes_pass_through() {
        let ao = Space::<f64>::identity(2);
        let mo = Space::derived(DenseTensor::ones(&[2, 3]), &ao).unwrap();
        let t = DenseTensor::from_fn(&[2, 4], |idx| (idx[0] + idx[1]) as f64);

        let out = transform(t, &[ao], &[mo]).unwrap();
        assert_eq!(out.shape(), &[3, 4]);
        // column sums of t
        assert_relative_eq!(*out.get(&[2, 3]).unwrap(), 3.0 + 4.0);
    }

    #[test]
    fn test_from_root_and_back() {
        let ao = Space::<f64>::identity(2);
        let c = DenseTensor::from_rows(&[vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        let swapped = Space::derived(c, &ao).unwrap();

        let t = DenseTensor::from_fn(&[2, 2], |idx| (idx[0] * 2 + idx[1]) as f64);
        let there = transform_from_root(t.clone(), &swapped, &[0, 1]).unwrap();
        assert_eq!(there.get(&[0, 0]), t.get(&[1, 1]));
        assert_eq!(there.get(&[0, 1]), t.get(&[1, 0]));

        let back = transform_to_root(there, &swapped, &[0, 1]).unwrap();
        assert_eq!(back, t);
    }
}
