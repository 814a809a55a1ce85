//! Applying a plan hop by hop.

use tracing::debug;

use super::cost::{CostModel, HopSelector, Schedule};
use super::plan::{TransformPlan, TransformRequest};
use crate::backend::{GemmBackend, TensorBackend};
use crate::config::TransformConfig;
use crate::error::SpaceError;
use crate::scalar::Scalar;

/// Runs transform requests through a backend, ordering hops with a selector.
///
/// ```
/// use orbspace::{DenseTensor, GemmBackend, Space};
/// use orbspace::transform::{TransformRequest, Transformer};
///
/// let ao = Space::<f64>::identity(3);
/// let mo = Space::derived(DenseTensor::ones(&[3, 2]), &ao).unwrap();
///
/// let transformer = Transformer::new(GemmBackend::default());
/// let t = DenseTensor::<f64>::ones(&[3, 3]);
/// let request = TransformRequest::new().mode(1, &ao, &mo);
/// let out = transformer.run(t, &request).unwrap();
/// assert_eq!(out.shape(), &[3, 2]);
/// assert_eq!(out.get(&[0, 0]), Some(&3.0));
/// ```
#[derive(Debug, Clone)]
pub struct Transformer<B, S = CostModel> {
    backend: B,
    selector: S,
}

impl<B> Transformer<B, CostModel> {
    /// A transformer using the greedy cost model.
    pub fn new(backend: B) -> Self {
        Self::with_selector(backend, CostModel)
    }
}

impl<B, S> Transformer<B, S> {
    /// A transformer with a caller-chosen hop order.
    pub fn with_selector(backend: B, selector: S) -> Self {
        Self { backend, selector }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn selector(&self) -> &S {
        &self.selector
    }
}

impl Transformer<GemmBackend, Schedule> {
    /// A GEMM transformer with the configured parallelism and schedule.
    pub fn from_config(config: &TransformConfig) -> Self {
        Self::with_selector(GemmBackend::new(config.par()), config.schedule.clone())
    }
}

impl<B, S: HopSelector> Transformer<B, S> {
    /// Validate `request` against `tensor` without contracting anything.
    pub fn plan<ElT>(
        &self,
        tensor: &<B as TensorBackend<ElT>>::Tensor,
        request: &TransformRequest<ElT>,
    ) -> Result<TransformPlan<ElT>, SpaceError>
    where
        ElT: Scalar,
        B: TensorBackend<ElT>,
    {
        let extents: Vec<usize> = (0..self.backend.rank(tensor))
            .map(|mode| self.backend.extent(tensor, mode).unwrap_or(0))
            .collect();
        TransformPlan::new(&extents, request)
    }

    /// Plan and execute `request`.
    ///
    /// All validation happens before the first contraction. If no mode needs
    /// a hop the input tensor is returned as-is.
    pub fn run<ElT>(
        &self,
        tensor: <B as TensorBackend<ElT>>::Tensor,
        request: &TransformRequest<ElT>,
    ) -> Result<<B as TensorBackend<ElT>>::Tensor, SpaceError>
    where
        ElT: Scalar,
        B: TensorBackend<ElT>,
    {
        let plan = self.plan(&tensor, request)?;
        self.execute(tensor, plan)
    }

    /// Contract every hop of `plan` into `tensor`.
    ///
    /// Backend failures are returned as-is; the partially transformed tensor
    /// is dropped.
    pub fn execute<ElT>(
        &self,
        mut tensor: <B as TensorBackend<ElT>>::Tensor,
        mut plan: TransformPlan<ElT>,
    ) -> Result<<B as TensorBackend<ElT>>::Tensor, SpaceError>
    where
        ElT: Scalar,
        B: TensorBackend<ElT>,
    {
        while let Some(mode) = plan.next_mode(&self.selector) {
            let Some(hop) = plan.advance(mode) else {
                break;
            };
            let matrix = hop.matrix().ok_or(SpaceError::NotDerived)?;
            debug!(
                mode,
                direction = ?hop.direction(),
                from = hop.rows(),
                to = hop.cols(),
                "applying hop"
            );
            tensor = self
                .backend
                .contract_mode(&tensor, mode, matrix, hop.direction())?;
        }
        Ok(tensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NaiveBackend;
    use crate::space::{HopDirection, Space};
    use crate::tensor::DenseTensor;
    use approx::assert_relative_eq;
    use std::cell::Cell;

    /// Wraps a backend and counts contractions.
    struct Counting<B> {
        inner: B,
        calls: Cell<usize>,
    }

    impl<B> Counting<B> {
        fn new(inner: B) -> Self {
            Self {
                inner,
                calls: Cell::new(0),
            }
        }
    }

    impl<ElT: Scalar, B: TensorBackend<ElT>> TensorBackend<ElT> for Counting<B> {
        type Tensor = B::Tensor;

        fn rank(&self, tensor: &Self::Tensor) -> usize {
            self.inner.rank(tensor)
        }

        fn extent(&self, tensor: &Self::Tensor, mode: usize) -> Option<usize> {
            self.inner.extent(tensor, mode)
        }

        fn contract_mode(
            &self,
            tensor: &Self::Tensor,
            mode: usize,
            matrix: &DenseTensor<ElT>,
            direction: HopDirection,
        ) -> Result<Self::Tensor, crate::error::TensorError> {
            self.calls.set(self.calls.get() + 1);
            self.inner.contract_mode(tensor, mode, matrix, direction)
        }
    }

    fn c22() -> DenseTensor<f64> {
        DenseTensor::from_rows(&[vec![0.12, 0.23], vec![0.34, 0.45]]).unwrap()
    }

    #[test]
    fn test_chain_issues_one_contraction_per_hop() {
        let ao = Space::identity(2);
        let a = Space::derived(c22(), &ao).unwrap();
        let b = Space::derived(c22(), &a).unwrap();
        let c = Space::derived(c22(), &b).unwrap();

        let transformer = Transformer::new(Counting::new(GemmBackend::default()));
        let t = DenseTensor::from_vec(vec![1.0, 2.0], &[2]).unwrap();
        let out = transformer
            .run(t.clone(), &TransformRequest::new().mode(0, &ao, &c))
            .unwrap();
        assert_eq!(transformer.backend().calls.get(), 3);

        // three applications of C^T to t
        let mut expected = t;
        for _ in 0..3 {
            expected = DenseTensor::from_fn(&[2], |idx| {
                (0..2)
                    .map(|i| expected.get(&[i]).unwrap() * c22().get(&[i, idx[0]]).unwrap())
                    .sum()
            });
        }
        for (x, y) in out.data().iter().zip(expected.data()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_noop_issues_no_contraction() {
        let ao = Space::identity(2);
        let mo = Space::derived(c22(), &ao).unwrap();
        let transformer = Transformer::new(Counting::new(NaiveBackend));

        let t = DenseTensor::from_fn(&[2, 2], |idx| (idx[0] + 2 * idx[1]) as f64);
        let expected = t.clone();
        let data = t.data().as_ptr();
        let request = TransformRequest::new().mode(0, &mo, &mo).mode(1, &ao, &ao);
        let out = transformer.run(t, &request).unwrap();

        assert_eq!(transformer.backend().calls.get(), 0);
        assert_eq!(out, expected);
        // the input buffer comes back untouched
        assert_eq!(out.data().as_ptr(), data);
    }

    #[test]
    fn test_validation_precedes_contraction() {
        let ao = Space::identity(2);
        let mo = Space::derived(c22(), &ao).unwrap();
        let transformer = Transformer::new(Counting::new(GemmBackend::default()));

        let t = DenseTensor::<f64>::ones(&[2, 2, 2]);
        let request = TransformRequest::new().mode(0, &ao, &mo).mode(5, &ao, &mo);
        assert!(matches!(
            transformer.run(t, &request),
            Err(SpaceError::ModeOutOfRange { mode: 5, rank: 3 })
        ));
        assert_eq!(transformer.backend().calls.get(), 0);
    }

    #[test]
    fn test_round_trip_through_root() {
        let ao = Space::identity(2);
        let mo = Space::derived(c22(), &ao).unwrap();
        let transformer = Transformer::new(NaiveBackend);

        let t = DenseTensor::from_vec(vec![1.0, -1.0], &[2]).unwrap();
        let up = transformer
            .run(t, &TransformRequest::new().mode(0, &mo, &ao))
            .unwrap();
        // C t
        assert_relative_eq!(*up.get(&[0]).unwrap(), 0.12 - 0.23, epsilon = 1e-12);
        assert_relative_eq!(*up.get(&[1]).unwrap(), 0.34 - 0.45, epsilon = 1e-12);
    }

    #[test]
    fn test_from_config() {
        let config = TransformConfig {
            threads: 2,
            schedule: Schedule::ModeOrder(vec![1]),
        };
        let transformer = Transformer::from_config(&config);
        assert_eq!(transformer.selector(), &Schedule::ModeOrder(vec![1]));
    }
}
