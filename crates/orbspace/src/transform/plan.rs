//! Requests and validated plans.
//!
//! ```text
//! TransformRequest  (mode, current, target)*
//!     → TransformPlan::new(extents, request)
//!         validate every entry, resolve each path into a queue of hops
//!     → schedule(selector)   inspect the order without contracting
//!     → Transformer::execute contract hop by hop
//! ```

use std::collections::VecDeque;

use tracing::debug;

use super::cost::{Candidate, HopSelector};
use crate::error::SpaceError;
use crate::scalar::Scalar;
use crate::space::{Hop, HopDirection, Space, path};

/// One mode's conversion.
#[derive(Debug, Clone)]
pub struct ModeRequest<ElT: Scalar> {
    pub mode: usize,
    pub current: Space<ElT>,
    pub target: Space<ElT>,
}

/// Which modes move from which space to which.
///
/// Modes that are not listed pass through untouched.
///
/// ```
/// use orbspace::{DenseTensor, Space};
/// use orbspace::transform::TransformRequest;
///
/// let ao = Space::<f64>::identity(3);
/// let mo = Space::derived(DenseTensor::ones(&[3, 2]), &ao).unwrap();
/// let request = TransformRequest::new().mode(0, &ao, &mo).mode(2, &ao, &mo);
/// assert_eq!(request.entries().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct TransformRequest<ElT: Scalar> {
    entries: Vec<ModeRequest<ElT>>,
}

impl<ElT: Scalar> Default for TransformRequest<ElT> {
    fn default() -> Self {
        Self::new()
    }
}

impl<ElT: Scalar> TransformRequest<ElT> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a mode moving from `current` to `target`.
    pub fn mode(mut self, mode: usize, current: &Space<ElT>, target: &Space<ElT>) -> Self {
        self.entries.push(ModeRequest {
            mode,
            current: current.clone(),
            target: target.clone(),
        });
        self
    }

    /// Pair mode `i` with `current[i]` and `target[i]`.
    ///
    /// # Errors
    ///
    /// Returns `SpaceError::WrongNumberOfSpaces` if the slices differ in length.
    pub fn from_slices(current: &[Space<ElT>], target: &[Space<ElT>]) -> Result<Self, SpaceError> {
        if current.len() != target.len() {
            return Err(SpaceError::WrongNumberOfSpaces {
                current: current.len(),
                target: target.len(),
            });
        }
        Ok(current
            .iter()
            .zip(target)
            .enumerate()
            .fold(Self::new(), |req, (mode, (c, t))| req.mode(mode, c, t)))
    }

    /// Move every listed mode from the root of `space` to `space`.
    pub fn from_root(space: &Space<ElT>, modes: &[usize]) -> Self {
        let root = space.root();
        modes
            .iter()
            .fold(Self::new(), |req, &mode| req.mode(mode, &root, space))
    }

    /// Move every listed mode from `space` back to its root.
    pub fn to_root(space: &Space<ElT>, modes: &[usize]) -> Self {
        let root = space.root();
        modes
            .iter()
            .fold(Self::new(), |req, &mode| req.mode(mode, space, &root))
    }

    pub fn entries(&self) -> &[ModeRequest<ElT>] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One step of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedStep {
    pub mode: usize,
    pub direction: HopDirection,
    pub rows: usize,
    pub cols: usize,
}

/// A validated request: per-mode hop queues plus the tensor's extents.
#[derive(Debug, Clone)]
pub struct TransformPlan<ElT: Scalar> {
    queues: Vec<VecDeque<Hop<ElT>>>,
    extents: Vec<usize>,
}

impl<ElT: Scalar> TransformPlan<ElT> {
    /// Validate `request` against a tensor with the given extents.
    ///
    /// # Errors
    ///
    /// - `ModeOutOfRange` if a mode is not smaller than the rank
    /// - `DuplicateMode` if a mode is listed twice
    /// - `ExtentMismatch` if a current space's dimension differs from the extent
    /// - `UnreachableTarget` if current and target do not share a root
    pub fn new(extents: &[usize], request: &TransformRequest<ElT>) -> Result<Self, SpaceError> {
        let rank = extents.len();
        let mut queues: Vec<VecDeque<Hop<ElT>>> = vec![VecDeque::new(); rank];
        let mut seen = vec![false; rank];

        for entry in request.entries() {
            let mode = entry.mode;
            if mode >= rank {
                return Err(SpaceError::ModeOutOfRange { mode, rank });
            }
            if seen[mode] {
                return Err(SpaceError::DuplicateMode { mode });
            }
            seen[mode] = true;

            let expected = entry.current.dimension();
            if expected != extents[mode] {
                return Err(SpaceError::ExtentMismatch {
                    mode,
                    expected,
                    actual: extents[mode],
                });
            }

            let hops = path(&entry.current, &entry.target)
                .ok_or(SpaceError::UnreachableTarget { mode })?;
            queues[mode] = hops.into();
        }

        let plan = Self {
            queues,
            extents: extents.to_vec(),
        };
        debug!(rank, hops = plan.len(), "planned transform");
        Ok(plan)
    }

    /// Total number of contractions the plan will issue.
    pub fn len(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum()
    }

    /// True if no mode needs a hop.
    pub fn is_empty(&self) -> bool {
        self.queues.iter().all(VecDeque::is_empty)
    }

    /// Current extents, updated as hops are applied.
    pub fn extents(&self) -> &[usize] {
        &self.extents
    }

    /// Extents once every hop has been applied.
    pub fn final_extents(&self) -> Vec<usize> {
        self.queues
            .iter()
            .zip(&self.extents)
            .map(|(q, &e)| q.back().map_or(e, Hop::cols))
            .collect()
    }

    /// Mode whose next hop `selector` wants applied, `None` when done.
    pub(crate) fn next_mode<S: HopSelector>(&self, selector: &S) -> Option<usize> {
        let candidates: Vec<Candidate> = self
            .queues
            .iter()
            .enumerate()
            .filter_map(|(mode, q)| {
                q.front().map(|hop| Candidate {
                    mode,
                    rows: hop.rows(),
                    cols: hop.cols(),
                })
            })
            .collect();

        match candidates.len() {
            0 => None,
            1 => Some(candidates[0].mode),
            _ => {
                let pick = selector.select(&candidates, &self.extents);
                Some(candidates.get(pick).unwrap_or(&candidates[0]).mode)
            }
        }
    }

    /// Pop the next hop of `mode` and record its new extent.
    pub(crate) fn advance(&mut self, mode: usize) -> Option<Hop<ElT>> {
        let hop = self.queues.get_mut(mode)?.pop_front()?;
        self.extents[mode] = hop.cols();
        Some(hop)
    }

    /// The order in which `selector` would apply the hops.
    pub fn schedule<S: HopSelector>(&self, selector: &S) -> Vec<PlannedStep> {
        let mut sim = self.clone();
        let mut steps = Vec::with_capacity(sim.len());
        while let Some(mode) = sim.next_mode(selector) {
            if let Some(hop) = sim.advance(mode) {
                steps.push(PlannedStep {
                    mode,
                    direction: hop.direction(),
                    rows: hop.rows(),
                    cols: hop.cols(),
                });
            }
        }
        steps
    }
}
