//! Choosing which pending hop to apply next.
//!
//! Every pending mode offers the next hop of its chain. Applying a hop to mode
//! `m` turns its extent into `cols(m)`, so the intermediate produced by that
//! hop has
//!
//! ```text
//! size(m) = cols(m) * prod_{k != m} extent(k)
//! ```
//!
//! elements. The greedy model picks the smallest; ties go to the lowest mode.

use serde::{Deserialize, Serialize};
use tracing::trace;

/// The next hop one mode could take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub mode: usize,
    /// Extent of the mode before the hop.
    pub rows: usize,
    /// Extent of the mode after the hop.
    pub cols: usize,
}

/// Picks the next hop among the pending candidates.
pub trait HopSelector {
    /// Index into `candidates` of the hop to apply next.
    ///
    /// `candidates` is non-empty and sorted by mode; `extents` are the
    /// current extents of every mode of the tensor.
    fn select(&self, candidates: &[Candidate], extents: &[usize]) -> usize;
}

/// Greedy smallest-intermediate cost model.
#[derive(Debug, Clone, Copy, Default)]
pub struct CostModel;

impl CostModel {
    /// Number of elements after applying `candidate`.
    ///
    /// ```
    /// use orbspace::transform::{Candidate, CostModel};
    ///
    /// let c = Candidate { mode: 0, rows: 4, cols: 2 };
    /// assert_eq!(CostModel::intermediate_size(&c, &[4, 4]), 8);
    /// ```
    pub fn intermediate_size(candidate: &Candidate, extents: &[usize]) -> usize {
        extents
            .iter()
            .enumerate()
            .filter(|&(k, _)| k != candidate.mode)
            .fold(candidate.cols, |acc, (_, &e)| acc.saturating_mul(e))
    }
}

impl HopSelector for CostModel {
    fn select(&self, candidates: &[Candidate], extents: &[usize]) -> usize {
        let mut best = 0;
        let mut best_size = usize::MAX;
        for (i, candidate) in candidates.iter().enumerate() {
            let size = Self::intermediate_size(candidate, extents);
            // strict comparison keeps the lowest mode on ties
            if size < best_size {
                best = i;
                best_size = size;
            }
        }
        trace!(
            mode = candidates.get(best).map(|c| c.mode),
            size = best_size,
            pending = candidates.len(),
            "cost model picked hop"
        );
        best
    }
}

/// Order in which pending hops are applied.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    /// Greedy cost model.
    #[default]
    SmallestIntermediate,
    /// Fixed priority: modes listed first are drained first, unlisted modes
    /// follow in ascending order.
    ModeOrder(Vec<usize>),
}

impl HopSelector for Schedule {
    fn select(&self, candidates: &[Candidate], extents: &[usize]) -> usize {
        match self {
            Schedule::SmallestIntermediate => CostModel.select(candidates, extents),
            Schedule::ModeOrder(order) => {
                let rank = |mode: usize| order.iter().position(|&m| m == mode).unwrap_or(order.len());
                candidates
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, c)| (rank(c.mode), c.mode))
                    .map_or(0, |(i, _)| i)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(mode: usize, rows: usize, cols: usize) -> Candidate {
        Candidate { mode, rows, cols }
    }

    #[test]
    fn test_prefers_shrinking_hop() {
        // (4,2) on mode 0 gives 2*4 = 8, (4,6) on mode 1 gives 4*6 = 24
        let candidates = [candidate(0, 4, 2), candidate(1, 4, 6)];
        assert_eq!(CostModel.select(&candidates, &[4, 4]), 0);
    }

    #[test]
    fn test_tie_goes_to_lowest_mode() {
        // (4,3) on mode 0 and (3,4) on mode 1 both give 12
        let candidates = [candidate(0, 4, 3), candidate(1, 3, 4)];
        assert_eq!(CostModel.select(&candidates, &[4, 3]), 0);
    }

    #[test]
    fn test_considers_untouched_modes() {
        let candidates = [candidate(1, 5, 6), candidate(2, 7, 3)];
        // mode 1 first: 2*6*7 = 84; mode 2 first: 2*5*3 = 30
        assert_eq!(CostModel.select(&candidates, &[2, 5, 7]), 1);
    }

    #[test]
    fn test_intermediate_size_saturates() {
        let c = candidate(0, 2, usize::MAX);
        assert_eq!(CostModel::intermediate_size(&c, &[2, 3]), usize::MAX);
    }

    #[test]
    fn test_mode_order_schedule() {
        let candidates = [candidate(0, 4, 2), candidate(1, 4, 6), candidate(3, 2, 2)];
        let schedule = Schedule::ModeOrder(vec![3, 1]);
        assert_eq!(schedule.select(&candidates, &[4, 4, 1, 2]), 2);

        let schedule = Schedule::ModeOrder(vec![]);
        assert_eq!(schedule.select(&candidates[1..], &[4, 4, 1, 2]), 0);
    }

    #[test]
    fn test_default_schedule_is_greedy() {
        let candidates = [candidate(0, 4, 6), candidate(1, 4, 2)];
        assert_eq!(Schedule::default().select(&candidates, &[4, 4]), 1);
    }
}
