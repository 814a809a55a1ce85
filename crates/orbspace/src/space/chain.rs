//! Walking parent links between spaces.

use serde::{Deserialize, Serialize};

use super::Space;
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;

/// Which way a hop crosses a derived space's transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HopDirection {
    /// Parent to child: contract the mode with the rows of `C`.
    ToTarget,
    /// Child to parent: contract the mode with the columns of `C`.
    ToRoot,
}

/// One basis change applied to one mode.
///
/// `space` is always a derived space; the hop crosses its transform.
#[derive(Debug, Clone)]
pub struct Hop<ElT: Scalar> {
    space: Space<ElT>,
    direction: HopDirection,
    rows: usize,
    cols: usize,
}

impl<ElT: Scalar> Hop<ElT> {
    fn new(space: &Space<ElT>, direction: HopDirection) -> Option<Self> {
        let transform = space.transform()?;
        let (rows, cols) = match direction {
            HopDirection::ToTarget => (transform.shape()[0], transform.shape()[1]),
            HopDirection::ToRoot => (transform.shape()[1], transform.shape()[0]),
        };
        Some(Self {
            space: space.clone(),
            direction,
            rows,
            cols,
        })
    }

    pub fn space(&self) -> &Space<ElT> {
        &self.space
    }

    pub fn direction(&self) -> HopDirection {
        self.direction
    }

    /// Extent of the mode before the hop.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Extent of the mode after the hop.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The stored transform `C`; the direction says which index is contracted.
    pub fn matrix(&self) -> Option<&DenseTensor<ElT>> {
        self.space.transform()
    }
}

impl<ElT: Scalar> Space<ElT> {
    /// This space followed by its ancestors, ending at the identity root.
    pub fn ancestors(&self) -> Vec<Space<ElT>> {
        let mut out = vec![self.clone()];
        let mut current = self;
        while let Some(parent) = current.parent() {
            out.push(parent.clone());
            current = parent;
        }
        out
    }

    /// The identity space at the bottom of the chain.
    pub fn root(&self) -> Space<ElT> {
        let mut current = self;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current.clone()
    }

    /// Number of basis changes between the root and this space.
    ///
    /// ```
    /// use orbspace::{DenseTensor, Space};
    ///
    /// let ao = Space::<f64>::identity(3);
    /// let mo = Space::derived(DenseTensor::ones(&[3, 2]), &ao).unwrap();
    /// assert_eq!(ao.distance(), 0);
    /// assert_eq!(mo.distance(), 1);
    /// ```
    pub fn distance(&self) -> usize {
        let mut n = 0;
        let mut current = self;
        while let Some(parent) = current.parent() {
            n += 1;
            current = parent;
        }
        n
    }

    /// Hops leading from the root to this space.
    pub fn chain(&self) -> Vec<Hop<ElT>> {
        self.ancestors()
            .iter()
            .rev()
            .filter_map(|s| Hop::new(s, HopDirection::ToTarget))
            .collect()
    }
}

/// Hops taking a mode from `current` to `target`.
///
/// Climbs from `current` to the deepest ancestor shared with `target`, then
/// descends to `target`. Returns `None` when the two spaces hang off
/// different roots.
pub fn path<ElT: Scalar>(current: &Space<ElT>, target: &Space<ElT>) -> Option<Vec<Hop<ElT>>> {
    if current == target {
        return Some(Vec::new());
    }

    let up = current.ancestors();
    let down = target.ancestors();

    let (i, j) = up
        .iter()
        .enumerate()
        .find_map(|(i, a)| down.iter().position(|b| a == b).map(|j| (i, j)))?;

    let climb = up[..i]
        .iter()
        .filter_map(|s| Hop::new(s, HopDirection::ToRoot));
    let descend = down[..j]
        .iter()
        .rev()
        .filter_map(|s| Hop::new(s, HopDirection::ToTarget));
    Some(climb.chain(descend).collect())
}
