//! Error types for orbspace.
//!
//! Two layers, mirroring the two halves of the crate:
//! - [`TensorError`] for the dense tensor core (storage, permutation, contraction)
//! - [`SpaceError`] for space construction and basis transformations

use thiserror::Error;

/// Errors raised by the dense tensor core.
#[derive(Debug, Error)]
pub enum TensorError {
    /// Shape mismatch between data length and expected size.
    #[error("shape mismatch: expected {expected} elements, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Index out of bounds.
    #[error("index out of bounds: index {index} is out of range for dimension {dim_size}")]
    IndexOutOfBounds { index: usize, dim_size: usize },

    /// Wrong number of indices provided.
    #[error("wrong number of indices: expected {expected}, got {actual}")]
    WrongNumberOfIndices { expected: usize, actual: usize },

    /// Invalid permutation.
    #[error("invalid permutation {perm:?} for tensor with {ndim} dimensions")]
    InvalidPermutation { perm: Vec<usize>, ndim: usize },

    /// Operation requires specific tensor rank.
    #[error("expected tensor of rank {expected}, got rank {actual}")]
    RankMismatch { expected: usize, actual: usize },
}

/// Errors raised while building spaces or transforming tensors between them.
///
/// Every variant except [`SpaceError::Tensor`] is reported before the first
/// contraction of a transform is issued.
#[derive(Debug, Error)]
pub enum SpaceError {
    /// The transform's row count does not match the parent's dimension.
    #[error("invalid transform: {rows} rows cannot act on a parent space of dimension {parent_dim}")]
    InvalidTransform { rows: usize, parent_dim: usize },

    /// The target space does not share an identity root with the current space.
    #[error("target space for mode {mode} is not reachable from its current space")]
    UnreachableTarget { mode: usize },

    /// A mode index is not smaller than the tensor rank.
    #[error("mode {mode} is out of range for a tensor of rank {rank}")]
    ModeOutOfRange { mode: usize, rank: usize },

    /// A hierarchical transform would collapse more inner modes than supported.
    #[error("unsupported collapse: {reason}")]
    UnsupportedCollapse { reason: String },

    /// The declared current space does not match the tensor's extent.
    #[error("mode {mode} has extent {actual}, but its current space has dimension {expected}")]
    ExtentMismatch {
        mode: usize,
        expected: usize,
        actual: usize,
    },

    /// The same mode was requested more than once.
    #[error("mode {mode} appears more than once in the request")]
    DuplicateMode { mode: usize },

    /// Current and target space lists have different lengths.
    #[error("got {current} current spaces but {target} target spaces")]
    WrongNumberOfSpaces { current: usize, target: usize },

    /// Transform and tensor of a hierarchical transform disagree on the outer rank.
    #[error("independent rank mismatch: transform has {transform}, tensor has {tensor}")]
    IndependentRankMismatch { transform: usize, tensor: usize },

    /// Two derived spaces were combined although they hang off different parents.
    #[error("derived spaces must share the same parent space")]
    ParentMismatch,

    /// Orbital energies do not match the space dimension.
    #[error("expected {expected} orbital energies, got {actual}")]
    InvalidEnergies { expected: usize, actual: usize },

    /// An operation that needs a transform was called on an identity space.
    #[error("operation requires a derived space")]
    NotDerived,

    /// A backend operation failed.
    #[error(transparent)]
    Tensor(#[from] TensorError),
}
