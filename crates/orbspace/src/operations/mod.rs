//! Tensor operations used by the contraction paths.

mod permutedims;

pub use permutedims::permutedims;
