//! Random tensors for tests and demos.
//!
//! Coefficient matrices and test tensors are drawn element by element; pass a
//! seeded RNG (`StdRng::seed_from_u64`) for reproducible data.

use rand::Rng;
use rand::distr::StandardUniform;
use rand_distr::StandardNormal;

use crate::scalar::{Scalar, c64};
use crate::tensor::Tensor;

/// Scalars that can be drawn from a uniform or a normal distribution.
pub trait SampleScalar: Scalar {
    /// Uniform on [0, 1); complex values sample both parts independently.
    fn uniform<R: Rng>(rng: &mut R) -> Self;

    /// Standard normal; complex values have `E|z|^2 = 1`.
    fn normal<R: Rng>(rng: &mut R) -> Self;
}

impl SampleScalar for f64 {
    fn uniform<R: Rng>(rng: &mut R) -> Self {
        rng.sample(StandardUniform)
    }

    fn normal<R: Rng>(rng: &mut R) -> Self {
        rng.sample(StandardNormal)
    }
}

impl SampleScalar for c64 {
    fn uniform<R: Rng>(rng: &mut R) -> Self {
        c64::new(f64::uniform(rng), f64::uniform(rng))
    }

    fn normal<R: Rng>(rng: &mut R) -> Self {
        let scale = std::f64::consts::FRAC_1_SQRT_2;
        c64::new(f64::normal(rng) * scale, f64::normal(rng) * scale)
    }
}

impl<ElT: SampleScalar> Tensor<ElT> {
    /// Uniform random values in [0, 1) from the thread RNG.
    ///
    /// ```
    /// use orbspace::Tensor;
    ///
    /// let t: Tensor<f64> = Tensor::random(&[2, 3]);
    /// assert!(t.data().iter().all(|v| (0.0..1.0).contains(v)));
    /// ```
    pub fn random(shape: &[usize]) -> Self {
        Self::random_with_rng(shape, &mut rand::rng())
    }

    /// Uniform random values drawn from `rng`.
    pub fn random_with_rng<R: Rng>(shape: &[usize], rng: &mut R) -> Self {
        Self::from_fn(shape, |_| ElT::uniform(rng))
    }

    /// Standard normal values from the thread RNG.
    pub fn randn(shape: &[usize]) -> Self {
        Self::randn_with_rng(shape, &mut rand::rng())
    }

    /// Standard normal values drawn from `rng`.
    ///
    /// ```
    /// use orbspace::Tensor;
    /// use rand::SeedableRng;
    /// use rand::rngs::StdRng;
    ///
    /// let a: Tensor<f64> = Tensor::randn_with_rng(&[3, 2], &mut StdRng::seed_from_u64(42));
    /// let b: Tensor<f64> = Tensor::randn_with_rng(&[3, 2], &mut StdRng::seed_from_u64(42));
    /// assert_eq!(a, b);
    /// ```
    pub fn randn_with_rng<R: Rng>(shape: &[usize], rng: &mut R) -> Self {
        Self::from_fn(shape, |_| ElT::normal(rng))
    }
}
