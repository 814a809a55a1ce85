//! Orbital spaces as chains of basis changes.
//!
//! ```text
//! Identity (AO, dim n0)
//!   └── Derived  C1: n0 x n1
//!         └── Derived  C2: n1 x n2
//! ```
//!
//! A [`Space`] is a cheap-to-clone handle. Children hold a handle to their
//! parent, so a parent always exists before its child and the chain always
//! ends at exactly one identity leaf.
//!
//! Overlap and density matrices are computed on first use and cached.

mod chain;

pub use chain::{Hop, HopDirection, path};

use std::sync::{Arc, OnceLock};

use tracing::trace;

use crate::contract::contract_gemm;
use crate::error::{SpaceError, TensorError};
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;

/// What a space is made of.
#[derive(Debug, Clone, PartialEq)]
pub enum SpaceKind<ElT: Scalar> {
    /// The root of every chain; basis functions are used as-is.
    Identity {
        dim: usize,
        overlap: Option<DenseTensor<ElT>>,
    },
    /// A space spanned by the columns of `transform` expressed in `parent`.
    Derived {
        transform: DenseTensor<ElT>,
        conjugate: Option<DenseTensor<ElT>>,
        parent: Space<ElT>,
    },
}

/// Extra structure a derived space may carry.
#[derive(Debug, Clone, PartialEq)]
pub enum Flavor<ElT: Scalar> {
    General,
    /// Orthonormal columns; the overlap is the unit matrix.
    Orthogonal,
    /// Orthonormal columns diagonalizing a Fock-like operator.
    Canonical { energies: Vec<<ElT as Scalar>::Real> },
}

#[derive(Debug, Clone)]
struct SpaceInner<ElT: Scalar> {
    kind: SpaceKind<ElT>,
    flavor: Flavor<ElT>,
    overlap: OnceLock<DenseTensor<ElT>>,
    density: OnceLock<DenseTensor<ElT>>,
}

/// Shared handle to an identity or derived space.
#[derive(Debug, Clone)]
pub struct Space<ElT: Scalar> {
    inner: Arc<SpaceInner<ElT>>,
}

impl<ElT: Scalar> Space<ElT> {
    fn from_parts(kind: SpaceKind<ElT>, flavor: Flavor<ElT>) -> Self {
        Self {
            inner: Arc::new(SpaceInner {
                kind,
                flavor,
                overlap: OnceLock::new(),
                density: OnceLock::new(),
            }),
        }
    }

    /// An identity space of `dim` basis functions with a unit overlap.
    ///
    /// ```
    /// use orbspace::Space;
    ///
    /// let ao = Space::<f64>::identity(4);
    /// assert_eq!(ao.dimension(), 4);
    /// assert!(ao.is_identity());
    /// ```
    pub fn identity(dim: usize) -> Self {
        Self::from_parts(SpaceKind::Identity { dim, overlap: None }, Flavor::General)
    }

    /// An identity space whose overlap matrix is supplied by the caller.
    ///
    /// # Errors
    ///
    /// Returns `SpaceError::Tensor` if `overlap` is not a square matrix.
    pub fn identity_with_overlap(overlap: DenseTensor<ElT>) -> Result<Self, SpaceError> {
        let dim = square_dim(&overlap)?;
        Ok(Self::from_parts(
            SpaceKind::Identity {
                dim,
                overlap: Some(overlap),
            },
            Flavor::General,
        ))
    }

    /// A space spanned by the columns of `transform`, expressed in `parent`.
    ///
    /// # Errors
    ///
    /// Returns `SpaceError::InvalidTransform` if the number of rows differs
    /// from the parent's dimension.
    ///
    /// ```
    /// use orbspace::{DenseTensor, Space, SpaceError};
    ///
    /// let ao = Space::identity(4);
    /// let mo = Space::derived(DenseTensor::<f64>::ones(&[4, 2]), &ao).unwrap();
    /// assert_eq!(mo.dimension(), 2);
    ///
    /// let bad = Space::derived(DenseTensor::<f64>::ones(&[5, 3]), &ao);
    /// assert!(matches!(bad, Err(SpaceError::InvalidTransform { rows: 5, parent_dim: 4 })));
    /// ```
    pub fn derived(transform: DenseTensor<ElT>, parent: &Space<ElT>) -> Result<Self, SpaceError> {
        Self::build_derived(transform, None, parent, Flavor::General)
    }

    /// A derived space with an explicit conjugate transform `C†`.
    ///
    /// `conjugate` must be `cols x rows` of `transform`.
    pub fn derived_with_conjugate(
        transform: DenseTensor<ElT>,
        conjugate: DenseTensor<ElT>,
        parent: &Space<ElT>,
    ) -> Result<Self, SpaceError> {
        Self::build_derived(transform, Some(conjugate), parent, Flavor::General)
    }

    /// A derived space whose columns are orthonormal.
    pub fn orthogonal(transform: DenseTensor<ElT>, parent: &Space<ElT>) -> Result<Self, SpaceError> {
        Self::build_derived(transform, None, parent, Flavor::Orthogonal)
    }

    /// A canonical molecular-orbital space with one energy per orbital.
    ///
    /// # Errors
    ///
    /// Returns `SpaceError::InvalidEnergies` if `energies.len()` differs from
    /// the number of columns of `transform`.
    pub fn canonical(
        energies: Vec<<ElT as Scalar>::Real>,
        transform: DenseTensor<ElT>,
        parent: &Space<ElT>,
    ) -> Result<Self, SpaceError> {
        Self::build_derived(transform, None, parent, Flavor::Canonical { energies })
    }

    fn build_derived(
        transform: DenseTensor<ElT>,
        conjugate: Option<DenseTensor<ElT>>,
        parent: &Space<ElT>,
        flavor: Flavor<ElT>,
    ) -> Result<Self, SpaceError> {
        validate_transform(&transform, parent.dimension())?;
        if let Some(conj) = &conjugate {
            validate_conjugate(conj, &transform)?;
        }
        validate_flavor(&flavor, transform.shape()[1])?;
        Ok(Self::from_parts(
            SpaceKind::Derived {
                transform,
                conjugate,
                parent: parent.clone(),
            },
            flavor,
        ))
    }

    pub fn kind(&self) -> &SpaceKind<ElT> {
        &self.inner.kind
    }

    pub fn flavor(&self) -> &Flavor<ElT> {
        &self.inner.flavor
    }

    pub fn is_identity(&self) -> bool {
        matches!(self.inner.kind, SpaceKind::Identity { .. })
    }

    /// Number of basis functions.
    pub fn dimension(&self) -> usize {
        match &self.inner.kind {
            SpaceKind::Identity { dim, .. } => *dim,
            SpaceKind::Derived { transform, .. } => transform.shape()[1],
        }
    }

    /// The change-of-basis matrix, `None` for an identity space.
    pub fn transform(&self) -> Option<&DenseTensor<ElT>> {
        match &self.inner.kind {
            SpaceKind::Identity { .. } => None,
            SpaceKind::Derived { transform, .. } => Some(transform),
        }
    }

    pub fn parent(&self) -> Option<&Space<ElT>> {
        match &self.inner.kind {
            SpaceKind::Identity { .. } => None,
            SpaceKind::Derived { parent, .. } => Some(parent),
        }
    }

    /// Orbital energies of a canonical space.
    pub fn energies(&self) -> Option<&[<ElT as Scalar>::Real]> {
        match &self.inner.flavor {
            Flavor::Canonical { energies } => Some(energies),
            _ => None,
        }
    }

    /// The conjugate transform `C†`; the transpose of `C` unless supplied.
    ///
    /// # Errors
    ///
    /// Returns `SpaceError::NotDerived` for an identity space.
    pub fn conjugate_transform(&self) -> Result<DenseTensor<ElT>, SpaceError> {
        match &self.inner.kind {
            SpaceKind::Identity { .. } => Err(SpaceError::NotDerived),
            SpaceKind::Derived {
                conjugate: Some(conj),
                ..
            } => Ok(conj.clone()),
            SpaceKind::Derived { transform, .. } => Ok(transform.transpose()?),
        }
    }

    /// Overlap matrix of the space's basis functions.
    ///
    /// Identity spaces report the supplied overlap or the unit matrix.
    /// Orthogonal and canonical spaces report the unit matrix. Otherwise
    /// `Cᵀ S C` with `S` the parent's overlap.
    pub fn overlap(&self) -> Result<&DenseTensor<ElT>, SpaceError> {
        if let Some(s) = self.inner.overlap.get() {
            return Ok(s);
        }
        let value = match (&self.inner.kind, &self.inner.flavor) {
            (SpaceKind::Identity { overlap: Some(s), .. }, _) => s.clone(),
            (SpaceKind::Identity { dim, .. }, _) => DenseTensor::identity(*dim),
            (SpaceKind::Derived { .. }, Flavor::Orthogonal | Flavor::Canonical { .. }) => {
                DenseTensor::identity(self.dimension())
            }
            (SpaceKind::Derived { transform, parent, .. }, Flavor::General) => {
                trace!(dim = self.dimension(), "computing derived overlap");
                let sc = contract_gemm(parent.overlap()?, &[1, -1], transform, &[-1, 2])?;
                contract_gemm(transform, &[-1, 1], &sc, &[-1, 2])?
            }
        };
        Ok(self.inner.overlap.get_or_init(move || value))
    }

    /// Density matrix `C C†`, expressed in the parent space.
    ///
    /// An identity space reports the unit matrix.
    pub fn density(&self) -> Result<&DenseTensor<ElT>, SpaceError> {
        if let Some(d) = self.inner.density.get() {
            return Ok(d);
        }
        let value = match &self.inner.kind {
            SpaceKind::Identity { dim, .. } => DenseTensor::identity(*dim),
            SpaceKind::Derived { transform, .. } => {
                let conj = self.conjugate_transform()?;
                contract_gemm(transform, &[1, -1], &conj, &[-1, 2])?
            }
        };
        Ok(self.inner.density.get_or_init(move || value))
    }

    /// Replace the change-of-basis matrix.
    ///
    /// Clears the cached overlap and density and drops an explicit conjugate
    /// transform. Spaces already built on top of this handle keep the old
    /// matrix.
    ///
    /// # Errors
    ///
    /// Returns `SpaceError::NotDerived` on an identity space and
    /// `SpaceError::InvalidTransform` if the row count no longer matches the
    /// parent.
    pub fn set_transform(&mut self, new_transform: DenseTensor<ElT>) -> Result<(), SpaceError> {
        let parent_dim = match &self.inner.kind {
            SpaceKind::Identity { .. } => return Err(SpaceError::NotDerived),
            SpaceKind::Derived { parent, .. } => parent.dimension(),
        };
        validate_transform(&new_transform, parent_dim)?;
        validate_flavor(&self.inner.flavor, new_transform.shape()[1])?;

        let inner = Arc::make_mut(&mut self.inner);
        if let SpaceKind::Derived {
            transform,
            conjugate,
            ..
        } = &mut inner.kind
        {
            *transform = new_transform;
            *conjugate = None;
        }
        inner.overlap = OnceLock::new();
        inner.density = OnceLock::new();
        Ok(())
    }

    /// Append the columns of `other` to this space's columns.
    ///
    /// The result is a general derived space over the shared parent. No
    /// attempt is made to remove linearly dependent columns.
    ///
    /// # Errors
    ///
    /// Returns `SpaceError::NotDerived` if either space is an identity space
    /// and `SpaceError::ParentMismatch` if the parents differ.
    pub fn concat(&self, other: &Space<ElT>) -> Result<Space<ElT>, SpaceError> {
        let (Some(lhs), Some(rhs)) = (self.transform(), other.transform()) else {
            return Err(SpaceError::NotDerived);
        };
        let (Some(parent), Some(other_parent)) = (self.parent(), other.parent()) else {
            return Err(SpaceError::NotDerived);
        };
        if parent != other_parent {
            return Err(SpaceError::ParentMismatch);
        }

        let rows = lhs.shape()[0];
        let cols = lhs.shape()[1] + rhs.shape()[1];
        // column-major: appending columns is appending data
        let mut data = Vec::with_capacity(rows * cols);
        data.extend_from_slice(lhs.data());
        data.extend_from_slice(rhs.data());
        Space::derived(DenseTensor::from_vec(data, &[rows, cols])?, parent)
    }

    /// True if both handles point at the same allocation.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

/// Derived spaces compare structurally. Identity roots carry no basis label,
/// so two roots are only equal when they share an allocation.
impl<ElT: Scalar> PartialEq for Space<ElT> {
    fn eq(&self, other: &Self) -> bool {
        if Self::ptr_eq(self, other) {
            return true;
        }
        if self.is_identity() || other.is_identity() {
            return false;
        }
        self.inner.flavor == other.inner.flavor && self.inner.kind == other.inner.kind
    }
}

fn square_dim<ElT: Scalar>(matrix: &DenseTensor<ElT>) -> Result<usize, TensorError> {
    match matrix.shape() {
        [n, m] if n == m => Ok(*n),
        [n, m] => Err(TensorError::ShapeMismatch {
            expected: n * n,
            actual: n * m,
        }),
        shape => Err(TensorError::RankMismatch {
            expected: 2,
            actual: shape.len(),
        }),
    }
}

fn validate_transform<ElT: Scalar>(
    transform: &DenseTensor<ElT>,
    parent_dim: usize,
) -> Result<(), SpaceError> {
    if transform.ndim() != 2 {
        return Err(TensorError::RankMismatch {
            expected: 2,
            actual: transform.ndim(),
        }
        .into());
    }
    let rows = transform.shape()[0];
    if rows != parent_dim {
        return Err(SpaceError::InvalidTransform { rows, parent_dim });
    }
    Ok(())
}

fn validate_conjugate<ElT: Scalar>(
    conjugate: &DenseTensor<ElT>,
    transform: &DenseTensor<ElT>,
) -> Result<(), SpaceError> {
    let expected = [transform.shape()[1], transform.shape()[0]];
    if conjugate.shape() != expected {
        return Err(TensorError::ShapeMismatch {
            expected: expected[0] * expected[1],
            actual: conjugate.len(),
        }
        .into());
    }
    Ok(())
}

fn validate_flavor<ElT: Scalar>(flavor: &Flavor<ElT>, dim: usize) -> Result<(), SpaceError> {
    if let Flavor::Canonical { energies } = flavor {
        if energies.len() != dim {
            return Err(SpaceError::InvalidEnergies {
                expected: dim,
                actual: energies.len(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn c22() -> DenseTensor<f64> {
        DenseTensor::from_rows(&[vec![0.12, 0.23], vec![0.34, 0.45]]).unwrap()
    }

    fn c23() -> DenseTensor<f64> {
        DenseTensor::from_rows(&[vec![0.12, 0.23, 0.45], vec![0.56, 0.67, 0.78]]).unwrap()
    }

    #[test]
    fn test_identity() {
        let ao = Space::<f64>::identity(3);
        assert!(ao.is_identity());
        assert!(ao.transform().is_none());
        assert!(ao.parent().is_none());
        assert_eq!(ao.overlap().unwrap(), &DenseTensor::identity(3));
        assert!(matches!(ao.conjugate_transform(), Err(SpaceError::NotDerived)));
    }

    #[test]
    fn test_identity_with_overlap() {
        let s = DenseTensor::from_rows(&[vec![1.0, 0.5], vec![0.5, 1.0]]).unwrap();
        let ao = Space::identity_with_overlap(s.clone()).unwrap();
        assert_eq!(ao.dimension(), 2);
        assert_eq!(ao.overlap().unwrap(), &s);

        assert!(Space::identity_with_overlap(DenseTensor::<f64>::ones(&[2, 3])).is_err());
    }

    #[test]
    fn test_derived_rejects_wrong_rows() {
        let ao = Space::identity(4);
        let err = Space::derived(DenseTensor::<f64>::ones(&[5, 3]), &ao).unwrap_err();
        assert!(matches!(
            err,
            SpaceError::InvalidTransform {
                rows: 5,
                parent_dim: 4
            }
        ));
    }

    #[test]
    fn test_derived_overlap() {
        let s = DenseTensor::from_rows(&[vec![1.0, 0.25], vec![0.25, 1.0]]).unwrap();
        let ao = Space::identity_with_overlap(s.clone()).unwrap();
        let c = c23();
        let mo = Space::derived(c.clone(), &ao).unwrap();

        let overlap = mo.overlap().unwrap();
        assert_eq!(overlap.shape(), &[3, 3]);
        for a in 0..3 {
            for b in 0..3 {
                let mut expected = 0.0;
                for i in 0..2 {
                    for j in 0..2 {
                        expected += c.get(&[i, a]).unwrap()
                            * s.get(&[i, j]).unwrap()
                            * c.get(&[j, b]).unwrap();
                    }
                }
                assert_relative_eq!(*overlap.get(&[a, b]).unwrap(), expected, epsilon = 1e-12);
            }
        }
        // second call hits the cache
        assert!(std::ptr::eq(overlap, mo.overlap().unwrap()));
    }

    #[test]
    fn test_orthogonal_overlap_is_unit() {
        let ao = Space::identity(2);
        let mo = Space::orthogonal(c22(), &ao).unwrap();
        assert_eq!(mo.overlap().unwrap(), &DenseTensor::identity(2));
    }

    #[test]
    fn test_canonical_energies() {
        let ao = Space::identity(2);
        let mo = Space::canonical(vec![-0.5, 0.25, 1.0], c23(), &ao).unwrap();
        assert_eq!(mo.energies(), Some(&[-0.5, 0.25, 1.0][..]));
        assert_eq!(mo.overlap().unwrap(), &DenseTensor::identity(3));

        let err = Space::canonical(vec![-0.5], c23(), &ao).unwrap_err();
        assert!(matches!(
            err,
            SpaceError::InvalidEnergies {
                expected: 3,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_density_default_conjugate() {
        let ao = Space::identity(2);
        let c = c23();
        let mo = Space::derived(c.clone(), &ao).unwrap();
        let d = mo.density().unwrap();
        assert_eq!(d.shape(), &[2, 2]);
        for i in 0..2 {
            for j in 0..2 {
                let expected: f64 = (0..3)
                    .map(|a| c.get(&[i, a]).unwrap() * c.get(&[j, a]).unwrap())
                    .sum();
                assert_relative_eq!(*d.get(&[i, j]).unwrap(), expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_density_explicit_conjugate() {
        let ao = Space::identity(2);
        let c = c22();
        let conj = DenseTensor::<f64>::identity(2);
        let mo = Space::derived_with_conjugate(c.clone(), conj.clone(), &ao).unwrap();
        assert_eq!(mo.conjugate_transform().unwrap(), conj);
        assert_eq!(mo.density().unwrap(), &c);

        let bad = Space::derived_with_conjugate(c, DenseTensor::ones(&[3, 2]), &ao);
        assert!(bad.is_err());
    }

    #[test]
    fn test_set_transform_resets_caches() {
        let ao = Space::identity(2);
        let mut mo = Space::derived(c22(), &ao).unwrap();
        let child = Space::derived(DenseTensor::<f64>::ones(&[2, 1]), &mo).unwrap();
        let before = mo.overlap().unwrap().clone();

        mo.set_transform(c23()).unwrap();
        assert_eq!(mo.dimension(), 3);
        assert_ne!(mo.overlap().unwrap().shape(), before.shape());

        // the child still sees the old parent
        assert_eq!(child.parent().unwrap().dimension(), 2);
        assert_eq!(child.parent().unwrap().transform(), Some(&c22()));

        assert!(matches!(
            mo.set_transform(DenseTensor::ones(&[3, 3])),
            Err(SpaceError::InvalidTransform { .. })
        ));
        let mut root = Space::<f64>::identity(2);
        assert!(matches!(
            root.set_transform(c22()),
            Err(SpaceError::NotDerived)
        ));
    }

    #[test]
    fn test_concat() {
        let ao = Space::identity(2);
        let occ = Space::derived(c22(), &ao).unwrap();
        let virt = Space::derived(c23(), &ao).unwrap();

        let all = occ.concat(&virt).unwrap();
        assert_eq!(all.dimension(), 5);
        let t = all.transform().unwrap();
        assert_eq!(t.get(&[1, 1]), Some(&0.45));
        assert_eq!(t.get(&[1, 2]), Some(&0.56));
        assert_eq!(all.parent(), Some(&ao));

        let other_ao = Space::identity(3);
        let elsewhere = Space::derived(DenseTensor::ones(&[3, 1]), &other_ao).unwrap();
        assert!(matches!(occ.concat(&elsewhere), Err(SpaceError::ParentMismatch)));
        assert!(matches!(occ.concat(&ao), Err(SpaceError::NotDerived)));
    }

    #[test]
    fn test_structural_equality() {
        let ao = Space::<f64>::identity(2);
        let a = Space::derived(c22(), &ao).unwrap();
        let b = Space::derived(c22(), &ao).unwrap();
        let c = Space::orthogonal(c22(), &ao).unwrap();

        assert!(!Space::ptr_eq(&a, &b));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, Space::derived(c23(), &ao).unwrap());
    }

    #[test]
    fn test_separate_roots_are_distinct() {
        let ao = Space::<f64>::identity(2);
        let other = Space::<f64>::identity(2);
        assert_eq!(ao, ao.clone());
        assert_ne!(ao, other);

        // same matrix, different chains
        let a = Space::derived(c22(), &ao).unwrap();
        let b = Space::derived(c22(), &other).unwrap();
        assert_ne!(a, b);
        assert!(path(&a, &b).is_none());
    }

    #[test]
    fn test_space_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Space<f64>>();
        assert_send_sync::<Space<crate::scalar::c64>>();
    }

    #[test]
    fn test_caches_shared_across_threads() {
        let s = DenseTensor::from_rows(&[vec![1.0, 0.25], vec![0.25, 1.0]]).unwrap();
        let ao = Space::identity_with_overlap(s).unwrap();
        let mo = Space::derived(c23(), &ao).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let mo = mo.clone();
                std::thread::spawn(move || {
                    let overlap = mo.overlap().unwrap().clone();
                    let density = mo.density().unwrap().clone();
                    (overlap, density)
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // every thread sees the value left in the shared cache
        for (overlap, density) in &results {
            assert_eq!(overlap, mo.overlap().unwrap());
            assert_eq!(density, mo.density().unwrap());
        }
    }
}
