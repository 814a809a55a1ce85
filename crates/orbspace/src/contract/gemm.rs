//! GEMM-based contraction using faer.
//!
//! Operands are permuted into matrix form only when their modes are out of
//! GEMM order, multiplied with faer's matmul, and the product's modes are
//! sorted by label.

use std::borrow::Cow;

use faer::linalg::matmul::matmul;
use faer::{Accum, Par};

use crate::backend::AsFaerMat;
use crate::contract::properties::ContractionProperties;
use crate::error::TensorError;
use crate::operations::permutedims;
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;

/// Contract two tensors with a sequential GEMM.
///
/// Same labels and output ordering as [`contract`](super::contract).
///
/// ```
/// use orbspace::Tensor;
/// use orbspace::contract::contract_gemm;
///
/// let a = Tensor::<f64>::ones(&[2, 3]);
/// let b = Tensor::<f64>::ones(&[3, 4]);
///
/// let c = contract_gemm(&a, &[1, -1], &b, &[-1, 2]).unwrap();
/// assert_eq!(c.shape(), &[2, 4]);
/// ```
pub fn contract_gemm<ElT: Scalar>(
    a: &DenseTensor<ElT>,
    labels_a: &[i32],
    b: &DenseTensor<ElT>,
    labels_b: &[i32],
) -> Result<DenseTensor<ElT>, TensorError> {
    contract_gemm_with_par(a, labels_a, b, labels_b, Par::Seq)
}

/// Contract two tensors with a GEMM running under the given parallelism.
pub fn contract_gemm_with_par<ElT: Scalar>(
    a: &DenseTensor<ElT>,
    labels_a: &[i32],
    b: &DenseTensor<ElT>,
    labels_b: &[i32],
    par: Par,
) -> Result<DenseTensor<ElT>, TensorError> {
    super::validate_labels(a, labels_a, b, labels_b)?;

    let props = ContractionProperties::compute(labels_a, a.shape(), labels_b, b.shape());
    let (m, k, n) = (props.dleft, props.dmid, props.dright);

    let a_mat = gemm_operand(a, &props.perm_a, props.permute_a)?;
    let b_mat = gemm_operand(b, &props.perm_b, props.permute_b)?;

    // a full contraction is the 1 x 1 case; an outer product has k == 1
    let mut c = DenseTensor::<ElT>::zeros(&[m, n]);
    matmul(
        c.as_faer_mat_mut(m, n)?,
        Accum::Replace,
        a_mat.as_faer_mat(m, k)?,
        b_mat.as_faer_mat(k, n)?,
        ElT::one(),
        par,
    );

    let unsorted = props.unsorted_output_shape(a.shape(), b.shape());
    if unsorted.is_empty() {
        return DenseTensor::from_vec(c.into_vec(), &[1]);
    }
    let c = c.reshape(&unsorted)?;
    if props.permute_c {
        permutedims(&c, &props.perm_c)
    } else {
        Ok(c)
    }
}

/// The operand in GEMM order, borrowed when no permutation is needed.
fn gemm_operand<'a, ElT: Scalar>(
    t: &'a DenseTensor<ElT>,
    perm: &[usize],
    permute: bool,
) -> Result<Cow<'a, DenseTensor<ElT>>, TensorError> {
    if permute {
        permutedims(t, perm).map(Cow::Owned)
    } else {
        Ok(Cow::Borrowed(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::contract;
    use crate::scalar::c64;
    use approx::assert_relative_eq;

    fn assert_matches_naive(
        a: &DenseTensor<f64>,
        labels_a: &[i32],
        b: &DenseTensor<f64>,
        labels_b: &[i32],
    ) {
        let c_gemm = contract_gemm(a, labels_a, b, labels_b).unwrap();
        let c_naive = contract(a, labels_a, b, labels_b).unwrap();
        assert_eq!(c_gemm.shape(), c_naive.shape());
        for (g, n) in c_gemm.data().iter().zip(c_naive.data()) {
            assert_relative_eq!(*g, *n, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_gemm_matrix_multiply() {
        let a = DenseTensor::from_fn(&[2, 3], |idx| (1 + idx[0] + 2 * idx[1]) as f64);
        let b = DenseTensor::from_fn(&[3, 4], |idx| (1 + idx[0] + 3 * idx[1]) as f64);
        assert_matches_naive(&a, &[1, -1], &b, &[-1, 2]);
    }

    #[test]
    fn test_gemm_inner_product() {
        let a = DenseTensor::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
        let b = DenseTensor::from_vec(vec![4.0, 5.0, 6.0], &[3]).unwrap();

        let c = contract_gemm(&a, &[-1], &b, &[-1]).unwrap();
        assert_relative_eq!(*c.get_linear(0).unwrap(), 32.0);
    }

    #[test]
    fn test_gemm_outer_product() {
        let a = DenseTensor::from_vec(vec![1.0, 2.0], &[2]).unwrap();
        let b = DenseTensor::from_vec(vec![3.0, 4.0, 5.0], &[3]).unwrap();
        assert_matches_naive(&a, &[1], &b, &[2]);
    }

    #[test]
    fn test_gemm_middle_mode() {
        // transform the middle mode of a rank-3 tensor: [2,4,5] x [4,3] -> [2,3,5]
        let t = DenseTensor::from_fn(&[2, 4, 5], |idx| (idx[0] + 3 * idx[1] + 7 * idx[2]) as f64);
        let c = DenseTensor::from_fn(&[4, 3], |idx| 0.1 * (1 + idx[0] + idx[1]) as f64);

        let r = contract_gemm(&t, &[1, -1, 3], &c, &[-1, 2]).unwrap();
        assert_eq!(r.shape(), &[2, 3, 5]);
        assert_matches_naive(&t, &[1, -1, 3], &c, &[-1, 2]);
    }

    #[test]
    fn test_gemm_back_transform() {
        // contract with the column index of the matrix: [2,3] x [4,3] -> [2,4]
        let t = DenseTensor::from_fn(&[2, 3], |idx| (idx[0] * 3 + idx[1]) as f64);
        let c = DenseTensor::from_fn(&[4, 3], |idx| (idx[0] + idx[1]) as f64);
        assert_matches_naive(&t, &[1, -1], &c, &[2, -1]);
    }

    #[test]
    fn test_gemm_parallel_agrees() {
        let t = DenseTensor::from_fn(&[6, 5, 4], |idx| (idx[0] * idx[1] + idx[2]) as f64);
        let c = DenseTensor::from_fn(&[5, 7], |idx| (idx[0] as f64 - idx[1] as f64) * 0.5);

        let seq = contract_gemm(&t, &[1, -1, 3], &c, &[-1, 2]).unwrap();
        let par = contract_gemm_with_par(&t, &[1, -1, 3], &c, &[-1, 2], Par::rayon(2)).unwrap();
        for (s, p) in seq.data().iter().zip(par.data()) {
            assert_relative_eq!(*s, *p, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_gemm_dimension_mismatch() {
        let a = DenseTensor::<f64>::ones(&[2, 3]);
        let b = DenseTensor::<f64>::ones(&[4, 5]);
        assert!(contract_gemm(&a, &[1, -1], &b, &[-1, 2]).is_err());
    }

    #[test]
    fn test_gemm_complex() {
        let a = DenseTensor::from_vec(
            vec![
                c64::new(1.0, 0.0),
                c64::new(2.0, 0.0),
                c64::new(3.0, 0.0),
                c64::new(4.0, 0.0),
            ],
            &[2, 2],
        )
        .unwrap();
        let b = DenseTensor::from_vec(
            vec![
                c64::new(1.0, 0.0),
                c64::new(0.0, 1.0),
                c64::new(0.0, -1.0),
                c64::new(1.0, 0.0),
            ],
            &[2, 2],
        )
        .unwrap();

        let c_gemm = contract_gemm(&a, &[1, -1], &b, &[-1, 2]).unwrap();
        let c_naive = contract(&a, &[1, -1], &b, &[-1, 2]).unwrap();

        for (g, n) in c_gemm.data().iter().zip(c_naive.data()) {
            assert_relative_eq!(g.re, n.re, epsilon = 1e-10);
            assert_relative_eq!(g.im, n.im, epsilon = 1e-10);
        }
    }
}
