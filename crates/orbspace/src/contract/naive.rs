//! Loop-based contraction.
//!
//! Slow but obviously correct; the GEMM path is tested against it.

use crate::contract::properties::ContractionProperties;
use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::strides::{for_each_index, offset};
use crate::tensor::Tensor;

/// Contract two tensors using label-based contraction.
///
/// Labels are integers where:
/// - Negative values indicate contracted indices (matched between tensors)
/// - Positive values indicate uncontracted indices (appear in output)
///
/// The output modes are ordered by ascending label.
///
/// # Examples
///
/// ```
/// use orbspace::Tensor;
/// use orbspace::contract::contract;
///
/// // C[i,k] = A[i,j] * B[j,k]
/// let a = Tensor::<f64>::ones(&[2, 3]);
/// let b = Tensor::<f64>::ones(&[3, 4]);
///
/// let c = contract(&a, &[1, -1], &b, &[-1, 2]).unwrap();
/// assert_eq!(c.shape(), &[2, 4]);
/// ```
pub fn contract<ElT: Scalar>(
    a: &Tensor<ElT>,
    labels_a: &[i32],
    b: &Tensor<ElT>,
    labels_b: &[i32],
) -> Result<Tensor<ElT>, TensorError> {
    super::validate_labels(a, labels_a, b, labels_b)?;

    let props = ContractionProperties::compute(labels_a, a.shape(), labels_b, b.shape());

    let mut output_shape = props.output_shape(a.shape(), b.shape());
    if output_shape.is_empty() {
        output_shape.push(1);
    }

    // Unsorted output position k lands at sorted position slot[k].
    let mut slot = vec![0usize; props.perm_c.len()];
    for (sorted, &unsorted) in props.perm_c.iter().enumerate() {
        slot[unsorted] = sorted;
    }
    let n_uncontracted_a = props.uncontracted_a.len();

    let contracted_dims: Vec<usize> = props
        .contracted_pairs
        .iter()
        .map(|&(i, _)| a.shape()[i])
        .collect();

    let mut a_index = vec![0usize; a.ndim()];
    let mut b_index = vec![0usize; b.ndim()];
    let mut data = Vec::with_capacity(output_shape.iter().product());

    for_each_index(&output_shape, |out| {
        for (k, &i) in props.uncontracted_a.iter().enumerate() {
            a_index[i] = out[slot[k]];
        }
        for (k, &j) in props.uncontracted_b.iter().enumerate() {
            b_index[j] = out[slot[n_uncontracted_a + k]];
        }

        let mut sum = ElT::zero();
        for_each_index(&contracted_dims, |summed| {
            for (&(i, j), &s) in props.contracted_pairs.iter().zip(summed) {
                a_index[i] = s;
                b_index[j] = s;
            }
            let x = a.data()[offset(&a_index, a.strides())];
            let y = b.data()[offset(&b_index, b.strides())];
            sum = sum + x * y;
        });
        data.push(sum);
    });

    Tensor::from_vec(data, &output_shape)
}
