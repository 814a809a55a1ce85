//! Label-based tensor contraction.
//!
//! - Negative labels indicate contracted indices (summed over)
//! - Positive labels indicate uncontracted indices (appear in output)
//!
//! Output modes are ordered by ascending label, in both implementations:
//!
//! - `naive`: loop-based reference
//! - `gemm`: permute, reshape and multiply with faer
//!
//! # Example
//!
//! ```
//! use orbspace::Tensor;
//! use orbspace::contract::contract;
//!
//! // C[i,k] = A[i,j] * B[j,k]
//! let a = Tensor::<f64>::ones(&[2, 3]);
//! let b = Tensor::<f64>::ones(&[3, 4]);
//!
//! let c = contract(&a, &[1, -1], &b, &[-1, 2]).unwrap();
//! assert_eq!(c.shape(), &[2, 4]);
//! ```

mod gemm;
mod naive;
mod properties;

pub use gemm::{contract_gemm, contract_gemm_with_par};
pub use naive::contract;
pub use properties::ContractionProperties;

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::tensor::Tensor;

/// Check label counts and the extents of every contracted pair.
fn validate_labels<ElT: Scalar>(
    a: &Tensor<ElT>,
    labels_a: &[i32],
    b: &Tensor<ElT>,
    labels_b: &[i32],
) -> Result<(), TensorError> {
    if labels_a.len() != a.ndim() {
        return Err(TensorError::WrongNumberOfIndices {
            expected: a.ndim(),
            actual: labels_a.len(),
        });
    }
    if labels_b.len() != b.ndim() {
        return Err(TensorError::WrongNumberOfIndices {
            expected: b.ndim(),
            actual: labels_b.len(),
        });
    }

    for (i, &la) in labels_a.iter().enumerate() {
        if la >= 0 {
            continue;
        }
        if let Some(j) = labels_b.iter().position(|&lb| lb == la) {
            if a.shape()[i] != b.shape()[j] {
                return Err(TensorError::ShapeMismatch {
                    expected: a.shape()[i],
                    actual: b.shape()[j],
                });
            }
        }
    }
    Ok(())
}
