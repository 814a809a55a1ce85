//! Index bookkeeping for label-based contractions.
//!
//! A contraction `C = A * B` over some shared indices becomes a single GEMM
//! once A is permuted to `[uncontracted..., contracted...]` and B to
//! `[contracted..., uncontracted...]`:
//!
//! ```text
//! C(dleft, dright) = A(dleft, dmid) * B(dmid, dright)
//! ```
//!
//! The output modes are finally sorted by label value, which is how a basis
//! transformation puts the transformed mode back into its original slot.

/// Properties of one contraction, computed from labels and shapes.
#[derive(Debug, Clone)]
pub struct ContractionProperties {
    /// Contracted index pairs: (index in A, index in B)
    pub contracted_pairs: Vec<(usize, usize)>,

    /// Indices in A that appear in the output
    pub uncontracted_a: Vec<usize>,

    /// Indices in B that appear in the output
    pub uncontracted_b: Vec<usize>,

    pub permute_a: bool,
    pub permute_b: bool,
    pub permute_c: bool,

    /// Product of uncontracted A dimensions
    pub dleft: usize,

    /// Product of contracted dimensions
    pub dmid: usize,

    /// Product of uncontracted B dimensions
    pub dright: usize,

    /// A reordered to [uncontracted..., contracted...]
    pub perm_a: Vec<usize>,

    /// B reordered to [contracted..., uncontracted...]
    pub perm_b: Vec<usize>,

    /// Sorts the GEMM output by label value
    pub perm_c: Vec<usize>,

    /// Output labels in the order they appear after GEMM (before perm_c)
    pub output_labels: Vec<i32>,
}

impl ContractionProperties {
    /// Compute contraction properties from labels and shapes.
    ///
    /// Negative labels are contracted (matched between A and B), positive
    /// labels survive into the output.
    ///
    /// # Example
    ///
    /// ```
    /// use orbspace::contract::ContractionProperties;
    ///
    /// // C[i,k] = A[i,j] * B[j,k]
    /// let props = ContractionProperties::compute(&[1, -1], &[2, 3], &[-1, 2], &[3, 4]);
    /// assert_eq!((props.dleft, props.dmid, props.dright), (2, 3, 4));
    /// ```
    pub fn compute(
        labels_a: &[i32],
        shape_a: &[usize],
        labels_b: &[i32],
        shape_b: &[usize],
    ) -> Self {
        let mut contracted_pairs = Vec::new();
        for (i, &la) in labels_a.iter().enumerate() {
            if la < 0 {
                if let Some(j) = labels_b.iter().position(|&lb| lb == la) {
                    contracted_pairs.push((i, j));
                }
            }
        }

        let contracted_a: Vec<usize> = contracted_pairs.iter().map(|&(i, _)| i).collect();
        let contracted_b: Vec<usize> = contracted_pairs.iter().map(|&(_, j)| j).collect();

        let uncontracted_a: Vec<usize> = (0..labels_a.len())
            .filter(|i| !contracted_a.contains(i))
            .collect();
        let uncontracted_b: Vec<usize> = (0..labels_b.len())
            .filter(|j| !contracted_b.contains(j))
            .collect();

        let dleft: usize = uncontracted_a.iter().map(|&i| shape_a[i]).product();
        let dmid: usize = contracted_pairs.iter().map(|&(i, _)| shape_a[i]).product();
        let dright: usize = uncontracted_b.iter().map(|&j| shape_b[j]).product();

        let perm_a: Vec<usize> = uncontracted_a
            .iter()
            .chain(contracted_a.iter())
            .copied()
            .collect();
        let permute_a = !is_identity_perm(&perm_a);

        let perm_b: Vec<usize> = contracted_b
            .iter()
            .chain(uncontracted_b.iter())
            .copied()
            .collect();
        let permute_b = !is_identity_perm(&perm_b);

        let output_labels: Vec<i32> = uncontracted_a
            .iter()
            .map(|&i| labels_a[i])
            .chain(uncontracted_b.iter().map(|&j| labels_b[j]))
            .collect();

        // perm_c[new_pos] = position of the new_pos-th smallest label
        let mut perm_c: Vec<usize> = (0..output_labels.len()).collect();
        perm_c.sort_by_key(|&i| output_labels[i]);
        let permute_c = !is_identity_perm(&perm_c);

        Self {
            contracted_pairs,
            uncontracted_a,
            uncontracted_b,
            permute_a,
            permute_b,
            permute_c,
            dleft,
            dmid,
            dright,
            perm_a,
            perm_b,
            perm_c,
            output_labels,
        }
    }

    /// Shape of the output after `perm_c` has been applied.
    pub fn output_shape(&self, shape_a: &[usize], shape_b: &[usize]) -> Vec<usize> {
        let unsorted = self.unsorted_output_shape(shape_a, shape_b);
        self.perm_c.iter().map(|&p| unsorted[p]).collect()
    }

    /// Output extents in GEMM order: A's free modes, then B's.
    pub fn unsorted_output_shape(&self, shape_a: &[usize], shape_b: &[usize]) -> Vec<usize> {
        self.uncontracted_a
            .iter()
            .map(|&i| shape_a[i])
            .chain(self.uncontracted_b.iter().map(|&j| shape_b[j]))
            .collect()
    }
}

fn is_identity_perm(perm: &[usize]) -> bool {
    perm.iter().enumerate().all(|(i, &p)| i == p)
}
