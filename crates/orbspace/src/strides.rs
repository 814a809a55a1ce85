//! Column-major index arithmetic.
//!
//! Mode 0 varies fastest, which is also faer's matrix layout, so the leading
//! modes of a tensor can be fused into matrix rows without copying.
//!
//! ```text
//! shape   [d0, d1, d2]
//! strides [1,  d0, d0*d1]
//! offset  i0 + d0*i1 + d0*d1*i2
//! ```

/// Column-major strides for `shape`.
///
/// ```
/// use orbspace::strides::compute_strides;
///
/// assert_eq!(compute_strides(&[3, 4, 5]), vec![1, 3, 12]);
/// assert!(compute_strides(&[]).is_empty());
/// ```
pub fn compute_strides(shape: &[usize]) -> Vec<usize> {
    shape
        .iter()
        .scan(1usize, |acc, &extent| {
            let stride = *acc;
            *acc *= extent;
            Some(stride)
        })
        .collect()
}

/// Linear offset of a multi-index.
#[inline]
pub fn offset(index: &[usize], strides: &[usize]) -> usize {
    index.iter().zip(strides).map(|(&i, &s)| i * s).sum()
}

/// Step `index` to the next column-major position within `shape`.
///
/// Returns `false`, leaving `index` at all zeros, once the last position has
/// been passed.
///
/// ```
/// use orbspace::strides::next_index;
///
/// let mut index = vec![1, 0];
/// assert!(next_index(&mut index, &[2, 2]));
/// assert_eq!(index, vec![0, 1]);
/// ```
#[inline]
pub fn next_index(index: &mut [usize], shape: &[usize]) -> bool {
    for (i, &extent) in index.iter_mut().zip(shape) {
        *i += 1;
        if *i < extent {
            return true;
        }
        *i = 0;
    }
    false
}

/// Call `f` with every multi-index of `shape`, in storage order.
///
/// A rank-0 shape visits the single empty index once; a shape with a zero
/// extent visits nothing.
pub fn for_each_index(shape: &[usize], mut f: impl FnMut(&[usize])) {
    if shape.contains(&0) {
        return;
    }
    let mut index = vec![0; shape.len()];
    loop {
        f(&index);
        if !next_index(&mut index, shape) {
            break;
        }
    }
}
