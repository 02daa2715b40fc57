//! Scatter-add kernels that fill a single feature row of a node histogram.
//!
//! Four variants cover `{root, non-root} x {hessian, constant-hessian}`.
//! Root variants walk the feature column directly; non-root variants go
//! through `sample_indices`. Every variant processes four samples per loop
//! body, loading the four bin indices into separate scalars before issuing
//! the accumulations, so the scatter targets stay independent; a scalar
//! tail handles the remaining `k % 4` samples. All variants sum in index
//! order `0..k` and therefore match the naive reference bit for bit.
//!
//! Preconditions are the builder's responsibility: rows arrive zeroed,
//! every value in `col` is below `out.len()`, and every sample index is
//! below `col.len()`. The kernels rely on that to skip bounds checks in
//! the hot loop.

use crate::data::FloatData;
use crate::histogram::Bin;

/// Root scan with hessians: bin index `col[i]`, values `ordered_*[i]`.
pub(crate) fn build_histogram_root<T: FloatData>(
    col: &[u8],
    ordered_gradients: &[T],
    ordered_hessians: &[T],
    out: &mut [Bin<T>],
) {
    let n = ordered_gradients.len();
    debug_assert!(col.len() >= n);
    debug_assert!(ordered_hessians.len() >= n);
    let n_unrolled = n - n % 4;
    let mut i = 0;
    while i < n_unrolled {
        // SAFETY: `i + 3 < n <= col.len()`; every bin value in `col` is
        // below `out.len()`, checked when the binned matrix was bound.
        unsafe {
            let b0 = *col.get_unchecked(i) as usize;
            let b1 = *col.get_unchecked(i + 1) as usize;
            let b2 = *col.get_unchecked(i + 2) as usize;
            let b3 = *col.get_unchecked(i + 3) as usize;

            let bin = out.get_unchecked_mut(b0);
            bin.grad_sum += *ordered_gradients.get_unchecked(i);
            bin.hess_sum += *ordered_hessians.get_unchecked(i);
            bin.count += 1;

            let bin = out.get_unchecked_mut(b1);
            bin.grad_sum += *ordered_gradients.get_unchecked(i + 1);
            bin.hess_sum += *ordered_hessians.get_unchecked(i + 1);
            bin.count += 1;

            let bin = out.get_unchecked_mut(b2);
            bin.grad_sum += *ordered_gradients.get_unchecked(i + 2);
            bin.hess_sum += *ordered_hessians.get_unchecked(i + 2);
            bin.count += 1;

            let bin = out.get_unchecked_mut(b3);
            bin.grad_sum += *ordered_gradients.get_unchecked(i + 3);
            bin.hess_sum += *ordered_hessians.get_unchecked(i + 3);
            bin.count += 1;
        }
        i += 4;
    }
    for j in n_unrolled..n {
        let bin = &mut out[col[j] as usize];
        bin.grad_sum += ordered_gradients[j];
        bin.hess_sum += ordered_hessians[j];
        bin.count += 1;
    }
}

/// Root scan, constant hessians: `hess_sum` is never written.
pub(crate) fn build_histogram_root_no_hessian<T: FloatData>(
    col: &[u8],
    ordered_gradients: &[T],
    out: &mut [Bin<T>],
) {
    let n = ordered_gradients.len();
    debug_assert!(col.len() >= n);
    let n_unrolled = n - n % 4;
    let mut i = 0;
    while i < n_unrolled {
        // SAFETY: as in `build_histogram_root`.
        unsafe {
            let b0 = *col.get_unchecked(i) as usize;
            let b1 = *col.get_unchecked(i + 1) as usize;
            let b2 = *col.get_unchecked(i + 2) as usize;
            let b3 = *col.get_unchecked(i + 3) as usize;

            let bin = out.get_unchecked_mut(b0);
            bin.grad_sum += *ordered_gradients.get_unchecked(i);
            bin.count += 1;

            let bin = out.get_unchecked_mut(b1);
            bin.grad_sum += *ordered_gradients.get_unchecked(i + 1);
            bin.count += 1;

            let bin = out.get_unchecked_mut(b2);
            bin.grad_sum += *ordered_gradients.get_unchecked(i + 2);
            bin.count += 1;

            let bin = out.get_unchecked_mut(b3);
            bin.grad_sum += *ordered_gradients.get_unchecked(i + 3);
            bin.count += 1;
        }
        i += 4;
    }
    for j in n_unrolled..n {
        let bin = &mut out[col[j] as usize];
        bin.grad_sum += ordered_gradients[j];
        bin.count += 1;
    }
}

/// Non-root scan with hessians: bin index `col[sample_indices[i]]`, values
/// `ordered_*[i]` as gathered for this node.
pub(crate) fn build_histogram<T: FloatData>(
    col: &[u8],
    sample_indices: &[u32],
    ordered_gradients: &[T],
    ordered_hessians: &[T],
    out: &mut [Bin<T>],
) {
    let n = sample_indices.len();
    debug_assert!(ordered_gradients.len() >= n);
    debug_assert!(ordered_hessians.len() >= n);
    let n_unrolled = n - n % 4;
    let mut i = 0;
    while i < n_unrolled {
        // SAFETY: sample indices were validated against the column length
        // before dispatch; bin values were validated against `out.len()`
        // when the binned matrix was bound.
        unsafe {
            let b0 = *col.get_unchecked(*sample_indices.get_unchecked(i) as usize) as usize;
            let b1 = *col.get_unchecked(*sample_indices.get_unchecked(i + 1) as usize) as usize;
            let b2 = *col.get_unchecked(*sample_indices.get_unchecked(i + 2) as usize) as usize;
            let b3 = *col.get_unchecked(*sample_indices.get_unchecked(i + 3) as usize) as usize;

            let bin = out.get_unchecked_mut(b0);
            bin.grad_sum += *ordered_gradients.get_unchecked(i);
            bin.hess_sum += *ordered_hessians.get_unchecked(i);
            bin.count += 1;

            let bin = out.get_unchecked_mut(b1);
            bin.grad_sum += *ordered_gradients.get_unchecked(i + 1);
            bin.hess_sum += *ordered_hessians.get_unchecked(i + 1);
            bin.count += 1;

            let bin = out.get_unchecked_mut(b2);
            bin.grad_sum += *ordered_gradients.get_unchecked(i + 2);
            bin.hess_sum += *ordered_hessians.get_unchecked(i + 2);
            bin.count += 1;

            let bin = out.get_unchecked_mut(b3);
            bin.grad_sum += *ordered_gradients.get_unchecked(i + 3);
            bin.hess_sum += *ordered_hessians.get_unchecked(i + 3);
            bin.count += 1;
        }
        i += 4;
    }
    for j in n_unrolled..n {
        let bin = &mut out[col[sample_indices[j] as usize] as usize];
        bin.grad_sum += ordered_gradients[j];
        bin.hess_sum += ordered_hessians[j];
        bin.count += 1;
    }
}

/// Non-root scan, constant hessians.
pub(crate) fn build_histogram_no_hessian<T: FloatData>(
    col: &[u8],
    sample_indices: &[u32],
    ordered_gradients: &[T],
    out: &mut [Bin<T>],
) {
    let n = sample_indices.len();
    debug_assert!(ordered_gradients.len() >= n);
    let n_unrolled = n - n % 4;
    let mut i = 0;
    while i < n_unrolled {
        // SAFETY: as in `build_histogram`.
        unsafe {
            let b0 = *col.get_unchecked(*sample_indices.get_unchecked(i) as usize) as usize;
            let b1 = *col.get_unchecked(*sample_indices.get_unchecked(i + 1) as usize) as usize;
            let b2 = *col.get_unchecked(*sample_indices.get_unchecked(i + 2) as usize) as usize;
            let b3 = *col.get_unchecked(*sample_indices.get_unchecked(i + 3) as usize) as usize;

            let bin = out.get_unchecked_mut(b0);
            bin.grad_sum += *ordered_gradients.get_unchecked(i);
            bin.count += 1;

            let bin = out.get_unchecked_mut(b1);
            bin.grad_sum += *ordered_gradients.get_unchecked(i + 1);
            bin.count += 1;

            let bin = out.get_unchecked_mut(b2);
            bin.grad_sum += *ordered_gradients.get_unchecked(i + 2);
            bin.count += 1;

            let bin = out.get_unchecked_mut(b3);
            bin.grad_sum += *ordered_gradients.get_unchecked(i + 3);
            bin.count += 1;
        }
        i += 4;
    }
    for j in n_unrolled..n {
        let bin = &mut out[col[sample_indices[j] as usize] as usize];
        bin.grad_sum += ordered_gradients[j];
        bin.count += 1;
    }
}

/// Single-accumulator reference the unrolled variants are pinned against
/// in tests.
pub(crate) fn build_histogram_naive<T: FloatData>(
    col: &[u8],
    sample_indices: &[u32],
    ordered_gradients: &[T],
    ordered_hessians: Option<&[T]>,
    out: &mut [Bin<T>],
) {
    for (i, &idx) in sample_indices.iter().enumerate() {
        let bin = &mut out[col[idx as usize] as usize];
        bin.grad_sum += ordered_gradients[i];
        if let Some(hessians) = ordered_hessians {
            bin.hess_sum += hessians[i];
        }
        bin.count += 1;
    }
}
