use crate::bitset::CategoryBitset;
use crate::data::FloatData;
use crate::errors::GradHistError;
use serde::{Deserialize, Serialize};

/// Accumulated first and second order gradient sums, and the number of
/// samples, for a single bin of a single feature.
///
/// In constant-hessian mode the kernels never touch `hess_sum`; consumers
/// must treat it as undefined there and supply the constant themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bin<T> {
    pub grad_sum: T,
    pub hess_sum: T,
    pub count: u32,
}

impl<T: FloatData> Bin<T> {
    pub fn empty() -> Self {
        Bin {
            grad_sum: T::ZERO,
            hess_sum: T::ZERO,
            count: 0,
        }
    }
}

/// Dense histogram for one tree node: `n_features` rows of `n_bins` bins.
///
/// Rows are contiguous and independent, which is what lets the builder
/// hand each feature's row to a different worker without synchronization.
/// Features a node never processes keep their zeroed row; trailing bins of
/// features with few distinct values stay zero as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeHistogram<T> {
    n_features: usize,
    n_bins: usize,
    bins: Vec<Bin<T>>,
}

impl<T: FloatData> NodeHistogram<T> {
    /// Allocate a zeroed histogram, reporting allocation failure instead
    /// of aborting.
    pub fn try_new(n_features: usize, n_bins: usize) -> Result<Self, GradHistError> {
        let mut bins = Vec::new();
        bins.try_reserve_exact(n_features * n_bins)
            .map_err(|_| GradHistError::HistogramAllocation(n_features, n_bins))?;
        bins.resize(n_features * n_bins, Bin::empty());
        Ok(NodeHistogram {
            n_features,
            n_bins,
            bins,
        })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// The bins of feature `feature`.
    pub fn get_feature(&self, feature: usize) -> &[Bin<T>] {
        let start = feature * self.n_bins;
        &self.bins[start..(start + self.n_bins)]
    }

    /// Iterator over all feature rows, in feature order, as disjoint
    /// mutable slices.
    pub(crate) fn rows_mut(&mut self) -> impl Iterator<Item = &mut [Bin<T>]> {
        self.bins.chunks_exact_mut(self.n_bins)
    }
}

/// Per-bin `parent - sibling` over one feature row.
///
/// Counts subtract exactly. Gradient and hessian sums can come out as tiny
/// negatives when the true value is zero, from floating point
/// cancellation; consumers tolerate that.
pub(crate) fn subtract_into<T: FloatData>(
    parent: &[Bin<T>],
    sibling: &[Bin<T>],
    out: &mut [Bin<T>],
) {
    for ((out_bin, parent_bin), sibling_bin) in out.iter_mut().zip(parent).zip(sibling) {
        out_bin.grad_sum = parent_bin.grad_sum - sibling_bin.grad_sum;
        out_bin.hess_sum = parent_bin.hess_sum - sibling_bin.hess_sum;
        out_bin.count = parent_bin.count - sibling_bin.count;
    }
}

/// Rebuild a child's row for the feature its parent split on, numeric
/// case: the child's samples occupy exactly the parent bins in
/// `[start, end)`, so those are copied and everything else stays zero.
///
/// `out` must be zeroed on entry.
pub(crate) fn fill_from_parent_numeric<T: FloatData>(
    parent: &[Bin<T>],
    start: usize,
    end: usize,
    out: &mut [Bin<T>],
) {
    out[start..end].copy_from_slice(&parent[start..end]);
}

/// Rebuild a child's row for the feature its parent split on, categorical
/// case: a bin is copied when the bitset routes it to the side this child
/// is on, otherwise it stays zero.
///
/// `out` must be zeroed on entry.
pub(crate) fn fill_from_parent_categorical<T: FloatData>(
    parent: &[Bin<T>],
    left_cat_bitset: &CategoryBitset,
    is_left_child: bool,
    out: &mut [Bin<T>],
) {
    for (b, (out_bin, parent_bin)) in out.iter_mut().zip(parent).enumerate() {
        if left_cat_bitset.contains(b as u16) == is_left_child {
            *out_bin = *parent_bin;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin(grad_sum: f32, hess_sum: f32, count: u32) -> Bin<f32> {
        Bin {
            grad_sum,
            hess_sum,
            count,
        }
    }

    #[test]
    fn test_subtract_into() {
        let parent = vec![bin(5., 5., 5), bin(3., 1., 3), bin(0., 0., 0)];
        let sibling = vec![bin(2., 4., 2), bin(3., 1., 3), bin(0., 0., 0)];
        let mut out = vec![Bin::empty(); 3];
        subtract_into(&parent, &sibling, &mut out);
        assert_eq!(out[0], bin(3., 1., 3));
        assert_eq!(out[1], bin(0., 0., 0));
        assert_eq!(out[2], bin(0., 0., 0));
    }

    #[test]
    fn test_fill_from_parent_numeric() {
        let parent = vec![bin(1., 1., 1), bin(2., 2., 2), bin(3., 3., 3), bin(4., 4., 4)];
        let mut left = vec![Bin::empty(); 4];
        fill_from_parent_numeric(&parent, 0, 2, &mut left);
        assert_eq!(left[0], parent[0]);
        assert_eq!(left[1], parent[1]);
        assert_eq!(left[2], Bin::empty());
        assert_eq!(left[3], Bin::empty());

        let mut right = vec![Bin::empty(); 4];
        fill_from_parent_numeric(&parent, 2, 4, &mut right);
        assert_eq!(right[0], Bin::empty());
        assert_eq!(right[1], Bin::empty());
        assert_eq!(right[2], parent[2]);
        assert_eq!(right[3], parent[3]);
    }

    #[test]
    fn test_fill_from_parent_categorical() {
        let parent = vec![bin(1., 1., 1), bin(2., 2., 2), bin(3., 3., 3), bin(4., 4., 4)];
        let set = CategoryBitset::from_bins(4, [0, 2]);

        let mut left = vec![Bin::empty(); 4];
        fill_from_parent_categorical(&parent, &set, true, &mut left);
        assert_eq!(left[0], parent[0]);
        assert_eq!(left[1], Bin::empty());
        assert_eq!(left[2], parent[2]);
        assert_eq!(left[3], Bin::empty());

        let mut right = vec![Bin::empty(); 4];
        fill_from_parent_categorical(&parent, &set, false, &mut right);
        assert_eq!(right[0], Bin::empty());
        assert_eq!(right[1], parent[1]);
        assert_eq!(right[2], Bin::empty());
        assert_eq!(right[3], parent[3]);
    }

    #[test]
    fn test_histogram_rows() {
        let mut hist: NodeHistogram<f32> = NodeHistogram::try_new(3, 4).unwrap();
        assert_eq!(hist.n_features(), 3);
        assert_eq!(hist.n_bins(), 4);
        assert_eq!(hist.rows_mut().count(), 3);
        hist.rows_mut().nth(1).unwrap()[2] = bin(1., 2., 3);
        assert_eq!(hist.get_feature(1)[2], bin(1., 2., 3));
        assert_eq!(hist.get_feature(0)[2], Bin::empty());
        assert_eq!(hist.get_feature(2)[2], Bin::empty());
    }

    #[test]
    fn test_histogram_serialization() {
        let mut hist: NodeHistogram<f32> = NodeHistogram::try_new(2, 2).unwrap();
        hist.rows_mut().next().unwrap()[1] = bin(0.125, -2.5, 7);
        let serialized = serde_json::to_string(&hist).unwrap();
        let loaded: NodeHistogram<f32> = serde_json::from_str(&serialized).unwrap();
        assert_eq!(loaded, hist);
    }
}
