use crate::bitset::CategoryBitset;
use crate::data::{FloatData, Matrix};
use crate::errors::GradHistError;
use crate::histogram::{self, Bin, NodeHistogram};
use crate::kernels;
use crate::split::SplitInfo;
use log::debug;
use rayon::prelude::*;

/// Builds per-node histograms from a binned feature matrix.
///
/// The builder owns the reorder scratch buffers and a fixed-size worker
/// pool, and borrows the binned matrix and the current iteration's
/// gradient and hessian vectors. Shapes, precision, the constant-hessian
/// mode, and the thread count are all fixed for its lifetime; only the
/// gradient vectors can be swapped between boosting iterations with
/// [`bind_gradients`](HistogramBuilder::bind_gradients).
///
/// Construction validates every binned value against `n_bins` once, which
/// is what lets the kernels skip bin bounds checks on the hot path.
#[derive(Debug)]
pub struct HistogramBuilder<'a, T> {
    x_binned: Matrix<'a, u8>,
    gradients: &'a [T],
    hessians: &'a [T],
    ordered_gradients: Vec<T>,
    ordered_hessians: Vec<T>,
    hessians_are_constant: bool,
    n_bins: usize,
    pool: rayon::ThreadPool,
}

/// How the split feature's row is derived from the parent histogram.
enum ReuseRule<'a> {
    Numeric {
        start: usize,
        end: usize,
    },
    Categorical {
        bitset: &'a CategoryBitset,
        is_left_child: bool,
    },
}

fn is_identity(sample_indices: &[u32]) -> bool {
    sample_indices
        .iter()
        .enumerate()
        .all(|(i, &idx)| idx as usize == i)
}

impl<'a, T: FloatData> HistogramBuilder<'a, T> {
    /// Create a builder over a column-major binned matrix.
    ///
    /// `hessians` is ignored (and may be empty) when
    /// `hessians_are_constant` is set; in that mode the kernels never
    /// write `hess_sum` and consumers supply the constant themselves.
    pub fn new(
        x_binned: Matrix<'a, u8>,
        n_bins: usize,
        gradients: &'a [T],
        hessians: &'a [T],
        hessians_are_constant: bool,
        n_threads: usize,
    ) -> Result<Self, GradHistError> {
        if n_bins == 0 || n_bins > 256 {
            return Err(GradHistError::InvalidBinCount(n_bins));
        }
        for f in 0..x_binned.cols {
            for &value in x_binned.get_col(f) {
                if value as usize >= n_bins {
                    return Err(GradHistError::BinnedValueOutOfRange(value, f, n_bins));
                }
            }
        }
        let n_samples = x_binned.rows;
        if gradients.len() != n_samples {
            return Err(GradHistError::GradientLength(gradients.len(), n_samples));
        }
        if !hessians_are_constant && hessians.len() != n_samples {
            return Err(GradHistError::GradientLength(hessians.len(), n_samples));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build()
            .map_err(|e| GradHistError::ThreadPool(n_threads, e))?;
        Ok(HistogramBuilder {
            ordered_gradients: gradients.to_vec(),
            ordered_hessians: if hessians_are_constant {
                Vec::new()
            } else {
                hessians.to_vec()
            },
            x_binned,
            gradients,
            hessians,
            hessians_are_constant,
            n_bins,
            pool,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.x_binned.rows
    }

    pub fn n_features(&self) -> usize {
        self.x_binned.cols
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// Swap in the next boosting iteration's gradient and hessian
    /// vectors, keeping the binned matrix, shapes, and pool.
    pub fn bind_gradients(
        &mut self,
        gradients: &'a [T],
        hessians: &'a [T],
    ) -> Result<(), GradHistError> {
        let n_samples = self.x_binned.rows;
        if gradients.len() != n_samples {
            return Err(GradHistError::GradientLength(gradients.len(), n_samples));
        }
        if !self.hessians_are_constant && hessians.len() != n_samples {
            return Err(GradHistError::GradientLength(hessians.len(), n_samples));
        }
        self.gradients = gradients;
        self.hessians = hessians;
        self.ordered_gradients.clear();
        self.ordered_gradients.extend_from_slice(gradients);
        if !self.hessians_are_constant {
            self.ordered_hessians.clear();
            self.ordered_hessians.extend_from_slice(hessians);
        }
        Ok(())
    }

    /// Build the histogram for the node holding `sample_indices` by
    /// scanning its samples.
    ///
    /// Features outside `allowed_features` (when given) keep their zeroed
    /// rows. When both `parent_split` and `parent_histograms` are given,
    /// the feature the parent split on is rebuilt from the parent's row
    /// instead of rescanning samples; `is_left_child` says which side of
    /// that split this node is.
    ///
    /// The gather into the ordered buffers is skipped only when
    /// `sample_indices` is the identity `0..n_samples`; a full-length
    /// permutation is treated like any other node.
    pub fn compute_brute(
        &mut self,
        sample_indices: &[u32],
        allowed_features: Option<&[u32]>,
        parent_split: Option<&SplitInfo>,
        parent_histograms: Option<&NodeHistogram<T>>,
        is_left_child: bool,
    ) -> Result<NodeHistogram<T>, GradHistError> {
        let n_samples = self.x_binned.rows;
        let n_features = self.x_binned.cols;
        let n_bins = self.n_bins;

        for &idx in sample_indices {
            if idx as usize >= n_samples {
                return Err(GradHistError::SampleIndexOutOfRange(idx, n_samples));
            }
        }
        let mask = self.allowed_mask(allowed_features)?;

        let reuse = match (parent_split, parent_histograms) {
            (Some(split), Some(parent)) => {
                if parent.n_features() != n_features || parent.n_bins() != n_bins {
                    return Err(GradHistError::ShapeMismatch(
                        parent.n_features(),
                        parent.n_bins(),
                        n_features,
                        n_bins,
                    ));
                }
                if split.split_feature >= n_features {
                    return Err(GradHistError::FeatureIndexOutOfRange(
                        split.split_feature,
                        n_features,
                    ));
                }
                let rule = if split.is_categorical {
                    let bitset = split
                        .left_cat_bitset
                        .as_ref()
                        .ok_or(GradHistError::MissingCategoryBitset(split.split_feature))?;
                    ReuseRule::Categorical {
                        bitset,
                        is_left_child,
                    }
                } else {
                    let split_bin = split.split_bin as usize;
                    if split_bin >= n_bins {
                        return Err(GradHistError::BinIndexOutOfRange(split.split_bin, n_bins));
                    }
                    if is_left_child {
                        ReuseRule::Numeric {
                            start: 0,
                            end: split_bin + 1,
                        }
                    } else {
                        ReuseRule::Numeric {
                            start: split_bin + 1,
                            end: n_bins,
                        }
                    }
                };
                Some((
                    split.split_feature,
                    rule,
                    parent.get_feature(split.split_feature),
                ))
            }
            _ => None,
        };

        let k = sample_indices.len();
        let at_root = k == n_samples && is_identity(sample_indices);

        if !at_root {
            let src_gradients = self.gradients;
            let src_hessians = self.hessians;
            if self.hessians_are_constant {
                let dst = &mut self.ordered_gradients[..k];
                self.pool.install(|| {
                    dst.par_iter_mut()
                        .zip(sample_indices.par_iter())
                        .for_each(|(g, &idx)| *g = src_gradients[idx as usize]);
                });
            } else {
                let dst_gradients = &mut self.ordered_gradients[..k];
                let dst_hessians = &mut self.ordered_hessians[..k];
                self.pool.install(|| {
                    dst_gradients
                        .par_iter_mut()
                        .zip(dst_hessians.par_iter_mut())
                        .zip(sample_indices.par_iter())
                        .for_each(|((g, h), &idx)| {
                            *g = src_gradients[idx as usize];
                            *h = src_hessians[idx as usize];
                        });
                });
            }
        }

        let mut out = NodeHistogram::try_new(n_features, n_bins)?;
        {
            let x_binned = &self.x_binned;
            let hessians_are_constant = self.hessians_are_constant;
            let ordered_gradients = &self.ordered_gradients[..k];
            let ordered_hessians: &[T] = if hessians_are_constant {
                &[]
            } else {
                &self.ordered_hessians[..k]
            };
            let rows: Vec<(usize, &mut [Bin<T>])> = out
                .rows_mut()
                .enumerate()
                .filter(|(f, _)| mask[*f])
                .collect();
            debug!(
                "building {} of {} feature histograms over {} samples (root scan: {}, reuse feature: {:?})",
                rows.len(),
                n_features,
                k,
                at_root,
                reuse.as_ref().map(|(f, _, _)| *f),
            );
            self.pool.install(|| {
                rows.into_par_iter().for_each(|(f, row)| {
                    if let Some((reuse_feature, rule, parent_row)) = &reuse {
                        if f == *reuse_feature {
                            match rule {
                                ReuseRule::Numeric { start, end } => {
                                    histogram::fill_from_parent_numeric(
                                        parent_row, *start, *end, row,
                                    );
                                }
                                ReuseRule::Categorical {
                                    bitset,
                                    is_left_child,
                                } => {
                                    histogram::fill_from_parent_categorical(
                                        parent_row,
                                        bitset,
                                        *is_left_child,
                                        row,
                                    );
                                }
                            }
                            return;
                        }
                    }
                    let col = x_binned.get_col(f);
                    match (at_root, hessians_are_constant) {
                        (true, true) => {
                            kernels::build_histogram_root_no_hessian(col, ordered_gradients, row)
                        }
                        (true, false) => kernels::build_histogram_root(
                            col,
                            ordered_gradients,
                            ordered_hessians,
                            row,
                        ),
                        (false, true) => kernels::build_histogram_no_hessian(
                            col,
                            sample_indices,
                            ordered_gradients,
                            row,
                        ),
                        (false, false) => kernels::build_histogram(
                            col,
                            sample_indices,
                            ordered_gradients,
                            ordered_hessians,
                            row,
                        ),
                    }
                });
            });
        }
        Ok(out)
    }

    /// Derive a node's histogram as `parent - sibling`, per bin.
    ///
    /// O(`n_bins`) per feature and never touches the binned matrix. The
    /// caller decides when this is cheaper than a brute build, typically
    /// by bruting the smaller child and subtracting to get the larger.
    pub fn compute_subtraction(
        &self,
        parent_histograms: &NodeHistogram<T>,
        sibling_histograms: &NodeHistogram<T>,
        allowed_features: Option<&[u32]>,
    ) -> Result<NodeHistogram<T>, GradHistError> {
        let n_features = self.x_binned.cols;
        let n_bins = self.n_bins;
        for hist in [parent_histograms, sibling_histograms] {
            if hist.n_features() != n_features || hist.n_bins() != n_bins {
                return Err(GradHistError::ShapeMismatch(
                    hist.n_features(),
                    hist.n_bins(),
                    n_features,
                    n_bins,
                ));
            }
        }
        let mask = self.allowed_mask(allowed_features)?;
        let mut out = NodeHistogram::try_new(n_features, n_bins)?;
        {
            let rows: Vec<(usize, &mut [Bin<T>])> = out
                .rows_mut()
                .enumerate()
                .filter(|(f, _)| mask[*f])
                .collect();
            debug!(
                "subtracting {} of {} feature histograms",
                rows.len(),
                n_features
            );
            self.pool.install(|| {
                rows.into_par_iter().for_each(|(f, row)| {
                    histogram::subtract_into(
                        parent_histograms.get_feature(f),
                        sibling_histograms.get_feature(f),
                        row,
                    );
                });
            });
        }
        Ok(out)
    }

    fn allowed_mask(&self, allowed_features: Option<&[u32]>) -> Result<Vec<bool>, GradHistError> {
        let n_features = self.x_binned.cols;
        match allowed_features {
            None => Ok(vec![true; n_features]),
            Some(allowed) => {
                let mut mask = vec![false; n_features];
                for &f in allowed {
                    if f as usize >= n_features {
                        return Err(GradHistError::FeatureIndexOutOfRange(
                            f as usize, n_features,
                        ));
                    }
                    debug_assert!(!mask[f as usize], "duplicate feature index {}", f);
                    mask[f as usize] = true;
                }
                Ok(mask)
            }
        }
    }
}
