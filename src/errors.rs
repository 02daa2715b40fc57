use thiserror::Error;

/// Errors surfaced by the histogram builder.
///
/// Every variant is detected before any worker thread writes to an output
/// histogram, so a returned error never leaves a partially filled
/// histogram behind.
#[derive(Debug, Error)]
pub enum GradHistError {
    #[error("sample index {0} is out of range for {1} samples")]
    SampleIndexOutOfRange(u32, usize),
    #[error("feature index {0} is out of range for {1} features")]
    FeatureIndexOutOfRange(usize, usize),
    #[error("bin {0} is out of range for {1} bins")]
    BinIndexOutOfRange(u16, usize),
    #[error("binned value {0} in feature {1} is out of range for {2} bins")]
    BinnedValueOutOfRange(u8, usize, usize),
    #[error("n_bins must be in 1..=256, got {0}")]
    InvalidBinCount(usize),
    #[error("gradient vector of length {0} does not match {1} samples")]
    GradientLength(usize, usize),
    #[error("histogram shape ({0} features, {1} bins) does not match ({2} features, {3} bins)")]
    ShapeMismatch(usize, usize, usize, usize),
    #[error("categorical split on feature {0} has no category bitset")]
    MissingCategoryBitset(usize),
    #[error("failed to allocate a histogram of {0} features x {1} bins")]
    HistogramAllocation(usize, usize),
    #[error("failed to start a thread pool with {0} threads: {1}")]
    ThreadPool(usize, rayon::ThreadPoolBuildError),
}
