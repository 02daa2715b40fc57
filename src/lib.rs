//! Binned gradient and hessian histograms for gradient boosted decision
//! trees.
//!
//! At every node of a growing tree, the trainer needs, per feature, the
//! sum of gradients, the sum of hessians, and the sample count falling
//! into each pre-computed bin. Those histograms are the only input to
//! split finding, and building them dominates training time. This crate
//! implements that construction step and nothing else: binning, node
//! partitioning, loss derivatives, and split finding all live with the
//! caller.
//!
//! A [`HistogramBuilder`] borrows the column-major binned matrix and the
//! current iteration's gradient vectors, and builds a node's
//! [`NodeHistogram`] one of three ways: a brute scan over the node's
//! sample indices (with a specialized index-free path at the root), a
//! per-bin subtraction `parent - sibling`, or, for the single feature the
//! parent split on, a copy of the selected parent bins. Features are
//! processed in parallel, each worker writing its own histogram row.
//!
//! ```
//! use gradhist::{HistogramBuilder, Matrix};
//!
//! // Two features over four samples, column-major.
//! let binned = vec![0u8, 1, 1, 0, 1, 1, 0, 0];
//! let x = Matrix::new(&binned, 4, 2);
//! let gradients = vec![0.5f32, -1.0, 2.0, 0.25];
//! let hessians = vec![1.0f32; 4];
//!
//! let mut builder = HistogramBuilder::new(x, 2, &gradients, &hessians, false, 2)?;
//! let root: Vec<u32> = (0..4).collect();
//! let hist = builder.compute_brute(&root, None, None, None, false)?;
//! assert_eq!(hist.get_feature(0)[0].count, 2);
//! assert_eq!(hist.get_feature(0)[0].grad_sum, 0.75);
//! # Ok::<(), gradhist::GradHistError>(())
//! ```

pub mod bitset;
pub mod builder;
pub mod data;
pub mod errors;
pub mod histogram;
mod kernels;
pub mod split;

pub use bitset::CategoryBitset;
pub use builder::HistogramBuilder;
pub use data::{FloatData, Matrix};
pub use errors::GradHistError;
pub use histogram::{Bin, NodeHistogram};
pub use split::SplitInfo;
