use crate::bitset::CategoryBitset;
use serde::{Deserialize, Serialize};

/// Description of the split that turned a parent node into its two
/// children.
///
/// Produced by the split finder, consumed here: when a child recomputes
/// the histogram for the very feature its parent split on, the builder
/// rebuilds that one row from the parent's histogram instead of rescanning
/// samples. For a numeric split, `split_bin` is the last bin routed to the
/// left child. For a categorical split, `left_cat_bitset` holds the bins
/// routed left and must be present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitInfo {
    pub split_feature: usize,
    pub split_bin: u16,
    pub is_categorical: bool,
    pub left_cat_bitset: Option<CategoryBitset>,
}

impl SplitInfo {
    pub fn new_numeric(split_feature: usize, split_bin: u16) -> Self {
        SplitInfo {
            split_feature,
            split_bin,
            is_categorical: false,
            left_cat_bitset: None,
        }
    }

    pub fn new_categorical(split_feature: usize, left_cat_bitset: CategoryBitset) -> Self {
        SplitInfo {
            split_feature,
            split_bin: 0,
            is_categorical: true,
            left_cat_bitset: Some(left_cat_bitset),
        }
    }
}
