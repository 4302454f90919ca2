mod distance;
mod kprototypes;
mod prototype;
mod types;

#[cfg(test)]
mod tests;

pub use distance::{euclidean_distance, mixed_dissimilarity};
pub use kprototypes::KPrototypes;
pub use types::{Fit, Prototype};

use crate::encoder::FeatureRepresentation;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClusterError {
    #[error("Cannot cluster an empty feature set")]
    EmptyInput,

    #[error("Invalid cluster count {k} for {n} records")]
    InvalidClusterCount { k: usize, n: usize },

    /// Any other failure inside an engine, such as input it cannot fit
    #[error("Clustering failed: {0}")]
    Failed(String),
}

/// Core trait for mixed-type clustering algorithms
pub trait ClusteringEngine {
    /// Partition the rows of `features` into at most `k` clusters
    ///
    /// # Returns
    /// One cluster id per row, aligned with the input batch. Implementations
    /// must return identical labels for identical `(features, k, seed)`.
    fn fit_predict(
        &self,
        features: &FeatureRepresentation,
        k: usize,
        seed: u64,
    ) -> Result<Vec<usize>, ClusterError>;
}
