mod silhouette;


pub use silhouette::Silhouette;

use crate::encoder::FeatureRepresentation;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    #[error("Got {labels} labels for {rows} rows")]
    LengthMismatch { labels: usize, rows: usize },

    #[error("Score is undefined for {distinct} distinct labels over {n} rows")]
    InvalidLabelCount { distinct: usize, n: usize },
}

/// Internal validation metric: higher is better
pub trait ValidationScorer {
    fn score(&self, features: &FeatureRepresentation, labels: &[usize]) -> Result<f64, ScoreError>;
}

/// Number of distinct cluster ids in `labels`
pub fn distinct_labels(labels: &[usize]) -> usize {
    labels.iter().collect::<HashSet<_>>().len()
}

/// A partition is scoreable when it uses between 2 and n - 1 distinct labels
pub fn is_scoreable(distinct: usize, n: usize) -> bool {
    distinct >= 2 && distinct < n
}
