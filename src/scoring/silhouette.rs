use super::{distinct_labels, is_scoreable, ScoreError, ValidationScorer};
use crate::clusterer::euclidean_distance;
use crate::encoder::FeatureRepresentation;
use std::collections::{BTreeMap, BTreeSet};

/// Mean silhouette coefficient over Euclidean distance on the dense
/// one-hot + numerical matrix. Range [-1, 1].
#[derive(Debug, Clone, Copy, Default)]
pub struct Silhouette;

impl ValidationScorer for Silhouette {
    fn score(&self, features: &FeatureRepresentation, labels: &[usize]) -> Result<f64, ScoreError> {
        let n = features.len();
        if labels.len() != n {
            return Err(ScoreError::LengthMismatch {
                labels: labels.len(),
                rows: n,
            });
        }

        let distinct = distinct_labels(labels);
        if !is_scoreable(distinct, n) {
            return Err(ScoreError::InvalidLabelCount { distinct, n });
        }

        // Cluster ids are arbitrary; work on dense indices 0..distinct
        let dense_ids: BTreeMap<usize, usize> = labels
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(idx, l)| (l, idx))
            .collect();
        let labels: Vec<usize> = labels.iter().map(|l| dense_ids[l]).collect();

        let k = dense_ids.len();
        let mut sizes = vec![0usize; k];
        for &l in &labels {
            sizes[l] += 1;
        }

        let mut total = 0.0;
        for i in 0..n {
            // Singletons contribute zero
            if sizes[labels[i]] == 1 {
                continue;
            }

            let mut sums = vec![0.0; k];
            for j in 0..n {
                if i != j {
                    sums[labels[j]] += euclidean_distance(&features.dense[i], &features.dense[j]);
                }
            }

            let a = sums[labels[i]] / (sizes[labels[i]] - 1) as f64;
            let b = (0..k)
                .filter(|&c| c != labels[i] && sizes[c] > 0)
                .map(|c| sums[c] / sizes[c] as f64)
                .fold(f64::INFINITY, f64::min);

            let denom = a.max(b);
            if denom > 0.0 {
                total += (b - a) / denom;
            }
        }

        Ok(total / n as f64)
    }
}
