use crate::clusterer::{
    distance::mixed_dissimilarity,
    prototype::compute_prototype,
    types::{Fit, Prototype},
    ClusterError, ClusteringEngine,
};
use crate::encoder::FeatureRepresentation;
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use tracing::debug;

/// k-prototypes: k-modes on categorical codes, k-means on numerical values
#[derive(Debug, Clone)]
pub struct KPrototypes {
    pub max_iters: usize,
    /// Weight of one categorical mismatch. `None` derives it from the data
    pub gamma: Option<f64>,
}

impl KPrototypes {
    pub fn new(max_iters: usize) -> Self {
        Self {
            max_iters,
            gamma: None,
        }
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = Some(gamma);
        self
    }

    /// Half the mean standard deviation of the numerical columns, or 1.0 when
    /// that is zero
    fn resolve_gamma(&self, features: &FeatureRepresentation) -> f64 {
        if let Some(gamma) = self.gamma {
            return gamma;
        }

        let n = features.numeric.len() as f64;
        let dim = features.numeric.first().map_or(0, Vec::len);
        if dim == 0 {
            return 1.0;
        }

        let mut std_sum = 0.0;
        for i in 0..dim {
            let mean = features.numeric.iter().map(|row| row[i]).sum::<f64>() / n;
            let var = features
                .numeric
                .iter()
                .map(|row| (row[i] - mean).powi(2))
                .sum::<f64>()
                / n;
            std_sum += var.sqrt();
        }

        let gamma = 0.5 * std_sum / dim as f64;
        if gamma.is_finite() && gamma > 0.0 {
            gamma
        } else {
            1.0
        }
    }

    pub fn fit(
        &self,
        features: &FeatureRepresentation,
        k: usize,
        seed: u64,
    ) -> Result<Fit, ClusterError> {
        let n = features.len();
        if n == 0 {
            return Err(ClusterError::EmptyInput);
        }
        if k == 0 || k > n {
            return Err(ClusterError::InvalidClusterCount { k, n });
        }
        if let Some(row) = features
            .numeric
            .iter()
            .position(|values| values.iter().any(|v| !v.is_finite()))
        {
            return Err(ClusterError::Failed(format!(
                "non-finite numerical value in row {}",
                row
            )));
        }

        let gamma = self.resolve_gamma(features);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        // 1. Seed prototypes from k randomly chosen distinct rows. With fewer
        //    distinct rows than k, every distinct row becomes a prototype.
        let rows = distinct_rows(features);
        if rows.len() < k {
            debug!(k, distinct = rows.len(), "fewer distinct rows than clusters");
        }
        let mut prototypes: Vec<Prototype> = rows
            .choose_multiple(&mut rng, k)
            .map(|&i| Prototype {
                categorical: features.codes[i].clone(),
                numeric: features.numeric[i].clone(),
            })
            .collect();

        let mut labels = vec![0usize; n];
        let mut iterations = 0;

        for _ in 0..self.max_iters {
            iterations += 1;

            // 2. Assign each row to its nearest prototype, first one on ties
            let mut changed = false;
            for i in 0..n {
                let best = nearest(features, i, &prototypes, gamma).0;
                if labels[i] != best {
                    changed = true;
                    labels[i] = best;
                }
            }

            if !changed && iterations > 1 {
                break;
            }

            // 3. Recompute prototypes; empty clusters keep their old one
            for (c, proto) in prototypes.iter_mut().enumerate() {
                let members: Vec<usize> = (0..n).filter(|&i| labels[i] == c).collect();
                if !members.is_empty() {
                    *proto = compute_prototype(features, &members);
                }
            }
        }

        let cost: f64 = (0..n)
            .map(|i| {
                let proto = &prototypes[labels[i]];
                mixed_dissimilarity(&features.codes[i], &features.numeric[i], proto, gamma)
            })
            .sum();

        debug!(k, iterations, cost, "k-prototypes finished");

        Ok(Fit {
            labels,
            prototypes,
            iterations,
            cost,
        })
    }
}

impl Default for KPrototypes {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ClusteringEngine for KPrototypes {
    fn fit_predict(
        &self,
        features: &FeatureRepresentation,
        k: usize,
        seed: u64,
    ) -> Result<Vec<usize>, ClusterError> {
        self.fit(features, k, seed).map(|fit| fit.labels)
    }
}

/// Index of the first occurrence of every distinct row
fn distinct_rows(features: &FeatureRepresentation) -> Vec<usize> {
    let mut seen: HashSet<(Vec<usize>, Vec<u64>)> = HashSet::new();
    (0..features.len())
        .filter(|&i| {
            let bits = features.numeric[i].iter().map(|v| v.to_bits()).collect();
            seen.insert((features.codes[i].clone(), bits))
        })
        .collect()
}

fn nearest(
    features: &FeatureRepresentation,
    row: usize,
    prototypes: &[Prototype],
    gamma: f64,
) -> (usize, f64) {
    prototypes
        .iter()
        .enumerate()
        .map(|(c, proto)| {
            let d = mixed_dissimilarity(&features.codes[row], &features.numeric[row], proto, gamma);
            (c, d)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap_or((0, 0.0))
}
