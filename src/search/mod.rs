//! Model selection: sweep candidate cluster counts and keep the best score.

use crate::clusterer::{ClusterError, ClusteringEngine};
use crate::encoder::FeatureRepresentation;
use crate::error::RunError;
use crate::scoring::{distinct_labels, is_scoreable, ScoreError, ValidationScorer};
use std::ops::RangeInclusive;
use tracing::{debug, info, warn};

#[cfg(test)]
mod tests;

/// Smallest cluster count ever tried
pub const MIN_K: usize = 2;

/// Default cap on the candidate cluster count
pub const DEFAULT_MAX_K: usize = 6;

/// Default seed handed to the clustering engine
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    pub max_k: usize,
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_k: DEFAULT_MAX_K,
            seed: DEFAULT_SEED,
        }
    }
}

impl SearchConfig {
    /// Candidate counts for `n` records: `[2, min(max_k, n - 1)]`, possibly empty
    pub fn candidates(&self, n: usize) -> RangeInclusive<usize> {
        MIN_K..=self.max_k.min(n.saturating_sub(1))
    }
}

/// One scored partition
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateResult {
    pub k: usize,
    pub labels: Vec<usize>,
    pub score: f64,
}

pub type BestResult = CandidateResult;

/// What happened to a single candidate during the sweep
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateOutcome {
    Scored { k: usize, score: f64 },
    Degenerate { k: usize, distinct: usize },
    Failed { k: usize, error: ClusterError },
    Rejected { k: usize, error: ScoreError },
    NonFinite { k: usize },
}

impl CandidateOutcome {
    pub fn k(&self) -> usize {
        match self {
            CandidateOutcome::Scored { k, .. }
            | CandidateOutcome::Degenerate { k, .. }
            | CandidateOutcome::Failed { k, .. }
            | CandidateOutcome::Rejected { k, .. }
            | CandidateOutcome::NonFinite { k } => *k,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best: BestResult,
    /// One entry per candidate, in sweep order
    pub trace: Vec<CandidateOutcome>,
}

/// Try every candidate cluster count in increasing order and keep the first
/// one reaching the highest score
pub fn search(
    features: &FeatureRepresentation,
    engine: &dyn ClusteringEngine,
    scorer: &dyn ValidationScorer,
    config: &SearchConfig,
) -> Result<SearchOutcome, RunError> {
    let n = features.len();
    let candidates = config.candidates(n);
    debug!(n, ?candidates, "starting cluster search");

    let (best, trace) = candidates.fold(
        (None::<BestResult>, Vec::new()),
        |(best, mut trace), k| {
            let (outcome, scored) = evaluate(features, engine, scorer, k, config.seed);
            trace.push(outcome);

            // strictly greater: lower k keeps exact ties
            let best = match (best, scored) {
                (None, Some(candidate)) => Some(candidate),
                (Some(current), Some(candidate)) if candidate.score > current.score => {
                    Some(candidate)
                }
                (current, _) => current,
            };
            (best, trace)
        },
    );

    match best {
        Some(best) => {
            info!(k = best.k, score = best.score, "selected cluster count");
            Ok(SearchOutcome { best, trace })
        }
        None => Err(RunError::SearchExhausted { tried: trace.len() }),
    }
}

fn evaluate(
    features: &FeatureRepresentation,
    engine: &dyn ClusteringEngine,
    scorer: &dyn ValidationScorer,
    k: usize,
    seed: u64,
) -> (CandidateOutcome, Option<CandidateResult>) {
    let n = features.len();

    let labels = match engine.fit_predict(features, k, seed) {
        Ok(labels) => labels,
        Err(error) => {
            warn!(k, %error, "clustering failed, skipping candidate");
            return (CandidateOutcome::Failed { k, error }, None);
        }
    };

    let distinct = distinct_labels(&labels);
    if labels.len() != n || !is_scoreable(distinct, n) {
        debug!(k, distinct, n, "degenerate partition, skipping candidate");
        return (CandidateOutcome::Degenerate { k, distinct }, None);
    }

    let score = match scorer.score(features, &labels) {
        Ok(score) => score,
        Err(error) => {
            warn!(k, %error, "scoring failed, skipping candidate");
            return (CandidateOutcome::Rejected { k, error }, None);
        }
    };

    if !score.is_finite() {
        warn!(k, score, "non-finite score, skipping candidate");
        return (CandidateOutcome::NonFinite { k }, None);
    }

    info!(k, distinct, score, "scored candidate");
    (
        CandidateOutcome::Scored { k, score },
        Some(CandidateResult { k, labels, score }),
    )
}
