use super::*;
use crate::clusterer::KPrototypes;
use crate::encoder::encode;
use crate::record::Record;
use crate::scoring::Silhouette;
use std::cell::RefCell;
use std::collections::HashMap;

/// Engine that returns `k` round-robin labels and records every call
struct RoundRobin {
    calls: RefCell<Vec<usize>>,
    fail_for: Vec<usize>,
}

impl RoundRobin {
    fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            fail_for: Vec::new(),
        }
    }

    fn failing_for(ks: &[usize]) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            fail_for: ks.to_vec(),
        }
    }
}

impl ClusteringEngine for RoundRobin {
    fn fit_predict(
        &self,
        features: &FeatureRepresentation,
        k: usize,
        _seed: u64,
    ) -> Result<Vec<usize>, ClusterError> {
        self.calls.borrow_mut().push(k);
        if self.fail_for.contains(&k) {
            return Err(ClusterError::Failed(format!("boom at k={}", k)));
        }
        Ok((0..features.len()).map(|i| i % k).collect())
    }
}

/// Engine that always puts everything in one cluster
struct Collapse;

impl ClusteringEngine for Collapse {
    fn fit_predict(
        &self,
        features: &FeatureRepresentation,
        _k: usize,
        _seed: u64,
    ) -> Result<Vec<usize>, ClusterError> {
        Ok(vec![0; features.len()])
    }
}

/// Scorer keyed on the number of distinct labels
struct ByDistinct(HashMap<usize, f64>);

impl ValidationScorer for ByDistinct {
    fn score(&self, _features: &FeatureRepresentation, labels: &[usize]) -> Result<f64, ScoreError> {
        Ok(self.0.get(&distinct_labels(labels)).copied().unwrap_or(-1.0))
    }
}

fn scores(pairs: &[(usize, f64)]) -> ByDistinct {
    ByDistinct(pairs.iter().copied().collect())
}

fn batch(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| Record {
            agent: format!("agent-{}", i % 3),
            customer: format!("customer-{}", i),
            job: "Cloud migration".to_string(),
            stage: "SPH".to_string(),
            portfolio: "PM".to_string(),
            sales_amount: (i * 10) as f64,
        })
        .collect()
}

#[test]
fn test_candidate_range() {
    let config = SearchConfig::default();
    assert_eq!(config.candidates(3), 2..=2);
    assert_eq!(config.candidates(5), 2..=4);
    assert_eq!(config.candidates(7), 2..=6);
    assert_eq!(config.candidates(100), 2..=6);
    assert!(config.candidates(2).is_empty());
    assert!(config.candidates(0).is_empty());
}

#[test]
fn test_picks_highest_score() {
    let features = encode(&batch(10));
    let engine = RoundRobin::new();
    let scorer = scores(&[(2, 0.2), (3, 0.7), (4, 0.4), (5, 0.1), (6, 0.3)]);

    let outcome = search(&features, &engine, &scorer, &SearchConfig::default()).unwrap();
    assert_eq!(outcome.best.k, 3);
    assert_eq!(outcome.best.score, 0.7);
    assert_eq!(outcome.best.labels, (0..10).map(|i| i % 3).collect::<Vec<_>>());
    assert_eq!(*engine.calls.borrow(), vec![2, 3, 4, 5, 6]);
    let swept: Vec<usize> = outcome.trace.iter().map(CandidateOutcome::k).collect();
    assert_eq!(swept, vec![2, 3, 4, 5, 6]);
}

#[test]
fn test_ties_prefer_lower_k() {
    let features = encode(&batch(10));
    let scorer = scores(&[(2, 0.1), (3, 0.5), (4, 0.5), (5, 0.5), (6, 0.2)]);

    let outcome = search(&features, &RoundRobin::new(), &scorer, &SearchConfig::default()).unwrap();
    assert_eq!(outcome.best.k, 3);
}

#[test]
fn test_failed_candidate_is_skipped() {
    let features = encode(&batch(10));
    let engine = RoundRobin::failing_for(&[4]);
    let scorer = scores(&[(2, 0.1), (3, 0.2), (4, 0.9), (5, 0.3), (6, 0.25)]);

    let outcome = search(&features, &engine, &scorer, &SearchConfig::default()).unwrap();
    assert_eq!(outcome.best.k, 5);
    assert!(matches!(
        outcome.trace[2],
        CandidateOutcome::Failed { k: 4, .. }
    ));
    assert_eq!(*engine.calls.borrow(), vec![2, 3, 4, 5, 6]);
}

#[test]
fn test_all_candidates_failing_exhausts_search() {
    let features = encode(&batch(5));
    let engine = RoundRobin::failing_for(&[2, 3, 4]);

    let err = search(&features, &engine, &scores(&[]), &SearchConfig::default()).unwrap_err();
    assert!(matches!(err, RunError::SearchExhausted { tried: 3 }));
}

#[test]
fn test_degenerate_partitions_are_discarded() {
    let features = encode(&batch(6));
    let err = search(&features, &Collapse, &scores(&[(1, 1.0)]), &SearchConfig::default())
        .unwrap_err();
    assert!(matches!(err, RunError::SearchExhausted { tried: 4 }));
}

#[test]
fn test_partition_with_n_labels_is_discarded() {
    // with 3 records, k=2 round-robin gives 2 distinct labels; force n labels instead
    struct Singletons;
    impl ClusteringEngine for Singletons {
        fn fit_predict(
            &self,
            features: &FeatureRepresentation,
            _k: usize,
            _seed: u64,
        ) -> Result<Vec<usize>, ClusterError> {
            Ok((0..features.len()).collect())
        }
    }

    let features = encode(&batch(3));
    let err = search(&features, &Singletons, &scores(&[(3, 1.0)]), &SearchConfig::default())
        .unwrap_err();
    assert!(matches!(err, RunError::SearchExhausted { tried: 1 }));
}

#[test]
fn test_non_finite_scores_are_discarded() {
    let features = encode(&batch(10));
    let scorer = scores(&[(2, f64::NAN), (3, 0.3), (4, f64::INFINITY)]);

    let outcome = search(&features, &RoundRobin::new(), &scorer, &SearchConfig::default()).unwrap();
    assert_eq!(outcome.best.k, 3);
    assert_eq!(outcome.trace[0], CandidateOutcome::NonFinite { k: 2 });
}

#[test]
fn test_negative_scores_still_win_when_alone() {
    let features = encode(&batch(4));
    let scorer = scores(&[(2, -0.4), (3, -0.6)]);

    let outcome = search(&features, &RoundRobin::new(), &scorer, &SearchConfig::default()).unwrap();
    assert_eq!(outcome.best.k, 2);
    assert_eq!(outcome.best.score, -0.4);
}

#[test]
fn test_max_k_cap_is_respected() {
    let features = encode(&batch(20));
    let engine = RoundRobin::new();
    let config = SearchConfig { max_k: 3, seed: 1 };

    search(&features, &engine, &scores(&[(2, 0.1)]), &config).unwrap();
    assert_eq!(*engine.calls.borrow(), vec![2, 3]);
}

#[test]
fn test_real_engine_search_is_deterministic() {
    let records = batch(12);
    let features = encode(&records);
    let engine = KPrototypes::default();
    let config = SearchConfig::default();

    let a = search(&features, &engine, &Silhouette, &config).unwrap();
    let b = search(&features, &engine, &Silhouette, &config).unwrap();

    assert_eq!(a.best, b.best);
    assert_eq!(a.trace, b.trace);
    assert!((MIN_K..=DEFAULT_MAX_K).contains(&a.best.k));
    let distinct = distinct_labels(&a.best.labels);
    assert!(distinct >= 2 && distinct < records.len());
}

#[test]
fn test_engine_with_extreme_cluster_ids() {
    struct FarApart;
    impl ClusteringEngine for FarApart {
        fn fit_predict(
            &self,
            features: &FeatureRepresentation,
            _k: usize,
            _seed: u64,
        ) -> Result<Vec<usize>, ClusterError> {
            Ok((0..features.len())
                .map(|i| if i % 2 == 0 { 0 } else { usize::MAX })
                .collect())
        }
    }

    let features = encode(&batch(6));
    let outcome = search(&features, &FarApart, &Silhouette, &SearchConfig::default()).unwrap();
    assert_eq!(outcome.best.k, 2);
    assert!(outcome.best.labels.contains(&usize::MAX));
    assert!(outcome.best.score.is_finite());
}
