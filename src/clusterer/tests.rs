use super::*;
use crate::encoder::encode;
use crate::record::Record;
use std::collections::HashSet;

fn lead(agent: &str, stage: &str, amount: f64) -> Record {
    Record {
        agent: agent.to_string(),
        customer: format!("{} Corp", agent),
        job: "Managed network".to_string(),
        stage: stage.to_string(),
        portfolio: "PS".to_string(),
        sales_amount: amount,
    }
}

fn two_groups() -> Vec<Record> {
    vec![
        lead("Budi", "Inisiasi", 10.0),
        lead("Budi", "Inisiasi", 12.0),
        lead("Budi", "Inisiasi", 11.0),
        lead("Sari", "Win", 1000.0),
        lead("Sari", "Win", 1010.0),
        lead("Sari", "Win", 990.0),
    ]
}

#[test]
fn test_kprototypes_separates_two_groups() {
    let features = encode(&two_groups());
    let labels = KPrototypes::default().fit_predict(&features, 2, 42).unwrap();

    assert_eq!(labels.len(), 6);
    assert_eq!(labels[0], labels[1]);
    assert_eq!(labels[1], labels[2]);
    assert_eq!(labels[3], labels[4]);
    assert_eq!(labels[4], labels[5]);
    assert_ne!(labels[0], labels[3]);
}

#[test]
fn test_kprototypes_is_deterministic_for_seed() {
    let features = encode(&two_groups());
    let engine = KPrototypes::default();

    for k in 2..=5 {
        let a = engine.fit_predict(&features, k, 7).unwrap();
        let b = engine.fit_predict(&features, k, 7).unwrap();
        assert_eq!(a, b, "labels differ for k={}", k);
    }
}

#[test]
fn test_labels_are_below_k() {
    let features = encode(&two_groups());
    for k in 1..=6 {
        let fit = KPrototypes::default().fit(&features, k, 42).unwrap();
        assert!(fit.labels.iter().all(|&l| l < k));
        assert_eq!(fit.prototypes.len(), k);
        assert!(fit.iterations >= 1);
        assert!(fit.cost >= 0.0);
    }
}

#[test]
fn test_identical_rows_collapse_to_one_label() {
    let batch = vec![lead("Budi", "SPH", 50.0); 3];
    let features = encode(&batch);

    let labels = KPrototypes::default().fit_predict(&features, 2, 42).unwrap();
    let distinct: HashSet<_> = labels.iter().collect();
    assert_eq!(distinct.len(), 1);
}

#[test]
fn test_fewer_distinct_rows_than_k() {
    let batch = vec![
        lead("Budi", "SPH", 50.0),
        lead("Budi", "SPH", 50.0),
        lead("Sari", "Win", 50.0),
        lead("Sari", "Win", 50.0),
        lead("Adi", "BAKN", 50.0),
        lead("Adi", "BAKN", 50.0),
    ];
    let features = encode(&batch);

    let fit = KPrototypes::default().fit(&features, 5, 42).unwrap();
    assert_eq!(fit.prototypes.len(), 3);
    assert_eq!(fit.labels[0], fit.labels[1]);
    assert_eq!(fit.labels[2], fit.labels[3]);
    assert_eq!(fit.labels[4], fit.labels[5]);
    let distinct: HashSet<_> = fit.labels.iter().collect();
    assert_eq!(distinct.len(), 3);
}

#[test]
fn test_invalid_cluster_counts() {
    let features = encode(&two_groups());
    let engine = KPrototypes::default();

    assert_eq!(
        engine.fit_predict(&features, 0, 42),
        Err(ClusterError::InvalidClusterCount { k: 0, n: 6 })
    );
    assert_eq!(
        engine.fit_predict(&features, 7, 42),
        Err(ClusterError::InvalidClusterCount { k: 7, n: 6 })
    );
    assert_eq!(
        engine.fit_predict(&encode(&[]), 2, 42),
        Err(ClusterError::EmptyInput)
    );
}

#[test]
fn test_non_finite_amount_fails_the_fit() {
    let mut batch = two_groups();
    batch[4].sales_amount = f64::NAN;
    let features = encode(&batch);

    let err = KPrototypes::default().fit_predict(&features, 2, 42).unwrap_err();
    assert!(matches!(err, ClusterError::Failed(ref msg) if msg.contains("row 4")));
}

#[test]
fn test_mixed_dissimilarity_weights_mismatches() {
    let proto = Prototype {
        categorical: vec![0, 1, 2],
        numeric: vec![3.0],
    };

    assert_eq!(mixed_dissimilarity(&[0, 1, 2], &[3.0], &proto, 0.5), 0.0);
    assert_eq!(mixed_dissimilarity(&[0, 0, 0], &[3.0], &proto, 0.5), 1.0);
    assert_eq!(mixed_dissimilarity(&[0, 1, 2], &[5.0], &proto, 0.5), 4.0);
}

#[test]
fn test_explicit_gamma_scales_mismatch_cost() {
    let batch = vec![
        lead("Budi", "SPH", 0.0),
        lead("Budi", "SPH", 10.0),
        lead("Sari", "Win", 1.0),
        lead("Sari", "Win", 11.0),
    ];
    let features = encode(&batch);

    // one cluster: 101 from sales around the 5.5 mean plus 6 mismatches
    let cheap = KPrototypes::default().with_gamma(1.0).fit(&features, 1, 42).unwrap();
    let dear = KPrototypes::default().with_gamma(10.0).fit(&features, 1, 42).unwrap();
    assert!((cheap.cost - 107.0).abs() < 1e-9);
    assert!((dear.cost - 161.0).abs() < 1e-9);
}

#[test]
fn test_euclidean_distance() {
    assert_eq!(euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
    assert_eq!(euclidean_distance(&[1.0], &[1.0]), 0.0);
}
