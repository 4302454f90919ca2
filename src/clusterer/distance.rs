use super::Prototype;

/// Squared Euclidean distance on numerical values plus `gamma` per
/// categorical mismatch
pub fn mixed_dissimilarity(codes: &[usize], numeric: &[f64], proto: &Prototype, gamma: f64) -> f64 {
    let mut num = 0.0;
    for i in 0..numeric.len() {
        let d = numeric[i] - proto.numeric[i];
        num += d * d;
    }

    let mismatches = codes
        .iter()
        .zip(&proto.categorical)
        .filter(|(a, b)| a != b)
        .count();

    num + gamma * mismatches as f64
}

pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    let mut sum = 0.0;
    for i in 0..a.len() {
        let d = a[i] - b[i];
        sum += d * d;
    }
    sum.sqrt()
}
