use super::Prototype;
use crate::encoder::FeatureRepresentation;

/// Mode of each categorical field and mean of each numerical field over
/// `members`. Mode ties go to the lowest code.
pub fn compute_prototype(features: &FeatureRepresentation, members: &[usize]) -> Prototype {
    let mut categorical = Vec::with_capacity(features.vocabularies.len());
    for (field, vocab) in features.vocabularies.iter().enumerate() {
        let mut counts = vec![0usize; vocab.len()];
        for &m in members {
            counts[features.codes[m][field]] += 1;
        }

        let mut best = 0;
        for code in 1..counts.len() {
            if counts[code] > counts[best] {
                best = code;
            }
        }
        categorical.push(best);
    }

    let dim = features.numeric.first().map_or(0, Vec::len);
    let mut numeric = vec![0.0; dim];
    for &m in members {
        for i in 0..dim {
            numeric[i] += features.numeric[m][i];
        }
    }

    let n = members.len() as f64;
    for value in numeric.iter_mut() {
        *value /= n;
    }

    Prototype {
        categorical,
        numeric,
    }
}
