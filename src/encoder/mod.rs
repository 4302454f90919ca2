use crate::record::{Record, CATEGORICAL_FIELDS, NUMERICAL_FIELD};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};


/// Mixed-type view of a batch, one row per record
///
/// Categorical fields are kept twice: as integer codes into per-field
/// vocabularies (for mode-based clustering) and expanded one-hot in `dense`
/// (for pairwise distances). Numerical fields are copied raw.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRepresentation {
    /// Distinct values per categorical field, sorted
    pub vocabularies: Vec<Vec<String>>,
    /// Per-row index into each field's vocabulary
    pub codes: Vec<Vec<usize>>,
    /// Per-row numerical values
    pub numeric: Vec<Vec<f64>>,
    /// One-hot columns followed by numerical columns
    pub dense: Vec<Vec<f64>>,
    pub columns: Vec<String>,
}

impl FeatureRepresentation {
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Number of dense columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// SHA-256 over the dense matrix and column names, hex encoded
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for column in &self.columns {
            hasher.update(column.as_bytes());
            hasher.update([0u8]);
        }
        for row in &self.dense {
            for value in row {
                hasher.update(value.to_le_bytes());
            }
        }
        hex::encode(hasher.finalize())
    }
}

/// Encode a batch into its mixed-type representation
///
/// Vocabularies are derived from this batch alone, so two batches may
/// produce differently shaped representations.
pub fn encode(batch: &[Record]) -> FeatureRepresentation {
    // Per field: value -> code, codes assigned in sorted value order
    let indices: Vec<BTreeMap<&str, usize>> = (0..CATEGORICAL_FIELDS.len())
        .map(|field| {
            batch
                .iter()
                .map(|r| r.categorical_values()[field])
                .collect::<BTreeSet<_>>()
                .into_iter()
                .enumerate()
                .map(|(code, value)| (value, code))
                .collect()
        })
        .collect();

    let vocabularies: Vec<Vec<String>> = indices
        .iter()
        .map(|index| index.keys().map(|v| v.to_string()).collect())
        .collect();

    let mut columns = Vec::new();
    for (field, vocab) in CATEGORICAL_FIELDS.iter().zip(&vocabularies) {
        for value in vocab {
            columns.push(format!("{}_{}", field, value));
        }
    }
    columns.push(NUMERICAL_FIELD.to_string());

    let mut codes = Vec::with_capacity(batch.len());
    let mut numeric = Vec::with_capacity(batch.len());
    let mut dense = Vec::with_capacity(batch.len());

    for record in batch {
        let values = record.categorical_values();
        let mut row_codes = Vec::with_capacity(values.len());
        let mut row = Vec::with_capacity(columns.len());

        for (value, index) in values.iter().zip(&indices) {
            let code = index[*value];
            row_codes.push(code);
            row.extend((0..index.len()).map(|i| if i == code { 1.0 } else { 0.0 }));
        }

        let nums = record.numerical_values().to_vec();
        row.extend_from_slice(&nums);

        codes.push(row_codes);
        numeric.push(nums);
        dense.push(row);
    }

    FeatureRepresentation {
        vocabularies,
        codes,
        numeric,
        dense,
        columns,
    }
}
