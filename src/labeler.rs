use crate::record::{LabeledRecord, Record};
use crate::search::BestResult;

/// Descriptive tags for cluster ids 0 through 5
pub const CLUSTER_DESCRIPTIONS: [&str; 6] = [
    "High Prospect",
    "Medium Prospect",
    "Low Prospect",
    "Weak Potential",
    "Not Interested",
    "Potential Prospect",
];

/// Tag for a cluster id. Ids past the table have none.
pub fn describe(cluster: usize) -> Option<&'static str> {
    CLUSTER_DESCRIPTIONS.get(cluster).copied()
}

/// Attach cluster ids and tags to the batch the search ran on
///
/// `best.labels` is aligned 1:1 with `batch`.
pub fn label(batch: &[Record], best: &BestResult) -> Vec<LabeledRecord> {
    batch
        .iter()
        .zip(&best.labels)
        .map(|(record, &cluster)| LabeledRecord {
            record: record.clone(),
            cluster,
            description: describe(cluster).map(str::to_string),
        })
        .collect()
}
