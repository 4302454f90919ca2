use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::clusterer::ClusteringEngine;
use crate::db::PersistenceGateway;
use crate::encoder::encode;
use crate::error::RunError;
use crate::labeler::label;
use crate::record::{LabeledRecord, Record, RunMetadata, MIN_BATCH_LEN};
use crate::scoring::ValidationScorer;
use crate::search::{search, SearchConfig};

/// Payload returned to the caller of a successful run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResponse {
    pub data: Vec<LabeledRecord>,
    pub score: f64,
    pub k: usize,
}

/// Collaborators for one clustering run
pub struct ClusterRun<'a> {
    pub engine: &'a dyn ClusteringEngine,
    pub scorer: &'a dyn ValidationScorer,
    pub config: SearchConfig,
}

impl<'a> ClusterRun<'a> {
    pub fn new(engine: &'a dyn ClusteringEngine, scorer: &'a dyn ValidationScorer) -> Self {
        Self {
            engine,
            scorer,
            config: SearchConfig::default(),
        }
    }

    pub fn config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Cluster `batch`, persist the result through `gateway`, and return it
    ///
    /// Nothing is written unless the search finds a valid clustering, and
    /// nothing is returned unless the write succeeded.
    pub fn execute(
        &self,
        batch: &[Record],
        gateway: &mut dyn PersistenceGateway,
    ) -> Result<RunResponse, RunError> {
        if batch.len() < MIN_BATCH_LEN {
            error!(found = batch.len(), required = MIN_BATCH_LEN, "batch too small");
            return Err(RunError::Precondition {
                found: batch.len(),
                required: MIN_BATCH_LEN,
            });
        }

        let features = encode(batch);
        info!(records = features.len(), width = features.width(), "encoded batch");

        let outcome = search(&features, self.engine, self.scorer, &self.config)?;
        let best = outcome.best;

        let data = label(batch, &best);
        let metadata = RunMetadata {
            score: best.score,
            k: best.k,
        };

        gateway
            .commit(&data, &metadata, &features.fingerprint())
            .map_err(RunError::Persistence)?;

        Ok(RunResponse {
            data,
            score: metadata.score,
            k: metadata.k,
        })
    }
}
