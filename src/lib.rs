// Public API exports
pub mod clusterer;
pub mod config;
pub mod db;
pub mod encoder;
pub mod error;
pub mod labeler;
pub mod pipeline;
pub mod record;
pub mod scoring;
pub mod search;
pub mod summary;

// Re-export main types for convenience
pub use record::{
    LabeledRecord, Record, RunMetadata, CATEGORICAL_FIELDS, MIN_BATCH_LEN, NUMERICAL_FIELD,
    PORTFOLIOS, STAGES,
};

pub use encoder::{encode, FeatureRepresentation};

pub use clusterer::{ClusterError, ClusteringEngine, KPrototypes};

pub use scoring::{ScoreError, Silhouette, ValidationScorer};

pub use search::{search, BestResult, CandidateOutcome, CandidateResult, SearchConfig, SearchOutcome};

pub use labeler::{describe, label, CLUSTER_DESCRIPTIONS};

pub use db::{LeadPage, PersistenceGateway, ResultStore, StoredDocument};

pub use pipeline::{ClusterRun, RunResponse};

pub use config::AppConfig;
pub use error::{LeadError, RunError};
