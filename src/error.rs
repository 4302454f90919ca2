use thiserror::Error;

/// Fatal outcomes of a clustering run
///
/// Per-candidate failures never appear here; the search absorbs them.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("At least {required} records are required, got {found}")]
    Precondition { found: usize, required: usize },

    #[error("No candidate produced a valid clustering ({tried} cluster counts tried)")]
    SearchExhausted { tried: usize },

    #[error("Failed to persist clustering results: {0:#}")]
    Persistence(anyhow::Error),
}

/// A lead rejected before it reaches the lead store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LeadError {
    #[error("Unknown stage {0:?}, expected one of Inisiasi, SPH, Negosiasi, BAKN, Win")]
    InvalidStage(String),

    #[error("Unknown portfolio {0:?}, expected one of PD, PM, PS")]
    InvalidPortfolio(String),

    #[error("Sales amount must be a finite number, got {0}")]
    InvalidAmount(f64),
}
