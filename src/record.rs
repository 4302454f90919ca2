use serde::{Deserialize, Serialize};

use crate::error::LeadError;

/// Names of the categorical fields, in encoding order
pub const CATEGORICAL_FIELDS: [&str; 5] = ["agent", "customer", "job", "stage", "portfolio"];

/// Name of the single numerical field
pub const NUMERICAL_FIELD: &str = "sales_amount";

/// Minimum number of records a batch needs before clustering is attempted
pub const MIN_BATCH_LEN: usize = 3;

/// Pipeline stages a stored lead may be in, earliest first
pub const STAGES: [&str; 5] = ["Inisiasi", "SPH", "Negosiasi", "BAKN", "Win"];

/// Product portfolios a stored lead may belong to
pub const PORTFOLIOS: [&str; 3] = ["PD", "PM", "PS"];

/// A single sales lead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Account manager assigned to the lead
    #[serde(alias = "nama_am")]
    pub agent: String,
    pub customer: String,
    #[serde(alias = "pekerjaan")]
    pub job: String,
    /// Pipeline stage (e.g. "Inisiasi", "SPH", "Negosiasi", "BAKN", "Win")
    pub stage: String,
    #[serde(alias = "portofolio")]
    pub portfolio: String,
    pub sales_amount: f64,
}

impl Record {
    /// Categorical values in `CATEGORICAL_FIELDS` order
    pub fn categorical_values(&self) -> [&str; 5] {
        [
            &self.agent,
            &self.customer,
            &self.job,
            &self.stage,
            &self.portfolio,
        ]
    }

    /// Numerical values in field order
    pub fn numerical_values(&self) -> [f64; 1] {
        [self.sales_amount]
    }

    /// Check the closed-vocabulary fields of a lead entering the store
    ///
    /// Clustering itself accepts any strings; only stored leads are held
    /// to the known stages and portfolios.
    pub fn check_lead(&self) -> Result<(), LeadError> {
        if !STAGES.contains(&self.stage.as_str()) {
            return Err(LeadError::InvalidStage(self.stage.clone()));
        }
        if !PORTFOLIOS.contains(&self.portfolio.as_str()) {
            return Err(LeadError::InvalidPortfolio(self.portfolio.clone()));
        }
        if !self.sales_amount.is_finite() {
            return Err(LeadError::InvalidAmount(self.sales_amount));
        }
        Ok(())
    }
}

/// A record after clustering: the original fields plus its cluster id and tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRecord {
    #[serde(flatten)]
    pub record: Record,
    pub cluster: usize,
    pub description: Option<String>,
}

/// Model metadata for one run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub score: f64,
    pub k: usize,
}
