use anyhow::{bail, Context, Result};
use std::str::FromStr;

use crate::search::{SearchConfig, DEFAULT_MAX_K, DEFAULT_SEED, MIN_K};

pub const DEFAULT_DB_PATH: &str = "leadcluster.db";
pub const DEFAULT_MAX_ITERS: usize = 100;

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub db_path: String,
    pub seed: u64,
    pub max_k: usize,
    pub max_iters: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            seed: DEFAULT_SEED,
            max_k: DEFAULT_MAX_K,
            max_iters: DEFAULT_MAX_ITERS,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup, falling back to defaults for missing keys
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let cfg = Self {
            db_path: lookup("LEADCLUSTER_DB").unwrap_or(defaults.db_path),
            seed: parse_or(&lookup, "LEADCLUSTER_SEED", defaults.seed)?,
            max_k: parse_or(&lookup, "LEADCLUSTER_MAX_K", defaults.max_k)?,
            max_iters: parse_or(&lookup, "LEADCLUSTER_MAX_ITER", defaults.max_iters)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_k < MIN_K {
            bail!("max_k must be at least {}, got {}", MIN_K, self.max_k);
        }
        if self.max_iters == 0 {
            bail!("max_iters must be positive");
        }
        if self.db_path.trim().is_empty() {
            bail!("database path must not be empty");
        }
        Ok(())
    }

    pub fn search(&self) -> SearchConfig {
        SearchConfig {
            max_k: self.max_k,
            seed: self.seed,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}
