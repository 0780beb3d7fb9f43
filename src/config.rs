//! Configuration for NDCG evaluation
//!
//! Defines the `ndcg-eval.toml` schema. Defaults reproduce the TREC Web 2014
//! BM25 evaluation (topics 201-250), so an empty file is a valid config.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{EvalError, EvalResult};
use crate::runs::DEFAULT_RANK_THRESHOLD;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "ndcg-eval.toml";

/// Cutoffs reported in the BM25 NDCG table
pub const DEFAULT_CUTOFFS: &[usize] = &[1, 5, 10, 20, 30, 40, 50];

/// Query ids missing from the TREC Web 2014 BM25 run (topics 201-250)
pub const DEFAULT_GAP_QUERY_IDS: &[i64] = &[219, 241];

/// DCG formula used for both DCG and IDCG
///
/// - `Reference`: `rel[0] + Σ_{i=2}^{k-1} rel[i] / log2(i)`. Position 1 is
///   never read. Kept for parity with published numbers.
/// - `Standard`: `Σ_{i=0}^{k-1} rel[i] / log2(i + 2)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DcgFormula {
    #[default]
    Reference,
    Standard,
}

impl DcgFormula {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::Standard => "standard",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Reference => "rel[0] + sum(rel[i]/log2(i), i=2..k-1), skips position 1",
            Self::Standard => "sum(rel[i]/log2(i+2), i=0..k-1)",
        }
    }
}

/// How the start of a query's window into the results list is found
///
/// - `Blocks`: fixed blocks of `rank_threshold` results per query id,
///   shifted back one block per missing query id below the current one
/// - `Offsets`: the position where the query's results actually begin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowStrategy {
    #[default]
    Blocks,
    Offsets,
}

impl WindowStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Blocks => "blocks",
            Self::Offsets => "offsets",
        }
    }
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `K\t|\tNDCG@K` table
    #[default]
    Table,
    Json,
}

/// Evaluation configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Ranked results file
    pub results: PathBuf,

    /// Relevance judgments file
    pub qrels: PathBuf,

    /// Report output file
    pub output: PathBuf,

    /// Run label written as the first report line
    pub label: String,

    /// Cutoffs K to evaluate
    pub cutoffs: Vec<usize>,

    /// Only results with `rank < rank_threshold` are kept. Also the block size
    /// for [`WindowStrategy::Blocks`].
    pub rank_threshold: i64,

    /// Query ids absent from the results file
    pub gap_query_ids: Vec<i64>,

    pub formula: DcgFormula,

    pub window: WindowStrategy,

    pub format: OutputFormat,

    /// Include per-query scores in the report
    pub per_query: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            results: PathBuf::from("input/BM25b0.75_0.res"),
            qrels: PathBuf::from("input/qrels.adhoc.txt"),
            output: PathBuf::from("output/temp/bm25_ndcg.txt"),
            label: "bm25".to_string(),
            cutoffs: DEFAULT_CUTOFFS.to_vec(),
            rank_threshold: DEFAULT_RANK_THRESHOLD,
            gap_query_ids: DEFAULT_GAP_QUERY_IDS.to_vec(),
            formula: DcgFormula::default(),
            window: WindowStrategy::default(),
            format: OutputFormat::default(),
            per_query: false,
        }
    }
}

impl EvalConfig {
    /// Load config from TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {:?}", path))?;
        Ok(config)
    }

    /// Load from default location (./ndcg-eval.toml) or return defaults
    pub fn load_default() -> Result<Self> {
        let local_path = Path::new(DEFAULT_CONFIG_FILE);
        if local_path.exists() {
            return Self::load(local_path);
        }
        Ok(Self::default())
    }

    /// Save config to TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {:?}", path))?;
        Ok(())
    }

    /// Check invariants and normalize the gap list (sorted, deduplicated)
    pub fn validate(&mut self) -> EvalResult<()> {
        if self.cutoffs.is_empty() {
            return Err(EvalError::InvalidConfig("no cutoffs configured".into()));
        }
        if self.cutoffs.contains(&0) {
            return Err(EvalError::InvalidConfig("cutoff K must be at least 1".into()));
        }
        if self.rank_threshold < 1 {
            return Err(EvalError::InvalidConfig(format!(
                "rank threshold must be positive, got {}",
                self.rank_threshold
            )));
        }

        let max_cutoff = self.cutoffs.iter().copied().max().unwrap_or(0);
        if max_cutoff as i64 > self.rank_threshold {
            return Err(EvalError::InvalidConfig(format!(
                "largest cutoff {} exceeds rank threshold {}",
                max_cutoff, self.rank_threshold
            )));
        }

        self.gap_query_ids.sort_unstable();
        self.gap_query_ids.dedup();
        Ok(())
    }
}
