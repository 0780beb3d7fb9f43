//! NDCG evaluation
//!
//! ## Usage
//!
//! ```bash
//! ndcg-eval run --results input/BM25b0.75_0.res --qrels input/qrels.adhoc.txt
//! ```
//!
//! ## Modules
//!
//! - `ndcg` - Binary-gain DCG/IDCG/NDCG over one window of a run
//! - `driver` - Per-query windows, per-cutoff sums and averages
//! - `report` - Table and JSON rendering

pub mod driver;
pub mod ndcg;
pub mod report;

pub use driver::{
    block_start, evaluate, parse_query_id, CutoffScore, EvaluationReport, QueryScores,
    ScoreAccumulator,
};
pub use ndcg::{binarize, dcg, idcg, score, window_relevance};
pub use report::{render, render_json, render_per_query, render_table, write_report};
