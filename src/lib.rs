//! NDCG evaluation library
//!
//! Scores ranked retrieval runs against TREC-style relevance judgments at
//! multiple cutoffs and averages over queries.

pub mod benchmark;
pub mod config;
pub mod error;
pub mod qrels;
pub mod runs;

pub use error::{EvalError, EvalResult};
