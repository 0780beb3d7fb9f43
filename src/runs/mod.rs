//! Ranked retrieval runs
//!
//! Parses a TREC-style results file into the flat, file-ordered list of
//! composite `"queryId documentId"` keys that the scorer indexes into.
//!
//! ## Results File Format
//!
//! One result per line, whitespace-separated:
//!
//! ```text
//! 201 Q0 clueweb12-0000tw-05-12114 0 11.73 BM25b0.75
//! 201 Q0 clueweb12-0108wb-22-26598 1 11.52 BM25b0.75
//! ```
//!
//! Only the first four columns are read: query id, an ignored column,
//! document id and rank. Rows whose rank is at or above the rank threshold
//! are dropped, but their query id is still recorded.
//!
//! Positions in [`RunFile::pairs`] are load-bearing: results for a query must
//! be contiguous and in ascending rank order in the source file.

use std::collections::HashSet;
use std::path::Path;

use tracing::{info, warn};

use crate::error::{read_input, EvalError, EvalResult};

/// Results at or beyond this rank are dropped
pub const DEFAULT_RANK_THRESHOLD: i64 = 50;

/// Build the composite lookup key shared by runs and qrels.
pub fn composite_key(query_id: &str, doc_id: &str) -> String {
    format!("{} {}", query_id, doc_id)
}

/// A parsed results file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunFile {
    /// Retained `"queryId documentId"` keys in file order
    pub pairs: Vec<String>,
    /// Distinct query ids in first-seen order
    pub query_ids: Vec<String>,
    /// Index into `pairs` where each query's results begin, parallel to `query_ids`
    pub query_offsets: Vec<usize>,
    /// Queries whose results reappear after another query, each listed once
    pub non_contiguous: Vec<String>,
}

impl RunFile {
    /// Load a results file, keeping rows with `rank < rank_threshold`
    pub fn load(path: &Path, rank_threshold: i64) -> EvalResult<Self> {
        let content = read_input(path)?;
        let run = Self::parse(&content, path, rank_threshold)?;

        info!(
            path = %path.display(),
            results = run.pairs.len(),
            queries = run.query_ids.len(),
            "Loaded results"
        );

        Ok(run)
    }

    /// Parse results text. `path` is only used in error messages.
    pub fn parse(content: &str, path: &Path, rank_threshold: i64) -> EvalResult<Self> {
        let mut run = RunFile::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut previous: Option<&str> = None;

        for (idx, line) in content.lines().enumerate() {
            let line_no = idx + 1;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.is_empty() {
                continue;
            }
            if tokens.len() < 4 {
                return Err(EvalError::Parse {
                    path: path.to_path_buf(),
                    line: line_no,
                    reason: format!("expected at least 4 columns, found {}", tokens.len()),
                });
            }

            let query_id = tokens[0];
            let doc_id = tokens[2];
            let rank: i64 = tokens[3].parse().map_err(|_| EvalError::Parse {
                path: path.to_path_buf(),
                line: line_no,
                reason: format!("rank '{}' is not an integer", tokens[3]),
            })?;

            if seen.insert(query_id.to_string()) {
                run.query_ids.push(query_id.to_string());
                run.query_offsets.push(run.pairs.len());
            } else if previous != Some(query_id)
                && !run.non_contiguous.iter().any(|q| q == query_id)
            {
                run.non_contiguous.push(query_id.to_string());
                warn!(
                    query_id,
                    line = line_no,
                    "Results for query are not contiguous; positional windows will be wrong"
                );
            }

            if rank < rank_threshold {
                run.pairs.push(composite_key(query_id, doc_id));
            }
            previous = Some(query_id);
        }

        Ok(run)
    }

    /// Number of retained results
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Check if no results were retained
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
