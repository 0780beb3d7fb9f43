//! Relevance judgments (qrels)
//!
//! ## Qrels File Format
//!
//! ```text
//! 201 0 clueweb12-0000tw-05-12114 1
//! 201 0 clueweb12-0108wb-22-26598 0
//! ```
//!
//! Columns are query id, an ignored iteration column, document id and an
//! integer relevance grade. Keys are built with [`composite_key`] so they
//! compare directly against [`RunFile::pairs`](crate::runs::RunFile).

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{debug, info};

use crate::error::{read_input, EvalError, EvalResult};
use crate::runs::composite_key;

/// Relevance grades keyed by `"queryId documentId"`
#[derive(Debug, Clone, Default)]
pub struct Qrels {
    grades: HashMap<String, i64>,
    queries: HashSet<String>,
}

impl Qrels {
    /// Load qrels from a file
    pub fn load(path: &Path) -> EvalResult<Self> {
        let content = read_input(path)?;
        let qrels = Self::parse(&content, path)?;

        info!(
            path = %path.display(),
            judgments = qrels.len(),
            queries = qrels.queries.len(),
            "Loaded qrels"
        );

        Ok(qrels)
    }

    /// Parse qrels text. Later duplicates overwrite earlier ones.
    pub fn parse(content: &str, path: &Path) -> EvalResult<Self> {
        let mut qrels = Qrels::default();

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
                    reason: format!("expected 4 columns, found {}", tokens.len()),
                });
            }

            let relevance: i64 = tokens[3].parse().map_err(|_| EvalError::Parse {
                path: path.to_path_buf(),
                line: line_no,
                reason: format!("relevance '{}' is not an integer", tokens[3]),
            })?;

            let key = composite_key(tokens[0], tokens[2]);
            if let Some(previous) = qrels.grades.insert(key, relevance) {
                debug!(line = line_no, previous, relevance, "Duplicate judgment overwritten");
            }
            qrels.queries.insert(tokens[0].to_string());
        }

        Ok(qrels)
    }

    /// Build qrels from `(query, doc, grade)` triples
    pub fn from_triples<'a>(triples: impl IntoIterator<Item = (&'a str, &'a str, i64)>) -> Self {
        let mut qrels = Qrels::default();
        for (query_id, doc_id, grade) in triples {
            qrels.insert(query_id, doc_id, grade);
        }
        qrels
    }

    /// Insert or overwrite a single judgment
    pub fn insert(&mut self, query_id: &str, doc_id: &str, grade: i64) {
        self.grades.insert(composite_key(query_id, doc_id), grade);
        self.queries.insert(query_id.to_string());
    }

    /// Relevance grade for a composite key; unjudged pairs are 0
    pub fn grade(&self, key: &str) -> i64 {
        self.grades.get(key).copied().unwrap_or(0)
    }

    /// Check if any judgment exists for this query
    pub fn has_query(&self, query_id: &str) -> bool {
        self.queries.contains(query_id)
    }

    /// Number of distinct judged pairs
    pub fn len(&self) -> usize {
        self.grades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grades.is_empty()
    }
}
