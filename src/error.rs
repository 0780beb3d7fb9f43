//! Error types for NDCG evaluation.
//!
//! Every variant is fatal for a batch run. An IDCG of zero is not an error:
//! the scorer defines NDCG as 0.0 for that window.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading inputs or scoring a run.
#[derive(Debug, Error)]
pub enum EvalError {
    /// Input file does not exist
    #[error("Input file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Input file exists but could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed line (too few tokens or a non-integer field)
    #[error("{}:{line}: {reason}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// Scoring window does not fit inside the parsed results
    #[error("Window [{start}, {end}) for k={k} is out of range for {len} results")]
    IndexOutOfRange {
        start: i64,
        end: i64,
        k: usize,
        len: usize,
    },

    /// Query identifier is not an integer
    #[error("Query id '{0}' is not an integer")]
    InvalidQueryId(String),

    /// Query id too far from the first query to place its window
    #[error("Query id {0} is out of range for block windows")]
    QueryIdOutOfRange(i64),

    /// Invalid evaluation settings
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Results file contained no queries to average over
    #[error("Results contain no queries")]
    EmptyRun,
}

pub type EvalResult<T> = std::result::Result<T, EvalError>;

/// Read a whole input file, mapping a missing file to [`EvalError::FileNotFound`].
pub(crate) fn read_input(path: &std::path::Path) -> EvalResult<String> {
    std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            EvalError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            EvalError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}
