//! Evaluation driver
//!
//! Walks every query of a run, scores each configured cutoff and averages the
//! per-cutoff sums over the number of distinct queries.
//!
//! ## Block windows
//!
//! The default [`WindowStrategy::Blocks`] assumes the results file holds one
//! block of `rank_threshold` results per query, with query ids numbered
//! consecutively from the first query. Ids listed in `gap_query_ids` have no
//! block, so every later query shifts back by one block per gap:
//!
//! ```text
//! first = 201, gaps = [219, 241], block = 50
//! query 218 -> 50 * (218 - 201)     = 850
//! query 220 -> 50 * (220 - 201 - 1) = 900
//! query 242 -> 50 * (242 - 201 - 2) = 1950
//! ```

use serde::Serialize;
use tracing::{debug, info, warn};

use super::ndcg;
use crate::config::{DcgFormula, EvalConfig, WindowStrategy};
use crate::error::{EvalError, EvalResult};
use crate::qrels::Qrels;
use crate::runs::RunFile;

/// Average NDCG at one cutoff
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CutoffScore {
    pub k: usize,
    pub ndcg: f64,
}

/// Scores of a single query, parallel to the report's cutoffs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryScores {
    pub query_id: String,
    /// First index of the query's window into the results list
    pub start: usize,
    pub ndcg: Vec<f64>,
}

/// Result of evaluating a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub label: String,
    pub formula: DcgFormula,
    pub window: WindowStrategy,
    pub num_queries: usize,
    pub cutoffs: Vec<CutoffScore>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub per_query: Vec<QueryScores>,
}

impl EvaluationReport {
    /// Average NDCG at cutoff `k`, if it was evaluated
    pub fn ndcg_at(&self, k: usize) -> Option<f64> {
        self.cutoffs.iter().find(|c| c.k == k).map(|c| c.ndcg)
    }
}

/// Running NDCG sums, one per cutoff
#[derive(Debug, Clone)]
pub struct ScoreAccumulator {
    sums: Vec<f64>,
}

impl ScoreAccumulator {
    pub fn new(cutoffs: usize) -> Self {
        Self {
            sums: vec![0.0; cutoffs],
        }
    }

    pub fn add(&mut self, index: usize, ndcg: f64) {
        self.sums[index] += ndcg;
    }

    /// Divide every sum by the number of queries
    pub fn averages(&self, num_queries: usize) -> Vec<f64> {
        self.sums.iter().map(|s| s / num_queries as f64).collect()
    }
}

/// Parse a query id token as an integer
pub fn parse_query_id(query_id: &str) -> EvalResult<i64> {
    query_id
        .parse()
        .map_err(|_| EvalError::InvalidQueryId(query_id.to_string()))
}

/// Start of a query's block under [`WindowStrategy::Blocks`]
///
/// `gaps` must be sorted. Gaps outside `(first_query_id, query_id)` do not
/// shift the block.
pub fn block_start(query_id: i64, first_query_id: i64, block: i64, gaps: &[i64]) -> EvalResult<i64> {
    if gaps.binary_search(&query_id).is_ok() {
        return Err(EvalError::InvalidConfig(format!(
            "query {} is present in the results but listed as a gap",
            query_id
        )));
    }

    let shift = gaps
        .iter()
        .filter(|&&gap| gap > first_query_id && gap < query_id)
        .count() as i64;

    query_id
        .checked_sub(first_query_id)
        .and_then(|base| base.checked_sub(shift))
        .and_then(|blocks| blocks.checked_mul(block))
        .ok_or(EvalError::QueryIdOutOfRange(query_id))
}

/// Evaluate a run against qrels at every configured cutoff
///
/// `config` must already be validated (sorted gaps, non-zero cutoffs).
pub fn evaluate(run: &RunFile, qrels: &Qrels, config: &EvalConfig) -> EvalResult<EvaluationReport> {
    let first = run.query_ids.first().ok_or(EvalError::EmptyRun)?;
    let first_query_id = parse_query_id(first)?;

    let mut accumulator = ScoreAccumulator::new(config.cutoffs.len());
    let mut per_query = Vec::new();

    for (idx, query) in run.query_ids.iter().enumerate() {
        let query_id = parse_query_id(query)?;

        if !qrels.has_query(query) {
            warn!(query_id = %query, "No judgments for query; it scores 0 at every cutoff");
        }

        let start = match config.window {
            WindowStrategy::Blocks => block_start(
                query_id,
                first_query_id,
                config.rank_threshold,
                &config.gap_query_ids,
            )?,
            WindowStrategy::Offsets => run.query_offsets[idx] as i64,
        };

        let mut scores = Vec::with_capacity(config.cutoffs.len());
        for (i, &k) in config.cutoffs.iter().enumerate() {
            let end = i64::try_from(k)
                .ok()
                .and_then(|k| start.checked_add(k))
                .ok_or(EvalError::QueryIdOutOfRange(query_id))?;
            if start < 0 {
                return Err(EvalError::IndexOutOfRange {
                    start,
                    end,
                    k,
                    len: run.len(),
                });
            }

            let ndcg = ndcg::score(
                &run.pairs,
                qrels,
                k,
                start as usize,
                end as usize,
                config.formula,
            )?;
            debug!(query_id = %query, k, start, end, ndcg, "Scored window");

            accumulator.add(i, ndcg);
            scores.push(ndcg);
        }

        if config.per_query {
            per_query.push(QueryScores {
                query_id: query.clone(),
                start: start as usize,
                ndcg: scores,
            });
        }
    }

    let num_queries = run.query_ids.len();
    let cutoffs = config
        .cutoffs
        .iter()
        .zip(accumulator.averages(num_queries))
        .map(|(&k, ndcg)| CutoffScore { k, ndcg })
        .collect();

    info!(
        queries = num_queries,
        formula = config.formula.name(),
        window = config.window.name(),
        "Evaluation complete"
    );

    Ok(EvaluationReport {
        label: config.label.clone(),
        formula: config.formula,
        window: config.window,
        num_queries,
        cutoffs,
        per_query,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    /// Run text with `per_query` results for each query id, all at ranks 0..n
    fn run_text(query_ids: &[i64], per_query: usize) -> String {
        let mut out = String::new();
        for q in query_ids {
            for rank in 0..per_query {
                out.push_str(&format!("{} Q0 d{} {} 1.0 bm25\n", q, rank, rank));
            }
        }
        out
    }

    fn small_config(cutoffs: Vec<usize>, block: i64, gaps: Vec<i64>) -> EvalConfig {
        let mut config = EvalConfig {
            cutoffs,
            rank_threshold: block,
            gap_query_ids: gaps,
            ..EvalConfig::default()
        };
        config.validate().unwrap();
        config
    }

    #[test]
    fn test_block_start_reference_dataset() {
        let gaps = [219, 241];
        assert_eq!(block_start(201, 201, 50, &gaps).unwrap(), 0);
        assert_eq!(block_start(218, 201, 50, &gaps).unwrap(), 850);
        assert_eq!(block_start(220, 201, 50, &gaps).unwrap(), 900);
        assert_eq!(block_start(240, 201, 50, &gaps).unwrap(), 1900);
        assert_eq!(block_start(242, 201, 50, &gaps).unwrap(), 1950);
        assert_eq!(block_start(250, 201, 50, &gaps).unwrap(), 2350);
    }

    #[test]
    fn test_block_start_without_gaps() {
        assert_eq!(block_start(5, 1, 10, &[]).unwrap(), 40);
    }

    #[test]
    fn test_block_start_rejects_present_gap() {
        assert!(matches!(
            block_start(219, 201, 50, &[219, 241]),
            Err(EvalError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_block_start_overflow_is_error() {
        assert!(matches!(
            block_start(900_000_000_000_000_000, 1, 50, &[]),
            Err(EvalError::QueryIdOutOfRange(900_000_000_000_000_000))
        ));
        assert!(matches!(
            block_start(i64::MIN, i64::MAX, 1, &[]),
            Err(EvalError::QueryIdOutOfRange(_))
        ));
    }

    #[test]
    fn test_evaluate_huge_query_id_returns_error() {
        let run = RunFile::parse(
            &run_text(&[1, 900_000_000_000_000_000], 5),
            Path::new("r"),
            50,
        )
        .unwrap();
        let config = small_config(vec![1], 50, vec![]);
        assert!(matches!(
            evaluate(&run, &Qrels::default(), &config),
            Err(EvalError::QueryIdOutOfRange(900_000_000_000_000_000))
        ));
    }

    #[test]
    fn test_accumulator_average_is_exact() {
        let mut acc = ScoreAccumulator::new(2);
        for _ in 0..7 {
            acc.add(0, 0.3);
            acc.add(1, 1.0);
        }
        let avg = acc.averages(7);
        assert!((avg[0] - 0.3).abs() < 1e-9);
        assert_eq!(avg[1], 1.0);
    }

    #[test]
    fn test_evaluate_with_gap() {
        // Queries 1, 2 and 4; 3 is missing from the run
        let run = RunFile::parse(&run_text(&[1, 2, 4], 5), Path::new("r"), 5).unwrap();
        let qrels = Qrels::from_triples([("1", "d0", 1), ("4", "d0", 1)]);

        let config = small_config(vec![1, 5], 5, vec![3]);
        let report = evaluate(&run, &qrels, &config).unwrap();

        assert_eq!(report.num_queries, 3);
        assert!((report.ndcg_at(1).unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.ndcg_at(5).unwrap() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_gap_missing_from_config_runs_off_the_end() {
        let run = RunFile::parse(&run_text(&[1, 2, 4], 5), Path::new("r"), 5).unwrap();
        let qrels = Qrels::default();
        let config = small_config(vec![5], 5, vec![]);

        assert!(matches!(
            evaluate(&run, &qrels, &config),
            Err(EvalError::IndexOutOfRange { start: 15, end: 20, .. })
        ));
    }

    #[test]
    fn test_offsets_strategy_handles_gaps_and_short_blocks() {
        // Query 10 has 5 results, query 30 has 3
        let mut text = run_text(&[10], 5);
        text.push_str(&run_text(&[30], 3));
        let run = RunFile::parse(&text, Path::new("r"), 5).unwrap();
        let qrels = Qrels::from_triples([("30", "d0", 2)]);

        let mut config = small_config(vec![1, 3], 5, vec![]);
        config.window = WindowStrategy::Offsets;
        config.per_query = true;

        let report = evaluate(&run, &qrels, &config).unwrap();
        assert_eq!(report.ndcg_at(1), Some(0.5));
        assert_eq!(report.per_query[1].start, 5);
        assert_eq!(report.per_query[1].ndcg, vec![1.0, 1.0]);
    }

    #[test]
    fn test_constant_score_average_equals_value() {
        let ids: Vec<i64> = (100..120).collect();
        let run = RunFile::parse(&run_text(&ids, 10), Path::new("r"), 10).unwrap();
        // Every query: only d3 relevant -> reference NDCG@5 = 1/log2(3)
        let triples: Vec<(String, i64)> = ids.iter().map(|q| (q.to_string(), 1)).collect();
        let qrels = Qrels::from_triples(triples.iter().map(|(q, g)| (q.as_str(), "d3", *g)));

        let config = small_config(vec![5], 10, vec![]);
        let report = evaluate(&run, &qrels, &config).unwrap();
        assert!((report.ndcg_at(5).unwrap() - 1.0 / 3f64.log2()).abs() < 1e-9);
        assert!(report.per_query.is_empty());
    }

    #[test]
    fn test_evaluate_empty_run() {
        let run = RunFile::default();
        let err = evaluate(&run, &Qrels::default(), &EvalConfig::default()).unwrap_err();
        assert!(matches!(err, EvalError::EmptyRun));
    }

    #[test]
    fn test_non_integer_query_id() {
        let run = RunFile::parse("abc Q0 d 0\n", Path::new("r"), 50).unwrap();
        let err = evaluate(&run, &Qrels::default(), &EvalConfig::default()).unwrap_err();
        assert!(matches!(err, EvalError::InvalidQueryId(id) if id == "abc"));
    }

    #[test]
    fn test_query_before_first_is_negative_start() {
        let mut text = run_text(&[5], 5);
        text.push_str(&run_text(&[4], 5));
        let run = RunFile::parse(&text, Path::new("r"), 5).unwrap();
        let config = small_config(vec![1], 5, vec![]);
        assert!(matches!(
            evaluate(&run, &Qrels::default(), &config),
            Err(EvalError::IndexOutOfRange { start: -5, .. })
        ));
    }
}
