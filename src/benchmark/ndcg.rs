//! NDCG for a single window of a ranked run
//!
//! Relevance is binary: any grade >= 1 counts as 1. The ideal ordering is the
//! same window's relevance sorted descending, so IDCG only rewards documents
//! that were actually retrieved inside the window.

use crate::config::DcgFormula;
use crate::error::{EvalError, EvalResult};
use crate::qrels::Qrels;

/// Collapse a graded judgment to binary gain
pub fn binarize(grade: i64) -> u8 {
    if grade >= 1 {
        1
    } else {
        0
    }
}

/// Binary relevance of `pairs[start..end]`; unjudged pairs are 0
pub fn window_relevance(pairs: &[String], qrels: &Qrels, start: usize, end: usize) -> Vec<u8> {
    pairs[start..end]
        .iter()
        .map(|key| binarize(qrels.grade(key)))
        .collect()
}

/// Discounted cumulative gain over the first `k` entries of `rels`
///
/// `Reference`: rel[0] + Σ_{i=2}^{k-1} rel[i] / log2(i). Index 1 is skipped.
/// `Standard`: Σ_{i=0}^{k-1} rel[i] / log2(i + 2)
pub fn dcg(rels: &[u8], k: usize, formula: DcgFormula) -> f64 {
    let k = k.min(rels.len());
    match formula {
        DcgFormula::Reference => {
            if k == 0 {
                return 0.0;
            }
            let tail: f64 = rels[..k]
                .iter()
                .enumerate()
                .skip(2)
                .map(|(i, &rel)| rel as f64 / (i as f64).log2())
                .sum();
            rels[0] as f64 + tail
        }
        DcgFormula::Standard => rels[..k]
            .iter()
            .enumerate()
            .map(|(i, &rel)| rel as f64 / (i as f64 + 2.0).log2())
            .sum(),
    }
}

/// DCG of the descending-sorted relevance list
pub fn idcg(rels: &[u8], k: usize, formula: DcgFormula) -> f64 {
    let mut sorted = rels.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    dcg(&sorted, k, formula)
}

/// NDCG@k of the window `pairs[start..end]`
///
/// Returns 0.0 when IDCG is zero (no relevant document in the window).
/// Under [`DcgFormula::Reference`] the value can exceed 1.0 because position 1
/// contributes to neither sum.
pub fn score(
    pairs: &[String],
    qrels: &Qrels,
    k: usize,
    start: usize,
    end: usize,
    formula: DcgFormula,
) -> EvalResult<f64> {
    if k == 0 || start > end || end > pairs.len() || k > end - start {
        return Err(EvalError::IndexOutOfRange {
            start: start as i64,
            end: end as i64,
            k,
            len: pairs.len(),
        });
    }

    let rels = window_relevance(pairs, qrels, start, end);
    let dcg = dcg(&rels, k, formula);
    let idcg = idcg(&rels, k, formula);

    if idcg == 0.0 {
        Ok(0.0)
    } else {
        Ok(dcg / idcg)
    }
}
