//! Metric evaluation for scoring system outputs against gold references.
//!
//! Supported metrics:
//! - Accuracy: fraction of outputs that exactly match their gold entry
//! - Corpus BLEU: clipped n-gram precision (orders 1-4) with brevity penalty
//!
//! Every entry is a token sequence. A classification label is simply a
//! one-token line, so both metrics share one input shape.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Highest n-gram order used by corpus BLEU
pub const BLEU_MAX_ORDER: usize = 4;

/// Errors that can occur when selecting a metric
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricError {
    #[error("Unsupported metric: {0} (expected one of: acc, bleu)")]
    Unsupported(String),
}

/// Supported evaluation metrics
///
/// Deserializes through [`FromStr`], so configuration files accept the same
/// case-insensitive selectors as the command line.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum MetricKind {
    /// Fraction of entries where the system output equals the gold entry
    Accuracy,
    /// Corpus-level BLEU with a single reference per entry
    #[default]
    Bleu,
}

impl MetricKind {
    /// Short selector name, as accepted on the command line
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Accuracy => "acc",
            Self::Bleu => "bleu",
        }
    }

    /// Score `sys` against `gold` with this metric
    #[must_use]
    pub fn evaluate<T: AsRef<[String]>>(self, gold: &[T], sys: &[T]) -> f64 {
        debug_assert_eq!(gold.len(), sys.len(), "gold and system must be aligned");
        match self {
            Self::Accuracy => accuracy(gold, sys),
            Self::Bleu => corpus_bleu(gold, sys),
        }
    }
}

impl FromStr for MetricKind {
    type Err = MetricError;

    /// Parse metric kind from string
    ///
    /// # Errors
    ///
    /// Returns `MetricError::Unsupported` if the string doesn't name a known metric.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "acc" | "accuracy" => Ok(Self::Accuracy),
            "bleu" => Ok(Self::Bleu),
            _ => Err(MetricError::Unsupported(s.to_string())),
        }
    }
}

impl TryFrom<String> for MetricKind {
    type Error = MetricError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Score `sys` against `gold` with the given metric
#[must_use]
pub fn evaluate<T: AsRef<[String]>>(gold: &[T], sys: &[T], metric: MetricKind) -> f64 {
    metric.evaluate(gold, sys)
}

/// Fraction of positions where the system entry equals the gold entry.
///
/// Returns 0.0 for empty input.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn accuracy<T: AsRef<[String]>>(gold: &[T], sys: &[T]) -> f64 {
    if gold.is_empty() {
        return 0.0;
    }
    let matches = gold
        .iter()
        .zip(sys)
        .filter(|(g, s)| g.as_ref() == s.as_ref())
        .count();
    matches as f64 / gold.len() as f64
}

/// Corpus BLEU of `hypotheses` against one reference each.
///
/// Clipped n-gram matches and hypothesis n-gram totals are summed over the
/// whole corpus before the precisions are combined (geometric mean, uniform
/// weights). Returns 0.0 when the hypotheses are empty or any order has no
/// match at all.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn corpus_bleu<T: AsRef<[String]>>(references: &[T], hypotheses: &[T]) -> f64 {
    let mut matches = [0_usize; BLEU_MAX_ORDER];
    let mut totals = [0_usize; BLEU_MAX_ORDER];
    let mut hyp_len = 0_usize;
    let mut ref_len = 0_usize;

    for (reference, hypothesis) in references.iter().zip(hypotheses) {
        let reference = reference.as_ref();
        let hypothesis = hypothesis.as_ref();
        hyp_len += hypothesis.len();
        ref_len += reference.len();

        for order in 1..=BLEU_MAX_ORDER {
            let (clipped, total) = clipped_matches(reference, hypothesis, order);
            matches[order - 1] += clipped;
            // A sentence too short for this order still counts one slot
            totals[order - 1] += total.max(1);
        }
    }

    if hyp_len == 0 || matches.contains(&0) {
        return 0.0;
    }

    let log_precision = matches
        .iter()
        .zip(&totals)
        .map(|(&m, &t)| (m as f64 / t as f64).ln())
        .sum::<f64>()
        / BLEU_MAX_ORDER as f64;

    brevity_penalty(hyp_len, ref_len) * log_precision.exp()
}

/// Clipped match count and total hypothesis n-grams for one sentence
fn clipped_matches(reference: &[String], hypothesis: &[String], order: usize) -> (usize, usize) {
    let hyp_counts = ngram_counts(hypothesis, order);
    if hyp_counts.is_empty() {
        return (0, 0);
    }
    let ref_counts = ngram_counts(reference, order);

    let clipped: usize = hyp_counts
        .iter()
        .map(|(gram, &count)| count.min(ref_counts.get(*gram).copied().unwrap_or(0)))
        .sum();
    let total: usize = hyp_counts.values().sum();
    (clipped, total)
}

fn ngram_counts(tokens: &[String], order: usize) -> HashMap<&[String], usize> {
    let mut counts = HashMap::new();
    for gram in tokens.windows(order) {
        *counts.entry(gram).or_insert(0) += 1;
    }
    counts
}

#[allow(clippy::cast_precision_loss)]
fn brevity_penalty(hyp_len: usize, ref_len: usize) -> f64 {
    if hyp_len > ref_len {
        1.0
    } else if hyp_len == 0 {
        0.0
    } else {
        (1.0 - ref_len as f64 / hyp_len as f64).exp()
    }
}
