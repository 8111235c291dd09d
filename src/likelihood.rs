//! Bucketed word log-likelihood comparison.
//!
//! Given a reference corpus and, for each of two systems, the log likelihood
//! each system assigned to every reference token, reports the average word
//! log likelihood per bucket. A word's bucket is its label from an aligned
//! label corpus (e.g. part-of-speech tags); without labels every word falls
//! into a single `all` bucket.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use thiserror::Error;

/// Bucket name used when no label corpus is given
pub const ALL_BUCKET: &str = "all";

/// Errors from misaligned likelihood inputs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LikelihoodError {
    #[error("{corpus} has {actual} lines, reference has {expected}")]
    LineCountMismatch {
        corpus: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{corpus} line {line} has {actual} entries, reference has {expected} tokens")]
    TokenCountMismatch {
        corpus: &'static str,
        line: usize,
        expected: usize,
        actual: usize,
    },
}

/// How words are grouped into buckets
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BucketKind {
    /// One bucket per label in the label corpus
    Label,
    /// Every word in one bucket
    All,
}

impl BucketKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::All => "all",
        }
    }
}

/// Average log likelihood of both systems within one bucket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BucketLikelihood {
    pub bucket: String,
    /// Words that fell into the bucket
    pub count: usize,
    pub sys1: f64,
    pub sys2: f64,
}

/// Per-bucket likelihood comparison, buckets sorted by name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LikelihoodReport {
    pub bucket_kind: BucketKind,
    pub buckets: Vec<BucketLikelihood>,
}

/// Table row for markdown output
#[derive(Tabled)]
struct BucketTableRow {
    #[tabled(rename = "Bucket")]
    bucket: String,
    #[tabled(rename = "Words")]
    count: usize,
    #[tabled(rename = "sys1")]
    sys1: String,
    #[tabled(rename = "sys2")]
    sys2: String,
}

#[derive(Default)]
struct BucketTotals {
    count: usize,
    sys1: f64,
    sys2: f64,
}

/// Compare per-word log likelihoods of two systems by bucket
///
/// `reference` is only used to check alignment: every line of `ll1`, `ll2`
/// and `labels` must have one entry per reference token.
///
/// # Errors
///
/// Returns `LikelihoodError` naming the first misaligned corpus and line.
#[allow(clippy::cast_precision_loss)]
pub fn compare_likelihoods<T: AsRef<[String]>>(
    reference: &[T],
    ll1: &[Vec<f64>],
    ll2: &[Vec<f64>],
    labels: Option<&[T]>,
) -> Result<LikelihoodReport, LikelihoodError> {
    check_line_count("ll1", reference.len(), ll1.len())?;
    check_line_count("ll2", reference.len(), ll2.len())?;
    if let Some(labels) = labels {
        check_line_count("labels", reference.len(), labels.len())?;
    }

    let mut totals: BTreeMap<&str, BucketTotals> = BTreeMap::new();

    for (idx, sentence) in reference.iter().enumerate() {
        let expected = sentence.as_ref().len();
        let line = idx + 1;
        check_token_count("ll1", line, expected, ll1[idx].len())?;
        check_token_count("ll2", line, expected, ll2[idx].len())?;
        let sentence_labels = match labels {
            Some(labels) => {
                let row = labels[idx].as_ref();
                check_token_count("labels", line, expected, row.len())?;
                Some(row)
            }
            None => None,
        };

        for pos in 0..expected {
            let bucket = sentence_labels.map_or(ALL_BUCKET, |row| row[pos].as_str());
            let entry = totals.entry(bucket).or_default();
            entry.count += 1;
            entry.sys1 += ll1[idx][pos];
            entry.sys2 += ll2[idx][pos];
        }
    }

    let buckets = totals
        .into_iter()
        .map(|(bucket, t)| BucketLikelihood {
            bucket: bucket.to_string(),
            count: t.count,
            sys1: t.sys1 / t.count as f64,
            sys2: t.sys2 / t.count as f64,
        })
        .collect::<Vec<_>>();

    tracing::debug!(buckets = buckets.len(), "Computed bucketed likelihoods");

    Ok(LikelihoodReport {
        bucket_kind: if labels.is_some() {
            BucketKind::Label
        } else {
            BucketKind::All
        },
        buckets,
    })
}

fn check_line_count(corpus: &'static str, expected: usize, actual: usize) -> Result<(), LikelihoodError> {
    if expected == actual {
        Ok(())
    } else {
        Err(LikelihoodError::LineCountMismatch {
            corpus,
            expected,
            actual,
        })
    }
}

fn check_token_count(
    corpus: &'static str,
    line: usize,
    expected: usize,
    actual: usize,
) -> Result<(), LikelihoodError> {
    if expected == actual {
        Ok(())
    } else {
        Err(LikelihoodError::TokenCountMismatch {
            corpus,
            line,
            expected,
            actual,
        })
    }
}

impl LikelihoodReport {
    /// Render as tab-separated text, one bucket per line
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut output = String::new();
        writeln!(
            output,
            "--- average word log likelihood by {} bucket",
            self.bucket_kind.name()
        )
        .ok();
        for b in &self.buckets {
            writeln!(output, "{}\t{:.4}\t{:.4}", b.bucket, b.sys1, b.sys2).ok();
        }
        output
    }

    /// Render as a markdown section with one table row per bucket
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        writeln!(
            output,
            "# Average Word Log Likelihood by {} Bucket",
            capitalize(self.bucket_kind.name())
        )
        .ok();
        writeln!(output).ok();

        if self.buckets.is_empty() {
            writeln!(output, "_No words to compare._").ok();
            return output;
        }

        let rows: Vec<BucketTableRow> = self
            .buckets
            .iter()
            .map(|b| BucketTableRow {
                bucket: b.bucket.clone(),
                count: b.count,
                sys1: format!("{:.4}", b.sys1),
                sys2: format!("{:.4}", b.sys2),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::markdown());
        writeln!(output, "{table}").ok();
        output
    }

    /// Render report as JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
