//! # compare-mt-sig
//!
//! Statistical comparison of two machine translation (or classification)
//! systems evaluated against the same reference data.
//!
//! ## Paired Bootstrap Resampling
//!
//! Based on Koehn, "Statistical Significance Tests for Machine Translation
//! Evaluation" (EMNLP 2004):
//! - Each round scores both systems on the same random subset of examples
//! - Win ratios over all rounds give a p-value estimate (`1 - win_ratio`)
//! - Per-system mean, median and 95% nearest-rank confidence interval
//!
//! ## Architecture
//!
//! ```text
//! Reference + System 1 + System 2 (one entry per line)
//!        ↓
//! Corpus loading (whitespace tokens)
//!        ↓
//! Paired bootstrap (N rounds × 2 metric evaluations)
//!        ↓
//! Win ratios, verdict, score distributions
//!        ↓
//! Report (text, markdown, JSON)
//! ```
//!
//! Word log-likelihood comparison by label bucket is provided alongside.

pub mod bootstrap;
pub mod config;
pub mod corpus;
pub mod likelihood;
pub mod metrics;
pub mod report;

pub use bootstrap::{
    eval_with_paired_bootstrap, BootstrapError, BootstrapReport, PairedBootstrap, RoundOutcome,
    ScoreSummary, System, Verdict, WinRatios,
};
pub use config::{BootstrapConfig, ConfigError};
pub use corpus::{load_nums, parse_nums, Corpus, CorpusError, CorpusStats};
pub use likelihood::{
    compare_likelihoods, BucketKind, BucketLikelihood, LikelihoodError, LikelihoodReport,
};
pub use metrics::{accuracy, corpus_bleu, evaluate, MetricError, MetricKind};
pub use report::{ComparisonReport, ReportMetadata};
