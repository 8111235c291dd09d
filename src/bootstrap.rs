//! Paired bootstrap resampling for significance testing.
//!
//! Compares two systems evaluated on the same examples, following Koehn,
//! "Statistical Significance Tests for Machine Translation Evaluation" (2004):
//!
//! 1. Draw a random subset of example indices (without replacement within a
//!    round, `floor(n * sample_ratio)` of them)
//! 2. Score both systems on that subset with the same metric
//! 3. Record which system won, or a tie
//!
//! After all rounds the win counts become win ratios, the larger side is
//! reported as superior with `p = 1 - win_ratio`, and each system's score
//! distribution is summarised by mean, median and a 95% nearest-rank
//! confidence interval.
//!
//! Every round owns its own `ChaCha8Rng`, seeded from the base seed and the
//! round index, so results do not depend on the order rounds are evaluated
//! in. Runs with the `parallel` feature produce the same report as
//! sequential runs.

use crate::config::{BootstrapConfig, ConfigError};
use crate::metrics::{MetricError, MetricKind};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
#[cfg(feature = "parallel")]
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

/// Lower quantile of the reported confidence interval
const CI_LOWER_QUANTILE: f64 = 0.025;
/// Upper quantile of the reported confidence interval
const CI_UPPER_QUANTILE: f64 = 0.975;

/// Errors that can occur before or during a bootstrap run
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error(transparent)]
    UnsupportedMetric(#[from] MetricError),
}

/// One of the two compared systems
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum System {
    Sys1,
    Sys2,
}

impl fmt::Display for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sys1 => f.write_str("sys1"),
            Self::Sys2 => f.write_str("sys2"),
        }
    }
}

/// Outcome of a single resampling round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Win(System),
    Tie,
}

impl RoundOutcome {
    /// Strict comparison of the two round scores; equal scores tie
    #[must_use]
    pub fn from_scores(score1: f64, score2: f64) -> Self {
        match score1.partial_cmp(&score2) {
            Some(Ordering::Greater) => Self::Win(System::Sys1),
            Some(Ordering::Less) => Self::Win(System::Sys2),
            _ => Self::Tie,
        }
    }
}

/// Scores and outcome of one round
#[derive(Debug, Clone, Copy, PartialEq)]
struct RoundResult {
    score1: f64,
    score2: f64,
    outcome: RoundOutcome,
}

/// Raw win tallies over all rounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct WinCounts {
    sys1: usize,
    sys2: usize,
    tie: usize,
}

impl WinCounts {
    fn record(&mut self, outcome: RoundOutcome) {
        match outcome {
            RoundOutcome::Win(System::Sys1) => self.sys1 += 1,
            RoundOutcome::Win(System::Sys2) => self.sys2 += 1,
            RoundOutcome::Tie => self.tie += 1,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn ratios(self, num_samples: usize) -> WinRatios {
        let n = num_samples as f64;
        WinRatios {
            sys1: self.sys1 as f64 / n,
            sys2: self.sys2 as f64 / n,
            tie: self.tie as f64 / n,
        }
    }
}

/// Fraction of rounds won by each system, and of ties
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WinRatios {
    pub sys1: f64,
    pub sys2: f64,
    pub tie: f64,
}

impl WinRatios {
    /// Significance verdict, if one system won strictly more rounds
    #[must_use]
    pub fn verdict(&self) -> Option<Verdict> {
        match self.sys1.partial_cmp(&self.sys2) {
            Some(Ordering::Greater) => Some(Verdict {
                winner: System::Sys1,
                p_value: 1.0 - self.sys1,
            }),
            Some(Ordering::Less) => Some(Verdict {
                winner: System::Sys2,
                p_value: 1.0 - self.sys2,
            }),
            _ => None,
        }
    }

    /// Win ratio of the given system
    #[must_use]
    pub const fn of(&self, system: System) -> f64 {
        match system {
            System::Sys1 => self.sys1,
            System::Sys2 => self.sys2,
        }
    }
}

/// Which system is superior, and the estimated p-value
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Verdict {
    pub winner: System,
    /// `1 - winner's win ratio`
    pub p_value: f64,
}

/// Descriptive statistics of one system's per-round scores
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreSummary {
    pub mean: f64,
    pub median: f64,
    /// Score at sorted rank `floor(n * 0.025)`
    pub ci_lower: f64,
    /// Score at sorted rank `floor(n * 0.975)`
    pub ci_upper: f64,
}

impl ScoreSummary {
    /// Summarise an ascending, non-empty score collection
    #[must_use]
    pub fn from_sorted(sorted: &[f64]) -> Self {
        debug_assert!(!sorted.is_empty(), "at least one round is always run");
        Self {
            mean: compute_mean(sorted),
            median: median_of_sorted(sorted),
            ci_lower: nearest_rank(sorted, CI_LOWER_QUANTILE),
            ci_upper: nearest_rank(sorted, CI_UPPER_QUANTILE),
        }
    }
}

/// Result of a paired bootstrap comparison
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BootstrapReport {
    /// Metric both systems were scored with
    pub metric: MetricKind,
    /// Number of resampling rounds
    pub num_samples: usize,
    /// Examples drawn per round
    pub sample_size: usize,
    /// Total number of paired examples
    pub num_examples: usize,
    /// Base random seed
    pub seed: u64,
    /// Fraction of rounds won by each side
    pub win_ratios: WinRatios,
    /// Present when one system won strictly more rounds
    pub verdict: Option<Verdict>,
    /// System 1 score distribution
    pub sys1: ScoreSummary,
    /// System 2 score distribution
    pub sys2: ScoreSummary,
    /// Per-round system 1 scores, ascending
    #[serde(skip)]
    pub sys1_scores: Vec<f64>,
    /// Per-round system 2 scores, ascending
    #[serde(skip)]
    pub sys2_scores: Vec<f64>,
}

impl BootstrapReport {
    /// Summary for the given system
    #[must_use]
    pub const fn summary(&self, system: System) -> &ScoreSummary {
        match system {
            System::Sys1 => &self.sys1,
            System::Sys2 => &self.sys2,
        }
    }
}

/// Paired bootstrap engine
#[derive(Debug, Clone, Default)]
pub struct PairedBootstrap {
    config: BootstrapConfig,
}

impl PairedBootstrap {
    /// Create an engine with the given configuration
    #[must_use]
    pub const fn new(config: BootstrapConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Compare `sys1` and `sys2` against `gold`
    ///
    /// # Errors
    ///
    /// Returns `BootstrapError::InvalidInput` if the sequences differ in length
    /// or are empty, and `BootstrapError::InvalidConfig` for an invalid round
    /// count or sample ratio. Nothing is sampled when an error is returned.
    pub fn run<T>(&self, gold: &[T], sys1: &[T], sys2: &[T]) -> Result<BootstrapReport, BootstrapError>
    where
        T: AsRef<[String]> + Sync,
    {
        self.run_with_progress(gold, sys1, sys2, |_| {})
    }

    /// Like [`run`](Self::run), calling `progress` with the number of
    /// completed rounds after each round finishes
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub fn run_with_progress<T, F>(
        &self,
        gold: &[T],
        sys1: &[T],
        sys2: &[T],
        progress: F,
    ) -> Result<BootstrapReport, BootstrapError>
    where
        T: AsRef<[String]> + Sync,
        F: Fn(usize) + Sync,
    {
        let sample_size = self.check_preconditions(gold, sys1, sys2)?;
        let num_samples = self.config.num_samples;

        tracing::info!(
            metric = %self.config.metric,
            num_samples,
            sample_size,
            num_examples = gold.len(),
            seed = self.config.seed,
            "Starting paired bootstrap"
        );

        let rounds = self.run_rounds(gold, sys1, sys2, sample_size, &progress);

        let mut wins = WinCounts::default();
        let mut sys1_scores = Vec::with_capacity(num_samples);
        let mut sys2_scores = Vec::with_capacity(num_samples);
        for round in rounds {
            wins.record(round.outcome);
            sys1_scores.push(round.score1);
            sys2_scores.push(round.score2);
        }

        let win_ratios = wins.ratios(num_samples);
        let verdict = win_ratios.verdict();

        sys1_scores.sort_by(f64::total_cmp);
        sys2_scores.sort_by(f64::total_cmp);

        match verdict {
            Some(v) => tracing::info!(
                winner = %v.winner,
                p_value = v.p_value,
                sys1_wins = wins.sys1,
                sys2_wins = wins.sys2,
                ties = wins.tie,
                "Paired bootstrap finished"
            ),
            None => tracing::info!(
                sys1_wins = wins.sys1,
                sys2_wins = wins.sys2,
                ties = wins.tie,
                "Paired bootstrap finished without a superior system"
            ),
        }

        Ok(BootstrapReport {
            metric: self.config.metric,
            num_samples,
            sample_size,
            num_examples: gold.len(),
            seed: self.config.seed,
            win_ratios,
            verdict,
            sys1: ScoreSummary::from_sorted(&sys1_scores),
            sys2: ScoreSummary::from_sorted(&sys2_scores),
            sys1_scores,
            sys2_scores,
        })
    }

    /// Validate configuration and input shape, returning the per-round
    /// sample size
    fn check_preconditions<T>(&self, gold: &[T], sys1: &[T], sys2: &[T]) -> Result<usize, BootstrapError> {
        self.config.validate()?;

        if gold.len() != sys1.len() || gold.len() != sys2.len() {
            return Err(BootstrapError::InvalidInput(format!(
                "length mismatch: gold={}, sys1={}, sys2={}",
                gold.len(),
                sys1.len(),
                sys2.len()
            )));
        }
        if gold.is_empty() {
            return Err(BootstrapError::InvalidInput(
                "no examples to compare".to_string(),
            ));
        }

        let sample_size = self.config.sample_size(gold.len());
        if sample_size == 0 {
            return Err(ConfigError::EmptySample {
                n: gold.len(),
                sample_ratio: self.config.sample_ratio,
            }
            .into());
        }
        Ok(sample_size)
    }

    #[cfg(not(feature = "parallel"))]
    fn run_rounds<T, F>(
        &self,
        gold: &[T],
        sys1: &[T],
        sys2: &[T],
        sample_size: usize,
        progress: &F,
    ) -> Vec<RoundResult>
    where
        T: AsRef<[String]> + Sync,
        F: Fn(usize) + Sync,
    {
        (0..self.config.num_samples)
            .map(|round| {
                let result = self.sample_and_compare(gold, sys1, sys2, sample_size, round);
                progress(round + 1);
                result
            })
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn run_rounds<T, F>(
        &self,
        gold: &[T],
        sys1: &[T],
        sys2: &[T],
        sample_size: usize,
        progress: &F,
    ) -> Vec<RoundResult>
    where
        T: AsRef<[String]> + Sync,
        F: Fn(usize) + Sync,
    {
        let completed = AtomicUsize::new(0);
        // Indexed collect keeps round order, so the report matches a sequential run
        (0..self.config.num_samples)
            .into_par_iter()
            .map(|round| {
                let result = self.sample_and_compare(gold, sys1, sys2, sample_size, round);
                progress(completed.fetch_add(1, AtomicOrdering::Relaxed) + 1);
                result
            })
            .collect()
    }

    /// Score both systems on one freshly drawn subset
    fn sample_and_compare<T: AsRef<[String]>>(
        &self,
        gold: &[T],
        sys1: &[T],
        sys2: &[T],
        sample_size: usize,
        round: usize,
    ) -> RoundResult {
        let mut rng = ChaCha8Rng::seed_from_u64(round_seed(self.config.seed, round as u64));
        let mut ids: Vec<usize> = (0..gold.len()).collect();
        ids.shuffle(&mut rng);
        let reduced_ids = &ids[..sample_size];

        let reduced_gold: Vec<&[String]> = reduced_ids.iter().map(|&i| gold[i].as_ref()).collect();
        let reduced_sys1: Vec<&[String]> = reduced_ids.iter().map(|&i| sys1[i].as_ref()).collect();
        let reduced_sys2: Vec<&[String]> = reduced_ids.iter().map(|&i| sys2[i].as_ref()).collect();

        let score1 = self.config.metric.evaluate(&reduced_gold, &reduced_sys1);
        let score2 = self.config.metric.evaluate(&reduced_gold, &reduced_sys2);
        let outcome = RoundOutcome::from_scores(score1, score2);

        tracing::trace!(round, score1, score2, ?outcome, "Bootstrap round");

        RoundResult {
            score1,
            score2,
            outcome,
        }
    }
}

/// Run a paired bootstrap comparison with a metric named by string.
///
/// The metric name is resolved before any round runs.
///
/// # Errors
///
/// Returns `BootstrapError::UnsupportedMetric` for an unknown metric name,
/// otherwise see [`PairedBootstrap::run`].
pub fn eval_with_paired_bootstrap<T>(
    gold: &[T],
    sys1: &[T],
    sys2: &[T],
    num_samples: usize,
    sample_ratio: f64,
    metric: &str,
    seed: u64,
) -> Result<BootstrapReport, BootstrapError>
where
    T: AsRef<[String]> + Sync,
{
    let metric: MetricKind = metric.parse()?;
    let config = BootstrapConfig::default()
        .with_num_samples(num_samples)
        .with_sample_ratio(sample_ratio)
        .with_metric(metric)
        .with_seed(seed);
    PairedBootstrap::new(config).run(gold, sys1, sys2)
}

/// Derive an independent per-round seed from the base seed (SplitMix64)
#[inline]
fn round_seed(base_seed: u64, round: u64) -> u64 {
    let mut z = base_seed.wrapping_add(round.wrapping_mul(0x9e37_79b9_7f4a_7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[allow(clippy::cast_precision_loss)]
fn compute_mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Value at sorted rank `floor(n * quantile)`, no interpolation
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn nearest_rank(sorted: &[f64], quantile: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = (sorted.len() as f64 * quantile).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

#[cfg(test)]
#[allow(clippy::float_cmp, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn labels(values: &[&str]) -> Vec<Vec<String>> {
        values.iter().map(|v| vec![(*v).to_string()]).collect()
    }

    fn acc_config(num_samples: usize, sample_ratio: f64) -> BootstrapConfig {
        BootstrapConfig::default()
            .with_metric(MetricKind::Accuracy)
            .with_num_samples(num_samples)
            .with_sample_ratio(sample_ratio)
    }

    /// Gold of 40 labels where sys1 is right on 30 and sys2 on 20
    fn uneven_systems() -> (Vec<Vec<String>>, Vec<Vec<String>>, Vec<Vec<String>>) {
        let gold: Vec<Vec<String>> = (0..40).map(|i| vec![format!("g{i}")]).collect();
        let sys1 = gold
            .iter()
            .enumerate()
            .map(|(i, g)| if i < 30 { g.clone() } else { vec!["x".to_string()] })
            .collect();
        let sys2 = gold
            .iter()
            .enumerate()
            .map(|(i, g)| if i % 2 == 0 { g.clone() } else { vec!["y".to_string()] })
            .collect();
        (gold, sys1, sys2)
    }

    // =========================================================================
    // Scenario tests
    // =========================================================================

    #[test]
    fn test_perfect_system_always_wins() {
        let gold = labels(&["1", "1", "1", "1"]);
        let sys2 = labels(&["0", "0", "0", "0"]);

        let report = PairedBootstrap::new(acc_config(10, 1.0))
            .run(&gold, &gold, &sys2)
            .unwrap();

        assert_eq!(report.win_ratios.sys1, 1.0);
        assert_eq!(report.win_ratios.sys2, 0.0);
        assert_eq!(report.win_ratios.tie, 0.0);
        assert!(report.sys1_scores.iter().all(|&s| s == 1.0));
        assert!(report.sys2_scores.iter().all(|&s| s == 0.0));

        let verdict = report.verdict.unwrap();
        assert_eq!(verdict.winner, System::Sys1);
        assert_eq!(verdict.p_value, 0.0);
    }

    #[test]
    fn test_identical_systems_always_tie() {
        let gold = labels(&["a", "b", "c", "d", "e", "f"]);

        let report = PairedBootstrap::new(acc_config(25, 0.5))
            .run(&gold, &gold, &gold)
            .unwrap();

        assert_eq!(report.win_ratios.sys1, 0.0);
        assert_eq!(report.win_ratios.sys2, 0.0);
        assert_eq!(report.win_ratios.tie, 1.0);
        assert!(report.verdict.is_none());
    }

    #[test]
    fn test_sys2_superior() {
        let (gold, sys1, sys2) = uneven_systems();
        let report = PairedBootstrap::new(acc_config(200, 0.5))
            .run(&gold, &sys2, &sys1)
            .unwrap();

        let verdict = report.verdict.unwrap();
        assert_eq!(verdict.winner, System::Sys2);
        assert!((verdict.p_value - (1.0 - report.win_ratios.sys2)).abs() < 1e-12);
        assert!(report.sys2.mean > report.sys1.mean);
    }

    #[test]
    fn test_single_round() {
        let (gold, sys1, sys2) = uneven_systems();
        let report = PairedBootstrap::new(acc_config(1, 0.5))
            .run(&gold, &sys1, &sys2)
            .unwrap();

        let ratios = [
            report.win_ratios.sys1,
            report.win_ratios.sys2,
            report.win_ratios.tie,
        ];
        assert_eq!(ratios.iter().filter(|&&r| r == 1.0).count(), 1);
        assert_eq!(ratios.iter().filter(|&&r| r == 0.0).count(), 2);

        for (summary, scores) in [
            (report.sys1, &report.sys1_scores),
            (report.sys2, &report.sys2_scores),
        ] {
            assert_eq!(scores.len(), 1);
            let score = scores[0];
            assert_eq!(summary.mean, score);
            assert_eq!(summary.median, score);
            assert_eq!(summary.ci_lower, score);
            assert_eq!(summary.ci_upper, score);
        }
    }

    #[test]
    fn test_win_ratios_sum_to_one() {
        let (gold, sys1, sys2) = uneven_systems();
        let report = PairedBootstrap::new(acc_config(333, 0.3))
            .run(&gold, &sys1, &sys2)
            .unwrap();

        let total = report.win_ratios.sys1 + report.win_ratios.sys2 + report.win_ratios.tie;
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_deterministic_with_seed() {
        let (gold, sys1, sys2) = uneven_systems();
        let engine = PairedBootstrap::new(acc_config(100, 0.5).with_seed(1234));

        let first = engine.run(&gold, &sys1, &sys2).unwrap();
        let second = engine.run(&gold, &sys1, &sys2).unwrap();
        assert_eq!(first, second);
    }

    /// Replays every round by hand from its own seed, independently of how
    /// `run` schedules rounds, and checks the report agrees exactly.
    #[test]
    fn test_report_matches_round_by_round_replay() {
        let (gold, sys1, sys2) = uneven_systems();
        let config = acc_config(64, 0.5).with_seed(2024);
        let report = PairedBootstrap::new(config.clone())
            .run(&gold, &sys1, &sys2)
            .unwrap();

        let sample_size = config.sample_size(gold.len());
        let mut scores1 = Vec::new();
        let mut scores2 = Vec::new();
        let (mut wins1, mut wins2, mut ties) = (0_usize, 0_usize, 0_usize);
        for round in 0..config.num_samples {
            let mut rng = ChaCha8Rng::seed_from_u64(round_seed(2024, round as u64));
            let mut ids: Vec<usize> = (0..gold.len()).collect();
            ids.shuffle(&mut rng);

            let picked = &ids[..sample_size];
            let correct = |sys: &[Vec<String>]| picked.iter().filter(|&&i| sys[i] == gold[i]).count();
            let score1 = correct(sys1.as_slice()) as f64 / sample_size as f64;
            let score2 = correct(sys2.as_slice()) as f64 / sample_size as f64;
            match score1.partial_cmp(&score2) {
                Some(Ordering::Greater) => wins1 += 1,
                Some(Ordering::Less) => wins2 += 1,
                _ => ties += 1,
            }
            scores1.push(score1);
            scores2.push(score2);
        }
        scores1.sort_by(f64::total_cmp);
        scores2.sort_by(f64::total_cmp);

        assert_eq!(report.sys1_scores, scores1);
        assert_eq!(report.sys2_scores, scores2);
        assert_eq!(report.win_ratios.sys1, wins1 as f64 / 64.0);
        assert_eq!(report.win_ratios.sys2, wins2 as f64 / 64.0);
        assert_eq!(report.win_ratios.tie, ties as f64 / 64.0);
    }

    #[test]
    fn test_round_seed_fixed_values() {
        assert_eq!(round_seed(0, 1), 0xe220_a839_7b1d_cdaf);
        assert_eq!(round_seed(42, 0), 0xa759_ea27_d472_7622);
        assert_eq!(round_seed(42, 1), 0xbdd7_3226_2feb_6e95);
        assert_eq!(round_seed(7, 3), 0xe698_4080_bab1_2a02);
    }

    #[test]
    fn test_different_seeds_draw_different_samples() {
        let (gold, sys1, sys2) = uneven_systems();
        let a = PairedBootstrap::new(acc_config(100, 0.5).with_seed(1))
            .run(&gold, &sys1, &sys2)
            .unwrap();
        let b = PairedBootstrap::new(acc_config(100, 0.5).with_seed(2))
            .run(&gold, &sys1, &sys2)
            .unwrap();
        assert_ne!(a.sys1_scores, b.sys1_scores);
    }

    #[test]
    fn test_confidence_interval_ordering() {
        let (gold, sys1, sys2) = uneven_systems();
        let report = PairedBootstrap::new(acc_config(500, 0.5))
            .run(&gold, &sys1, &sys2)
            .unwrap();

        for summary in [report.sys1, report.sys2] {
            assert!(summary.ci_lower <= summary.median);
            assert!(summary.median <= summary.ci_upper);
        }
        // sys1 is right on 30/40, so half-samples vary around 0.75
        assert!(report.sys1.ci_lower < report.sys1.ci_upper);
    }

    #[test]
    fn test_report_metadata() {
        let (gold, sys1, sys2) = uneven_systems();
        let report = PairedBootstrap::new(acc_config(10, 0.25).with_seed(9))
            .run(&gold, &sys1, &sys2)
            .unwrap();

        assert_eq!(report.metric, MetricKind::Accuracy);
        assert_eq!(report.num_samples, 10);
        assert_eq!(report.sample_size, 10);
        assert_eq!(report.num_examples, 40);
        assert_eq!(report.seed, 9);
        assert_eq!(report.sys1_scores.len(), 10);
        assert!(report.sys1_scores.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_progress_callback_counts_rounds() {
        use std::sync::Mutex;

        let (gold, sys1, sys2) = uneven_systems();
        let seen = Mutex::new(Vec::new());
        PairedBootstrap::new(acc_config(20, 0.5))
            .run_with_progress(&gold, &sys1, &sys2, |done| {
                seen.lock().unwrap().push(done);
            })
            .unwrap();

        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen, (1..=20).collect::<Vec<_>>());
    }

    #[test]
    fn test_bleu_metric_run() {
        let tokens = |s: &str| -> Vec<String> { s.split_whitespace().map(String::from).collect() };
        let gold: Vec<Vec<String>> = (0..10)
            .map(|i| tokens(&format!("this is reference sentence number {i} here")))
            .collect();
        let sys1 = gold.clone();
        let sys2: Vec<Vec<String>> = (0..10)
            .map(|i| tokens(&format!("this is a hypothesis number {i} here")))
            .collect();

        let config = BootstrapConfig::default()
            .with_metric(MetricKind::Bleu)
            .with_num_samples(30);
        let report = PairedBootstrap::new(config).run(&gold, &sys1, &sys2).unwrap();

        assert_eq!(report.win_ratios.sys1, 1.0);
        assert!((report.sys1.mean - 1.0).abs() < 1e-12);
        assert!(report.sys2.mean < 1.0);
    }

    // =========================================================================
    // Precondition tests
    // =========================================================================

    #[test]
    fn test_length_mismatch_is_invalid_input() {
        let gold = labels(&["1", "2", "3", "4", "5"]);
        let sys1 = labels(&["1", "2", "3", "4"]);
        let sys2 = gold.clone();

        let progressed = std::sync::atomic::AtomicUsize::new(0);
        let result = PairedBootstrap::new(acc_config(10, 1.0)).run_with_progress(
            &gold,
            &sys1,
            &sys2,
            |_| {
                progressed.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            },
        );

        assert!(matches!(result, Err(BootstrapError::InvalidInput(_))));
        assert_eq!(progressed.into_inner(), 0);
    }

    #[test]
    fn test_empty_input_is_invalid_input() {
        let empty: Vec<Vec<String>> = Vec::new();
        let result = PairedBootstrap::default().run(&empty, &empty, &empty);
        assert!(matches!(result, Err(BootstrapError::InvalidInput(_))));
    }

    #[test]
    fn test_zero_rounds_is_invalid_config() {
        let gold = labels(&["1", "2"]);
        let result = PairedBootstrap::new(acc_config(0, 1.0)).run(&gold, &gold, &gold);
        assert!(matches!(
            result,
            Err(BootstrapError::InvalidConfig(ConfigError::InvalidNumSamples(0)))
        ));
    }

    #[test]
    fn test_bad_ratio_is_invalid_config() {
        let gold = labels(&["1", "2"]);
        for ratio in [0.0, 1.5] {
            let result = PairedBootstrap::new(acc_config(5, ratio)).run(&gold, &gold, &gold);
            assert!(matches!(
                result,
                Err(BootstrapError::InvalidConfig(ConfigError::InvalidSampleRatio(_)))
            ));
        }
    }

    #[test]
    fn test_empty_subsample_is_invalid_config() {
        let gold = labels(&["1", "2", "3"]);
        let result = PairedBootstrap::new(acc_config(5, 0.2)).run(&gold, &gold, &gold);
        assert!(matches!(
            result,
            Err(BootstrapError::InvalidConfig(ConfigError::EmptySample { n: 3, .. }))
        ));
    }

    #[test]
    fn test_eval_with_paired_bootstrap_unknown_metric() {
        let gold = labels(&["1"]);
        let result = eval_with_paired_bootstrap(&gold, &gold, &gold, 10, 1.0, "chrf", 42);
        match result {
            Err(BootstrapError::UnsupportedMetric(MetricError::Unsupported(name))) => {
                assert_eq!(name, "chrf");
            }
            other => panic!("expected unsupported metric, got {other:?}"),
        }
    }

    #[test]
    fn test_eval_with_paired_bootstrap_matches_engine() {
        let (gold, sys1, sys2) = uneven_systems();
        let via_fn = eval_with_paired_bootstrap(&gold, &sys1, &sys2, 50, 0.5, "acc", 5).unwrap();
        let via_engine = PairedBootstrap::new(acc_config(50, 0.5).with_seed(5))
            .run(&gold, &sys1, &sys2)
            .unwrap();
        assert_eq!(via_fn, via_engine);
    }

    // =========================================================================
    // Statistics helpers
    // =========================================================================

    #[test]
    fn test_round_outcome_from_scores() {
        assert_eq!(
            RoundOutcome::from_scores(0.6, 0.5),
            RoundOutcome::Win(System::Sys1)
        );
        assert_eq!(
            RoundOutcome::from_scores(0.4, 0.5),
            RoundOutcome::Win(System::Sys2)
        );
        assert_eq!(RoundOutcome::from_scores(0.5, 0.5), RoundOutcome::Tie);
    }

    #[test]
    fn test_verdict_equal_ratios() {
        let ratios = WinRatios {
            sys1: 0.4,
            sys2: 0.4,
            tie: 0.2,
        };
        assert!(ratios.verdict().is_none());
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median_of_sorted(&[1.0, 2.0, 3.0]), 2.0);
        assert_eq!(median_of_sorted(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert_eq!(median_of_sorted(&[7.0]), 7.0);
    }

    #[test]
    fn test_nearest_rank_indices() {
        let sorted: Vec<f64> = (0..1000).map(f64::from).collect();
        assert_eq!(nearest_rank(&sorted, CI_LOWER_QUANTILE), 25.0);
        assert_eq!(nearest_rank(&sorted, CI_UPPER_QUANTILE), 975.0);

        let sorted: Vec<f64> = (0..10).map(f64::from).collect();
        assert_eq!(nearest_rank(&sorted, CI_LOWER_QUANTILE), 0.0);
        assert_eq!(nearest_rank(&sorted, CI_UPPER_QUANTILE), 9.0);
    }

    #[test]
    fn test_round_seed_distinct() {
        let seeds: std::collections::HashSet<u64> = (0..1000).map(|r| round_seed(42, r)).collect();
        assert_eq!(seeds.len(), 1000);
        assert_ne!(round_seed(1, 0), round_seed(2, 0));
    }
}
