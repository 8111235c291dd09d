//! compare-mt-sig CLI
//!
//! Paired bootstrap significance testing and word log-likelihood comparison

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use compare_mt_sig::{
    compare_likelihoods, load_nums, BootstrapConfig, ComparisonReport, Corpus, MetricKind,
    PairedBootstrap,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "compare-mt-sig")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Markdown,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two systems with paired bootstrap resampling
    Bootstrap {
        /// Reference file, one entry per line
        #[arg(long)]
        ref_file: PathBuf,

        /// Output of system 1, aligned with the reference
        #[arg(long)]
        sys1_file: PathBuf,

        /// Output of system 2, aligned with the reference
        #[arg(long)]
        sys2_file: PathBuf,

        /// YAML configuration file (flags override its values)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Metric to compare with (acc, bleu)
        #[arg(long)]
        metric: Option<String>,

        /// Number of bootstrap samples
        #[arg(long)]
        num_samples: Option<usize>,

        /// Fraction of examples drawn per sample
        #[arg(long)]
        sample_ratio: Option<f64>,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Display name for system 1
        #[arg(long, default_value = "sys1")]
        sys1_name: String,

        /// Display name for system 2
        #[arg(long, default_value = "sys2")]
        sys2_name: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Write the report to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Show a progress bar
        #[arg(long)]
        progress: bool,
    },

    /// Compare per-word log likelihoods of two systems by bucket
    CompareLl {
        /// Reference file the likelihoods were computed over
        #[arg(long)]
        ref_file: PathBuf,

        /// Per-token log likelihoods from system 1
        #[arg(long)]
        ll1_file: PathBuf,

        /// Per-token log likelihoods from system 2
        #[arg(long)]
        ll2_file: PathBuf,

        /// Per-token labels used as buckets (one bucket when omitted)
        #[arg(long)]
        label_file: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Bootstrap {
            ref_file,
            sys1_file,
            sys2_file,
            config,
            metric,
            num_samples,
            sample_ratio,
            seed,
            sys1_name,
            sys2_name,
            format,
            output,
            progress,
        } => {
            let mut bootstrap_config = match &config {
                Some(path) => BootstrapConfig::load(path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => BootstrapConfig::default(),
            };
            if let Some(metric) = metric {
                bootstrap_config.metric = metric.parse::<MetricKind>()?;
            }
            if let Some(n) = num_samples {
                bootstrap_config.num_samples = n;
            }
            if let Some(ratio) = sample_ratio {
                bootstrap_config.sample_ratio = ratio;
            }
            if let Some(seed) = seed {
                bootstrap_config.seed = seed;
            }
            bootstrap_config.validate()?;

            tracing::info!(
                ref_file = %ref_file.display(),
                sys1_file = %sys1_file.display(),
                sys2_file = %sys2_file.display(),
                config = ?bootstrap_config,
                "Running paired bootstrap"
            );

            let gold = load_corpus(&ref_file)?;
            let sys1 = load_corpus(&sys1_file)?;
            let sys2 = load_corpus(&sys2_file)?;

            let engine = PairedBootstrap::new(bootstrap_config);
            let report = if progress {
                let pb = progress_bar(engine.config().num_samples)?;
                let report = engine.run_with_progress(&gold.lines, &sys1.lines, &sys2.lines, |done| {
                    pb.set_position(done as u64);
                });
                pb.finish_and_clear();
                report?
            } else {
                engine.run(&gold.lines, &sys1.lines, &sys2.lines)?
            };

            let report = ComparisonReport::with_names(report, &sys1_name, &sys2_name);
            let rendered = match format {
                OutputFormat::Text => report.to_text(),
                OutputFormat::Markdown => report.to_markdown(),
                OutputFormat::Json => report.to_json()?,
            };
            emit(&rendered, output.as_deref())
        }
        Commands::CompareLl {
            ref_file,
            ll1_file,
            ll2_file,
            label_file,
            format,
        } => {
            tracing::info!(
                ref_file = %ref_file.display(),
                ll1_file = %ll1_file.display(),
                ll2_file = %ll2_file.display(),
                label_file = ?label_file,
                "Comparing word likelihoods"
            );

            let reference = load_corpus(&ref_file)?;
            let ll1 = load_nums(&ll1_file)
                .with_context(|| format!("Failed to load {}", ll1_file.display()))?;
            let ll2 = load_nums(&ll2_file)
                .with_context(|| format!("Failed to load {}", ll2_file.display()))?;
            let labels = label_file.as_deref().map(load_corpus).transpose()?;

            let report = compare_likelihoods(
                &reference.lines,
                &ll1,
                &ll2,
                labels.as_ref().map(|l| l.lines.as_slice()),
            )?;

            let rendered = match format {
                OutputFormat::Text => report.to_text(),
                OutputFormat::Markdown => report.to_markdown(),
                OutputFormat::Json => report.to_json()?,
            };
            emit(&rendered, None)
        }
    }
}

fn load_corpus(path: &Path) -> Result<Corpus> {
    let corpus =
        Corpus::load(path).with_context(|| format!("Failed to load {}", path.display()))?;
    let stats = corpus.stats();
    tracing::debug!(
        path = %path.display(),
        lines = stats.lines,
        tokens = stats.tokens,
        empty_lines = stats.empty_lines,
        "Loaded corpus"
    );
    if corpus.is_empty() {
        bail!("{} contains no lines", path.display());
    }
    Ok(corpus)
}

fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rounds")?;
    pb.set_style(style.progress_chars("#>-"));
    Ok(pb)
}

fn emit(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "Report written");
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
