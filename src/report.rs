//! Report generation for paired bootstrap comparisons.
//!
//! Wraps a [`BootstrapReport`] with metadata and renders it as:
//! - Plain text (win ratios, significance line, one stats line per system)
//! - Markdown (summary table)
//! - JSON

use crate::bootstrap::{BootstrapReport, ScoreSummary, System};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as FmtWrite;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Bootstrap result with report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Report metadata
    pub metadata: ReportMetadata,
    /// Significance test result
    pub bootstrap: BootstrapReport,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Report title
    pub title: String,
    /// Display name of system 1
    pub sys1_name: String,
    /// Display name of system 2
    pub sys2_name: String,
    /// Report generation timestamp
    pub generated_at: DateTime<Utc>,
    /// Tool version
    pub framework_version: String,
}

/// Table row for markdown output
#[derive(Tabled)]
struct SystemTableRow {
    #[tabled(rename = "System")]
    system: String,
    #[tabled(rename = "Win ratio")]
    win_ratio: String,
    #[tabled(rename = "Mean")]
    mean: String,
    #[tabled(rename = "Median")]
    median: String,
    #[tabled(rename = "95% CI")]
    ci: String,
}

impl ComparisonReport {
    /// Wrap a bootstrap result, naming the systems `sys1` and `sys2`
    #[must_use]
    pub fn new(bootstrap: BootstrapReport) -> Self {
        Self::with_names(bootstrap, "sys1", "sys2")
    }

    /// Wrap a bootstrap result with display names for both systems
    #[must_use]
    pub fn with_names(bootstrap: BootstrapReport, sys1_name: &str, sys2_name: &str) -> Self {
        Self {
            metadata: ReportMetadata {
                title: format!("Paired Bootstrap Comparison ({})", bootstrap.metric),
                sys1_name: sys1_name.to_string(),
                sys2_name: sys2_name.to_string(),
                generated_at: Utc::now(),
                framework_version: env!("CARGO_PKG_VERSION").to_string(),
            },
            bootstrap,
        }
    }

    fn name(&self, system: System) -> &str {
        match system {
            System::Sys1 => &self.metadata.sys1_name,
            System::Sys2 => &self.metadata.sys2_name,
        }
    }

    /// Render report as JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Render report as plain text
    #[must_use]
    pub fn to_text(&self) -> String {
        let b = &self.bootstrap;
        let mut output = String::new();

        writeln!(
            output,
            "Win ratio: {}={:.3}, {}={:.3}, tie={:.3}",
            self.name(System::Sys1),
            b.win_ratios.sys1,
            self.name(System::Sys2),
            b.win_ratios.sys2,
            b.win_ratios.tie
        )
        .ok();
        if let Some(verdict) = b.verdict {
            writeln!(
                output,
                "({} is superior with p value p={:.3})",
                self.name(verdict.winner),
                verdict.p_value
            )
            .ok();
            writeln!(output).ok();
        }

        for system in [System::Sys1, System::Sys2] {
            let s = b.summary(system);
            writeln!(
                output,
                "{} mean={:.3}, median={:.3}, 95% confidence interval=[{:.3}, {:.3}]",
                self.name(system),
                s.mean,
                s.median,
                s.ci_lower,
                s.ci_upper
            )
            .ok();
        }

        output
    }

    /// Render report as markdown
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let b = &self.bootstrap;
        let mut output = String::new();

        writeln!(output, "# {}", self.metadata.title).ok();
        writeln!(output).ok();
        writeln!(
            output,
            "**Generated:** {}",
            self.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
        .ok();
        writeln!(
            output,
            "**Framework Version:** {}",
            self.metadata.framework_version
        )
        .ok();
        writeln!(output).ok();

        writeln!(output, "## Systems").ok();
        writeln!(output).ok();
        let rows: Vec<SystemTableRow> = [System::Sys1, System::Sys2]
            .into_iter()
            .map(|system| self.table_row(system, b.summary(system)))
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::markdown());
        writeln!(output, "{table}").ok();
        writeln!(output).ok();

        writeln!(output, "## Significance").ok();
        writeln!(output).ok();
        writeln!(output, "- Ties: {:.3}", b.win_ratios.tie).ok();
        if let Some(verdict) = b.verdict {
            writeln!(
                output,
                "- **{}** is superior (p = {:.3})",
                self.name(verdict.winner),
                verdict.p_value
            )
            .ok();
        } else {
            writeln!(output, "- Neither system is superior").ok();
        }
        writeln!(output).ok();

        writeln!(output, "## Configuration").ok();
        writeln!(output).ok();
        writeln!(output, "- Metric: {}", b.metric).ok();
        writeln!(output, "- Bootstrap samples: {}", b.num_samples).ok();
        writeln!(
            output,
            "- Examples per sample: {} of {}",
            b.sample_size, b.num_examples
        )
        .ok();
        writeln!(output, "- Seed: {}", b.seed).ok();

        output
    }

    fn table_row(&self, system: System, summary: &ScoreSummary) -> SystemTableRow {
        SystemTableRow {
            system: self.name(system).to_string(),
            win_ratio: format!("{:.3}", self.bootstrap.win_ratios.of(system)),
            mean: format!("{:.4}", summary.mean),
            median: format!("{:.4}", summary.median),
            ci: format!("[{:.4}, {:.4}]", summary.ci_lower, summary.ci_upper),
        }
    }
}
