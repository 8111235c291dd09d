//! Corpus loading for line-aligned evaluation data.
//!
//! Every file holds one entry per line: a whitespace-tokenized sentence, a
//! single label, or a whitespace-separated list of numbers (per-token log
//! likelihoods). Line `i` of every file refers to the same example.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during corpus loading
#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Corpus file not found: {0}")]
    NotFound(String),

    #[error("Invalid number {value:?} on line {line} of {path}")]
    InvalidNumber {
        path: String,
        line: usize,
        value: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A tokenized, line-aligned corpus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    /// Source file, if loaded from disk
    pub path: Option<PathBuf>,
    /// One token sequence per line
    pub lines: Vec<Vec<String>>,
}

impl Corpus {
    /// Load a corpus file, one whitespace-tokenized entry per line
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist or cannot be read.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CorpusError> {
        let path = path.as_ref();
        let content = read_file(path)?;
        let mut corpus = Self::parse(&content);
        corpus.path = Some(path.to_path_buf());
        Ok(corpus)
    }

    /// Tokenize in-memory content, one entry per line
    #[must_use]
    pub fn parse(content: &str) -> Self {
        Self {
            path: None,
            lines: content.lines().map(tokenize).collect(),
        }
    }

    /// Number of lines
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the corpus has no lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterate over token lines
    pub fn iter(&self) -> impl Iterator<Item = &Vec<String>> {
        self.lines.iter()
    }

    /// Compute statistics about the corpus
    #[must_use]
    pub fn stats(&self) -> CorpusStats {
        CorpusStats {
            lines: self.lines.len(),
            tokens: self.lines.iter().map(Vec::len).sum(),
            empty_lines: self.lines.iter().filter(|l| l.is_empty()).count(),
        }
    }
}

impl AsRef<[Vec<String>]> for Corpus {
    fn as_ref(&self) -> &[Vec<String>] {
        &self.lines
    }
}

/// Statistics about a corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorpusStats {
    /// Total lines
    pub lines: usize,
    /// Total tokens
    pub tokens: usize,
    /// Lines with no tokens
    pub empty_lines: usize,
}

/// Load a file of whitespace-separated numbers, one list per line
///
/// # Errors
///
/// Returns an error if the file cannot be read or a field is not a number.
pub fn load_nums<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<f64>>, CorpusError> {
    let path = path.as_ref();
    let content = read_file(path)?;
    parse_nums(&content, &path.display().to_string())
}

/// Parse whitespace-separated numbers, one list per line
///
/// `source` names the input in error messages.
///
/// # Errors
///
/// Returns `CorpusError::InvalidNumber` for the first field that does not
/// parse as a float.
pub fn parse_nums(content: &str, source: &str) -> Result<Vec<Vec<f64>>, CorpusError> {
    content
        .lines()
        .enumerate()
        .map(|(idx, line)| {
            line.split_whitespace()
                .map(|field| {
                    field.parse::<f64>().map_err(|_| CorpusError::InvalidNumber {
                        path: source.to_string(),
                        line: idx + 1,
                        value: field.to_string(),
                    })
                })
                .collect::<Result<Vec<f64>, CorpusError>>()
        })
        .collect()
}

fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(String::from).collect()
}

fn read_file(path: &Path) -> Result<String, CorpusError> {
    if !path.exists() {
        return Err(CorpusError::NotFound(path.display().to_string()));
    }
    Ok(std::fs::read_to_string(path)?)
}
