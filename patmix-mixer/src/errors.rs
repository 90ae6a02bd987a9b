use std::fmt::{self, Display};
use std::path::PathBuf;

use thiserror::Error;

use patmix_core::errors::{ScopeError, StatsError};

/// Problems with the request itself. Raised before anything is read or written.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("At least {min} pat files are required, got {found}")]
    TooFewSources { min: usize, found: usize },

    #[error("No such file: {0:?}")]
    SourceNotFound(PathBuf),

    #[error("Not a pat file (expected .pat.gz): {0:?}")]
    UnrecognizedSource(PathBuf),

    #[error("len(rates) must be in {{len(files), len(files) - 1}}: got {found} rates for {expected} files")]
    RateCountMismatch { expected: usize, found: usize },

    #[error("Sum(rates) == {0} != 1")]
    RateSumError(f64),

    #[error("rates must be in range [0, 1], got {0}")]
    RateRangeError(f64),

    #[error("len(labels) != len(files): {found} labels for {expected} files")]
    LabelCountMismatch { expected: usize, found: usize },

    #[error("Target coverage must be a positive number, got {0}")]
    InvalidCoverage(f64),

    #[error("Number of replicates must be at least 1")]
    NoReplicates,
}

/// Failure of one of the external collaborators (cache generation or merge).
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Could not run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{0:?} was not created")]
    MissingOutput(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A replicate whose merge failed, kept for the end-of-batch report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicateFailure {
    pub replicate: usize,
    pub path: PathBuf,
    pub reason: String,
}

impl Display for ReplicateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "replicate {} ({}): {}",
            self.replicate,
            self.path.display(),
            self.reason
        )
    }
}

#[derive(Error, Debug)]
pub enum MixError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to create directory {path:?}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to generate coverage statistics for {source_path:?}: {error}")]
    Upstream {
        source_path: PathBuf,
        #[source]
        error: UpstreamError,
    },

    #[error("{source_path:?} has no coverage in the requested scope")]
    NoCoverage { source_path: PathBuf },

    #[error("{} of {total} replicates failed:\n{}", .failed.len(), format_failures(.failed))]
    ReplicatesFailed {
        failed: Vec<ReplicateFailure>,
        total: usize,
    },

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error(transparent)]
    Stats(#[from] StatsError),
}

fn format_failures(failed: &[ReplicateFailure]) -> String {
    failed
        .iter()
        .map(|f| format!("  {}", f))
        .collect::<Vec<_>>()
        .join("\n")
}

pub type Result<T> = std::result::Result<T, MixError>;
