use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScopeError {
    #[error("Invalid site range (expected START-END, 1-based, end exclusive): {0}")]
    InvalidSiteRange(String),

    #[error("Invalid genomic region (expected chr or chr:start-end): {0}")]
    InvalidRegion(String),

    #[error("No sites found in region: {0}")]
    EmptyRegion(String),

    #[error("Error parsing line {line} in {path:?}: {reason}")]
    ParseError {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Corrupted file. 0 blocks found in the file: {0:?}")]
    EmptyBlockSet(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Coverage file not found: {0:?}")]
    NotFound(PathBuf),

    #[error("File size of {path:?} ({size} bytes) is not a multiple of {row} bytes per site")]
    Truncated { path: PathBuf, size: u64, row: u64 },

    #[error("Sites {start}-{end} are out of bounds for {path:?} ({nr_sites} sites)")]
    OutOfBounds {
        path: PathBuf,
        start: u64,
        end: u64,
        nr_sites: u64,
    },

    #[error("No sites to compute coverage over in {0:?}")]
    EmptyScope(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
