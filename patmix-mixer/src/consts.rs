pub const MIX_CMD: &str = "mix";

/// Allowed deviation of the rates' sum from 1.
pub const RATE_SUM_TOLERANCE: f64 = 1e-8;

pub const MIN_SOURCES: usize = 2;
pub const DEFAULT_OUT_DIR: &str = ".";
pub const DEFAULT_REPS: usize = 1;

/// Extension of merged replicates and of their index.
pub const MIX_EXT: &str = "pat.gz";
pub const INDEX_EXT: &str = "csi";

pub const PREFIX_SEP: &str = "_";

// external tools, overridable through the environment
pub const WGBSTOOLS_ENV: &str = "PATMIX_WGBSTOOLS";
pub const BGZIP_ENV: &str = "PATMIX_BGZIP";
pub const TABIX_ENV: &str = "PATMIX_TABIX";
pub const SORT_ENV: &str = "PATMIX_SORT";
pub const DEFAULT_WGBSTOOLS: &str = "wgbstools";
pub const DEFAULT_BGZIP: &str = "bgzip";
pub const DEFAULT_TABIX: &str = "tabix";
pub const DEFAULT_SORT: &str = "sort";
pub const SHELL: &str = "bash";
