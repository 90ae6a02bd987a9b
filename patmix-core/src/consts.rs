pub const PAT_SUFFIX: &str = ".pat.gz";
pub const BETA_EXT: &str = "beta";
pub const LBETA_EXT: &str = "lbeta";
