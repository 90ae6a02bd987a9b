//! # Mixing pat files
//!
//! Synthesizes a pat file that looks like it was sequenced from a mixture of
//! several samples: each source is sub-sampled so that it contributes its
//! requested share of a target coverage, and the sub-sampled reads are merged
//! into a single sorted, indexed file. Several independent replicates can be
//! produced in parallel.
//!
//! ```rust,no_run
//! use patmix_mixer::{MixRequest, Mixer};
//! use patmix_mixer::tools::{CommandMergeExecutor, Pat2BetaGenerator, ToolPaths};
//!
//! # fn main() -> anyhow::Result<()> {
//! let request = MixRequest::builder()
//!     .with_sources(&["Liver.pat.gz", "Blood.pat.gz"])
//!     .with_rates(vec![0.1])
//!     .with_reps(3)
//!     .finish()?;
//!
//! let tools = ToolPaths::from_env();
//! let mixer = Mixer::new(request)?;
//! let plan = mixer.prepare(&Pat2BetaGenerator::new(tools.clone()))?;
//! eprintln!("{}", plan.stats);
//! mixer.run(&plan, &CommandMergeExecutor::new(tools))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Structure
//!
//! - [`request`] - the validated request and its builder
//! - [`rates`] - rate completion, validation and adjustment to source coverage
//! - [`coverage`] - prior coverage of each source from its statistics cache
//! - [`naming`] - output prefixes
//! - [`scheduler`] - replicate jobs on a worker pool
//! - [`stats`] - the diagnostic table
//! - [`merge`], [`tools`] - the external merge and cache generation
pub mod consts;
pub mod coverage;
pub mod errors;
pub mod merge;
pub mod mixer;
pub mod naming;
pub mod rates;
pub mod request;
pub mod scheduler;
pub mod stats;
pub mod tools;

// re-exports
pub use coverage::{CoverageResolver, CoverageScope, StatsGenerator};
pub use errors::{MixError, ReplicateFailure, UpstreamError, ValidationError};
pub use merge::{MergeExecutor, MergeTask, ViewFlags};
pub use mixer::{MixPlan, Mixer};
pub use request::{FilterOptions, MixRequest, MixScope, OutputTarget};
pub use scheduler::{BatchReport, MixJob, ReplicateOutcome};
pub use stats::{MixStats, SourceCoverageEntry};
