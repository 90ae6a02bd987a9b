//! Prior coverage of each source, read from its per-site statistics cache.
//!
//! Resolution is explicitly two-phase: [`CoverageResolver::try_read`] opens an
//! existing cache, [`CoverageResolver::materialize_if_absent`] generates a
//! missing one. Generation writes next to the source and is not guarded against
//! other processes doing the same; callers running several mixes over the same
//! sources concurrently should materialize the caches first.

use std::path::{Path, PathBuf};

use log::{debug, info};

use patmix_core::beta::{BetaStats, StatsPrecision, stats_path_for};
use patmix_core::errors::StatsError;
use patmix_core::models::{BlockSet, GenomicRegion, SiteRange};

use crate::errors::{MixError, Result, UpstreamError};

/// Builds the statistics cache of a pat file.
pub trait StatsGenerator: Send + Sync {
    ///
    /// Create the cache of `source` at `precision`. On success the file returned
    /// by [`stats_path_for`] must exist.
    ///
    fn generate(&self, source: &Path, precision: StatsPrecision) -> std::result::Result<(), UpstreamError>;
}

/// Where coverage is measured.
#[derive(Debug, Clone, Copy)]
pub enum CoverageScope<'a> {
    Blocks(&'a BlockSet),
    Sites(SiteRange),
    WholeGenome,
}

impl<'a> CoverageScope<'a> {
    ///
    /// Pick the scope by precedence: the mixing blocks, then the coverage-only
    /// blocks, then the site range, then the whole genome.
    ///
    pub fn select(
        mix_blocks: Option<&'a BlockSet>,
        coverage_blocks: Option<&'a BlockSet>,
        region: &GenomicRegion,
    ) -> Self {
        if let Some(blocks) = mix_blocks.or(coverage_blocks) {
            return CoverageScope::Blocks(blocks);
        }
        match region.sites() {
            Some(sites) => CoverageScope::Sites(sites),
            None => CoverageScope::WholeGenome,
        }
    }
}

pub struct CoverageResolver<'a> {
    generator: &'a dyn StatsGenerator,
    precision: StatsPrecision,
}

impl<'a> CoverageResolver<'a> {
    pub fn new(generator: &'a dyn StatsGenerator, precision: StatsPrecision) -> Self {
        CoverageResolver {
            generator,
            precision,
        }
    }

    pub fn cache_path(&self, source: &Path) -> PathBuf {
        stats_path_for(source, self.precision)
    }

    /// Open the cache of `source`, `None` if there is none yet.
    pub fn try_read(&self, source: &Path) -> Result<Option<BetaStats>> {
        match BetaStats::open(&self.cache_path(source), self.precision) {
            Ok(stats) => Ok(Some(stats)),
            Err(StatsError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    ///
    /// Generate the cache of `source` unless it exists. Returns true if it had
    /// to be generated. Blocks until generation finishes.
    ///
    pub fn materialize_if_absent(&self, source: &Path) -> Result<bool> {
        let cache = self.cache_path(source);
        if cache.is_file() {
            return Ok(false);
        }

        info!(
            "No {} file compatible to {} was found. Generate it...",
            self.precision.extension(),
            source.display()
        );
        let upstream = |error| MixError::Upstream {
            source_path: source.to_owned(),
            error,
        };
        self.generator
            .generate(source, self.precision)
            .map_err(upstream)?;
        if !cache.is_file() {
            return Err(upstream(UpstreamError::MissingOutput(cache)));
        }
        Ok(true)
    }

    ///
    /// Coverage of `source` within `scope`, generating its cache first if needed.
    ///
    pub fn resolve(&self, source: &Path, scope: &CoverageScope<'_>) -> Result<f64> {
        self.materialize_if_absent(source)?;
        let stats = self
            .try_read(source)?
            .ok_or_else(|| StatsError::NotFound(self.cache_path(source)))?;

        let coverage = match scope {
            CoverageScope::Blocks(blocks) => stats.block_coverage(blocks)?,
            CoverageScope::Sites(sites) => stats.mean_coverage(Some(*sites))?,
            CoverageScope::WholeGenome => stats.mean_coverage(None)?,
        };
        debug!("{}: coverage {:.2}", source.display(), coverage);

        if !(coverage.is_finite() && coverage > 0.0) {
            return Err(MixError::NoCoverage {
                source_path: source.to_owned(),
            });
        }
        Ok(coverage)
    }
}
