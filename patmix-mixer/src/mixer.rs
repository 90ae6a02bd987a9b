use std::path::PathBuf;

use log::info;
use rayon::ThreadPool;

use patmix_core::models::BlockSet;

use crate::coverage::{CoverageResolver, CoverageScope, StatsGenerator};
use crate::errors::Result;
use crate::merge::{MergeExecutor, ViewFlags};
use crate::naming::resolve_prefix;
use crate::rates::{compute_adjusted_rates, resolve_target_coverage};
use crate::request::MixRequest;
use crate::scheduler::{BatchReport, JobContext, ReplicationScheduler};
use crate::stats::MixStats;

/// Everything derived from a request before any replicate is produced.
#[derive(Debug, Clone)]
pub struct MixPlan {
    pub stats: MixStats,
    pub prefix: PathBuf,
    /// one entry per source
    pub view_flags: Vec<ViewFlags>,
}

///
/// Drives a mix: [`Mixer::prepare`] resolves coverages, rates and the output
/// prefix, [`Mixer::run`] produces the replicates. Both run on the mixer's
/// worker pool.
///
pub struct Mixer {
    request: MixRequest,
    pool: ThreadPool,
}

impl Mixer {
    pub fn new(request: MixRequest) -> Result<Self> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = request.threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build()?;
        Ok(Mixer { request, pool })
    }

    pub fn request(&self) -> &MixRequest {
        &self.request
    }

    pub fn prepare(&self, generator: &dyn StatsGenerator) -> Result<MixPlan> {
        info!("mixing...");
        let request = &self.request;
        let scope = &request.scope;

        let mix_blocks = scope
            .bed_file
            .as_deref()
            .map(|path| BlockSet::try_from(path))
            .transpose()?;
        let coverage_blocks = match &mix_blocks {
            Some(_) => None,
            None => scope
                .bed_cov
                .as_deref()
                .map(|path| BlockSet::try_from(path))
                .transpose()?,
        };
        let coverage_scope =
            CoverageScope::select(mix_blocks.as_ref(), coverage_blocks.as_ref(), &scope.region);

        let resolver = CoverageResolver::new(generator, request.precision);
        // on a pool worker, one source at a time, so a cache is generated at
        // most once per run
        let coverages = self.pool.install(|| {
            request
                .sources
                .iter()
                .map(|source| resolver.resolve(source, &coverage_scope))
                .collect::<Result<Vec<f64>>>()
        })?;

        let target = resolve_target_coverage(request.target_coverage, &request.rates, &coverages);
        let adjusted = compute_adjusted_rates(&request.rates, target, &coverages, &request.sources);
        let stats = MixStats::new(&request.sources, &request.rates, &coverages, &adjusted, target);

        let prefix = resolve_prefix(
            &request.output,
            &request.sources,
            &request.rates,
            target,
            scope.region.descriptor(),
        )?;

        let view_flags = adjusted
            .iter()
            .map(|&p| ViewFlags::new(&request.filters, scope, p))
            .collect();

        Ok(MixPlan {
            stats,
            prefix,
            view_flags,
        })
    }

    ///
    /// Produce all replicates of the plan. Fails, after every replicate has
    /// finished, if any of them failed.
    ///
    pub fn run(&self, plan: &MixPlan, executor: &dyn MergeExecutor) -> Result<BatchReport> {
        let ctx = JobContext {
            sources: &self.request.sources,
            labels: &self.request.labels,
            view_flags: &plan.view_flags,
            prefix: &plan.prefix,
            force: self.request.force,
            temp_dir: self.request.temp_dir.as_deref(),
        };

        let report = ReplicationScheduler::new(&self.pool, executor).run(&ctx, self.request.reps);
        info!(
            "{} replicate(s) produced, {} skipped, {} failed",
            report.produced().count(),
            report.skipped().count(),
            report.failures().len()
        );
        report.into_result()
    }
}
