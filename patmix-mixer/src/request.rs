use std::path::{Path, PathBuf};

use patmix_core::beta::StatsPrecision;
use patmix_core::models::GenomicRegion;
use patmix_core::utils::{default_label, is_pat_file};

use crate::consts::{DEFAULT_OUT_DIR, DEFAULT_REPS, MIN_SOURCES};
use crate::errors::ValidationError;
use crate::rates::{complete_rates, validate_rates};

/// Read filters handed to the viewer as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    pub strict: bool,
    pub strip: bool,
    pub min_len: Option<u32>,
}

/// Where replicates are written.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputTarget {
    /// Directory for an informative, generated prefix.
    Dir(PathBuf),
    /// Explicit prefix, used verbatim.
    Prefix(PathBuf),
}

impl Default for OutputTarget {
    fn default() -> Self {
        OutputTarget::Dir(PathBuf::from(DEFAULT_OUT_DIR))
    }
}

///
/// Genomic restriction of a mix. `bed_file` restricts both coverage and mixing;
/// `bed_cov` only the coverage computation.
///
#[derive(Debug, Clone, Default)]
pub struct MixScope {
    pub region: GenomicRegion,
    pub bed_file: Option<PathBuf>,
    pub bed_cov: Option<PathBuf>,
}

///
/// A validated mixing request. Built with [`MixRequest::builder`], never
/// modified afterwards.
///
#[derive(Debug, Clone)]
pub struct MixRequest {
    pub sources: Vec<PathBuf>,
    /// one rate per source, summing to 1
    pub rates: Vec<f64>,
    pub labels: Vec<String>,
    pub target_coverage: Option<f64>,
    pub scope: MixScope,
    pub reps: usize,
    /// worker pool size, `None` lets rayon decide
    pub threads: Option<usize>,
    pub output: OutputTarget,
    pub force: bool,
    pub filters: FilterOptions,
    pub precision: StatsPrecision,
    /// scratch directory for the merge sort
    pub temp_dir: Option<PathBuf>,
}

impl MixRequest {
    pub fn builder() -> MixRequestBuilder {
        MixRequestBuilder::default()
    }

    pub fn nr_sources(&self) -> usize {
        self.sources.len()
    }
}

#[derive(Debug, Default)]
pub struct MixRequestBuilder {
    sources: Vec<PathBuf>,
    rates: Vec<f64>,
    labels: Option<Vec<String>>,
    target_coverage: Option<f64>,
    scope: MixScope,
    reps: Option<usize>,
    threads: Option<usize>,
    output: OutputTarget,
    force: bool,
    filters: FilterOptions,
    precision: StatsPrecision,
    temp_dir: Option<PathBuf>,
}

impl MixRequestBuilder {
    pub fn with_sources<P: AsRef<Path>>(mut self, sources: &[P]) -> Self {
        self.sources = sources.iter().map(|p| p.as_ref().to_owned()).collect();
        self
    }

    /// Rates in source order; the last one may be omitted.
    pub fn with_rates(mut self, rates: Vec<f64>) -> Self {
        self.rates = rates;
        self
    }

    pub fn with_labels(mut self, labels: Option<Vec<String>>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_target_coverage(mut self, coverage: Option<f64>) -> Self {
        self.target_coverage = coverage;
        self
    }

    pub fn with_scope(mut self, scope: MixScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_reps(mut self, reps: usize) -> Self {
        self.reps = Some(reps);
        self
    }

    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_output(mut self, output: OutputTarget) -> Self {
        self.output = output;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_filters(mut self, filters: FilterOptions) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_precision(mut self, precision: StatsPrecision) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_temp_dir(mut self, temp_dir: Option<PathBuf>) -> Self {
        self.temp_dir = temp_dir;
        self
    }

    ///
    /// Validate everything and produce the request. Only looks at the source
    /// files; nothing is created or written.
    ///
    pub fn finish(self) -> Result<MixRequest, ValidationError> {
        let nr_sources = self.sources.len();
        if nr_sources < MIN_SOURCES {
            return Err(ValidationError::TooFewSources {
                min: MIN_SOURCES,
                found: nr_sources,
            });
        }
        for source in &self.sources {
            if !source.is_file() {
                return Err(ValidationError::SourceNotFound(source.clone()));
            }
            if !is_pat_file(source) {
                return Err(ValidationError::UnrecognizedSource(source.clone()));
            }
        }

        let labels = match self.labels {
            Some(labels) => labels,
            None => self.sources.iter().map(|p| default_label(p)).collect(),
        };
        if labels.len() != nr_sources {
            return Err(ValidationError::LabelCountMismatch {
                expected: nr_sources,
                found: labels.len(),
            });
        }

        let rates = complete_rates(self.rates, nr_sources)?;
        validate_rates(&rates)?;

        if let Some(coverage) = self.target_coverage {
            if !(coverage.is_finite() && coverage > 0.0) {
                return Err(ValidationError::InvalidCoverage(coverage));
            }
        }

        let reps = self.reps.unwrap_or(DEFAULT_REPS);
        if reps == 0 {
            return Err(ValidationError::NoReplicates);
        }

        Ok(MixRequest {
            sources: self.sources,
            rates,
            labels,
            target_coverage: self.target_coverage,
            scope: self.scope,
            reps,
            threads: self.threads.filter(|&t| t > 0),
            output: self.output,
            force: self.force,
            filters: self.filters,
            precision: self.precision,
            temp_dir: self.temp_dir,
        })
    }
}
