use std::path::{Path, PathBuf};

use patmix_core::models::SiteRange;

use crate::errors::UpstreamError;
use crate::request::{FilterOptions, MixScope};

/// Restriction passed to the viewer of every source.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeFlag {
    /// `-L <blocks file>`
    Blocks(PathBuf),
    /// `-s <start>-<end>`
    Sites(SiteRange),
}

///
/// Everything the viewer needs to know about one source in one mix: the read
/// filters, the scope and the source's sub-sampling probability.
///
#[derive(Debug, Clone, PartialEq)]
pub struct ViewFlags {
    pub filters: FilterOptions,
    pub scope: Option<ScopeFlag>,
    pub sub_sample: f64,
}

impl ViewFlags {
    /// A blocks file takes precedence over a site range; only one is emitted.
    pub fn new(filters: &FilterOptions, scope: &MixScope, sub_sample: f64) -> Self {
        let scope = match (&scope.bed_file, scope.region.sites()) {
            (Some(bed), _) => Some(ScopeFlag::Blocks(bed.clone())),
            (None, Some(sites)) => Some(ScopeFlag::Sites(sites)),
            (None, None) => None,
        };
        ViewFlags {
            filters: filters.clone(),
            scope,
            sub_sample,
        }
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.filters.strict {
            args.push("--strict".to_string());
        }
        if self.filters.strip {
            args.push("--strip".to_string());
        }
        if let Some(min_len) = self.filters.min_len {
            args.push("--min_len".to_string());
            args.push(min_len.to_string());
        }
        match &self.scope {
            Some(ScopeFlag::Blocks(bed)) => {
                args.push("-L".to_string());
                args.push(bed.to_string_lossy().into_owned());
            }
            Some(ScopeFlag::Sites(sites)) => {
                args.push("-s".to_string());
                args.push(sites.to_string());
            }
            None => {}
        }
        args.push("--sub_sample".to_string());
        args.push(self.sub_sample.to_string());
        args
    }
}

/// One merge: K sources, their flags and labels, one output file.
#[derive(Debug, Clone, Copy)]
pub struct MergeTask<'a> {
    pub replicate: usize,
    pub sources: &'a [PathBuf],
    pub labels: &'a [String],
    pub view_flags: &'a [ViewFlags],
    pub output: &'a Path,
    pub temp_dir: Option<&'a Path>,
}

///
/// Produces a mixed pat file: the sub-sampled (or duplicated, for
/// probabilities above 1) reads of every source, tagged with the source's
/// label, merged into one sorted, bgzipped and indexed file.
///
/// Implementations run on worker threads, several at a time, each with a
/// distinct output path.
///
pub trait MergeExecutor: Send + Sync {
    fn merge(&self, task: &MergeTask<'_>) -> Result<(), UpstreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    use patmix_core::models::GenomicRegion;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_plain_flags() {
        let flags = ViewFlags::new(&FilterOptions::default(), &MixScope::default(), 0.8);
        assert_eq!(flags.to_args(), vec!["--sub_sample", "0.8"]);
    }

    #[rstest]
    fn test_all_flags() {
        let filters = FilterOptions {
            strict: true,
            strip: true,
            min_len: Some(3),
        };
        let scope = MixScope {
            region: GenomicRegion::from_sites("100-200").unwrap(),
            ..Default::default()
        };
        let flags = ViewFlags::new(&filters, &scope, 1.5);
        assert_eq!(
            flags.to_args(),
            vec![
                "--strict",
                "--strip",
                "--min_len",
                "3",
                "-s",
                "100-200",
                "--sub_sample",
                "1.5"
            ]
        );
    }

    #[rstest]
    fn test_blocks_take_precedence_over_sites() {
        let scope = MixScope {
            region: GenomicRegion::from_sites("100-200").unwrap(),
            bed_file: Some(PathBuf::from("blocks.bed")),
            bed_cov: None,
        };
        let flags = ViewFlags::new(&FilterOptions::default(), &scope, 0.5);

        assert_eq!(flags.scope, Some(ScopeFlag::Blocks(PathBuf::from("blocks.bed"))));
        assert_eq!(flags.to_args(), vec!["-L", "blocks.bed", "--sub_sample", "0.5"]);
    }

    #[rstest]
    fn test_coverage_only_blocks_are_not_passed_on() {
        let scope = MixScope {
            bed_cov: Some(PathBuf::from("cov.bed")),
            ..Default::default()
        };
        let flags = ViewFlags::new(&FilterOptions::default(), &scope, 0.5);
        assert_eq!(flags.scope, None);
    }
}
