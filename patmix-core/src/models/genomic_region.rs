use std::path::Path;

use crate::errors::ScopeError;
use crate::models::site_index::SiteIndex;
use crate::models::site_range::SiteRange;

///
/// The genomic restriction given on the command line: either the whole genome,
/// or a contiguous range of sites together with a human readable descriptor
/// used in output names.
///
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct GenomicRegion {
    sites: Option<SiteRange>,
    region_str: Option<String>,
}

impl GenomicRegion {
    /// The whole-genome sentinel.
    pub fn whole() -> Self {
        Self::default()
    }

    /// Restrict to an explicit site range, e.g. `"1000-2000"`.
    pub fn from_sites(sites: &str) -> Result<Self, ScopeError> {
        let sites: SiteRange = sites.parse()?;
        Ok(GenomicRegion {
            region_str: Some(sites.to_string()),
            sites: Some(sites),
        })
    }

    ///
    /// Restrict to an explicit site range, described by the genomic span of the
    /// sites, e.g. `"chr1:150-301"`, as found in the genome's site index.
    ///
    pub fn from_sites_with_index(sites: &str, index_path: &Path) -> Result<Self, ScopeError> {
        let sites: SiteRange = sites.parse()?;
        let region_str = SiteIndex::new(index_path).locate(sites)?;
        Ok(GenomicRegion {
            sites: Some(sites),
            region_str: Some(region_str),
        })
    }

    ///
    /// Restrict to a genomic region (`chr` or `chr:start-end`, 1-based inclusive
    /// loci), translated to sites through the genome's site index.
    ///
    pub fn from_region(region: &str, index_path: &Path) -> Result<Self, ScopeError> {
        let index = SiteIndex::new(index_path);
        let (chrom, loci) = parse_region(region)?;
        let sites = index.lookup(&chrom, loci)?;
        Ok(GenomicRegion {
            sites: Some(sites),
            region_str: Some(region.to_string()),
        })
    }

    pub fn is_whole(&self) -> bool {
        self.sites.is_none()
    }

    pub fn sites(&self) -> Option<SiteRange> {
        self.sites
    }

    /// Descriptor used in output names, `None` for the whole genome.
    pub fn descriptor(&self) -> Option<&str> {
        self.region_str.as_deref()
    }
}

fn parse_region(region: &str) -> Result<(String, Option<(u64, u64)>), ScopeError> {
    let invalid = || ScopeError::InvalidRegion(region.to_string());
    let region = region.trim();

    let Some((chrom, loci)) = region.split_once(':') else {
        if region.is_empty() {
            return Err(invalid());
        }
        return Ok((region.to_string(), None));
    };

    let loci = loci.replace(',', "");
    let (start, end) = loci.split_once('-').ok_or_else(invalid)?;
    let start = start.parse::<u64>().map_err(|_| invalid())?;
    let end = end.parse::<u64>().map_err(|_| invalid())?;
    if chrom.is_empty() || start < 1 || end < start {
        return Err(invalid());
    }

    Ok((chrom.to_string(), Some((start, end))))
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::fs;

    #[fixture]
    fn site_index() -> tempfile::TempDir {
        let tempdir = tempfile::tempdir().unwrap();
        fs::write(
            tempdir.path().join("CpG.bed"),
            "chr1\t100\t1\nchr1\t150\t2\nchr1\t300\t3\nchr2\t50\t4\nchr2\t80\t5\n",
        )
        .unwrap();
        tempdir
    }

    #[rstest]
    fn test_whole_genome() {
        let region = GenomicRegion::whole();
        assert!(region.is_whole());
        assert_eq!(region.descriptor(), None);
    }

    #[rstest]
    fn test_from_sites() {
        let region = GenomicRegion::from_sites("10-20").unwrap();
        assert!(!region.is_whole());
        assert_eq!(region.sites(), Some(SiteRange { start: 10, end: 20 }));
        assert_eq!(region.descriptor(), Some("10-20"));
    }

    #[rstest]
    fn test_from_sites_with_index(site_index: tempfile::TempDir) {
        let index = site_index.path().join("CpG.bed");

        let region = GenomicRegion::from_sites_with_index("2-4", &index).unwrap();
        assert_eq!(region.sites(), Some(SiteRange { start: 2, end: 4 }));
        assert_eq!(region.descriptor(), Some("chr1:150-301"));

        let single = GenomicRegion::from_sites_with_index("4-5", &index).unwrap();
        assert_eq!(single.descriptor(), Some("chr2:50-51"));
    }

    #[rstest]
    #[case("3-5")]
    #[case("5-9")]
    fn test_sites_not_locatable(site_index: tempfile::TempDir, #[case] sites: &str) {
        let index = site_index.path().join("CpG.bed");
        let result = GenomicRegion::from_sites_with_index(sites, &index);
        assert!(matches!(result, Err(ScopeError::InvalidSiteRange(_))));
    }

    #[rstest]
    fn test_from_region(site_index: tempfile::TempDir) {
        let index = site_index.path().join("CpG.bed");

        let region = GenomicRegion::from_region("chr1:120-300", &index).unwrap();
        assert_eq!(region.sites(), Some(SiteRange { start: 2, end: 4 }));
        assert_eq!(region.descriptor(), Some("chr1:120-300"));

        let chrom = GenomicRegion::from_region("chr2", &index).unwrap();
        assert_eq!(chrom.sites(), Some(SiteRange { start: 4, end: 6 }));
    }

    #[rstest]
    fn test_region_without_sites(site_index: tempfile::TempDir) {
        let index = site_index.path().join("CpG.bed");
        let result = GenomicRegion::from_region("chr1:400-500", &index);
        assert!(matches!(result, Err(ScopeError::EmptyRegion(_))));
    }

    #[rstest]
    #[case("chr1:")]
    #[case("chr1:10")]
    #[case("chr1:20-10")]
    #[case(":1-2")]
    fn test_bad_region(#[case] raw: &str) {
        assert!(parse_region(raw).is_err());
    }
}
