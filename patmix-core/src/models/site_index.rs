use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::errors::ScopeError;
use crate::models::site_range::SiteRange;
use crate::utils::get_dynamic_reader;

///
/// Lookup table from genomic loci to CpG site indices: a (optionally gzipped)
/// TSV of `chr`, `locus`, `site index`, sorted by site index.
///
/// The table is streamed on every lookup rather than held in memory, since
/// a whole-genome index has tens of millions of rows and lookups are rare.
///
pub struct SiteIndex {
    path: PathBuf,
}

impl SiteIndex {
    pub fn new(path: &Path) -> Self {
        SiteIndex {
            path: path.to_owned(),
        }
    }

    ///
    /// Find the sites of `chrom` whose locus lies within `loci` (1-based,
    /// inclusive). `None` selects the whole chromosome.
    ///
    pub fn lookup(&self, chrom: &str, loci: Option<(u64, u64)>) -> Result<SiteRange, ScopeError> {
        let reader = get_dynamic_reader(&self.path)
            .map_err(|e| std::io::Error::other(format!("{:#}", e)))?;

        let mut first: Option<u64> = None;
        let mut last: Option<u64> = None;
        let mut seen_chrom = false;

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.starts_with('#') || line.is_empty() {
                continue;
            }
            let mut fields = line.split('\t');
            let ctg = fields.next().unwrap_or_default();
            if ctg != chrom {
                if seen_chrom {
                    break;
                }
                continue;
            }
            seen_chrom = true;

            let parse_err = |what: &str| ScopeError::ParseError {
                path: self.path.clone(),
                line: i + 1,
                reason: format!("invalid {}", what),
            };
            let locus: u64 = fields
                .next()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| parse_err("locus"))?;
            let site: u64 = fields
                .next()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| parse_err("site index"))?;

            if let Some((start, end)) = loci {
                if locus < start {
                    continue;
                }
                if locus > end {
                    break;
                }
            }
            first.get_or_insert(site);
            last = Some(site);
        }

        let region = match loci {
            Some((start, end)) => format!("{}:{}-{}", chrom, start, end),
            None => chrom.to_string(),
        };
        match (first, last) {
            (Some(first), Some(last)) => SiteRange::new(first, last + 1),
            _ => Err(ScopeError::EmptyRegion(region)),
        }
    }

    ///
    /// The inverse of [`SiteIndex::lookup`]: the `chr:start-end` span of a site
    /// range, from the locus of its first site to one past the locus of its last.
    /// The range must lie on a single chromosome.
    ///
    pub fn locate(&self, sites: SiteRange) -> Result<String, ScopeError> {
        let reader = get_dynamic_reader(&self.path)
            .map_err(|e| std::io::Error::other(format!("{:#}", e)))?;
        let invalid = |reason: &str| ScopeError::InvalidSiteRange(format!("{}: {}", sites, reason));
        let last_site = sites.end - 1;

        let mut first: Option<(String, u64)> = None;
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.starts_with('#') || line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 3 {
                return Err(ScopeError::ParseError {
                    path: self.path.clone(),
                    line: i + 1,
                    reason: format!("expected 3 columns, found {}", fields.len()),
                });
            }
            let parse = |idx: usize, what: &str| {
                fields[idx].parse::<u64>().map_err(|_| ScopeError::ParseError {
                    path: self.path.clone(),
                    line: i + 1,
                    reason: format!("invalid {}", what),
                })
            };
            let site = parse(2, "site index")?;
            if site < sites.start {
                continue;
            }
            let locus = parse(1, "locus")?;

            if site == sites.start {
                first = Some((fields[0].to_string(), locus));
            }
            if site == last_site {
                return match first {
                    Some((chrom, start)) if chrom == fields[0] => {
                        Ok(format!("{}:{}-{}", chrom, start, locus + 1))
                    }
                    Some(_) => Err(invalid("spans more than one chromosome")),
                    None => Err(invalid("not in the site index")),
                };
            }
            if site > last_site {
                break;
            }
        }

        Err(invalid("not in the site index"))
    }
}
