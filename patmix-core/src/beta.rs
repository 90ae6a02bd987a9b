//! Readers for the per-site aggregate-statistics caches (`.beta` / `.lbeta`).
//!
//! Both layouts store one row per CpG site, ordered by site index, holding two
//! unsigned counts: methylated reads and total covering reads. `.beta` rows are
//! two `u8`, `.lbeta` rows are two little-endian `u16`. Only the coverage column
//! is read here.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};

use crate::consts::{BETA_EXT, LBETA_EXT, PAT_SUFFIX};
use crate::errors::StatsError;
use crate::models::{BlockSet, SiteRange};

const CHUNK_ROWS: u64 = 1 << 16;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum StatsPrecision {
    /// 8-bit counts
    #[default]
    Beta,
    /// 16-bit counts
    LBeta,
}

impl StatsPrecision {
    pub fn extension(&self) -> &'static str {
        match self {
            StatsPrecision::Beta => BETA_EXT,
            StatsPrecision::LBeta => LBETA_EXT,
        }
    }

    fn row_bytes(&self) -> u64 {
        match self {
            StatsPrecision::Beta => 2,
            StatsPrecision::LBeta => 4,
        }
    }
}

///
/// Location of the statistics cache belonging to a pat file: the same path with
/// `.pat.gz` swapped for the precision's extension.
///
pub fn stats_path_for(source: &Path, precision: StatsPrecision) -> PathBuf {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.strip_suffix(PAT_SUFFIX).unwrap_or(&name);
    source.with_file_name(format!("{}.{}", stem, precision.extension()))
}

#[derive(Debug, Clone)]
pub struct BetaStats {
    path: PathBuf,
    precision: StatsPrecision,
    nr_sites: u64,
}

impl BetaStats {
    pub fn open(path: &Path, precision: StatsPrecision) -> Result<Self, StatsError> {
        if !path.is_file() {
            return Err(StatsError::NotFound(path.to_owned()));
        }
        let size = path.metadata()?.len();
        let row = precision.row_bytes();
        if size % row != 0 {
            return Err(StatsError::Truncated {
                path: path.to_owned(),
                size,
                row,
            });
        }
        Ok(BetaStats {
            path: path.to_owned(),
            precision,
            nr_sites: size / row,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn nr_sites(&self) -> u64 {
        self.nr_sites
    }

    ///
    /// Mean number of covering reads per site, over the whole file or over a
    /// site range.
    ///
    pub fn mean_coverage(&self, sites: Option<SiteRange>) -> Result<f64, StatsError> {
        let (start, count) = match sites {
            Some(range) => (range.start - 1, range.len()),
            None => (0, self.nr_sites),
        };
        if count == 0 {
            return Err(StatsError::EmptyScope(self.path.clone()));
        }

        let mut reader = BufReader::new(File::open(&self.path)?);
        let total = self.sum_coverage(&mut reader, start, count)?;
        Ok(total as f64 / count as f64)
    }

    ///
    /// Mean number of covering reads per site, over all sites spanned by the
    /// blocks.
    ///
    pub fn block_coverage(&self, blocks: &BlockSet) -> Result<f64, StatsError> {
        let nr_sites = blocks.nr_sites();
        if nr_sites == 0 {
            return Err(StatsError::EmptyScope(self.path.clone()));
        }

        let mut reader = BufReader::new(File::open(&self.path)?);
        let mut total = 0u64;
        for block in blocks.iter().filter(|b| b.nr_sites() > 0) {
            let start = block.site_start.checked_sub(1).ok_or(StatsError::OutOfBounds {
                path: self.path.clone(),
                start: block.site_start,
                end: block.site_end,
                nr_sites: self.nr_sites,
            })?;
            total += self.sum_coverage(&mut reader, start, block.nr_sites())?;
        }
        Ok(total as f64 / nr_sites as f64)
    }

    /// Sum the coverage column over `count` rows starting at 0-based row `start`.
    fn sum_coverage(
        &self,
        reader: &mut BufReader<File>,
        start: u64,
        count: u64,
    ) -> Result<u64, StatsError> {
        let end = start.checked_add(count).filter(|&end| end <= self.nr_sites);
        if end.is_none() {
            return Err(StatsError::OutOfBounds {
                path: self.path.clone(),
                start: start.saturating_add(1),
                end: start.saturating_add(count).saturating_add(1),
                nr_sites: self.nr_sites,
            });
        }

        let row = self.precision.row_bytes();
        reader.seek(SeekFrom::Start(start * row))?;

        let mut buf = vec![0u8; (CHUNK_ROWS.min(count) * row) as usize];
        let mut remaining = count;
        let mut total = 0u64;

        while remaining > 0 {
            let rows = remaining.min(CHUNK_ROWS);
            let chunk = &mut buf[..(rows * row) as usize];
            reader.read_exact(chunk)?;

            total += match self.precision {
                StatsPrecision::Beta => chunk.chunks_exact(2).map(|r| r[1] as u64).sum::<u64>(),
                StatsPrecision::LBeta => chunk
                    .chunks_exact(4)
                    .map(|r| LittleEndian::read_u16(&r[2..4]) as u64)
                    .sum::<u64>(),
            };
            remaining -= rows;
        }

        Ok(total)
    }
}
