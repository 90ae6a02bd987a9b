use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::errors::ScopeError;
use crate::utils::get_dynamic_reader;

///
/// One block of a blocks file: genomic coordinates plus the `[site_start, site_end)`
/// range of CpG sites it spans.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub chr: String,
    pub start: u64,
    pub end: u64,
    pub site_start: u64,
    pub site_end: u64,
}

impl Block {
    pub fn nr_sites(&self) -> u64 {
        self.site_end.saturating_sub(self.site_start)
    }
}

///
/// BlockSet struct, the representation of a bed-like blocks file
/// (`chr start end startCpG endCpG`).
///
#[derive(Clone, Debug)]
pub struct BlockSet {
    pub blocks: Vec<Block>,
    pub path: Option<PathBuf>,
}

impl BlockSet {
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Total number of sites covered by all blocks.
    pub fn nr_sites(&self) -> u64 {
        self.blocks.iter().map(Block::nr_sites).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }
}

impl TryFrom<&Path> for BlockSet {
    type Error = ScopeError;

    ///
    /// Create a new [BlockSet] from a blocks file.
    ///
    /// # Arguments:
    /// - value: path to blocks file on disk, optionally gzipped.
    fn try_from(value: &Path) -> Result<Self, Self::Error> {
        let path = value;
        let reader = get_dynamic_reader(path)
            .map_err(|e| std::io::Error::other(format!("{:#}", e)))?;

        let mut blocks: Vec<Block> = Vec::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty()
                || line.starts_with('#')
                || line.starts_with("browser")
                || line.starts_with("track")
            {
                continue;
            }

            let parts: Vec<&str> = line.split('\t').collect();
            let err = |reason: String| ScopeError::ParseError {
                path: path.to_owned(),
                line: i + 1,
                reason,
            };
            if parts.len() < 5 {
                return Err(err(format!("expected 5 columns, found {}", parts.len())));
            }

            // column headers like `chr start end startCpG endCpG` without #
            if blocks.is_empty() && parts[1].parse::<u64>().is_err() {
                continue;
            }

            let field = |idx: usize, name: &str| {
                parts[idx]
                    .parse::<u64>()
                    .map_err(|_| err(format!("invalid {}: {}", name, parts[idx])))
            };

            let block = Block {
                chr: parts[0].to_string(),
                start: field(1, "start")?,
                end: field(2, "end")?,
                site_start: field(3, "startCpG")?,
                site_end: field(4, "endCpG")?,
            };
            if block.site_start == 0 {
                return Err(err("startCpG must be at least 1".to_string()));
            }
            if block.site_end < block.site_start {
                return Err(err("endCpG is smaller than startCpG".to_string()));
            }
            blocks.push(block);
        }

        if blocks.is_empty() {
            return Err(ScopeError::EmptyBlockSet(path.to_owned()));
        }

        Ok(BlockSet {
            blocks,
            path: Some(path.to_owned()),
        })
    }
}

impl TryFrom<PathBuf> for BlockSet {
    type Error = ScopeError;

    fn try_from(value: PathBuf) -> Result<Self, Self::Error> {
        BlockSet::try_from(value.as_path())
    }
}
