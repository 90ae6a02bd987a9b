use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;

use crate::consts::PAT_SUFFIX;

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    Ok(BufReader::new(file))
}

/// Whether the path carries the pat extension (`.pat.gz`).
pub fn is_pat_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(PAT_SUFFIX) && n.len() > PAT_SUFFIX.len())
}

///
/// File name of a source with its `.gz` and the extension before it removed,
/// e.g. `/data/Liver-Z000.pat.gz` gives `Liver-Z000`.
///
pub fn split_ext_gz(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    match name.rfind('.') {
        Some(dot) if dot > 0 => name[..dot].to_string(),
        _ => name.to_string(),
    }
}

///
/// Default read label for a source: its basename trimmed at the first `-`,
/// lower-cased. `Liver-Z000.pat.gz` gives `liver`.
///
pub fn default_label(path: &Path) -> String {
    let base = split_ext_gz(path);
    base.split('-').next().unwrap_or_default().to_lowercase()
}
