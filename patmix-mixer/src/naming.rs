use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use patmix_core::utils::split_ext_gz;

use crate::consts::PREFIX_SEP;
use crate::errors::{MixError, Result};
use crate::request::OutputTarget;

///
/// Resolve the output prefix, creating the directory it lives in.
///
/// An explicit prefix is returned unchanged. Otherwise the prefix is composed
/// from the sources and their rates, see [`compose_prefix`].
///
pub fn resolve_prefix(
    output: &OutputTarget,
    sources: &[PathBuf],
    rates: &[f64],
    target_coverage: f64,
    region: Option<&str>,
) -> Result<PathBuf> {
    match output {
        OutputTarget::Prefix(prefix) => {
            if let Some(parent) = prefix.parent().filter(|p| !p.as_os_str().is_empty()) {
                ensure_dir(parent)?;
            }
            Ok(prefix.clone())
        }
        OutputTarget::Dir(dir) => {
            ensure_dir(dir)?;
            Ok(dir.join(compose_prefix(sources, rates, target_coverage, region)))
        }
    }
}

///
/// Informative file name prefix: each source basename followed by its rate,
/// then the target coverage and, if the mix is restricted to a region, the
/// region. E.g. `Liver_0.6_Blood_0.4_cov_10.00_chr1:100-900`.
///
pub fn compose_prefix(
    sources: &[PathBuf],
    rates: &[f64],
    target_coverage: f64,
    region: Option<&str>,
) -> String {
    let mut prefix = sources
        .iter()
        .zip(rates)
        .flat_map(|(source, rate)| [split_ext_gz(source), format_rate(*rate)])
        .collect::<Vec<_>>()
        .join(PREFIX_SEP);

    prefix.push_str(&format!("{}cov{}{:.2}", PREFIX_SEP, PREFIX_SEP, target_coverage));
    if let Some(region) = region {
        prefix.push_str(PREFIX_SEP);
        prefix.push_str(region);
    }
    prefix
}

/// Shortest round-tripping representation, always with a decimal point.
fn format_rate(rate: f64) -> String {
    let formatted = rate.to_string();
    if formatted.contains('.') || !rate.is_finite() {
        formatted
    } else {
        format!("{}.0", formatted)
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    create_dir_all(dir).map_err(|source| MixError::Directory {
        path: dir.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::{assert_eq, assert_ne};
    use rstest::*;
    use std::fs;

    fn sources() -> Vec<PathBuf> {
        vec![
            PathBuf::from("/data/Liver-Z01.pat.gz"),
            PathBuf::from("/other/Blood.pat.gz"),
        ]
    }

    #[rstest]
    fn test_compose_prefix() {
        let prefix = compose_prefix(&sources(), &[0.6, 0.4], 10.0, None);
        assert_eq!(prefix, "Liver-Z01_0.6_Blood_0.4_cov_10.00");

        let prefix = compose_prefix(&sources(), &[1.0, 0.0], 7.5, Some("chr1:100-900"));
        assert_eq!(prefix, "Liver-Z01_1.0_Blood_0.0_cov_7.50_chr1:100-900");
    }

    #[rstest]
    fn test_prefix_is_deterministic() {
        let first = compose_prefix(&sources(), &[0.7, 0.3], 12.0, Some("10-20"));
        let second = compose_prefix(&sources(), &[0.7, 0.3], 12.0, Some("10-20"));
        assert_eq!(first, second);

        let swapped = compose_prefix(&sources(), &[0.3, 0.7], 12.0, Some("10-20"));
        assert_ne!(first, swapped);
    }

    #[rstest]
    fn test_resolve_creates_out_dir() {
        let tempdir = tempfile::tempdir().unwrap();
        let out_dir = tempdir.path().join("nested/out");
        let output = OutputTarget::Dir(out_dir.clone());

        let prefix = resolve_prefix(&output, &sources(), &[0.6, 0.4], 10.0, None).unwrap();
        assert!(out_dir.is_dir());
        assert_eq!(prefix, out_dir.join("Liver-Z01_0.6_Blood_0.4_cov_10.00"));
    }

    #[rstest]
    fn test_explicit_prefix() {
        let tempdir = tempfile::tempdir().unwrap();
        let explicit = tempdir.path().join("mixes/my_mix");
        let output = OutputTarget::Prefix(explicit.clone());

        let prefix = resolve_prefix(&output, &sources(), &[0.6, 0.4], 10.0, None).unwrap();
        assert_eq!(prefix, explicit);
        assert!(tempdir.path().join("mixes").is_dir());
    }

    #[rstest]
    fn test_directory_error() {
        let tempdir = tempfile::tempdir().unwrap();
        let blocker = tempdir.path().join("file");
        fs::write(&blocker, b"").unwrap();
        let output = OutputTarget::Dir(blocker.join("sub"));

        let result = resolve_prefix(&output, &sources(), &[0.6, 0.4], 10.0, None);
        assert!(matches!(result, Err(MixError::Directory { .. })));
    }
}
