//! Command line implementations of the merge and cache generation collaborators.
//!
//! Both drive `wgbstools`; the merge additionally pipes through `sort`, `bgzip`
//! and `tabix`. Tool locations default to the bare names and can be overridden
//! with environment variables (see [`ToolPaths::from_env`]).

use std::env;
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Output};

use log::debug;

use patmix_core::beta::StatsPrecision;

use crate::consts::*;
use crate::coverage::StatsGenerator;
use crate::errors::UpstreamError;
use crate::merge::{MergeExecutor, MergeTask};

/// How much of a failing tool's stderr ends up in the error.
const STDERR_TAIL: usize = 2000;

#[derive(Debug, Clone, PartialEq)]
pub struct ToolPaths {
    pub wgbstools: String,
    pub sort: String,
    pub bgzip: String,
    pub tabix: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        ToolPaths {
            wgbstools: DEFAULT_WGBSTOOLS.to_string(),
            sort: DEFAULT_SORT.to_string(),
            bgzip: DEFAULT_BGZIP.to_string(),
            tabix: DEFAULT_TABIX.to_string(),
        }
    }
}

impl ToolPaths {
    pub fn from_env() -> Self {
        let var = |key: &str, default: &str| {
            env::var(key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        ToolPaths {
            wgbstools: var(WGBSTOOLS_ENV, DEFAULT_WGBSTOOLS),
            sort: var(SORT_ENV, DEFAULT_SORT),
            bgzip: var(BGZIP_ENV, DEFAULT_BGZIP),
            tabix: var(TABIX_ENV, DEFAULT_TABIX),
        }
    }
}

/// Quote for a POSIX shell.
fn shell_quote(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', r"'\''"))
}

fn quote_path(path: &Path) -> String {
    shell_quote(&path.to_string_lossy())
}

fn run<I, S>(program: &str, args: I) -> Result<Output, UpstreamError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(program)
        .args(args)
        .env("LC_ALL", "C")
        .output()
        .map_err(|source| match source.kind() {
            ErrorKind::NotFound => UpstreamError::Spawn {
                program: program.to_string(),
                source,
            },
            _ => UpstreamError::Io(source),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail_start = stderr.len().saturating_sub(STDERR_TAIL);
        let tail_start = (tail_start..stderr.len())
            .find(|&i| stderr.is_char_boundary(i))
            .unwrap_or(stderr.len());
        return Err(UpstreamError::Failed {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr: stderr[tail_start..].trim().to_string(),
        });
    }
    Ok(output)
}

///
/// Merges through a bash script: one `wgbstools view` per source, each line
/// tagged with the source label, k-way merged by `sort -m`, compressed with
/// `bgzip` and indexed with `tabix`.
///
/// Every view writes into its own named pipe as a background job and is
/// waited on after the merge, so a view that dies half way fails the replicate
/// instead of silently shortening one input of `sort`.
///
#[derive(Debug, Clone, Default)]
pub struct CommandMergeExecutor {
    tools: ToolPaths,
}

impl CommandMergeExecutor {
    pub fn new(tools: ToolPaths) -> Self {
        CommandMergeExecutor { tools }
    }

    pub fn script(&self, task: &MergeTask<'_>) -> String {
        let output = quote_path(task.output);
        let fifos: Vec<String> = (0..task.sources.len())
            .map(|i| format!("\"$work/{}\"", i))
            .collect();

        let mut lines = vec![
            "set -o pipefail".to_string(),
            "work=$(mktemp -d) || exit 1".to_string(),
            "trap 'rm -rf \"$work\"' EXIT".to_string(),
            format!("mkfifo {} || exit 1", fifos.join(" ")),
        ];

        let views = task
            .sources
            .iter()
            .zip(task.labels)
            .zip(task.view_flags);
        for (i, ((source, label), flags)) in views.enumerate() {
            let args: Vec<String> = flags.to_args().iter().map(|a| shell_quote(a)).collect();
            lines.push(format!(
                "( {} view {} {} | awk -v OFS='\\t' -v label={} '{{print $0, label}}' ) > {} & v{}=$!",
                shell_quote(&self.tools.wgbstools),
                quote_path(source),
                args.join(" "),
                shell_quote(label),
                fifos[i],
                i,
            ));
        }

        let temp_dir = task
            .temp_dir
            .map(|dir| format!(" -T {}", quote_path(dir)))
            .unwrap_or_default();
        lines.push(format!(
            "{} -m -k2,2n -k3,3{} {} | {} -c > {}",
            shell_quote(&self.tools.sort),
            temp_dir,
            fifos.join(" "),
            shell_quote(&self.tools.bgzip),
            output,
        ));
        lines.push("merged=$?".to_string());

        let pids: Vec<String> = (0..task.sources.len()).map(|i| format!("$v{}", i)).collect();
        lines.push(format!(
            "[ $merged -eq 0 ] || kill {} 2>/dev/null",
            pids.join(" ")
        ));
        lines.push("failed=0".to_string());
        for (i, source) in task.sources.iter().enumerate() {
            let message = shell_quote(&format!("view of {} failed", source.display()));
            lines.push(format!(
                "wait $v{} || {{ echo {} >&2; failed=1; }}",
                i, message
            ));
        }
        lines.push(format!(
            "[ $merged -eq 0 ] && [ $failed -eq 0 ] || {{ rm -f {}; exit 1; }}",
            output
        ));
        lines.push(format!(
            "{} -C -f -b 2 -e 2 {}",
            shell_quote(&self.tools.tabix),
            output
        ));

        lines.join("\n")
    }
}

impl MergeExecutor for CommandMergeExecutor {
    fn merge(&self, task: &MergeTask<'_>) -> Result<(), UpstreamError> {
        let script = self.script(task);
        debug!("replicate {}: {}", task.replicate, script);

        run(SHELL, ["-c", script.as_str()])?;
        if !task.output.is_file() {
            return Err(UpstreamError::MissingOutput(task.output.to_owned()));
        }
        Ok(())
    }
}

/// Generates `.beta` / `.lbeta` caches with `wgbstools pat2beta`.
#[derive(Debug, Clone, Default)]
pub struct Pat2BetaGenerator {
    tools: ToolPaths,
}

impl Pat2BetaGenerator {
    pub fn new(tools: ToolPaths) -> Self {
        Pat2BetaGenerator { tools }
    }

    pub fn args(&self, source: &Path, precision: StatsPrecision) -> Vec<String> {
        let out_dir = source
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut args = vec![
            "pat2beta".to_string(),
            source.to_string_lossy().into_owned(),
            "-o".to_string(),
            out_dir.to_string_lossy().into_owned(),
            "-f".to_string(),
        ];
        if precision == StatsPrecision::LBeta {
            args.push("--lbeta".to_string());
        }
        args
    }
}

impl StatsGenerator for Pat2BetaGenerator {
    fn generate(&self, source: &Path, precision: StatsPrecision) -> Result<(), UpstreamError> {
        run(&self.tools.wgbstools, self.args(source, precision))?;
        Ok(())
    }
}
