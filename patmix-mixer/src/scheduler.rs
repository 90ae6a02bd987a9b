//! Fan-out of replicate mixes over a fixed-size worker pool.
//!
//! Every replicate is a [`MixJob`] with its own output path. Jobs whose output
//! already exists are skipped unless forced; the rest run concurrently and
//! each yields a [`ReplicateOutcome`]. A failing job never cancels its
//! siblings: the batch always runs to completion and failures are reported
//! together afterwards (see [`BatchReport::into_result`]).

use std::ffi::OsString;
use std::fs::remove_file;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use log::{error, info};
use rayon::ThreadPool;
use rayon::prelude::*;

use crate::consts::{INDEX_EXT, MIX_EXT};
use crate::errors::{MixError, ReplicateFailure, Result};
use crate::merge::{MergeExecutor, MergeTask, ViewFlags};

/// `<prefix>_<replicate>.pat.gz`
pub fn replicate_path(prefix: &Path, replicate: usize) -> PathBuf {
    let mut path = OsString::from(prefix.as_os_str());
    path.push(format!("_{}.{}", replicate, MIX_EXT));
    PathBuf::from(path)
}

fn index_path(output: &Path) -> PathBuf {
    let mut path = OsString::from(output.as_os_str());
    path.push(format!(".{}", INDEX_EXT));
    PathBuf::from(path)
}

/// Inputs shared, read-only, by every replicate of a batch.
#[derive(Debug, Clone)]
pub struct JobContext<'a> {
    pub sources: &'a [PathBuf],
    pub labels: &'a [String],
    pub view_flags: &'a [ViewFlags],
    pub prefix: &'a Path,
    pub force: bool,
    pub temp_dir: Option<&'a Path>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplicateOutcome {
    Produced { replicate: usize, path: PathBuf },
    Skipped { replicate: usize, path: PathBuf },
    Failed(ReplicateFailure),
}

impl ReplicateOutcome {
    pub fn replicate(&self) -> usize {
        match self {
            ReplicateOutcome::Produced { replicate, .. } => *replicate,
            ReplicateOutcome::Skipped { replicate, .. } => *replicate,
            ReplicateOutcome::Failed(failure) => failure.replicate,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ReplicateOutcome::Produced { path, .. } => path,
            ReplicateOutcome::Skipped { path, .. } => path,
            ReplicateOutcome::Failed(failure) => &failure.path,
        }
    }
}

/// One replicate to produce.
#[derive(Debug, Clone, PartialEq)]
pub struct MixJob {
    pub replicate: usize,
    pub output: PathBuf,
}

impl MixJob {
    pub fn new(replicate: usize, prefix: &Path) -> Self {
        MixJob {
            replicate,
            output: replicate_path(prefix, replicate),
        }
    }

    /// Existing output is kept unless forced.
    pub fn should_skip(&self, force: bool) -> bool {
        !force && self.output.exists()
    }

    ///
    /// Run the merge for this replicate. A stale output (and its index) is
    /// removed first.
    ///
    pub fn run(&self, ctx: &JobContext<'_>, executor: &dyn MergeExecutor) -> ReplicateOutcome {
        info!("mix: {}", self.output.display());

        let result = self.remove_stale().map_err(Into::into).and_then(|_| {
            executor.merge(&MergeTask {
                replicate: self.replicate,
                sources: ctx.sources,
                labels: ctx.labels,
                view_flags: ctx.view_flags,
                output: &self.output,
                temp_dir: ctx.temp_dir,
            })
        });

        match result {
            Ok(()) => ReplicateOutcome::Produced {
                replicate: self.replicate,
                path: self.output.clone(),
            },
            Err(e) => {
                error!("replicate {} failed: {}", self.replicate, e);
                ReplicateOutcome::Failed(ReplicateFailure {
                    replicate: self.replicate,
                    path: self.output.clone(),
                    reason: e.to_string(),
                })
            }
        }
    }

    fn remove_stale(&self) -> std::io::Result<()> {
        for path in [self.output.clone(), index_path(&self.output)] {
            if path.exists() {
                remove_file(&path)?;
            }
        }
        Ok(())
    }
}

/// Outcomes of a whole batch, ordered by replicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub outcomes: Vec<ReplicateOutcome>,
}

impl BatchReport {
    pub fn produced(&self) -> impl Iterator<Item = &Path> {
        self.outcomes.iter().filter_map(|o| match o {
            ReplicateOutcome::Produced { path, .. } => Some(path.as_path()),
            _ => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = &Path> {
        self.outcomes.iter().filter_map(|o| match o {
            ReplicateOutcome::Skipped { path, .. } => Some(path.as_path()),
            _ => None,
        })
    }

    pub fn failures(&self) -> Vec<ReplicateFailure> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                ReplicateOutcome::Failed(failure) => Some(failure.clone()),
                _ => None,
            })
            .collect()
    }

    /// Err listing every failed replicate, if there was any.
    pub fn into_result(self) -> Result<BatchReport> {
        let failed = self.failures();
        if failed.is_empty() {
            return Ok(self);
        }
        Err(MixError::ReplicatesFailed {
            failed,
            total: self.outcomes.len(),
        })
    }
}

pub struct ReplicationScheduler<'a> {
    pool: &'a ThreadPool,
    executor: &'a dyn MergeExecutor,
}

impl<'a> ReplicationScheduler<'a> {
    pub fn new(pool: &'a ThreadPool, executor: &'a dyn MergeExecutor) -> Self {
        ReplicationScheduler { pool, executor }
    }

    ///
    /// Produce replicates `1..=reps` and wait for all of them.
    ///
    pub fn run(&self, ctx: &JobContext<'_>, reps: usize) -> BatchReport {
        let (skipped, pending): (Vec<MixJob>, Vec<MixJob>) = (1..=reps)
            .map(|r| MixJob::new(r, ctx.prefix))
            .partition(|job| job.should_skip(ctx.force));

        let mut outcomes: Vec<ReplicateOutcome> = skipped
            .into_iter()
            .map(|job| {
                info!(
                    "{} already exists. Skipping (use -f to overwrite)",
                    job.output.display()
                );
                ReplicateOutcome::Skipped {
                    replicate: job.replicate,
                    path: job.output,
                }
            })
            .collect();

        let bar = match pending.len() {
            0 | 1 => ProgressBar::hidden(),
            n => ProgressBar::new(n as u64),
        };

        let executor = self.executor;
        let finished: Vec<ReplicateOutcome> = self.pool.install(|| {
            pending
                .par_iter()
                .map(|job| {
                    let outcome = job.run(ctx, executor);
                    bar.inc(1);
                    outcome
                })
                .collect()
        });
        bar.finish_and_clear();

        outcomes.extend(finished);
        outcomes.sort_by_key(ReplicateOutcome::replicate);
        BatchReport { outcomes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::collections::HashSet;
    use std::fs;
    use std::sync::Mutex;

    use crate::errors::UpstreamError;
    use crate::request::{FilterOptions, MixScope};

    /// Records every merge; fails the replicates listed in `fail`.
    #[derive(Default)]
    struct RecordingExecutor {
        calls: Mutex<Vec<(usize, PathBuf, Vec<String>)>>,
        fail: HashSet<usize>,
    }

    impl MergeExecutor for RecordingExecutor {
        fn merge(&self, task: &MergeTask<'_>) -> std::result::Result<(), UpstreamError> {
            self.calls.lock().unwrap().push((
                task.replicate,
                task.output.to_owned(),
                task.view_flags.iter().map(|f| f.sub_sample.to_string()).collect(),
            ));
            if self.fail.contains(&task.replicate) {
                return Err(UpstreamError::Failed {
                    program: "bash".to_string(),
                    status: "exit status: 2".to_string(),
                    stderr: format!("replicate {} exploded", task.replicate),
                });
            }
            fs::write(task.output, b"mixed")?;
            Ok(())
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        sources: Vec<PathBuf>,
        labels: Vec<String>,
        flags: Vec<ViewFlags>,
    }

    impl Fixture {
        fn prefix(&self) -> PathBuf {
            self.dir.path().join("a_0.6_b_0.4_cov_10.00")
        }

        fn ctx<'a>(&'a self, prefix: &'a Path, force: bool) -> JobContext<'a> {
            JobContext {
                sources: &self.sources,
                labels: &self.labels,
                view_flags: &self.flags,
                prefix,
                force,
                temp_dir: None,
            }
        }
    }

    #[fixture]
    fn fixture() -> Fixture {
        let flags = [0.6, 0.8]
            .iter()
            .map(|&p| ViewFlags::new(&FilterOptions::default(), &MixScope::default(), p))
            .collect();
        Fixture {
            dir: tempfile::tempdir().unwrap(),
            sources: vec![PathBuf::from("a.pat.gz"), PathBuf::from("b.pat.gz")],
            labels: vec!["a".to_string(), "b".to_string()],
            flags,
        }
    }

    fn pool(threads: usize) -> ThreadPool {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap()
    }

    #[rstest]
    fn test_replicate_path() {
        assert_eq!(
            replicate_path(Path::new("out/mix"), 3),
            PathBuf::from("out/mix_3.pat.gz")
        );
        assert_eq!(
            index_path(Path::new("out/mix_3.pat.gz")),
            PathBuf::from("out/mix_3.pat.gz.csi")
        );
    }

    #[rstest]
    fn test_one_merge_per_replicate(fixture: Fixture) {
        let executor = RecordingExecutor::default();
        let pool = pool(2);
        let prefix = fixture.prefix();

        let report = ReplicationScheduler::new(&pool, &executor).run(&fixture.ctx(&prefix, false), 3);

        let mut calls = executor.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls.len(), 3);
        for (i, (replicate, output, probabilities)) in calls.iter().enumerate() {
            assert_eq!(*replicate, i + 1);
            assert!(output.to_string_lossy().ends_with(&format!("_{}.pat.gz", i + 1)));
            assert_eq!(probabilities, &vec!["0.6".to_string(), "0.8".to_string()]);
        }
        assert_eq!(report.produced().count(), 3);
        assert!(report.into_result().is_ok());
    }

    #[rstest]
    fn test_existing_replicates_are_skipped(fixture: Fixture) {
        let prefix = fixture.prefix();
        for r in 1..=2 {
            fs::write(replicate_path(&prefix, r), b"old").unwrap();
        }
        let executor = RecordingExecutor::default();
        let pool = pool(2);

        let report = ReplicationScheduler::new(&pool, &executor).run(&fixture.ctx(&prefix, false), 4);

        let skipped: Vec<usize> = report
            .outcomes
            .iter()
            .filter(|o| matches!(o, ReplicateOutcome::Skipped { .. }))
            .map(ReplicateOutcome::replicate)
            .collect();
        assert_eq!(skipped, vec![1, 2]);

        let mut merged: Vec<usize> = executor.calls.lock().unwrap().iter().map(|c| c.0).collect();
        merged.sort();
        assert_eq!(merged, vec![3, 4]);
        assert_eq!(fs::read(replicate_path(&prefix, 1)).unwrap(), b"old");
    }

    #[rstest]
    fn test_force_overwrites(fixture: Fixture) {
        let prefix = fixture.prefix();
        let existing = replicate_path(&prefix, 1);
        fs::write(&existing, b"old").unwrap();
        fs::write(index_path(&existing), b"old index").unwrap();
        let executor = RecordingExecutor::default();
        let pool = pool(1);

        let report = ReplicationScheduler::new(&pool, &executor).run(&fixture.ctx(&prefix, true), 1);

        assert_eq!(report.skipped().count(), 0);
        assert_eq!(fs::read(&existing).unwrap(), b"mixed");
        assert!(!index_path(&existing).exists());
    }

    #[rstest]
    fn test_failures_do_not_cancel_siblings(fixture: Fixture) {
        let prefix = fixture.prefix();
        let executor = RecordingExecutor {
            fail: HashSet::from([2, 4]),
            ..Default::default()
        };
        let pool = pool(2);

        let report = ReplicationScheduler::new(&pool, &executor).run(&fixture.ctx(&prefix, false), 5);

        assert_eq!(executor.calls.lock().unwrap().len(), 5);
        assert_eq!(report.produced().count(), 3);
        let order: Vec<usize> = report.outcomes.iter().map(ReplicateOutcome::replicate).collect();
        assert_eq!(order, vec![1, 2, 3, 4, 5]);

        match report.into_result() {
            Err(MixError::ReplicatesFailed { failed, total }) => {
                assert_eq!(total, 5);
                let replicates: Vec<usize> = failed.iter().map(|f| f.replicate).collect();
                assert_eq!(replicates, vec![2, 4]);
                assert!(failed[0].reason.contains("replicate 2 exploded"));
            }
            other => panic!("expected ReplicatesFailed, got {:?}", other),
        }
    }
}
