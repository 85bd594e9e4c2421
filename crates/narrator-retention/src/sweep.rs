//! File-age sweeps over managed directories.
//!
//! A sweep never aborts on a single bad file. Every failure is logged,
//! recorded in the [`SweepReport`], and the walk continues.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::error::RetentionError;

/// A file the sweep could not inspect or remove.
#[derive(Debug)]
pub struct SweepFailure {
    pub path: PathBuf,
    pub error: std::io::Error,
}

/// Outcome of one sweep or clear pass.
#[derive(Debug)]
pub struct SweepReport {
    pub dir: PathBuf,
    pub removed: usize,
    pub failures: Vec<SweepFailure>,
}

impl SweepReport {
    fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            removed: 0,
            failures: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, path: &Path, error: std::io::Error) {
        tracing::warn!(path = %path.display(), error = %error, "could not sweep file");
        self.failures.push(SweepFailure {
            path: path.to_path_buf(),
            error,
        });
    }

    /// Collapses the report: `Ok(removed)` or `SweepPartialFailure`.
    pub fn into_result(self) -> Result<usize, RetentionError> {
        if self.failures.is_empty() {
            Ok(self.removed)
        } else {
            Err(RetentionError::SweepPartialFailure {
                dir: self.dir,
                removed: self.removed,
                failed: self.failures.len(),
            })
        }
    }
}

/// Removes every file under `dir` (recursively) last modified strictly
/// before `now - max_age`.
///
/// A file modified exactly at the cutoff is kept. A missing directory is an
/// empty sweep.
pub fn purge_older_than(dir: &Path, max_age: Duration) -> SweepReport {
    purge_older_than_at(dir, max_age, SystemTime::now())
}

/// [`purge_older_than`] against an explicit clock.
pub fn purge_older_than_at(dir: &Path, max_age: Duration, now: SystemTime) -> SweepReport {
    purge_with(dir, max_age, now, |path| std::fs::remove_file(path))
}

pub(crate) fn purge_with<F>(
    dir: &Path,
    max_age: Duration,
    now: SystemTime,
    mut remove: F,
) -> SweepReport
where
    F: FnMut(&Path) -> std::io::Result<()>,
{
    let mut report = SweepReport::new(dir);
    let Some(cutoff) = now.checked_sub(max_age) else {
        return report;
    };

    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let entries = match std::fs::read_dir(&current) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                report.fail(&current, e);
                continue;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    report.fail(&current, e);
                    continue;
                }
            };
            let path = entry.path();

            // DirEntry::metadata does not follow symlinks.
            let modified = match entry.metadata() {
                Ok(meta) if meta.is_dir() => {
                    pending.push(path);
                    continue;
                }
                Ok(meta) => meta.modified(),
                Err(e) => Err(e),
            };

            match modified {
                Ok(mtime) if mtime < cutoff => match remove(&path) {
                    Ok(()) => {
                        tracing::debug!(path = %path.display(), "deleted old file");
                        report.removed += 1;
                    }
                    Err(e) => report.fail(&path, e),
                },
                Ok(_) => {}
                Err(e) => report.fail(&path, e),
            }
        }
    }

    if report.removed > 0 || !report.is_clean() {
        tracing::info!(
            dir = %dir.display(),
            removed = report.removed,
            failed = report.failures.len(),
            "retention sweep finished"
        );
    }
    report
}

/// Removes every file directly under `dir`.
///
/// Subdirectories are left alone; this is for flat scratch space only.
pub fn clear_directory(dir: &Path) -> SweepReport {
    let mut report = SweepReport::new(dir);

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return report,
        Err(e) => {
            report.fail(dir, e);
            return report;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                report.fail(dir, e);
                continue;
            }
        };
        let path = entry.path();

        match entry.file_type() {
            Ok(kind) if kind.is_dir() => {
                tracing::debug!(path = %path.display(), "skipping subdirectory while clearing");
            }
            Ok(_) => match std::fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "removed temp file");
                    report.removed += 1;
                }
                Err(e) => report.fail(&path, e),
            },
            Err(e) => report.fail(&path, e),
        }
    }

    report
}
