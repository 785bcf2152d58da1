use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::common::errors::SweepError;
use crate::common::safety;
use crate::scanner::walker;

/// The two removal attempts the executor makes for every entry.
///
/// `SystemRemover` is the real implementation; tests swap in their own to
/// simulate an unavailable trash or a permission-denied entry.
pub trait Remover: Send + Sync {
    /// Reversible removal (move to the system trash)
    fn trash(&self, path: &Path) -> Result<(), String>;

    /// Permanent removal of a file, symlink or whole directory
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Removes through the platform trash, falling back to `std::fs`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRemover;

impl Remover for SystemRemover {
    fn trash(&self, path: &Path) -> Result<(), String> {
        trash::delete(path).map_err(|e| e.to_string())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        if fs::symlink_metadata(path)?.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        }
    }
}

/// Outcome of a delete operation
#[derive(Debug, Default, Serialize)]
pub struct CleanReport {
    /// Bytes actually freed (entries that failed both attempts count 0)
    pub bytes_freed: u64,
    /// Entries removed, by trash or permanently
    pub removed: usize,
    /// Entries moved to the trash (a subset of `removed`)
    pub trashed: usize,
    /// Entries skipped, with the reason
    pub failures: Vec<SweepError>,
}

impl CleanReport {
    pub fn merge(&mut self, other: CleanReport) {
        self.bytes_freed += other.bytes_freed;
        self.removed += other.removed;
        self.trashed += other.trashed;
        self.failures.extend(other.failures);
    }

    pub fn record(&mut self, outcome: Result<Removed, SweepError>) {
        match outcome {
            Ok(removed) => {
                self.bytes_freed += removed.bytes;
                self.removed += 1;
                if removed.trashed {
                    self.trashed += 1;
                }
            }
            Err(e) => self.failures.push(e),
        }
    }
}

/// One successfully removed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removed {
    pub bytes: u64,
    pub trashed: bool,
}

/// Trash-first, fallback-to-permanent remover.
///
/// Every entry is an independent unit of failure: nothing here returns an
/// operation-wide error, a failed entry is recorded and the batch goes on.
#[derive(Clone)]
pub struct Executor {
    remover: Arc<dyn Remover>,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(SystemRemover)
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor").finish_non_exhaustive()
    }
}

impl Executor {
    pub fn new(remover: impl Remover + 'static) -> Self {
        Self {
            remover: Arc::new(remover),
        }
    }

    /// Remove a single entry (file, symlink or whole directory).
    ///
    /// The size is measured before removal. The trash is tried first, then
    /// permanent removal.
    pub fn remove_entry(&self, path: &Path) -> Result<Removed, SweepError> {
        if safety::is_protected(path) {
            warn!("Refusing to delete protected path {}", path.display());
            return Err(SweepError::Protected {
                path: path.to_path_buf(),
            });
        }

        let meta = fs::symlink_metadata(path).map_err(|e| SweepError::from_io(path, e))?;
        let bytes = if meta.file_type().is_symlink() {
            0
        } else {
            walker::directory_size(path)
        };

        let trash_err = match self.remover.trash(path) {
            Ok(()) => {
                debug!("Moved to trash: {} ({} bytes)", path.display(), bytes);
                return Ok(Removed {
                    bytes,
                    trashed: true,
                });
            }
            Err(e) => e,
        };

        match self.remover.remove(path) {
            Ok(()) => {
                debug!(
                    "Trash unavailable for {} ({}), removed permanently",
                    path.display(),
                    trash_err
                );
                Ok(Removed {
                    bytes,
                    trashed: false,
                })
            }
            Err(remove_err) => {
                warn!(
                    "Could not delete {}: trash: {}; remove: {}",
                    path.display(),
                    trash_err,
                    remove_err
                );
                Err(SweepError::DeleteFailed {
                    path: path.to_path_buf(),
                    trash: trash_err,
                    remove: remove_err.to_string(),
                })
            }
        }
    }

    /// Clean one target.
    ///
    /// A file is removed outright. A directory is emptied but kept: each
    /// direct child is measured and removed on its own, and a child that
    /// cannot be removed does not affect its siblings.
    pub fn clean(&self, path: &Path) -> CleanReport {
        let mut report = CleanReport::default();

        let meta = match fs::metadata(path) {
            Ok(m) => m,
            Err(e) => {
                debug!("Nothing to clean at {}: {}", path.display(), e);
                report.failures.push(SweepError::from_io(path, e));
                return report;
            }
        };

        if !meta.is_dir() {
            report.record(self.remove_entry(path));
            return report;
        }

        let children = match fs::read_dir(path) {
            Ok(rd) => rd,
            Err(e) => {
                warn!("Cannot list {}: {}", path.display(), e);
                report.failures.push(SweepError::from_io(path, e));
                return report;
            }
        };

        for child in children {
            match child {
                Ok(entry) => report.record(self.remove_entry(&entry.path())),
                Err(e) => report.failures.push(SweepError::from_io(path, e)),
            }
        }

        report
    }

    /// Clean one target and return the bytes freed
    pub fn clean_path(&self, path: &Path) -> u64 {
        self.clean(path).bytes_freed
    }

    /// Clean every target in turn; always runs to completion
    pub fn delete_batch<I, P>(&self, paths: I) -> CleanReport
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut report = CleanReport::default();
        for path in paths {
            report.merge(self.clean(path.as_ref()));
        }
        info!(
            "Cleanup finished: {} removed ({} bytes), {} skipped",
            report.removed,
            report.bytes_freed,
            report.failures.len()
        );
        report
    }
}
