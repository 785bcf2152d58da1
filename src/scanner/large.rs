use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{info, warn};
use uuid::Uuid;

use super::progress::ScanObserver;
use super::walker::{self, WalkPolicy};
use crate::cleaner::executor::Executor;

/// Default threshold: 100 MB (decimal)
pub const DEFAULT_THRESHOLD: u64 = 100_000_000;

/// Roots searched for large files, in search order
pub const LARGE_FILE_ROOTS: &[&str] = &[
    "Downloads",
    "Documents",
    "Desktop",
    "Movies",
    "Music",
    "Pictures",
    "Library",
    "Developer",
];

/// A file at or above the size threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LargeFile {
    pub id: Uuid,
    pub path: PathBuf,
    pub size: u64,
}

/// Searches a fixed, ordered list of roots for files at or above a threshold
#[derive(Debug, Clone)]
pub struct LargeFileFinder {
    threshold: u64,
    roots: Vec<PathBuf>,
    policy: WalkPolicy,
}

impl Default for LargeFileFinder {
    fn default() -> Self {
        Self::new(walker::home_roots(LARGE_FILE_ROOTS))
    }
}

impl LargeFileFinder {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            roots,
            policy: WalkPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: WalkPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Change the threshold used by subsequent scans
    pub fn set_threshold(&mut self, bytes: u64) {
        self.threshold = bytes;
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Walk each root in order. After every root the whole result so far is
    /// republished, biggest first.
    pub fn scan(&self, observer: &dyn ScanObserver) -> Vec<LargeFile> {
        let mut found: Vec<LargeFile> = Vec::new();
        let roots = walker::distinct_roots(self.roots.clone());
        let total = roots.len().max(1);

        for (i, root) in roots.iter().enumerate() {
            found.extend(
                walker::walk_with([root], Some(self.threshold), self.policy.clone()).map(
                    |entry| LargeFile {
                        id: Uuid::new_v4(),
                        path: entry.path,
                        size: entry.size,
                    },
                ),
            );
            found.sort_by(|a, b| b.size.cmp(&a.size));

            observer.on_large_files(&found);
            observer.on_progress(
                (i + 1) as f64 / total as f64,
                &format!("Searched {}", root.display()),
            );
        }

        info!(
            "Large file scan: {} files >= {} bytes",
            found.len(),
            self.threshold
        );
        found
    }
}

/// Live large-file result that supports deletion by id
#[derive(Debug, Clone, Default, Serialize)]
pub struct LargeFileSet {
    files: Vec<LargeFile>,
}

impl LargeFileSet {
    pub fn new(files: Vec<LargeFile>) -> Self {
        Self { files }
    }

    pub fn files(&self) -> &[LargeFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Delete the files with the given ids and return the bytes freed.
    ///
    /// Unknown ids are ignored. Only files that were actually removed leave
    /// the set.
    pub fn delete(&mut self, ids: &[Uuid], executor: &Executor) -> u64 {
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        let mut freed = 0;
        let mut removed: HashSet<Uuid> = HashSet::new();

        for file in self.files.iter().filter(|f| wanted.contains(&f.id)) {
            match executor.remove_entry(&file.path) {
                Ok(r) => {
                    freed += r.bytes;
                    removed.insert(file.id);
                }
                Err(e) => warn!("Keeping {} in results: {}", file.path.display(), e),
            }
        }

        self.files.retain(|f| !removed.contains(&f.id));
        freed
    }
}

impl From<Vec<LargeFile>> for LargeFileSet {
    fn from(files: Vec<LargeFile>) -> Self {
        Self::new(files)
    }
}
