use parking_lot::Mutex;
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{info, warn};

use super::hasher;
use super::resolver::{self, KeepStrategy};
use crate::cleaner::executor::{CleanReport, Executor};
use crate::common::config::Config;
use crate::common::errors::SweepError;
use crate::scanner::progress::ScanObserver;
use crate::scanner::walker::{self, FileEntry, WalkPolicy};

/// User-content roots searched by default
pub const DUPLICATE_ROOTS: &[&str] = &[
    "Downloads",
    "Documents",
    "Desktop",
    "Pictures",
    "Music",
    "Movies",
];

/// Configuration for duplicate scanning
#[derive(Debug, Clone)]
pub struct DupConfig {
    /// Directories to scan
    pub roots: Vec<PathBuf>,
    /// Minimum file size to consider (skip tiny files)
    pub min_size: u64,
    /// Leading bytes hashed per file
    pub prefix_bytes: usize,
    /// Publish partial results every N size buckets
    pub publish_every: usize,
    /// Re-split prefix matches by full-content hash
    pub verify: bool,
    pub policy: WalkPolicy,
}

impl Default for DupConfig {
    fn default() -> Self {
        Self {
            roots: walker::home_roots(DUPLICATE_ROOTS),
            min_size: 1024,
            prefix_bytes: hasher::DEFAULT_PREFIX_BYTES,
            publish_every: 20,
            verify: false,
            policy: WalkPolicy::default(),
        }
    }
}

impl DupConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_size: config.duplicate_min_size,
            prefix_bytes: config.fingerprint_bytes.max(1),
            publish_every: config.publish_every,
            verify: config.verify_duplicates,
            policy: WalkPolicy::default().with_exclusions(config.exclude_paths.clone()),
            ..Self::default()
        }
    }

    pub fn with_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.roots = roots;
        self
    }
}

/// Files sharing a size and a fingerprint. Always at least two paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub size: u64,
    pub fingerprint: String,
    pub paths: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Bytes reclaimable by keeping a single copy
    pub fn wasted_bytes(&self) -> u64 {
        self.size * self.paths.len().saturating_sub(1) as u64
    }
}

/// Largest groups first; ties broken by size, then fingerprint, so output is stable
fn sort_groups(groups: &mut [DuplicateGroup]) {
    groups.sort_by(|a, b| {
        b.paths
            .len()
            .cmp(&a.paths.len())
            .then(b.size.cmp(&a.size))
            .then(a.fingerprint.cmp(&b.fingerprint))
    });
}

/// `None` when fewer than two distinct paths remain
fn into_group(size: u64, fingerprint: String, members: Vec<FileEntry>) -> Option<DuplicateGroup> {
    let mut paths: Vec<PathBuf> = members.into_iter().map(|f| f.path).collect();
    paths.sort();
    paths.dedup();
    (paths.len() > 1).then_some(DuplicateGroup {
        size,
        fingerprint,
        paths,
    })
}

/// Confirmed groups inside one size bucket
fn hash_bucket(size: u64, files: &[FileEntry], config: &DupConfig) -> Vec<DuplicateGroup> {
    let mut groups = Vec::new();
    for (fingerprint, members) in hasher::group_by_fingerprint(files, config.prefix_bytes) {
        if config.verify {
            for (full, verified) in hasher::group_by_full_hash(&members) {
                groups.extend(into_group(size, full, verified));
            }
        } else {
            groups.extend(into_group(size, fingerprint, members));
        }
    }
    groups
}

/// Run the duplicate pipeline: walk, bucket by size, fingerprint buckets on
/// `pool`, publishing sorted partial results as buckets complete.
pub fn find_duplicates(
    config: &DupConfig,
    pool: &ThreadPool,
    observer: &dyn ScanObserver,
) -> Vec<DuplicateGroup> {
    let start = Instant::now();

    let entries = walker::walk_with(&config.roots, Some(config.min_size), config.policy.clone());
    let buckets: Vec<(u64, Vec<FileEntry>)> = hasher::group_by_size(entries).into_iter().collect();
    let total = buckets.len();
    info!("Duplicate scan: {} candidate size buckets", total);

    let publish_every = config.publish_every.max(1);
    let processed = AtomicUsize::new(0);
    let confirmed: Mutex<Vec<DuplicateGroup>> = Mutex::new(Vec::new());

    pool.install(|| {
        buckets.par_iter().for_each(|(size, files)| {
            let groups = hash_bucket(*size, files, config);

            let mut all = confirmed.lock();
            all.extend(groups);
            let done = processed.fetch_add(1, Ordering::SeqCst) + 1;
            if done % publish_every == 0 && done < total {
                let mut snapshot = all.clone();
                sort_groups(&mut snapshot);
                observer.on_duplicates(&snapshot);
                observer.on_progress(
                    done as f64 / total as f64,
                    &format!("Hashed {}/{} size groups", done, total),
                );
            }
        });
    });

    let mut groups = confirmed.into_inner();
    sort_groups(&mut groups);
    observer.on_duplicates(&groups);
    observer.on_progress(1.0, &format!("{} duplicate groups", groups.len()));

    info!(
        "Duplicate scan finished: {} groups in {:.1}s",
        groups.len(),
        start.elapsed().as_secs_f64()
    );
    groups
}

/// Live duplicate result. Removing members keeps the group invariant:
/// any group left with one path or fewer disappears.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DuplicateSet {
    groups: Vec<DuplicateGroup>,
}

impl DuplicateSet {
    pub fn new(groups: Vec<DuplicateGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[DuplicateGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn total_wasted(&self) -> u64 {
        self.groups.iter().map(|g| g.wasted_bytes()).sum()
    }

    /// Number of files that are redundant copies
    pub fn duplicate_count(&self) -> usize {
        self.groups.iter().map(|g| g.paths.len() - 1).sum()
    }

    /// Drop `path` from the in-memory result without touching the disk
    pub fn forget(&mut self, path: &Path) {
        for group in &mut self.groups {
            group.paths.retain(|p| p != path);
        }
        self.groups.retain(|g| g.paths.len() > 1);
    }

    /// Delete one member (trash first) and drop it from its group
    pub fn remove(&mut self, path: &Path, executor: &Executor) -> Result<u64, SweepError> {
        let removed = executor.remove_entry(path)?;
        self.forget(path);
        Ok(removed.bytes)
    }

    /// Keep one file per group according to `strategy`; delete the rest
    pub fn remove_extras(&mut self, strategy: &KeepStrategy, executor: &Executor) -> CleanReport {
        let plans = resolver::resolve_all(&self.groups, strategy);
        let mut report = CleanReport::default();

        for path in plans.iter().flat_map(|plan| plan.remove.iter()) {
            match executor.remove_entry(path) {
                Ok(removed) => {
                    report.record(Ok(removed));
                    self.forget(path);
                }
                Err(e) => {
                    warn!("Duplicate kept: {}", e);
                    report.record(Err(e));
                }
            }
        }
        report
    }
}

impl From<Vec<DuplicateGroup>> for DuplicateSet {
    fn from(groups: Vec<DuplicateGroup>) -> Self {
        Self::new(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::executor::{Remover, SystemRemover};
    use crate::scanner::progress::NoopObserver;
    use tempfile::TempDir;

    struct PermanentOnly;

    impl Remover for PermanentOnly {
        fn trash(&self, _path: &Path) -> Result<(), String> {
            Err("unavailable".into())
        }
        fn remove(&self, path: &Path) -> std::io::Result<()> {
            SystemRemover.remove(path)
        }
    }

    fn pool() -> ThreadPool {
        rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap()
    }

    fn write(path: &Path, data: &[u8]) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, data).unwrap();
    }

    fn config(root: &Path) -> DupConfig {
        DupConfig::default().with_roots(vec![root.to_path_buf()])
    }

    #[test]
    fn test_three_identical_one_different() {
        let dir = TempDir::new().unwrap();
        let same = vec![0xABu8; 2048];
        let mut other = vec![0xABu8; 2048];
        other[0] = 0;
        write(&dir.path().join("a/one.bin"), &same);
        write(&dir.path().join("b/two.bin"), &same);
        write(&dir.path().join("three.bin"), &same);
        write(&dir.path().join("four.bin"), &other);

        let groups = find_duplicates(&config(dir.path()), &pool(), &NoopObserver);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].paths.len(), 3);
        assert_eq!(groups[0].size, 2048);
        assert!(!groups[0].paths.contains(&dir.path().join("four.bin")));
    }

    #[test]
    fn test_nested_roots_do_not_pair_a_file_with_itself() {
        let dir = TempDir::new().unwrap();
        let only = dir.path().join("sub/only.bin");
        write(&only, &[6u8; 4096]);

        let cfg = DupConfig::default()
            .with_roots(vec![dir.path().to_path_buf(), dir.path().join("sub")]);
        assert!(find_duplicates(&cfg, &pool(), &NoopObserver).is_empty());

        write(&dir.path().join("copy.bin"), &[6u8; 4096]);
        let groups = find_duplicates(&cfg, &pool(), &NoopObserver);
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].paths,
            vec![dir.path().join("copy.bin"), only.clone()]
        );
    }

    #[test]
    fn test_repeated_entry_in_bucket_is_not_a_group() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("one.bin");
        write(&path, &[8u8; 2048]);
        let entry = FileEntry {
            path: path.clone(),
            size: 2048,
        };

        let cfg = config(dir.path());
        assert!(hash_bucket(2048, &[entry.clone(), entry.clone()], &cfg).is_empty());

        let mut verified = cfg.clone();
        verified.verify = true;
        assert!(hash_bucket(2048, &[entry.clone(), entry], &verified).is_empty());
    }

    #[test]
    fn test_zero_prefix_from_config_still_finds_duplicates() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("a"), &[2u8; 1500]);
        write(&dir.path().join("b"), &[2u8; 1500]);
        let settings = Config {
            fingerprint_bytes: 0,
            ..Config::default()
        };
        let cfg = DupConfig::from_config(&settings).with_roots(vec![dir.path().to_path_buf()]);
        assert_eq!(cfg.prefix_bytes, 1);
        assert_eq!(find_duplicates(&cfg, &pool(), &NoopObserver).len(), 1);
    }

    #[test]
    fn test_small_files_ignored() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("x"), &[1u8; 100]);
        write(&dir.path().join("y"), &[1u8; 100]);
        let groups = find_duplicates(&config(dir.path()), &pool(), &NoopObserver);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_prefix_match_split_by_verify() {
        let dir = TempDir::new().unwrap();
        let mut a = vec![5u8; 4096];
        let mut b = vec![5u8; 4096];
        a[4000] = 1;
        b[4000] = 2;
        write(&dir.path().join("a"), &a);
        write(&dir.path().join("b"), &b);

        let mut cfg = config(dir.path());
        cfg.prefix_bytes = 1024;
        assert_eq!(find_duplicates(&cfg, &pool(), &NoopObserver).len(), 1);
        cfg.verify = true;
        assert!(find_duplicates(&cfg, &pool(), &NoopObserver).is_empty());
    }

    #[test]
    fn test_sorted_by_member_count() {
        let dir = TempDir::new().unwrap();
        for i in 0..2 {
            write(&dir.path().join(format!("pair{}", i)), &[1u8; 1500]);
        }
        for i in 0..4 {
            write(&dir.path().join(format!("quad{}", i)), &[2u8; 3000]);
        }
        let groups = find_duplicates(&config(dir.path()), &pool(), &NoopObserver);
        let counts: Vec<usize> = groups.iter().map(|g| g.paths.len()).collect();
        assert_eq!(counts, vec![4, 2]);
    }

    #[test]
    fn test_remove_prunes_group_down_to_one() {
        let dir = TempDir::new().unwrap();
        let data = vec![9u8; 1500];
        for name in ["p", "q", "r"] {
            write(&dir.path().join(name), &data);
        }
        let mut set = DuplicateSet::new(find_duplicates(
            &config(dir.path()),
            &pool(),
            &NoopObserver,
        ));
        let exec = Executor::new(PermanentOnly);

        assert_eq!(set.remove(&dir.path().join("p"), &exec).unwrap(), 1500);
        assert_eq!(set.len(), 1);
        assert_eq!(set.groups()[0].paths.len(), 2);

        set.remove(&dir.path().join("q"), &exec).unwrap();
        assert!(set.is_empty());
        assert!(dir.path().join("r").exists());
    }

    #[test]
    fn test_remove_extras_keeps_one_per_group() {
        let dir = TempDir::new().unwrap();
        for name in ["a1", "a2", "a3"] {
            write(&dir.path().join(name), &[3u8; 2000]);
        }
        for name in ["b1", "b2"] {
            write(&dir.path().join(name), &[4u8; 1200]);
        }
        let mut set = DuplicateSet::new(find_duplicates(
            &config(dir.path()),
            &pool(),
            &NoopObserver,
        ));
        assert_eq!(set.total_wasted(), 2 * 2000 + 1200);

        let report = set.remove_extras(&KeepStrategy::First, &Executor::new(PermanentOnly));
        assert_eq!(report.removed, 3);
        assert_eq!(report.bytes_freed, 5200);
        assert!(set.is_empty());
        assert!(dir.path().join("a1").exists());
        assert!(dir.path().join("b1").exists());
    }

    #[test]
    fn test_failed_remove_keeps_member() {
        let mut set = DuplicateSet::new(vec![DuplicateGroup {
            size: 10,
            fingerprint: "f".into(),
            paths: vec!["/nonexistent/a".into(), "/nonexistent/b".into()],
        }]);
        let err = set
            .remove(Path::new("/nonexistent/a"), &Executor::new(PermanentOnly))
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
        assert_eq!(set.groups()[0].paths.len(), 2);
    }
}
