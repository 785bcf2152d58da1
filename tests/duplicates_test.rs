use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use diskbroom::cleaner::{Executor, Remover, SystemRemover};
use diskbroom::duplicates::{hasher, DupConfig, DuplicateGroup, DuplicateSet, KeepStrategy};
use diskbroom::scanner::progress::{NoopObserver, ScanObserver};

struct PermanentOnly;

impl Remover for PermanentOnly {
    fn trash(&self, _path: &Path) -> Result<(), String> {
        Err("no trash in tests".into())
    }
    fn remove(&self, path: &Path) -> std::io::Result<()> {
        SystemRemover.remove(path)
    }
}

#[derive(Default)]
struct Snapshots {
    counts: Mutex<Vec<usize>>,
}

impl ScanObserver for Snapshots {
    fn on_duplicates(&self, groups: &[DuplicateGroup]) {
        self.counts.lock().push(groups.len());
    }
}

fn pool() -> rayon::ThreadPool {
    rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap()
}

fn write(path: &Path, data: &[u8]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, data).unwrap();
}

fn scan(root: &Path) -> Vec<DuplicateGroup> {
    let config = DupConfig::default().with_roots(vec![root.to_path_buf()]);
    diskbroom::duplicates::find_duplicates(&config, &pool(), &NoopObserver)
}

#[test]
fn test_three_copies_across_folders() {
    let dir = TempDir::new().unwrap();
    let photo = vec![0x42u8; 2 * 1024 * 1024];
    let mut edited = photo.clone();
    edited[10] = 0;

    let a = dir.path().join("Downloads/IMG_1.jpg");
    let b = dir.path().join("Desktop/IMG_1 copy.jpg");
    let c = dir.path().join("Pictures/2024/IMG_1.jpg");
    write(&a, &photo);
    write(&b, &photo);
    write(&c, &photo);
    write(&dir.path().join("Pictures/IMG_1 edited.jpg"), &edited);

    let groups = scan(dir.path());
    assert_eq!(groups.len(), 1);
    let members: HashSet<PathBuf> = groups[0].paths.iter().cloned().collect();
    assert_eq!(members, HashSet::from([a, b, c]));
}

#[test]
fn test_default_prefix_decides_membership() {
    let dir = TempDir::new().unwrap();
    let base: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
    let mut tail_differs = base.clone();
    tail_differs[12_000] ^= 0xFF;
    let mut head_differs = base.clone();
    head_differs[100] ^= 0xFF;

    let x = dir.path().join("x.bin");
    let y = dir.path().join("y.bin");
    write(&x, &base);
    write(&y, &tail_differs);
    write(&dir.path().join("z.bin"), &head_differs);

    let config = DupConfig::default().with_roots(vec![dir.path().to_path_buf()]);
    assert_eq!(config.prefix_bytes, 8192);
    let groups = diskbroom::duplicates::find_duplicates(&config, &pool(), &NoopObserver);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 20_000);
    assert_eq!(groups[0].paths, vec![x, y]);
}

#[test]
fn test_group_invariants_hold() {
    let dir = TempDir::new().unwrap();
    for (i, fill) in [1u8, 2, 3].iter().enumerate() {
        for copy in 0..=i + 1 {
            write(
                &dir.path().join(format!("set{}/copy{}", i, copy)),
                &vec![*fill; 1500 + i * 100],
            );
        }
    }
    write(&dir.path().join("loner"), &[9u8; 1500]);

    let groups = scan(dir.path());
    assert_eq!(groups.len(), 3);
    for group in &groups {
        assert!(group.paths.len() >= 2);
        let fingerprints: HashSet<Option<String>> = group
            .paths
            .iter()
            .map(|p| hasher::fingerprint(p, hasher::DEFAULT_PREFIX_BYTES).unwrap())
            .collect();
        assert_eq!(fingerprints.len(), 1);
        for path in &group.paths {
            assert_eq!(std::fs::metadata(path).unwrap().len(), group.size);
        }
    }
    let counts: Vec<usize> = groups.iter().map(|g| g.paths.len()).collect();
    assert_eq!(counts, vec![4, 3, 2]);
}

#[test]
fn test_partial_results_are_published() {
    let dir = TempDir::new().unwrap();
    for bucket in 0..5usize {
        for copy in 0..2 {
            write(
                &dir.path().join(format!("b{}_{}", bucket, copy)),
                &vec![bucket as u8; 1100 + bucket],
            );
        }
    }

    let mut config = DupConfig::default().with_roots(vec![dir.path().to_path_buf()]);
    config.publish_every = 2;
    let observer = Snapshots::default();
    let groups = diskbroom::duplicates::find_duplicates(&config, &pool(), &observer);

    let counts = observer.counts.lock();
    assert_eq!(groups.len(), 5);
    assert_eq!(counts.last(), Some(&5));
    // Two periodic snapshots (after 2 and 4 buckets) plus the final one
    assert_eq!(counts.len(), 3);
}

#[test]
fn test_deleting_all_but_one_prunes_group() {
    let dir = TempDir::new().unwrap();
    let data = vec![7u8; 4096];
    let paths: Vec<PathBuf> = (0..3).map(|i| dir.path().join(format!("f{}", i))).collect();
    for p in &paths {
        write(p, &data);
    }

    let exec = Executor::new(PermanentOnly);
    let mut set = DuplicateSet::new(scan(dir.path()));
    assert_eq!(set.len(), 1);
    for p in &paths[..2] {
        assert_eq!(set.remove(p, &exec).unwrap(), 4096);
    }
    assert!(set.is_empty());
    assert!(paths[2].exists());
}

#[test]
fn test_keep_in_dir_strategy() {
    let dir = TempDir::new().unwrap();
    let data = vec![5u8; 2000];
    let keep = dir.path().join("Archive/a.pdf");
    write(&dir.path().join("Downloads/a.pdf"), &data);
    write(&keep, &data);

    let mut set = DuplicateSet::new(scan(dir.path()));
    let strategy = KeepStrategy::InDir(dir.path().join("Archive"));
    let report = set.remove_extras(&strategy, &Executor::new(PermanentOnly));
    assert_eq!(report.bytes_freed, 2000);
    assert!(keep.exists());
    assert!(!dir.path().join("Downloads/a.pdf").exists());
}
