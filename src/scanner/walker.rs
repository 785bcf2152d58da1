use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Directory extensions treated as opaque packages (never descended into)
const PACKAGE_EXTENSIONS: &[&str] = &[
    "app",
    "bundle",
    "framework",
    "plugin",
    "kext",
    "xpc",
    "pkg",
    "mpkg",
    "photoslibrary",
    "musiclibrary",
    "tvlibrary",
    "imovielibrary",
    "fcpbundle",
    "logicx",
    "band",
    "xcodeproj",
    "xcworkspace",
    "xcarchive",
    "playground",
    "rtfd",
    "pages",
    "numbers",
    "key",
];

/// A regular file found during a walk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size: u64,
}

/// Which entries a walk skips
#[derive(Debug, Clone)]
pub struct WalkPolicy {
    /// Skip dot-files and never descend into dot-directories
    pub skip_hidden: bool,
    /// Never descend into package-like bundle directories
    pub skip_packages: bool,
    /// Skip any entry whose path contains one of these substrings
    pub exclude: Vec<String>,
}

impl Default for WalkPolicy {
    fn default() -> Self {
        Self {
            skip_hidden: true,
            skip_packages: true,
            exclude: Vec::new(),
        }
    }
}

impl WalkPolicy {
    /// Policy used for size measurement: hidden entries skipped, packages counted
    pub fn measuring() -> Self {
        Self {
            skip_hidden: true,
            skip_packages: false,
            exclude: Vec::new(),
        }
    }

    pub fn with_exclusions(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    /// Whether the walk should yield / descend into this entry.
    /// The root itself (depth 0) is always admitted.
    fn admits(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        if self.skip_hidden && is_hidden(entry) {
            return false;
        }
        if self.skip_packages && is_package(entry) {
            return false;
        }
        if !self.exclude.is_empty() {
            let path = entry.path().to_string_lossy();
            if self.exclude.iter().any(|p| path.contains(p.as_str())) {
                return false;
            }
        }
        true
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn is_package(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| PACKAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
}

/// Lazily enumerate every regular file under `roots`.
///
/// Uses the default policy (hidden entries and packages skipped). Missing
/// roots yield nothing; unreadable entries are skipped and the walk carries on.
pub fn walk<I, P>(roots: I, min_size: Option<u64>) -> impl Iterator<Item = FileEntry>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    walk_with(roots, min_size, WalkPolicy::default())
}

/// Like [`walk`], with an explicit policy
pub fn walk_with<I, P>(
    roots: I,
    min_size: Option<u64>,
    policy: WalkPolicy,
) -> impl Iterator<Item = FileEntry>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let roots: Vec<PathBuf> = roots
        .into_iter()
        .map(|p| p.as_ref().to_path_buf())
        .collect();
    distinct_roots(roots)
        .into_iter()
        .flat_map(move |root| walk_root(root, min_size.unwrap_or(0), policy.clone()))
}

/// Drop roots that repeat another root or lie inside one, so a walk over
/// the result never yields the same file twice.
///
/// Roots are compared in canonical form (symlinked roots included); the
/// kept roots are returned as given, in their original order.
pub fn distinct_roots(roots: Vec<PathBuf>) -> Vec<PathBuf> {
    let keys: Vec<PathBuf> = roots
        .iter()
        .map(|r| std::fs::canonicalize(r).unwrap_or_else(|_| r.clone()))
        .collect();

    roots
        .into_iter()
        .enumerate()
        .filter(|(i, root)| {
            let key = &keys[*i];
            let covered = keys.iter().enumerate().any(|(j, other)| {
                j != *i && key.starts_with(other) && (key != other || j < *i)
            });
            if covered {
                debug!("walk: {} is covered by another root", root.display());
            }
            !covered
        })
        .map(|(_, root)| root)
        .collect()
}

fn walk_root(root: PathBuf, min_size: u64, policy: WalkPolicy) -> impl Iterator<Item = FileEntry> {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(move |e| policy.admits(e))
        .filter_map(|res| match res {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!("walk: skipping entry: {}", err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(move |entry| {
            let size = match entry.metadata() {
                Ok(meta) => meta.len(),
                Err(err) => {
                    debug!("walk: no metadata for {}: {}", entry.path().display(), err);
                    return None;
                }
            };
            (size >= min_size).then(|| FileEntry {
                path: entry.into_path(),
                size,
            })
        })
}

/// Total bytes of a file, or of all regular files beneath a directory.
///
/// Hidden entries below `path` and unreadable entries are skipped.
/// A path that does not exist measures 0.
pub fn directory_size(path: &Path) -> u64 {
    let meta = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(_) => return 0,
    };

    if meta.is_file() {
        return meta.len();
    }
    if !meta.is_dir() {
        return 0;
    }

    walk_with([path], None, WalkPolicy::measuring())
        .map(|f| f.size)
        .sum()
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_default();
    }
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().unwrap_or_default().join(rest),
        None => PathBuf::from(path),
    }
}

/// The user's home directory joined with each name, in order
pub fn home_roots(names: &[&str]) -> Vec<PathBuf> {
    let home = dirs::home_dir().unwrap_or_default();
    names.iter().map(|n| home.join(n)).collect()
}
