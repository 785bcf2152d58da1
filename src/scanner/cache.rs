use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::walker;

/// Cache hit statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub invalidated: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<PathBuf, u64>,
    stats: CacheStats,
}

/// Shared path → byte count memo for entities whose size rarely changes
/// (installed applications, for instance).
///
/// Cloning is cheap and every clone sees the same map. All access goes
/// through one mutex, so concurrent workers can call any method freely.
/// Nothing populates it implicitly: [`walker::directory_size`] never
/// touches it.
#[derive(Debug, Clone, Default)]
pub struct SizeCache {
    inner: Arc<Mutex<Inner>>,
}

impl SizeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached size for `path`, if any
    pub fn get(&self, path: &Path) -> Option<u64> {
        let mut inner = self.inner.lock();
        let found = inner.entries.get(path).copied();
        match found {
            Some(_) => inner.stats.hits += 1,
            None => inner.stats.misses += 1,
        }
        found
    }

    pub fn set(&self, path: impl Into<PathBuf>, size: u64) {
        self.inner.lock().entries.insert(path.into(), size);
    }

    /// Forget one path (after it was cleaned, say)
    pub fn remove(&self, path: &Path) -> Option<u64> {
        let mut inner = self.inner.lock();
        let removed = inner.entries.remove(path);
        if removed.is_some() {
            inner.stats.invalidated += 1;
        }
        removed
    }

    /// Drop every entry; statistics are kept
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.stats.invalidated += inner.entries.len();
        inner.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }

    /// Return the cached size, or measure `path` and remember the result.
    ///
    /// The lock is not held while measuring, so two workers racing on the
    /// same uncached path may both measure it; the last write wins.
    pub fn get_or_measure(&self, path: &Path) -> u64 {
        if let Some(size) = self.get(path) {
            return size;
        }
        let size = walker::directory_size(path);
        self.set(path, size);
        size
    }
}
