use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::SystemTime;

use super::grouper::DuplicateGroup;

/// Which member of a duplicate group survives a bulk cleanup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeepStrategy {
    /// Keep the first path in the group
    First,
    /// Keep the most recently modified file
    Newest,
    /// Keep the oldest file (usually the original)
    Oldest,
    /// Keep a file inside this directory, else the first
    InDir(PathBuf),
}

impl FromStr for KeepStrategy {
    type Err = String;

    /// `first`, `newest`, `oldest`, or `dir:<path>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(KeepStrategy::First),
            "newest" => Ok(KeepStrategy::Newest),
            "oldest" => Ok(KeepStrategy::Oldest),
            other => match other.strip_prefix("dir:") {
                Some(dir) if !dir.is_empty() => Ok(KeepStrategy::InDir(PathBuf::from(dir))),
                _ => Err(format!(
                    "unknown keep strategy '{}' (expected first, newest, oldest or dir:<path>)",
                    other
                )),
            },
        }
    }
}

/// Plan for one duplicate group
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedGroup {
    pub keep: PathBuf,
    pub remove: Vec<PathBuf>,
    /// Bytes freed if every removal succeeds
    pub bytes_freed: u64,
    pub reason: String,
}

fn modified(path: &Path) -> SystemTime {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Pick the survivor of a group
pub fn resolve_group(group: &DuplicateGroup, strategy: &KeepStrategy) -> ResolvedGroup {
    let paths = &group.paths;

    let (keep_idx, reason) = match strategy {
        KeepStrategy::First => (0, "First in group".to_string()),
        KeepStrategy::Newest => {
            let idx = paths
                .iter()
                .enumerate()
                .max_by_key(|(_, p)| modified(p))
                .map(|(i, _)| i)
                .unwrap_or(0);
            (idx, "Most recently modified".to_string())
        }
        KeepStrategy::Oldest => {
            let idx = paths
                .iter()
                .enumerate()
                .min_by_key(|(_, p)| modified(p))
                .map(|(i, _)| i)
                .unwrap_or(0);
            (idx, "Oldest file (original)".to_string())
        }
        KeepStrategy::InDir(preferred) => {
            let idx = paths.iter().position(|p| p.starts_with(preferred)).unwrap_or(0);
            (idx, format!("In preferred directory: {}", preferred.display()))
        }
    };

    let keep = paths.get(keep_idx).cloned().unwrap_or_default();
    let remove: Vec<PathBuf> = paths
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != keep_idx)
        .map(|(_, p)| p.clone())
        .collect();
    let bytes_freed = group.size * remove.len() as u64;

    ResolvedGroup {
        keep,
        remove,
        bytes_freed,
        reason,
    }
}

/// Resolve all groups in a result set
pub fn resolve_all(groups: &[DuplicateGroup], strategy: &KeepStrategy) -> Vec<ResolvedGroup> {
    groups.iter().map(|g| resolve_group(g, strategy)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn group(paths: Vec<PathBuf>) -> DuplicateGroup {
        DuplicateGroup {
            size: 100,
            fingerprint: "abc".into(),
            paths,
        }
    }

    #[test]
    fn test_keep_first() {
        let g = group(vec!["/a/1".into(), "/b/2".into(), "/c/3".into()]);
        let r = resolve_group(&g, &KeepStrategy::First);
        assert_eq!(r.keep, PathBuf::from("/a/1"));
        assert_eq!(r.remove.len(), 2);
        assert_eq!(r.bytes_freed, 200);
    }

    #[test]
    fn test_keep_in_dir_falls_back_to_first() {
        let g = group(vec!["/a/1".into(), "/keep/2".into()]);
        let r = resolve_group(&g, &KeepStrategy::InDir("/keep".into()));
        assert_eq!(r.keep, PathBuf::from("/keep/2"));
        let r = resolve_group(&g, &KeepStrategy::InDir("/elsewhere".into()));
        assert_eq!(r.keep, PathBuf::from("/a/1"));
    }

    #[test]
    fn test_keep_newest_and_oldest() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("old");
        let new = dir.path().join("new");
        std::fs::write(&old, b"x").unwrap();
        let f = std::fs::File::options().write(true).open(&old).unwrap();
        f.set_modified(SystemTime::now() - Duration::from_secs(3600))
            .unwrap();
        std::fs::write(&new, b"x").unwrap();

        let g = group(vec![old.clone(), new.clone()]);
        assert_eq!(resolve_group(&g, &KeepStrategy::Newest).keep, new);
        assert_eq!(resolve_group(&g, &KeepStrategy::Oldest).keep, old);
    }

    #[test]
    fn test_parse_strategy() {
        assert_eq!("newest".parse::<KeepStrategy>(), Ok(KeepStrategy::Newest));
        assert_eq!(
            "dir:/Users/me/Photos".parse::<KeepStrategy>(),
            Ok(KeepStrategy::InDir("/Users/me/Photos".into()))
        );
        assert!("largest".parse::<KeepStrategy>().is_err());
        assert!("dir:".parse::<KeepStrategy>().is_err());
    }
}
