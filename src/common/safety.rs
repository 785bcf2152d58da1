use std::path::{Component, Path, PathBuf};

/// Top-level locations that must never be removed, on any platform we run on.
const PROTECTED_PATHS: &[&str] = &[
    "/",
    "/System",
    "/Applications",
    "/Users",
    "/Library",
    "/Volumes",
    "/home",
    "/root",
    "/usr",
    "/bin",
    "/sbin",
    "/var",
    "/etc",
    "/opt",
    "/private",
    "/tmp",
];

/// Home subdirectories that may be emptied but never removed themselves
const PROTECTED_HOME_DIRS: &[&str] = &[
    "Desktop",
    "Documents",
    "Downloads",
    "Pictures",
    "Music",
    "Movies",
    "Library",
    "Applications",
    "Developer",
    ".ssh",
    ".gnupg",
];

/// Check if a path is protected and should never be deleted.
///
/// Only exact matches are protected: the contents of `~/Library/Caches` are
/// fair game, `~/Library` itself is not.
pub fn is_protected(path: &Path) -> bool {
    let path = normalize(path);

    if PROTECTED_PATHS.iter().any(|p| path == Path::new(p)) {
        return true;
    }

    if let Some(home) = dirs::home_dir() {
        let home = normalize(&home);
        if path == home {
            return true;
        }
        if PROTECTED_HOME_DIRS.iter().any(|d| path == home.join(d)) {
            return true;
        }
    }

    false
}

/// Drop `.` components and trailing separators so comparisons are exact
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
