use anyhow::Result;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

use crate::scanner::walker::FileEntry;

/// Default fingerprint prefix (first 8KB)
pub const DEFAULT_PREFIX_BYTES: usize = 8192;

/// Hex SHA-256 of the first `prefix_bytes` bytes of a file.
///
/// Returns `None` for a file that reads zero bytes: it has nothing to
/// fingerprint and is never reported as a duplicate.
pub fn fingerprint(path: &Path, prefix_bytes: usize) -> Result<Option<String>> {
    let file = File::open(path)?;
    let mut buffer = Vec::with_capacity(prefix_bytes);
    file.take(prefix_bytes as u64).read_to_end(&mut buffer)?;

    if buffer.is_empty() {
        return Ok(None);
    }

    let mut hasher = Sha256::new();
    hasher.update(&buffer);
    Ok(Some(format!("{:x}", hasher.finalize())))
}

/// Compute full SHA-256 hash of a file
pub fn full_hash(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(1024 * 1024, file);
    let mut hasher = Sha256::new();

    let mut buffer = vec![0u8; 1024 * 1024];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Bucket files by exact size.
/// Files with a unique size cannot have a duplicate, so those buckets are dropped.
pub fn group_by_size<I>(entries: I) -> HashMap<u64, Vec<FileEntry>>
where
    I: IntoIterator<Item = FileEntry>,
{
    let mut groups: HashMap<u64, Vec<FileEntry>> = HashMap::new();
    for entry in entries {
        groups.entry(entry.size).or_default().push(entry);
    }
    groups.retain(|_, v| v.len() > 1);
    groups
}

/// Split one size bucket by prefix fingerprint.
/// Unreadable and empty files drop out; their siblings are unaffected.
pub fn group_by_fingerprint(
    files: &[FileEntry],
    prefix_bytes: usize,
) -> HashMap<String, Vec<FileEntry>> {
    let mut groups: HashMap<String, Vec<FileEntry>> = HashMap::new();

    for file in files {
        match fingerprint(&file.path, prefix_bytes) {
            Ok(Some(hash)) => groups.entry(hash).or_default().push(file.clone()),
            Ok(None) => debug!("Empty read, skipping {}", file.path.display()),
            Err(e) => debug!("Cannot fingerprint {}: {}", file.path.display(), e),
        }
    }

    groups.retain(|_, v| v.len() > 1);
    groups
}

/// Split a fingerprint group by full-content hash
pub fn group_by_full_hash(files: &[FileEntry]) -> HashMap<String, Vec<FileEntry>> {
    let mut groups: HashMap<String, Vec<FileEntry>> = HashMap::new();

    for file in files {
        match full_hash(&file.path) {
            Ok(hash) => groups.entry(hash).or_default().push(file.clone()),
            Err(e) => debug!("Cannot hash {}: {}", file.path.display(), e),
        }
    }

    groups.retain(|_, v| v.len() > 1);
    groups
}
