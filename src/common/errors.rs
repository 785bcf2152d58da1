use std::io;
use std::path::{Path, PathBuf};

/// Per-entry failures recorded by scans and deletions.
///
/// None of these abort an operation: they are collected into reports and
/// logged, and the remaining work carries on.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    /// Path vanished or never existed
    #[error("not found: '{}'", path.display())]
    NotFound { path: PathBuf },

    /// Permission denied accessing a path
    #[error("permission denied: '{}'", path.display())]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure while reading or measuring
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Both the trash move and the permanent removal failed
    #[error("could not delete '{}': trash: {trash}; remove: {remove}", path.display())]
    DeleteFailed {
        path: PathBuf,
        trash: String,
        remove: String,
    },

    /// Refused by the protected-path guard
    #[error("refusing to delete protected path '{}'", path.display())]
    Protected { path: PathBuf },

    /// Configuration file is invalid
    #[error("config error in '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl SweepError {
    /// Classify an I/O error for the given path
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => SweepError::NotFound {
                path: path.to_path_buf(),
            },
            io::ErrorKind::PermissionDenied => SweepError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => SweepError::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// The path this error is about
    pub fn path(&self) -> &Path {
        match self {
            SweepError::NotFound { path }
            | SweepError::PermissionDenied { path }
            | SweepError::Io { path, .. }
            | SweepError::DeleteFailed { path, .. }
            | SweepError::Protected { path }
            | SweepError::Config { path, .. } => path,
        }
    }

    /// Short machine-readable kind, used in JSON reports
    pub fn kind(&self) -> &'static str {
        match self {
            SweepError::NotFound { .. } => "not_found",
            SweepError::PermissionDenied { .. } => "permission_denied",
            SweepError::Io { .. } => "io_failure",
            SweepError::DeleteFailed { .. } => "delete_failure",
            SweepError::Protected { .. } => "protected",
            SweepError::Config { .. } => "config",
        }
    }
}

impl serde::Serialize for SweepError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("SweepError", 3)?;
        s.serialize_field("kind", self.kind())?;
        s.serialize_field("path", &self.path().display().to_string())?;
        s.serialize_field("message", &self.to_string())?;
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_classifies_kinds() {
        let p = Path::new("/tmp/x");
        let e = SweepError::from_io(p, io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(e.kind(), "not_found");
        let e = SweepError::from_io(p, io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(e.kind(), "permission_denied");
        let e = SweepError::from_io(p, io::Error::new(io::ErrorKind::Other, "boom"));
        assert_eq!(e.kind(), "io_failure");
        assert_eq!(e.path(), p);
    }

    #[test]
    fn test_serializes_kind_and_path() {
        let e = SweepError::Protected {
            path: PathBuf::from("/"),
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["kind"], "protected");
        assert_eq!(json["path"], "/");
    }
}
