use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The scan root is missing, not a directory, or could not be traversed.
    #[error("cannot read directory {path}: {source}")]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No snapshot has been taken for this root yet.
    #[error("no manifest for {root} (expected at {manifest})")]
    ManifestNotFound { root: PathBuf, manifest: PathBuf },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to delete {path}: {reason}")]
    Delete { path: PathBuf, reason: String },
}

impl Error {
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn delete(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Delete {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Recoverable conditions the shell reports without treating them as failures.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ManifestNotFound { .. })
    }
}
