use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::engine::now_unix;
use crate::error::{Error, Result};
use crate::models::Manifest;

pub const MANIFEST_SUFFIX: &str = "_Backup.json";

/// Hex characters of the path digest kept in manifest file names.
const DIGEST_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backup_dir: PathBuf,
}

/// Manifests on disk, one file per resolved root.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    config: StoreConfig,
}

impl ManifestStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.config.backup_dir
    }

    fn resolve(root: &Path) -> Result<PathBuf> {
        fs::canonicalize(root).map_err(|e| Error::fs(root, e))
    }

    /// `<name>_<digest>`: the root's final component, readable in a file
    /// browser, plus a digest of the full resolved path so two roots with the
    /// same name keep separate manifests.
    fn identifier(resolved: &Path) -> String {
        let name = resolved
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "root".to_string());

        let mut hasher = Sha256::new();
        hasher.update(resolved.to_string_lossy().as_bytes());
        let digest = hex::encode(hasher.finalize());

        format!("{name}_{}", &digest[..DIGEST_LEN])
    }

    fn path_for(&self, resolved: &Path) -> PathBuf {
        self.config
            .backup_dir
            .join(format!("{}{MANIFEST_SUFFIX}", Self::identifier(resolved)))
    }

    /// Where the manifest for `root` is (or would be) stored.
    pub fn manifest_path(&self, root: &Path) -> Result<PathBuf> {
        Ok(self.path_for(&Self::resolve(root)?))
    }

    /// Writes `manifest` for `root`, replacing any earlier snapshot.
    pub fn save(&self, root: &Path, manifest: &Manifest) -> Result<PathBuf> {
        let resolved = Self::resolve(root)?;
        let path = self.path_for(&resolved);

        fs::create_dir_all(&self.config.backup_dir)
            .map_err(|e| Error::io(&self.config.backup_dir, e))?;

        let mut doc = manifest.clone();
        doc.root = Some(resolved.to_string_lossy().into_owned());
        if doc.created_at == 0 {
            doc.created_at = now_unix();
        }

        let json =
            serde_json::to_string_pretty(&doc).map_err(|e| Error::io(&path, io::Error::other(e)))?;
        fs::write(&path, json).map_err(|e| Error::io(&path, e))?;

        debug!(manifest = %path.display(), "manifest written");
        Ok(path)
    }

    pub fn load(&self, root: &Path) -> Result<Manifest> {
        let resolved = Self::resolve(root)?;
        let path = self.path_for(&resolved);

        let txt = match fs::read_to_string(&path) {
            Ok(txt) => txt,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::ManifestNotFound {
                    root: resolved,
                    manifest: path,
                });
            }
            Err(e) => return Err(Error::io(&path, e)),
        };

        serde_json::from_str(&txt).map_err(|e| Error::Parse { path, source: e })
    }
}
