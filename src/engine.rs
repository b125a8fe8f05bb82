use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};
use crate::models::{DeleteReport, DiffResult, Manifest, Review};
use crate::store::ManifestStore;

/// Leading character of entries that are never listed.
pub const HIDDEN_MARKER: char = '.';

// -----------------------------------------------------------------------------
// Time helpers
// -----------------------------------------------------------------------------

pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

// -----------------------------------------------------------------------------
// Filters
// -----------------------------------------------------------------------------

/// A relative path is hidden when its first segment starts with the marker,
/// which also covers everything stored beneath a hidden top-level entry.
pub fn is_hidden(rel: &str) -> bool {
    rel.starts_with(HIDDEN_MARKER)
}

fn is_hidden_top_level(entry: &DirEntry) -> bool {
    entry.depth() == 1 && entry.file_name().to_string_lossy().starts_with(HIDDEN_MARKER)
}

fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    if rel.as_os_str().is_empty() {
        return None;
    }
    Some(rel.to_string_lossy().replace('\\', "/"))
}

// -----------------------------------------------------------------------------
// Scan
// -----------------------------------------------------------------------------

/// Lists every folder and file beneath `root`, relative to it.
///
/// Symlinks are not followed and land in `files`. Any unreadable entry aborts
/// the scan with [`Error::FileSystem`].
pub fn scan_tree(root: &Path) -> Result<Manifest> {
    let meta = fs::metadata(root).map_err(|e| Error::fs(root, e))?;
    if !meta.is_dir() {
        return Err(Error::fs(
            root,
            io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }

    let mut manifest = Manifest::default();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !is_hidden_top_level(e));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                return Err(Error::fs(path, err.into()));
            }
        };

        let rel = match relative_key(root, entry.path()) {
            Some(r) => r,
            None => continue,
        };
        if is_hidden(&rel) {
            continue;
        }

        if entry.file_type().is_dir() {
            manifest.folders.insert(rel);
        } else {
            manifest.files.insert(rel);
        }
    }

    debug!(
        root = %root.display(),
        folders = manifest.folders.len(),
        files = manifest.files.len(),
        "scanned tree"
    );
    Ok(manifest)
}

// -----------------------------------------------------------------------------
// Diff checking
// -----------------------------------------------------------------------------

fn difference(left: &BTreeSet<String>, right: &BTreeSet<String>) -> BTreeSet<String> {
    left.difference(right).cloned().collect()
}

pub fn compare(manifest: &Manifest, live: &Manifest) -> DiffResult {
    DiffResult {
        missing_files: difference(&manifest.files, &live.files),
        new_files: difference(&live.files, &manifest.files),
        missing_folders: difference(&manifest.folders, &live.folders),
        new_folders: difference(&live.folders, &manifest.folders),
    }
}

// -----------------------------------------------------------------------------
// Operations
// -----------------------------------------------------------------------------

/// Scans `root` and records its listing. Returns where the manifest was written.
pub fn snapshot(store: &ManifestStore, root: &Path) -> Result<PathBuf> {
    let manifest = scan_tree(root)?;
    let path = store.save(root, &manifest)?;
    info!(
        root = %root.display(),
        manifest = %path.display(),
        folders = manifest.folders.len(),
        files = manifest.files.len(),
        "snapshot saved"
    );
    Ok(path)
}

/// Compares the live tree at `root` against its saved manifest.
pub fn review(store: &ManifestStore, root: &Path) -> Result<Review> {
    let saved = store.load(root)?;
    let live = scan_tree(root)?;
    let diff = compare(&saved, &live);
    info!(
        root = %root.display(),
        missing_files = diff.missing_files.len(),
        new_files = diff.new_files.len(),
        missing_folders = diff.missing_folders.len(),
        new_folders = diff.new_folders.len(),
        clean = diff.is_clean(),
        "compared against manifest"
    );
    Ok(Review {
        diff,
        created_at: saved.created_at,
    })
}

// -----------------------------------------------------------------------------
// Deletion
// -----------------------------------------------------------------------------

fn resolve_inside(root: &Path, rel: &str) -> Result<PathBuf> {
    let rel_path = Path::new(rel);
    let escapes = rel.is_empty()
        || rel_path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(Error::delete(rel, "path is not inside the scanned root"));
    }
    Ok(root.join(rel_path))
}

pub fn delete_file(root: &Path, rel: &str) -> Result<()> {
    let target = resolve_inside(root, rel)?;
    fs::remove_file(&target).map_err(|e| Error::delete(&target, e.to_string()))?;
    debug!(path = %target.display(), "deleted file");
    Ok(())
}

pub fn delete_folder_recursive(root: &Path, rel: &str) -> Result<()> {
    let target = resolve_inside(root, rel)?;
    fs::remove_dir_all(&target).map_err(|e| Error::delete(&target, e.to_string()))?;
    debug!(path = %target.display(), "deleted folder");
    Ok(())
}

/// Deletes every listed file, carrying on past failures.
pub fn delete_files(root: &Path, paths: &[String]) -> DeleteReport {
    let mut report = DeleteReport::default();
    for rel in paths {
        match delete_file(root, rel) {
            Ok(()) => report.deleted.push(rel.clone()),
            Err(e) => {
                warn!(path = %rel, error = %e, "could not delete file");
                report.failed.push((rel.clone(), e.to_string()));
            }
        }
    }
    info!(
        deleted = report.deleted.len(),
        failed = report.failed.len(),
        "file cleanup finished"
    );
    report
}

/// Drops entries that live inside another listed folder.
fn top_level_only(paths: &[String]) -> Vec<String> {
    let mut sorted: Vec<&String> = paths.iter().collect();
    sorted.sort();
    sorted.dedup();

    let mut kept: Vec<String> = Vec::new();
    for path in sorted {
        let nested = kept
            .iter()
            .any(|parent| path.starts_with(parent.as_str()) && path[parent.len()..].starts_with('/'));
        if !nested {
            kept.push(path.clone());
        }
    }
    kept
}

/// Removes each listed folder with its contents. Stops at the first failure.
pub fn delete_folders(root: &Path, paths: &[String]) -> Result<Vec<String>> {
    let mut removed = Vec::new();
    for rel in top_level_only(paths) {
        delete_folder_recursive(root, &rel)?;
        removed.push(rel);
    }
    info!(removed = removed.len(), "folder cleanup finished");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Step;
    use crate::store::StoreConfig;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, rel).unwrap();
    }

    fn store_in(temp: &TempDir) -> ManifestStore {
        ManifestStore::new(StoreConfig {
            backup_dir: temp.path().join("backups"),
        })
    }

    #[test]
    fn scan_lists_files_and_folders_relative_to_root() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a.txt");
        touch(temp.path(), "mods/one.pak");
        touch(temp.path(), "mods/deep/two.pak");
        fs::create_dir_all(temp.path().join("empty")).unwrap();

        let manifest = scan_tree(temp.path()).unwrap();
        assert_eq!(manifest.folders, set(&["empty", "mods", "mods/deep"]));
        assert_eq!(
            manifest.files,
            set(&["a.txt", "mods/deep/two.pak", "mods/one.pak"])
        );
    }

    #[test]
    fn scan_skips_hidden_top_level_entries_at_any_depth() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), ".config");
        touch(temp.path(), ".git/objects/pack/x");
        touch(temp.path(), "visible.txt");

        let manifest = scan_tree(temp.path()).unwrap();
        assert_eq!(manifest.folders, BTreeSet::new());
        assert_eq!(manifest.files, set(&["visible.txt"]));
        assert!(manifest
            .files
            .iter()
            .chain(manifest.folders.iter())
            .all(|p| !is_hidden(p)));
    }

    #[test]
    fn scan_missing_root_is_filesystem_error() {
        let temp = TempDir::new().unwrap();
        let err = scan_tree(&temp.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::FileSystem { .. }));
    }

    #[test]
    fn scan_file_root_is_filesystem_error() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "file.txt");
        let err = scan_tree(&temp.path().join("file.txt")).unwrap_err();
        assert!(matches!(err, Error::FileSystem { .. }));
    }

    #[test]
    fn scan_keeps_dot_entries_below_visible_folders() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "mods/.keep");
        touch(temp.path(), "mods/.cache/shader.bin");

        let manifest = scan_tree(temp.path()).unwrap();
        assert_eq!(manifest.folders, set(&["mods", "mods/.cache"]));
        assert_eq!(
            manifest.files,
            set(&["mods/.cache/shader.bin", "mods/.keep"])
        );
    }

    #[cfg(unix)]
    #[test]
    fn scan_lists_symlinks_as_files_without_following() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        touch(outside.path(), "inner/secret.pak");
        touch(temp.path(), "game.exe");
        std::os::unix::fs::symlink(outside.path(), temp.path().join("link")).unwrap();

        let manifest = scan_tree(temp.path()).unwrap();
        assert_eq!(manifest.folders, BTreeSet::new());
        assert_eq!(manifest.files, set(&["game.exe", "link"]));

        delete_file(temp.path(), "link").unwrap();
        assert!(outside.path().join("inner/secret.pak").exists());
    }

    #[test]
    fn unchanged_tree_reports_no_changes() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a.txt");
        touch(temp.path(), "mods/b.txt");

        let first = scan_tree(temp.path()).unwrap();
        let second = scan_tree(temp.path()).unwrap();
        let diff = compare(&first, &second);
        assert!(diff.is_clean());
        assert_eq!(diff.steps(), vec![Step::NoChanges]);
    }

    #[test]
    fn replaced_file_reports_missing_only() {
        let temp = TempDir::new().unwrap();
        let backups = TempDir::new().unwrap();
        let store = store_in(&backups);
        touch(temp.path(), "a.txt");
        touch(temp.path(), "b.txt");
        snapshot(&store, temp.path()).unwrap();

        fs::remove_file(temp.path().join("b.txt")).unwrap();
        touch(temp.path(), "c.txt");

        let diff = review(&store, temp.path()).unwrap().diff;
        assert_eq!(diff.missing_files, set(&["b.txt"]));
        assert_eq!(diff.new_files, set(&["c.txt"]));
        assert!(diff.missing_folders.is_empty());
        assert!(diff.new_folders.is_empty());
        assert_eq!(
            diff.steps(),
            vec![Step::ReportMissingFiles(vec!["b.txt".into()])]
        );
    }

    #[test]
    fn new_folder_is_offered_and_removed() {
        let temp = TempDir::new().unwrap();
        let backups = TempDir::new().unwrap();
        let store = store_in(&backups);
        touch(temp.path(), "modsA/base.pak");
        snapshot(&store, temp.path()).unwrap();

        touch(temp.path(), "modsB/1.pak");
        touch(temp.path(), "modsB/2.pak");
        touch(temp.path(), "modsB/3.pak");

        let diff = review(&store, temp.path()).unwrap().diff;
        assert_eq!(diff.new_folders, set(&["modsB"]));
        assert_eq!(
            diff.new_files,
            set(&["modsB/1.pak", "modsB/2.pak", "modsB/3.pak"])
        );
        let folders = match diff.steps().pop() {
            Some(Step::OfferDeleteFolders(folders)) => folders,
            other => panic!("unexpected step {other:?}"),
        };

        let removed = delete_folders(temp.path(), &folders).unwrap();
        assert_eq!(removed, vec!["modsB".to_string()]);
        assert!(!temp.path().join("modsB").exists());
        assert!(temp.path().join("modsA/base.pak").exists());

        let after = review(&store, temp.path()).unwrap().diff;
        assert!(after.is_clean());
    }

    #[test]
    fn review_without_snapshot_is_recoverable() {
        let temp = TempDir::new().unwrap();
        let backups = TempDir::new().unwrap();
        let err = review(&store_in(&backups), temp.path()).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn delete_files_continues_past_failures() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "x.dll");
        touch(temp.path(), "z.dll");

        let paths = vec!["x.dll".to_string(), "gone.dll".to_string(), "z.dll".to_string()];
        let report = delete_files(temp.path(), &paths);

        assert_eq!(report.deleted, vec!["x.dll".to_string(), "z.dll".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "gone.dll");
        assert!(!report.is_complete());
        assert!(!temp.path().join("z.dll").exists());
    }

    #[test]
    fn delete_folders_collapses_nested_entries() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "mods/sub/a.pak");
        touch(temp.path(), "mods-extra/b.pak");

        let paths = vec![
            "mods/sub".to_string(),
            "mods".to_string(),
            "mods-extra".to_string(),
        ];
        let removed = delete_folders(temp.path(), &paths).unwrap();
        assert_eq!(removed, vec!["mods".to_string(), "mods-extra".to_string()]);
        assert!(!temp.path().join("mods").exists());
        assert!(!temp.path().join("mods-extra").exists());
    }

    #[test]
    fn delete_folders_propagates_failure() {
        let temp = TempDir::new().unwrap();
        let err = delete_folders(temp.path(), &["missing".to_string()]).unwrap_err();
        assert!(matches!(err, Error::Delete { .. }));
    }

    #[test]
    fn deletion_refuses_paths_outside_root() {
        let temp = TempDir::new().unwrap();
        let inner = temp.path().join("root");
        fs::create_dir_all(&inner).unwrap();
        touch(temp.path(), "outside.txt");

        assert!(matches!(
            delete_file(&inner, "../outside.txt"),
            Err(Error::Delete { .. })
        ));
        assert!(matches!(
            delete_folder_recursive(&inner, ""),
            Err(Error::Delete { .. })
        ));
        assert!(temp.path().join("outside.txt").exists());
        assert!(inner.exists());
    }

    fn paths() -> impl Strategy<Value = BTreeSet<String>> {
        prop::collection::btree_set("[a-c]{1,2}(/[a-c]{1,2}){0,2}", 0..12)
    }

    fn listing() -> impl Strategy<Value = Manifest> {
        (paths(), paths()).prop_map(|(folders, files)| Manifest {
            folders,
            files,
            ..Default::default()
        })
    }

    proptest! {
        #[test]
        fn compare_with_itself_is_clean(m in listing()) {
            prop_assert!(compare(&m, &m).is_clean());
        }

        #[test]
        fn compare_is_symmetric(m in listing(), l in listing()) {
            let forward = compare(&m, &l);
            let backward = compare(&l, &m);

            prop_assert!(forward.missing_files.is_disjoint(&forward.new_files));
            prop_assert!(forward.missing_folders.is_disjoint(&forward.new_folders));
            prop_assert_eq!(&forward.missing_files, &backward.new_files);
            prop_assert_eq!(&forward.new_files, &backward.missing_files);
            prop_assert_eq!(&forward.missing_folders, &backward.new_folders);
        }
    }
}
