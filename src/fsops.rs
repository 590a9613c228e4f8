// (c) Copyright 2026 reposprout contributors. All rights reserved.

//! Filesystem collaborator (spec §6): recursive remove, sibling symlink
//! creation, and binary symlink creation. A narrow async_trait seam so the
//! orchestrator never touches `tokio::fs`/`std::os::unix::fs` directly.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::errors::BootstrapError;

/// One binary entry a package declares (name of the executable -> path to
/// the script, relative to the package's location).
pub type BinaryEntries = Vec<(String, PathBuf)>;

/// Filesystem primitives the orchestrator mutates state through (spec §6).
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Recursively removes the directory at `path`, if it exists. A
    /// missing path is not an error (spec §7 only treats a failed prune of
    /// an *existing* shadowing directory as fatal).
    async fn remove_dir_all(&self, path: &Path) -> Result<(), BootstrapError>;

    /// Symlinks the sibling package at `source` into `dest` (a path inside
    /// a dependent's local-module directory), creating parent directories
    /// as needed.
    async fn symlink_package(&self, source: &Path, dest: &Path) -> Result<(), BootstrapError>;

    /// Symlinks `binary` (an executable at `source`) into `dest` (a path
    /// inside a dependent's local `.bin` directory), creating parent
    /// directories as needed.
    async fn symlink_binary(&self, source: &Path, dest: &Path) -> Result<(), BootstrapError>;

    /// Reads the `bin` entries an installed package at `package_dir`
    /// declares, if any. Used to drive binary-link actions after a hoisted
    /// install (spec §4.5 phase B). A package with no manifest or no `bin`
    /// field yields an empty list, not an error.
    async fn binary_entries(&self, package_dir: &Path) -> Result<BinaryEntries, BootstrapError>;
}

/// Real filesystem implementation, backed by `tokio::fs` and Unix symlinks.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

async fn ensure_parent(path: &Path) -> Result<(), BootstrapError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| BootstrapError::FilesystemFailed {
                op: "create parent directory",
                path: parent.to_path_buf(),
                source,
            })?;
    }
    Ok(())
}

async fn symlink(source: &Path, dest: &Path) -> Result<(), BootstrapError> {
    ensure_parent(dest).await?;

    // A stale link or leftover shadowing entry at `dest` must not make a
    // fresh symlink attempt fail.
    let _ = tokio::fs::remove_file(dest).await;

    #[cfg(unix)]
    let result = tokio::fs::symlink(source, dest).await;
    #[cfg(not(unix))]
    let result = tokio::fs::symlink_file(source, dest).await;

    result.map_err(|source| BootstrapError::FilesystemFailed {
        op: "symlink",
        path: dest.to_path_buf(),
        source,
    })
}

#[async_trait]
impl FileSystem for RealFileSystem {
    async fn remove_dir_all(&self, path: &Path) -> Result<(), BootstrapError> {
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(BootstrapError::FilesystemFailed {
                op: "prune",
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    async fn symlink_package(&self, source: &Path, dest: &Path) -> Result<(), BootstrapError> {
        symlink(source, dest).await
    }

    async fn symlink_binary(&self, source: &Path, dest: &Path) -> Result<(), BootstrapError> {
        symlink(source, dest).await
    }

    async fn binary_entries(&self, package_dir: &Path) -> Result<BinaryEntries, BootstrapError> {
        let manifest_path = package_dir.join("package.json");

        let contents = match tokio::fs::read_to_string(&manifest_path).await {
            Ok(contents) => contents,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(BootstrapError::FilesystemFailed {
                    op: "read installed package manifest",
                    path: manifest_path,
                    source,
                })
            }
        };

        let manifest: serde_json::Value =
            serde_json::from_str(&contents).unwrap_or(serde_json::Value::Null);

        Ok(match manifest.get("bin") {
            Some(serde_json::Value::String(rel_path)) => {
                let name = package_dir
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default()
                    .to_owned();
                vec![(name, PathBuf::from(rel_path))]
            }
            Some(serde_json::Value::Object(map)) => map
                .iter()
                .filter_map(|(name, value)| {
                    value.as_str().map(|rel_path| (name.clone(), PathBuf::from(rel_path)))
                })
                .collect(),
            _ => Vec::new(),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn removing_a_missing_directory_is_not_an_error() {
        let fs = RealFileSystem;
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("does-not-exist");

        fs.remove_dir_all(&missing).await.expect("missing dir is a no-op");
    }

    #[tokio::test]
    async fn symlinking_creates_parent_directories() {
        let fs = RealFileSystem;
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("pkg-b");
        tokio::fs::create_dir_all(&source).await.unwrap();
        let dest = dir.path().join("pkg-a/node_modules/pkg-b");

        fs.symlink_package(&source, &dest).await.expect("symlink should succeed");
        assert!(dest.symlink_metadata().is_ok());
    }
}
