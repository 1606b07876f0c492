//! Workspace scanning for `buf.lock` files
//!
//! Walks a directory tree, keeps the files the input filter accepts and reads
//! them into [`FileContent`] values ready to be fed to an index host.

use std::path::{Path, PathBuf};

use anyhow::Context;
use walkdir::WalkDir;

use crate::config::ScanConfig;
use crate::document::FileContent;
use crate::file_types;

/// Find every lock file below `root`.
pub fn find_lock_files(root: &Path, config: &ScanConfig) -> Vec<PathBuf> {
    let mut walker = WalkDir::new(root).follow_links(config.follow_links);
    if let Some(depth) = config.max_depth {
        walker = walker.max_depth(depth);
    }

    walker
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| config.is_excluded(name))
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && file_types::accepts_path(entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}

/// Find and read every lock file below `root`.
///
/// Files that cannot be read are logged and skipped; only a missing or
/// unreadable root is an error.
pub async fn scan_workspace(root: &Path, config: &ScanConfig) -> anyhow::Result<Vec<FileContent>> {
    let root = tokio::fs::canonicalize(root)
        .await
        .with_context(|| format!("Cannot resolve scan root {}", root.display()))?;

    let paths = {
        let root = root.clone();
        let config = config.clone();
        tokio::task::spawn_blocking(move || find_lock_files(&root, &config)).await?
    };
    tracing::debug!(root = %root.display(), found = paths.len(), "Lock files found");

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => files.push(FileContent::from_path(&path, &text)),
            Err(e) => tracing::warn!(path = %path.display(), "Failed to read lock file: {e}"),
        }
    }
    Ok(files)
}
