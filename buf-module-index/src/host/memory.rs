//! In-process index host backed by DashMap
//!
//! Drives a single [`FileIndexExtension`]: files are filtered, extracted and
//! their keys stored codec-encoded, exactly as an editor host would persist
//! them. Nothing is written to disk; a [`HostSnapshot`] can carry the state
//! over to a new host, and is dropped when the extension's name or version no
//! longer match.

use std::collections::HashSet;
use std::fmt::Display;

use dashmap::DashMap;
use indexmap::IndexSet;

use super::{IndexQuery, IndexUpdate, ProjectScope};
use crate::document::FileContent;
use crate::index::FileIndexExtension;

type FileKey = (ProjectScope, String);

/// Encoded index entries of every file, tagged with the index that wrote them
#[derive(Debug, Clone)]
pub struct HostSnapshot {
    pub index_name: String,
    pub version: u32,
    pub files: Vec<(ProjectScope, String, Vec<Vec<u8>>)>,
}

/// Memory-only index host
pub struct MemoryIndexHost<E: FileIndexExtension> {
    extension: E,
    files: DashMap<FileKey, Vec<Vec<u8>>>,
}

impl<E: FileIndexExtension> MemoryIndexHost<E> {
    pub fn new(extension: E) -> Self {
        tracing::debug!(
            index = extension.name(),
            version = extension.version(),
            "Registered index extension"
        );
        Self {
            extension,
            files: DashMap::new(),
        }
    }

    /// Build a host seeded with `snapshot`.
    ///
    /// A snapshot written by another index or another version of this index is
    /// discarded and the host starts empty.
    pub fn restore(extension: E, snapshot: HostSnapshot) -> Self {
        let host = Self::new(extension);
        if snapshot.index_name != host.extension.name()
            || snapshot.version != host.extension.version()
        {
            tracing::info!(
                "Discarding index snapshot {} v{} (current: {} v{})",
                snapshot.index_name,
                snapshot.version,
                host.extension.name(),
                host.extension.version()
            );
            return host;
        }
        for (project, location, keys) in snapshot.files {
            host.files.insert((project, location), keys);
        }
        host
    }

    pub fn snapshot(&self) -> HostSnapshot {
        let mut files: Vec<_> = self
            .files
            .iter()
            .map(|entry| {
                let (project, location) = entry.key().clone();
                (project, location, entry.value().clone())
            })
            .collect();
        files.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        HostSnapshot {
            index_name: self.extension.name().to_string(),
            version: self.extension.version(),
            files,
        }
    }

    pub fn extension(&self) -> &E {
        &self.extension
    }

    /// Counts of projects, files and stored keys
    pub fn stats(&self) -> IndexStats {
        let mut projects = HashSet::new();
        let mut files = 0;
        let mut keys = 0;
        for entry in self.files.iter() {
            projects.insert(entry.key().0.clone());
            files += 1;
            keys += entry.value().len();
        }
        IndexStats {
            projects: projects.len(),
            files,
            keys,
        }
    }
}

impl<E: FileIndexExtension> IndexUpdate for MemoryIndexHost<E> {
    fn update_file(&self, project: &ProjectScope, file: &FileContent) -> usize {
        let Some(location) = file.location.clone() else {
            tracing::debug!(file = %file.file_name, "File has no location, not indexed");
            return 0;
        };
        let key = (project.clone(), location);

        if !self.extension.accepts(&file.file_name) {
            self.files.remove(&key);
            return 0;
        }

        let codec = self.extension.codec();
        let encoded: Vec<Vec<u8>> = self
            .extension
            .index(file)
            .keys()
            .filter_map(|k| match codec.encode(k) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    tracing::warn!(location = %key.1, "Failed to encode index key: {e}");
                    None
                }
            })
            .collect();

        let count = encoded.len();
        if encoded.is_empty() {
            self.files.remove(&key);
        } else {
            self.files.insert(key, encoded);
        }
        count
    }

    fn remove_file(&self, project: &ProjectScope, location: &str) -> bool {
        self.files
            .remove(&(project.clone(), location.to_string()))
            .is_some()
    }
}

impl<E: FileIndexExtension> IndexQuery<E::Key> for MemoryIndexHost<E> {
    fn all_keys(&self, index_id: &str, project: &ProjectScope) -> anyhow::Result<Vec<E::Key>> {
        anyhow::ensure!(
            index_id == self.extension.name(),
            "Unknown index {index_id}, host serves {}",
            self.extension.name()
        );

        let mut files: Vec<(String, Vec<Vec<u8>>)> = self
            .files
            .iter()
            .filter(|entry| &entry.key().0 == project)
            .map(|entry| (entry.key().1.clone(), entry.value().clone()))
            .collect();
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let codec = self.extension.codec();
        let mut keys = IndexSet::new();
        for (location, encoded) in files {
            for bytes in encoded {
                match codec.decode(&bytes) {
                    Ok(key) => {
                        keys.insert(key);
                    }
                    Err(e) => tracing::warn!(%location, "Dropping undecodable index key: {e}"),
                }
            }
        }
        Ok(keys.into_iter().collect())
    }
}

/// Statistics about host contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub projects: usize,
    pub files: usize,
    pub keys: usize,
}

impl Display for IndexStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "IndexStats {{ projects: {}, files: {}, keys: {} }}",
            self.projects, self.files, self.keys
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinates::ModuleCoordinates;
    use crate::document::ParsedContent;
    use crate::index::{BufModuleIndex, INDEX_ID, all_project_modules};

    const LOCK_A: &str = "file:///repo/a/buf.lock";
    const LOCK_B: &str = "file:///repo/b/buf.lock";

    fn project() -> ProjectScope {
        ProjectScope::new("repo", "/repo")
    }

    fn lock_file(location: &str, repos: &[&str]) -> FileContent {
        let mut text = String::from("version: v1\ndeps:\n");
        for repo in repos {
            text.push_str(&format!(
                "  - {{remote: buf.build, owner: acme, repository: {repo}, commit: c0ffee}}\n"
            ));
        }
        FileContent::from_text(Some(location.to_string()), "buf.lock", &text)
    }

    fn host() -> MemoryIndexHost<BufModuleIndex> {
        MemoryIndexHost::new(BufModuleIndex::new())
    }

    #[test]
    fn test_update_and_lookup() {
        let host = host();
        assert_eq!(host.update_file(&project(), &lock_file(LOCK_A, &["pet", "store"])), 2);
        assert_eq!(host.update_file(&project(), &lock_file(LOCK_B, &["pet"])), 1);

        let modules = all_project_modules(&host, &project()).unwrap();
        assert_eq!(modules.len(), 3);
        assert_eq!(modules[0].lock_file_location, LOCK_A);
        assert_eq!(modules[2].lock_file_location, LOCK_B);
    }

    #[test]
    fn test_update_replaces_previous_entries() {
        let host = host();
        host.update_file(&project(), &lock_file(LOCK_A, &["pet", "store"]));
        host.update_file(&project(), &lock_file(LOCK_A, &["pet"]));

        let modules = all_project_modules(&host, &project()).unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].repository, "pet");
    }

    #[test]
    fn test_rejected_file_drops_entries() {
        let host = host();
        host.update_file(&project(), &lock_file(LOCK_A, &["pet"]));

        let renamed = FileContent {
            file_name: "buf.lock.orig".to_string(),
            ..lock_file(LOCK_A, &["pet"])
        };
        assert_eq!(host.update_file(&project(), &renamed), 0);
        assert!(all_project_modules(&host, &project()).unwrap().is_empty());
    }

    #[test]
    fn test_unparsable_file_yields_no_entries() {
        let host = host();
        let file = FileContent::new(Some(LOCK_A.to_string()), "buf.lock", ParsedContent::Other);
        assert_eq!(host.update_file(&project(), &file), 0);
        assert_eq!(host.stats().files, 0);
    }

    #[test]
    fn test_remove_file() {
        let host = host();
        host.update_file(&project(), &lock_file(LOCK_A, &["pet"]));

        assert!(host.remove_file(&project(), LOCK_A));
        assert!(!host.remove_file(&project(), LOCK_A));
        assert!(all_project_modules(&host, &project()).unwrap().is_empty());
    }

    #[test]
    fn test_projects_are_isolated() {
        let host = host();
        let other = ProjectScope::new("other", "/other");
        host.update_file(&project(), &lock_file(LOCK_A, &["pet"]));
        host.update_file(&other, &lock_file("file:///other/buf.lock", &["store"]));

        let modules = all_project_modules(&host, &other).unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].repository, "store");
        assert_eq!(host.stats().projects, 2);
    }

    #[test]
    fn test_unknown_index_is_an_error() {
        let host = host();
        let result: anyhow::Result<Vec<ModuleCoordinates>> =
            host.all_keys("SomeOtherIndex", &project());
        assert!(result.is_err());
        assert!(host.all_keys(INDEX_ID, &project()).is_ok());
    }

    #[test]
    fn test_snapshot_restore_same_version() {
        let host = host();
        host.update_file(&project(), &lock_file(LOCK_A, &["pet", "store"]));

        let restored = MemoryIndexHost::restore(BufModuleIndex::new(), host.snapshot());
        assert_eq!(restored.stats(), host.stats());
        assert_eq!(
            all_project_modules(&restored, &project()).unwrap(),
            all_project_modules(&host, &project()).unwrap()
        );
    }

    #[test]
    fn test_snapshot_from_other_version_is_discarded() {
        let host = host();
        host.update_file(&project(), &lock_file(LOCK_A, &["pet"]));

        let mut snapshot = host.snapshot();
        snapshot.version -= 1;
        let restored = MemoryIndexHost::restore(BufModuleIndex::new(), snapshot);
        assert_eq!(restored.stats().files, 0);
    }

    #[test]
    fn test_stats_display() {
        let stats = IndexStats {
            projects: 1,
            files: 2,
            keys: 5,
        };
        let display = stats.to_string();
        assert!(display.contains("projects: 1"));
        assert!(display.contains("files: 2"));
        assert!(display.contains("keys: 5"));
    }

    #[test]
    fn test_concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let host = Arc::new(host());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let host = Arc::clone(&host);
                thread::spawn(move || {
                    let location = format!("file:///repo/m{i}/buf.lock");
                    host.update_file(&project(), &lock_file(&location, &["pet", "store"]))
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().expect("Thread panicked"), 2);
        }
        assert_eq!(all_project_modules(&host, &project()).unwrap().len(), 16);
    }
}
