//! Host-side capabilities consumed by index extensions
//!
//! The indexing engine belongs to the host. Extensions and the lookup helper
//! only see it through these traits, which keeps them testable without a
//! running editor:
//!
//! - **IndexQuery**: read every key an index holds for a project
//! - **IndexUpdate**: feed file content to an index and drop stale files
//!
//! [`MemoryIndexHost`] is an in-process implementation of both.

use std::path::PathBuf;
use std::sync::Arc;

use crate::document::FileContent;

pub mod memory;

pub use memory::MemoryIndexHost;

/// Opaque handle naming the project an index query is scoped to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectScope {
    pub name: String,
    pub root: PathBuf,
}

impl ProjectScope {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }
}

/// Read access to a host index
pub trait IndexQuery<K>: Send + Sync {
    /// Every key stored by the index `index_id` for files of `project`
    fn all_keys(&self, index_id: &str, project: &ProjectScope) -> anyhow::Result<Vec<K>>;
}

/// Write access to a host index
pub trait IndexUpdate: Send + Sync {
    /// Re-index one file, replacing whatever it contributed before.
    ///
    /// Returns the number of keys now stored for the file.
    fn update_file(&self, project: &ProjectScope, file: &FileContent) -> usize;

    /// Forget a file. Returns `true` if it had entries.
    fn remove_file(&self, project: &ProjectScope, location: &str) -> bool;
}

impl<K, T: IndexQuery<K>> IndexQuery<K> for Arc<T> {
    fn all_keys(&self, index_id: &str, project: &ProjectScope) -> anyhow::Result<Vec<K>> {
        (**self).all_keys(index_id, project)
    }
}

impl<T: IndexUpdate> IndexUpdate for Arc<T> {
    fn update_file(&self, project: &ProjectScope, file: &FileContent) -> usize {
        (**self).update_file(project, file)
    }

    fn remove_file(&self, project: &ProjectScope, location: &str) -> bool {
        (**self).remove_file(project, location)
    }
}
