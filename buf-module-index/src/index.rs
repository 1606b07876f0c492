//! The Buf module index extension and its lookup helper
//!
//! [`BufModuleIndex`] is what the host registers: a stable name, a format
//! version, the `buf.lock` input filter, the extractor and the key codec.
//! [`all_project_modules`] asks the host for every module the index knows
//! about in a project.

use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};

use crate::codec::{KeyCodec, ModuleCoordinatesCodec};
use crate::coordinates::ModuleCoordinates;
use crate::document::FileContent;
use crate::file_types;
use crate::host::{IndexQuery, ProjectScope};
use crate::parsers::Extractor;
use crate::parsers::buf_lock::BufLockExtractor;

/// Name the index is registered under. Persisted data is keyed by it.
pub const INDEX_ID: &str = "BufModuleIndex";

/// Format version of the index.
///
/// Bump whenever extraction semantics or the codec layout change so the host
/// discards entries written by an older build.
pub const INDEX_VERSION: u32 = 2;

/// A content-dependent file index the host can register
pub trait FileIndexExtension: Send + Sync {
    type Key: Clone + Eq + Hash + Send + Sync;

    fn name(&self) -> &str;

    fn version(&self) -> u32;

    /// Whether entries are computed from file content rather than metadata
    fn depends_on_file_content(&self) -> bool {
        true
    }

    /// Input filter, called for every candidate file
    fn accepts(&self, file_name: &str) -> bool;

    fn index(&self, file: &FileContent) -> IndexMap<Self::Key, ()>;

    fn codec(&self) -> &dyn KeyCodec<Self::Key>;
}

/// Index of module coordinates pinned by `buf.lock` files
#[derive(Debug, Default, Clone, Copy)]
pub struct BufModuleIndex {
    extractor: BufLockExtractor,
    codec: ModuleCoordinatesCodec,
}

impl BufModuleIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileIndexExtension for BufModuleIndex {
    type Key = ModuleCoordinates;

    fn name(&self) -> &str {
        INDEX_ID
    }

    fn version(&self) -> u32 {
        INDEX_VERSION
    }

    fn accepts(&self, file_name: &str) -> bool {
        file_types::accepts(file_name)
    }

    fn index(&self, file: &FileContent) -> IndexMap<ModuleCoordinates, ()> {
        self.extractor.extract(file)
    }

    fn codec(&self) -> &dyn KeyCodec<ModuleCoordinates> {
        &self.codec
    }
}

/// All distinct modules the host index holds for `project`, in the order the
/// host reports them.
pub fn all_project_modules(
    host: &dyn IndexQuery<ModuleCoordinates>,
    project: &ProjectScope,
) -> anyhow::Result<Vec<ModuleCoordinates>> {
    let keys: IndexSet<ModuleCoordinates> =
        host.all_keys(INDEX_ID, project)?.into_iter().collect();
    Ok(keys.into_iter().collect())
}
