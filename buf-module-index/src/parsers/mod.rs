//! Extractors turning parsed lock files into index keys

use std::hash::Hash;

use indexmap::IndexMap;

use crate::document::FileContent;

/// Trait for extracting index keys from a parsed file.
///
/// Implementations must not fail: content they cannot understand yields an
/// empty map. The value type is `()` because the index only records key
/// presence.
pub trait Extractor: Send + Sync {
    type Key: Eq + Hash;

    /// Extract keys from `file` in first-seen order, without duplicates
    fn extract(&self, file: &FileContent) -> IndexMap<Self::Key, ()>;
}

pub mod buf_lock;
