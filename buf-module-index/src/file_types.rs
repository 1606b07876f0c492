//! Input filter for the module index
//!
//! Only files named exactly `buf.lock` are handed to the extractor. The check
//! looks at the file name alone and runs for every candidate file the host
//! visits, so it never touches file content.

use std::path::Path;

/// Name of the lock file written by `buf dep update`.
pub const BUF_LOCK: &str = "buf.lock";

/// Returns `true` if a file with this name should be indexed.
pub fn accepts(file_name: &str) -> bool {
    file_name == BUF_LOCK
}

/// Same as [`accepts`], applied to the last component of `path`.
///
/// Paths without a file name or with a non UTF-8 file name are rejected.
pub fn accepts_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(accepts)
}
