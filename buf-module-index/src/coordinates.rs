//! Coordinates of a Buf module pinned in a `buf.lock` file

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Identifies one dependency pinned by a lock file.
///
/// Equality and hashing cover every field, so the same module pinned by two
/// different lock files yields two distinct coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ModuleCoordinates {
    /// Location of the lock file the entry was read from (usually a `file://` URL)
    pub lock_file_location: String,
    /// Registry host, e.g. `buf.build`
    pub remote: String,
    /// Namespace owning the module
    pub owner: String,
    /// Module name within the owner
    pub repository: String,
    /// Pinned commit
    pub commit: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatesError {
    #[error("module coordinate field `{field}` must not be empty")]
    EmptyField { field: &'static str },
}

impl ModuleCoordinates {
    /// Build coordinates, rejecting empty fields.
    pub fn new(
        lock_file_location: impl Into<String>,
        remote: impl Into<String>,
        owner: impl Into<String>,
        repository: impl Into<String>,
        commit: impl Into<String>,
    ) -> Result<Self, CoordinatesError> {
        let coordinates = Self {
            lock_file_location: lock_file_location.into(),
            remote: remote.into(),
            owner: owner.into(),
            repository: repository.into(),
            commit: commit.into(),
        };
        coordinates.validate()?;
        Ok(coordinates)
    }

    /// Check that no field is empty.
    pub fn validate(&self) -> Result<(), CoordinatesError> {
        let fields = [
            ("lock_file_location", &self.lock_file_location),
            ("remote", &self.remote),
            ("owner", &self.owner),
            ("repository", &self.repository),
            ("commit", &self.commit),
        ];
        match fields.iter().find(|(_, value)| value.is_empty()) {
            Some((field, _)) => Err(CoordinatesError::EmptyField { field: *field }),
            None => Ok(()),
        }
    }

    /// Full module name as Buf spells it: `remote/owner/repository`.
    pub fn module_name(&self) -> String {
        format!("{}/{}/{}", self.remote, self.owner, self.repository)
    }
}

impl fmt::Display for ModuleCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}:{}",
            self.remote, self.owner, self.repository, self.commit
        )
    }
}
