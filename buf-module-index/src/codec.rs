//! Key codec for [`ModuleCoordinates`]
//!
//! A record is stored as a list of exactly five strings in the order
//! `lock_file_location, remote, owner, repository, commit`. On the wire the
//! list is a big-endian `u32` element count followed by each element as a
//! big-endian `u32` byte length and its UTF-8 bytes.
//!
//! Changing this layout requires bumping [`crate::index::INDEX_VERSION`].

use std::hash::{DefaultHasher, Hash, Hasher};
use std::io::{self, Read, Write};

use thiserror::Error;

use crate::coordinates::{CoordinatesError, ModuleCoordinates};

/// Number of string fields in an encoded record
pub const FIELD_COUNT: usize = 5;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("field is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("field of {0} bytes exceeds the u32 length prefix")]
    FieldTooLong(usize),
    #[error(transparent)]
    Coordinates(#[from] CoordinatesError),
}

/// Serialization of index keys, as required by the host index.
pub trait KeyCodec<K>: Send + Sync {
    fn save(&self, out: &mut dyn Write, value: &K) -> Result<(), CodecError>;

    fn read(&self, input: &mut dyn Read) -> Result<K, CodecError>;

    /// Hash used by the host to bucket keys
    fn hash(&self, value: &K) -> u64
    where
        K: Hash,
    {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    fn is_equal(&self, a: &K, b: &K) -> bool
    where
        K: Eq,
    {
        a == b
    }

    /// Encode `value` into a fresh buffer
    fn encode(&self, value: &K) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::new();
        self.save(&mut buf, value)?;
        Ok(buf)
    }

    /// Decode a buffer produced by [`KeyCodec::encode`]
    fn decode(&self, mut bytes: &[u8]) -> Result<K, CodecError> {
        self.read(&mut bytes)
    }
}

/// Codec for [`ModuleCoordinates`] keys
#[derive(Debug, Default, Clone, Copy)]
pub struct ModuleCoordinatesCodec;

impl KeyCodec<ModuleCoordinates> for ModuleCoordinatesCodec {
    fn save(&self, out: &mut dyn Write, value: &ModuleCoordinates) -> Result<(), CodecError> {
        write_string_list(out, &to_fields(value))
    }

    fn read(&self, input: &mut dyn Read) -> Result<ModuleCoordinates, CodecError> {
        let fields = read_string_list(input)?;
        from_fields(&fields)
    }
}

/// Flatten a record into its five fields.
pub fn to_fields(value: &ModuleCoordinates) -> [String; FIELD_COUNT] {
    [
        value.lock_file_location.clone(),
        value.remote.clone(),
        value.owner.clone(),
        value.repository.clone(),
        value.commit.clone(),
    ]
}

/// Rebuild a record from the fields produced by [`to_fields`].
pub fn from_fields(fields: &[String]) -> Result<ModuleCoordinates, CodecError> {
    let [lock_file_location, remote, owner, repository, commit] = fields else {
        return Err(CodecError::FieldCount {
            expected: FIELD_COUNT,
            found: fields.len(),
        });
    };
    Ok(ModuleCoordinates::new(
        lock_file_location.as_str(),
        remote.as_str(),
        owner.as_str(),
        repository.as_str(),
        commit.as_str(),
    )?)
}

fn write_string_list(out: &mut dyn Write, items: &[String]) -> Result<(), CodecError> {
    write_len(out, items.len())?;
    for item in items {
        write_len(out, item.len())?;
        out.write_all(item.as_bytes())?;
    }
    Ok(())
}

fn read_string_list(input: &mut dyn Read) -> Result<Vec<String>, CodecError> {
    let count = read_len(input)?;
    if count != FIELD_COUNT {
        return Err(CodecError::FieldCount {
            expected: FIELD_COUNT,
            found: count,
        });
    }
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        let len = read_len(input)?;
        let mut bytes = Vec::new();
        Read::take(&mut *input, len as u64).read_to_end(&mut bytes)?;
        if bytes.len() != len {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        items.push(String::from_utf8(bytes)?);
    }
    Ok(items)
}

fn write_len(out: &mut dyn Write, len: usize) -> Result<(), CodecError> {
    let len = u32::try_from(len).map_err(|_| CodecError::FieldTooLong(len))?;
    out.write_all(&len.to_be_bytes())?;
    Ok(())
}

fn read_len(input: &mut dyn Read) -> Result<usize, CodecError> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf) as usize)
}
