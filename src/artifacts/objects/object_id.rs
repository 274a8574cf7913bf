//! Git object identifier (SHA-1 hash)
//!
//! Object IDs are 40-character lowercase hexadecimal strings representing SHA-1
//! hashes of the framed object bytes.
//!
//! ## Storage
//!
//! Objects are stored in `objects/<first-2-chars>/<remaining-38-chars>`

use crate::artifacts::objects::{DIGEST_SIZE, MIN_PREFIX_LENGTH, OBJECT_ID_LENGTH};
use crate::errors::ObjectError;
use std::path::PathBuf;

/// Git object identifier (SHA-1 hash)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate a full 40-character object ID.
    pub fn try_parse(id: impl Into<String>) -> Result<Self, ObjectError> {
        let id = id.into();
        if id.len() != OBJECT_ID_LENGTH || !id.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ObjectError::InvalidHash(id));
        }
        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Build an object ID from a raw 20-byte digest.
    pub fn from_raw(digest: &[u8; DIGEST_SIZE]) -> Self {
        Self(hex::encode(digest))
    }

    /// The raw 20-byte digest.
    pub fn to_raw(&self) -> [u8; DIGEST_SIZE] {
        let mut raw = [0u8; DIGEST_SIZE];
        // the string was validated as 40 hex characters on construction
        if hex::decode_to_slice(&self.0, &mut raw).is_err() {
            unreachable!("object id {} is not hex", self.0);
        }
        raw
    }

    /// Split into the bucket directory name and the file name within it.
    pub fn split(&self) -> (&str, &str) {
        self.0.split_at(2)
    }

    /// Convert to file system path for object storage, `ab/c123...`.
    pub fn to_path(&self) -> PathBuf {
        let (dir, file) = self.split();
        PathBuf::from(dir).join(file)
    }

    /// Validate an abbreviated (or full) hash used for lookups and return it
    /// lowercased.
    pub fn check_prefix(prefix: &str) -> Result<String, ObjectError> {
        let valid = (MIN_PREFIX_LENGTH..=OBJECT_ID_LENGTH).contains(&prefix.len())
            && prefix.bytes().all(|b| b.is_ascii_hexdigit());
        if !valid {
            return Err(ObjectError::InvalidHash(prefix.to_string()));
        }
        Ok(prefix.to_ascii_lowercase())
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
