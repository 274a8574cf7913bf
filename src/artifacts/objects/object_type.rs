//! Git object kinds and the framing header
//!
//! Every loose object starts with `<type> <size>\0`, where `<type>` is one of
//! the tokens below and `<size>` the decimal payload length.

use crate::errors::ObjectError;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
}

impl ObjectType {
    /// Token used in object headers and tree lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
            ObjectType::Commit => "commit",
        }
    }

    /// Parse a raw header token
    ///
    /// # Arguments
    ///
    /// * `token` - Bytes before the space of an object header
    ///
    /// # Returns
    ///
    /// The object type, or `UnknownType` for anything but `blob`, `tree` and
    /// `commit`
    pub fn parse(token: &[u8]) -> Result<Self, ObjectError> {
        match token {
            b"blob" => Ok(ObjectType::Blob),
            b"tree" => Ok(ObjectType::Tree),
            b"commit" => Ok(ObjectType::Commit),
            _ => Err(ObjectError::UnknownType(
                String::from_utf8_lossy(token).into_owned(),
            )),
        }
    }

    /// The NUL terminated framing header for a payload of `size` bytes.
    pub fn header(&self, size: u64) -> Vec<u8> {
        format!("{} {}\0", self.as_str(), size).into_bytes()
    }
}

impl FromStr for ObjectType {
    type Err = ObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.as_bytes())
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
