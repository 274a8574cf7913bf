//! Typed failures of the object codec and stores
//!
//! Every codec and store operation returns [`ObjectError`]. Failures that have
//! to cross a `std::io::Read` / `std::io::Write` boundary are wrapped into an
//! [`io::Error`] and unwrapped again by `From<io::Error> for ObjectError`, so
//! callers always get the typed variant back.

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
    /// No stored object matches the (possibly abbreviated) hash.
    #[error("object {0} does not exist")]
    NotFound(String),

    /// An abbreviated hash matches more than one stored object.
    #[error("ambiguous hash {prefix}: candidates {}", .candidates.join(", "))]
    Ambiguous {
        prefix: String,
        candidates: Vec<String>,
    },

    /// The hash is not a usable lookup key (too short, too long or not hex).
    #[error("invalid object hash {0:?}")]
    InvalidHash(String),

    /// The header type token is not one of blob, tree or commit.
    #[error("unknown object type {0:?}")]
    UnknownType(String),

    /// The framing header or a fixed-width field could not be parsed.
    #[error("malformed header: {0}")]
    MalformedHeader(String),

    /// A tree entry violates the binary or pretty tree layout.
    #[error("malformed tree: {0}")]
    MalformedTree(String),

    /// Protocol misuse: missing or duplicate header, write or close after close.
    #[error("header order violation: {0}")]
    HeaderOrderViolation(&'static str),

    /// The declared payload size disagrees with the bytes actually written.
    #[error("declared size {declared} but payload is {actual} bytes")]
    SizeMismatch { declared: u64, actual: u64 },

    /// The stream ended in the middle of a tree entry.
    #[error("truncated tree entry: {0}")]
    Truncated(String),

    /// The storage backend does not implement the operation.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    #[error("not a git repository (or any of the parent directories): {}", .0.display())]
    NotARepository(PathBuf),

    #[error("directory not empty: {}", .0.display())]
    DirectoryNotEmpty(PathBuf),

    #[error(transparent)]
    Io(io::Error),
}

pub type ObjectResult<T> = Result<T, ObjectError>;

impl From<io::Error> for ObjectError {
    fn from(err: io::Error) -> Self {
        if !err
            .get_ref()
            .is_some_and(|inner| inner.is::<ObjectError>())
        {
            return ObjectError::Io(err);
        }

        let kind = err.kind();
        match err.into_inner().map(|inner| inner.downcast::<ObjectError>()) {
            Some(Ok(typed)) => *typed,
            Some(Err(other)) => ObjectError::Io(io::Error::new(kind, other)),
            None => ObjectError::Io(io::Error::from(kind)),
        }
    }
}

impl From<ObjectError> for io::Error {
    fn from(err: ObjectError) -> Self {
        match err {
            ObjectError::Io(err) => err,
            ObjectError::Truncated(_) => io::Error::new(io::ErrorKind::UnexpectedEof, err),
            ObjectError::NotFound(_) => io::Error::new(io::ErrorKind::NotFound, err),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
