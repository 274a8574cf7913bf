//! Loose object codec
//!
//! Git stores all content as objects identified by SHA-1 hashes. The three kinds
//! handled here are:
//!
//! - **Blob**: File content (raw bytes)
//! - **Tree**: Directory listing (names, modes, and object IDs)
//! - **Commit**: Snapshot with metadata, treated as an opaque payload
//!
//! Every object is framed as `<type> <size>\0<content>`, zlib-compressed, and
//! addressed by the SHA-1 of the uncompressed framed bytes.

pub mod checksum;
pub mod object_id;
pub mod object_type;
pub mod reader;
pub mod writer;

/// Length of a SHA-1 hash in hexadecimal format
pub const OBJECT_ID_LENGTH: usize = 40;

/// Length of a raw SHA-1 digest
pub const DIGEST_SIZE: usize = 20;

/// Shortest abbreviated hash accepted for lookups (the bucket directory name)
pub const MIN_PREFIX_LENGTH: usize = 2;

/// Upper bound on the framing header: `commit ` plus the 20 digits of
/// `u64::MAX` plus the NUL terminator.
pub const HEADER_LIMIT: usize = 28;
