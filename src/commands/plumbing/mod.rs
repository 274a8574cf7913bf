//! Plumbing commands (low-level object access)
//!
//! - `cat-file`: Print the type, size or content of a stored object
//! - `hash-object`: Compute an object ID and optionally store the object

pub mod cat_file;
pub mod hash_object;
