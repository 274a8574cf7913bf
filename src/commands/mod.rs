//! Command implementations
//!
//! Commands are `Repository` methods writing their output to the repository's
//! writer:
//!
//! - `plumbing`: direct object access (cat-file, hash-object)
//! - `porcelain`: repository setup (init)

pub mod plumbing;
pub mod porcelain;
