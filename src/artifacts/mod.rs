//! Object formats
//!
//! - `objects`: object types, identifiers and the streaming codec
//! - `tree`: tree entry transcoding between binary and text forms

pub mod objects;
pub mod tree;
