//! Porcelain commands
//!
//! - `init`: Create an empty repository

pub mod init;
