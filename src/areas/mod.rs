//! Object storage and repository layout
//!
//! - `store`: the `ObjectStore` contract and prefix resolution
//! - `database`: loose objects on disk
//! - `memory`: objects held in memory
//! - `pack`: packfile placeholder
//! - `repository`: repository discovery, layout and command context

pub mod database;
pub mod memory;
pub mod pack;
pub mod repository;
pub mod store;
