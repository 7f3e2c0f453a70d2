//! Storage subsystem
//!
//! Persistence for generated replay scripts.
//!
//! Components:
//! - `storage_trait`: the `ScriptStore` trait defining a uniform API.
//! - `file_storage`: filesystem-backed implementation, one script file per stream.

pub mod file_storage;
pub mod storage_trait;

pub use file_storage::FileStorage;
pub use storage_trait::ScriptStore;
