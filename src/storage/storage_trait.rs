//! Script Store Trait
//!
//! This module defines the `ScriptStore` trait, the interface for backends
//! that keep generated replay scripts around after a harness run.
//!
//! All methods return a `Result` to handle potential storage errors.

use std::path::PathBuf;

use crate::converter::ScriptArtifact;
use crate::error_handling::types::StorageError;

pub trait ScriptStore: Send + Sync {
    /// Saves the script of one stream, replacing any earlier one, and
    /// returns where it was written.
    fn save_script(&self, artifact: &ScriptArtifact) -> Result<PathBuf, StorageError>;

    /// Retrieves the script stored for a stream.
    fn get_script(&self, stream_id: u64) -> Result<String, StorageError>;

    /// Lists the ids of all stored streams in ascending order.
    fn list_scripts(&self) -> Result<Vec<u64>, StorageError>;
}
