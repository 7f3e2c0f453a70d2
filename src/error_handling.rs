pub mod types;

pub use types::{ConfigError, HarnessError, StorageError};
