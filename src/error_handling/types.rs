use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::InvalidValue(e) => write!(f, "Invalid configuration value: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

#[derive(Debug)]
pub enum StorageError {
    WriteFailed,
    ReadFailed,
    NotFound(u64),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::WriteFailed => write!(f, "Storage write failed"),
            StorageError::ReadFailed => write!(f, "Storage read failed"),
            StorageError::NotFound(id) => write!(f, "No script stored for stream {}", id),
        }
    }
}

impl std::error::Error for StorageError {}

/// Failures of the line-oriented converter protocol. Line numbers are 1-based.
#[derive(Debug)]
pub enum HarnessError {
    IoError(std::io::Error),
    JsonError { line: usize, source: serde_json::Error },
    Base64Error { line: usize, source: base64::DecodeError },
    StorageError(StorageError),
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::IoError(e) => write!(f, "Harness IO error: {}", e),
            HarnessError::JsonError { line, source } => {
                write!(f, "Malformed JSON on line {}: {}", line, source)
            }
            HarnessError::Base64Error { line, source } => {
                write!(f, "Malformed chunk content on line {}: {}", line, source)
            }
            HarnessError::StorageError(e) => write!(f, "Script storage error: {}", e),
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HarnessError::IoError(e) => Some(e),
            HarnessError::JsonError { source, .. } => Some(source),
            HarnessError::Base64Error { source, .. } => Some(source),
            HarnessError::StorageError(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for HarnessError {
    fn from(err: std::io::Error) -> Self {
        HarnessError::IoError(err)
    }
}

impl From<StorageError> for HarnessError {
    fn from(err: StorageError) -> Self {
        HarnessError::StorageError(err)
    }
}
