use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, error, info};

use crate::converter::ScriptArtifact;
use crate::error_handling::types::StorageError;
use crate::storage::storage_trait::ScriptStore;

const SCRIPT_PREFIX: &str = "stream-";
const SCRIPT_EXTENSION: &str = "py";

pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, StorageError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).map_err(|e| {
            error!("Failed to create script dir {}: {}", base_path.display(), e);
            StorageError::WriteFailed
        })?;
        info!("FileStorage initialized at {}", base_path.display());
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn script_path(&self, stream_id: u64) -> PathBuf {
        self.base_path
            .join(format!("{}{}.{}", SCRIPT_PREFIX, stream_id, SCRIPT_EXTENSION))
    }

    fn stream_id_of(path: &Path) -> Option<u64> {
        if path.extension().and_then(|s| s.to_str()) != Some(SCRIPT_EXTENSION) {
            return None;
        }
        path.file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.strip_prefix(SCRIPT_PREFIX))
            .and_then(|s| s.parse().ok())
    }

    #[cfg(unix)]
    fn mark_executable(path: &Path) -> Result<(), StorageError> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|e| {
            error!("Failed to set permissions on {}: {}", path.display(), e);
            StorageError::WriteFailed
        })
    }

    #[cfg(not(unix))]
    fn mark_executable(_path: &Path) -> Result<(), StorageError> {
        Ok(())
    }
}

impl ScriptStore for FileStorage {
    fn save_script(&self, artifact: &ScriptArtifact) -> Result<PathBuf, StorageError> {
        let path = self.script_path(artifact.stream_id);
        let mut f = File::create(&path).map_err(|e| {
            error!("Failed to create script file {}: {}", path.display(), e);
            StorageError::WriteFailed
        })?;
        f.write_all(artifact.script.as_bytes()).map_err(|e| {
            error!("Failed to write script file {}: {}", path.display(), e);
            StorageError::WriteFailed
        })?;
        Self::mark_executable(&path)?;
        info!(
            "Saved script for stream {} ({} request(s)) to {}",
            artifact.stream_id,
            artifact.request_count,
            path.display()
        );
        Ok(path)
    }

    fn get_script(&self, stream_id: u64) -> Result<String, StorageError> {
        let path = self.script_path(stream_id);
        if !path.exists() {
            return Err(StorageError::NotFound(stream_id));
        }
        let mut script = String::new();
        File::open(&path)
            .and_then(|mut f| f.read_to_string(&mut script))
            .map_err(|e| {
                error!("Read failed {}: {}", path.display(), e);
                StorageError::ReadFailed
            })?;
        debug!("Read {} byte(s) from {}", script.len(), path.display());
        Ok(script)
    }

    fn list_scripts(&self) -> Result<Vec<u64>, StorageError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            error!("Failed to read script dir {}: {}", self.base_path.display(), e);
            StorageError::ReadFailed
        })?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                error!("Dir entry error: {}", e);
                StorageError::ReadFailed
            })?;
            if let Some(id) = Self::stream_id_of(&entry.path()) {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        debug!("Found {} stored script(s)", ids.len());
        Ok(ids)
    }
}
