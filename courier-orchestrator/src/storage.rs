//! Package Blob Storage
//!
//! Package bodies are kept on the file system, outside the execution store,
//! at `<root>/<file_name with '.' replaced by '_'>/<version>/<file_name>`.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid blob name: {0}")]
    InvalidName(String),

    #[error("Blob storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// File-system blob store for package bodies
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    root: PathBuf,
}

impl FileSystemStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of a package body
    pub fn blob_path(&self, file_name: &str, version: &str) -> Result<PathBuf, StorageError> {
        validate_name(file_name)?;
        validate_name(version)?;

        Ok(self
            .root
            .join(file_name.replace('.', "_"))
            .join(version)
            .join(file_name))
    }

    /// Writes a package body, replacing any previous one
    pub async fn save(&self, file_name: &str, version: &str, body: &[u8]) -> Result<(), StorageError> {
        let path = self.blob_path(file_name, version)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, body).await?;

        tracing::debug!("Stored blob {} ({} bytes)", path.display(), body.len());
        Ok(())
    }

    /// Reads a package body; `None` when nothing was stored
    pub async fn read(&self, file_name: &str, version: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.blob_path(file_name, version)?;

        match tokio::fs::read(&path).await {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn validate_name(value: &str) -> Result<(), StorageError> {
    if value.is_empty() || value.contains("..") || value.contains('/') || value.contains('\\') {
        return Err(StorageError::InvalidName(value.to_string()));
    }

    Ok(())
}
