//! Filesystem media storage rooted at `MEDIA_ROOT`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use yatube_core::ports::{MediaError, MediaStorage};

/// Stores uploads as plain files below a root directory.
pub struct LocalMediaStorage {
    root: PathBuf,
}

impl LocalMediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Keep only the final path component of a client-supplied name.
    fn clean_name(file_name: &str) -> Result<String, MediaError> {
        let name = Path::new(file_name.trim())
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty() && *n != "." && *n != "..")
            .ok_or_else(|| MediaError::InvalidName(file_name.to_string()))?;
        Ok(name.to_string())
    }

    /// `name` with a short random suffix inserted before the extension.
    fn suffixed(name: &str) -> String {
        let suffix: String = Uuid::new_v4().simple().to_string().chars().take(7).collect();
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, suffix, ext),
            _ => format!("{}_{}", name, suffix),
        }
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn save(
        &self,
        directory: &str,
        file_name: &str,
        content: &[u8],
    ) -> Result<String, MediaError> {
        let mut name = Self::clean_name(file_name)?;
        let dir = self.root.join(directory);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| MediaError::Io(e.to_string()))?;

        while tokio::fs::try_exists(dir.join(&name))
            .await
            .map_err(|e| MediaError::Io(e.to_string()))?
        {
            name = Self::suffixed(&name);
        }

        tokio::fs::write(dir.join(&name), content)
            .await
            .map_err(|e| MediaError::Io(e.to_string()))?;

        let stored = format!("{}/{}", directory, name);
        tracing::debug!(path = %stored, bytes = content.len(), "Stored media file");
        Ok(stored)
    }

    async fn remove(&self, path: &str) -> Result<(), MediaError> {
        if path.split('/').any(|part| part == "..") {
            return Err(MediaError::InvalidName(path.to_string()));
        }

        match tokio::fs::remove_file(self.root.join(path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MediaError::Io(e.to_string())),
        }
    }
}
