//! Media storage port - where uploaded post images end up.

use async_trait::async_trait;

/// Stores uploaded files and hands back their path relative to the media root.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Store `content` as `file_name` inside `directory`.
    ///
    /// Returns the stored relative path (`posts/cat.jpg`). A different name is
    /// picked when the requested one is already taken.
    async fn save(
        &self,
        directory: &str,
        file_name: &str,
        content: &[u8],
    ) -> Result<String, MediaError>;

    /// Remove a previously stored file. Missing files are ignored.
    async fn remove(&self, path: &str) -> Result<(), MediaError>;
}

/// Media storage errors.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    Io(String),
}
