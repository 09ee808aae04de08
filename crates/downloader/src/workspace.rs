//! Per-request scratch directories
//!
//! Every download runs inside its own directory so concurrent requests never
//! collide on filenames. The directory is removed when the guard is dropped.

use std::path::{Path, PathBuf};

/// Scratch directory owned by a single request
#[derive(Debug)]
pub struct TempWorkspace {
    path: PathBuf,
}

impl TempWorkspace {
    /// Create `root/key`, wiping any leftovers from an interrupted run
    pub async fn create(root: &Path, key: &str) -> std::io::Result<Self> {
        let path = root.join(key);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::remove_dir_all(&path).await?;
        }
        tokio::fs::create_dir_all(&path).await?;
        tracing::debug!("Created workspace {}", path.display());
        Ok(Self { path })
    }

    /// Directory path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a file inside the workspace
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for TempWorkspace {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => tracing::debug!("Removed workspace {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove workspace {}: {}", self.path.display(), e),
        }
    }
}
