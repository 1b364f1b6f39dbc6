//! Scratch copies of uploaded documents

use chrono::Utc;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// An uploaded document written to its own scratch directory
///
/// The directory is named `<timestamp>_<random>` so concurrent uploads of the
/// same file never collide, while the document keeps its (sanitized) name for
/// the engine. Dropping the guard removes the directory.
#[derive(Debug)]
pub(crate) struct ScratchUpload {
    dir: PathBuf,
    path: PathBuf,
    armed: bool,
}

impl ScratchUpload {
    /// Write `contents` as `file_name` under a fresh directory in `upload_root`
    ///
    /// `file_name` must already be sanitized.
    pub(crate) async fn write(
        upload_root: &Path,
        file_name: &str,
        contents: &[u8],
    ) -> io::Result<Self> {
        let nonce = Uuid::new_v4().simple().to_string();
        let dir = upload_root.join(format!(
            "{}_{}",
            Utc::now().format("%Y%m%d_%H%M%S"),
            &nonce[..12]
        ));
        tokio::fs::create_dir_all(&dir).await?;

        let guard = Self {
            path: dir.join(file_name),
            dir,
            armed: true,
        };
        tokio::fs::write(&guard.path, contents).await?;
        Ok(guard)
    }

    /// Location of the document
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the document and its directory
    pub(crate) async fn remove(mut self) {
        self.armed = false;
        if let Err(e) = tokio::fs::remove_dir_all(&self.dir).await {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %self.dir.display(), "Failed to remove scratch upload: {}", e);
            }
        }
    }
}

impl Drop for ScratchUpload {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = std::fs::remove_dir_all(&self.dir) {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(path = %self.dir.display(), "Failed to remove scratch upload: {}", e);
                }
            }
        }
    }
}
