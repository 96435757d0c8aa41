//! Storage for uploaded post images.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::forms::UploadedFile;

/// Subdirectory of the media root holding post images.
const POSTS_DIR: &str = "posts";

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the upload and returns its name relative to the media root,
    /// e.g. `posts/small_1a2b3c4.gif`.
    pub async fn save(&self, upload: &UploadedFile) -> Result<String> {
        let name = storage_name(&upload.file_name);
        let path = self.root.join(&name);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&path, &upload.data).await?;
        tracing::debug!(%name, bytes = upload.data.len(), content_type = ?upload.content_type, "stored upload");
        Ok(name)
    }

    /// Best-effort removal of a stored upload whose post was never saved.
    pub async fn remove(&self, name: &str) {
        if let Err(err) = tokio::fs::remove_file(self.root.join(name)).await {
            tracing::warn!(%name, error = %err, "could not remove orphaned upload");
        }
    }
}

/// Generated name for an upload: the sanitised original stem, a random
/// suffix and the original extension.
pub fn storage_name(original: &str) -> String {
    let file_name = Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    };

    let mut stem: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    if stem.is_empty() {
        stem.push_str("upload");
    }

    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let suffix = &suffix[..7];
    match ext.map(|e| e.to_ascii_lowercase()).filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric())) {
        Some(ext) if !ext.is_empty() => format!("{POSTS_DIR}/{stem}_{suffix}.{ext}"),
        _ => format!("{POSTS_DIR}/{stem}_{suffix}"),
    }
}
