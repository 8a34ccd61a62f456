//! On-disk storage for application document uploads.
//!
//! Uploads are content-addressed: the stored name is the SHA-256 hex digest of
//! the bytes plus the original extension, filed under the attachment's
//! directory. Identical uploads share one file. Only the relative path is
//! kept in the database.

use std::path::{Path, PathBuf};

use admissions_core::application::Attachment;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Upload storage rooted at a directory and served under a URL prefix.
#[derive(Debug, Clone)]
pub struct MediaStore {
  root:     PathBuf,
  base_url: String,
}

impl MediaStore {
  /// `base_url` is the public prefix uploads are served under, e.g.
  /// `/media/`. A trailing slash is added if missing.
  pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
    let mut base_url = base_url.into();
    if !base_url.ends_with('/') {
      base_url.push('/');
    }
    Self { root: root.into(), base_url }
  }

  pub fn root(&self) -> &Path { &self.root }

  /// Public reference for a stored relative path.
  pub fn url(&self, relative: &str) -> String { format!("{}{}", self.base_url, relative) }

  /// Write `bytes` and return the path relative to the media root.
  pub async fn save(
    &self,
    which: Attachment,
    file_name: Option<&str>,
    bytes: &[u8],
  ) -> std::io::Result<StoredFile> {
    let digest = hex::encode(Sha256::digest(bytes));
    let path = match file_name.and_then(extension) {
      Some(ext) => format!("{}/{digest}.{ext}", which.directory()),
      None => format!("{}/{digest}", which.directory()),
    };

    let target = self.root.join(&path);
    if tokio::fs::try_exists(&target).await? {
      return Ok(StoredFile { path, created: false });
    }

    let dir = self.root.join(which.directory());
    tokio::fs::create_dir_all(&dir).await?;

    // Write beside the target, then rename, so readers never see a partial file.
    let staging = dir.join(format!(".{}.part", Uuid::new_v4()));
    tokio::fs::write(&staging, bytes).await?;
    tokio::fs::rename(&staging, &target).await?;

    tracing::debug!(path = %path, size = bytes.len(), "stored upload");
    Ok(StoredFile { path, created: true })
  }

  /// Delete a stored file. A file that is already gone is not an error.
  pub async fn remove(&self, relative: &str) -> std::io::Result<()> {
    match tokio::fs::remove_file(self.root.join(relative)).await {
      Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
      _ => Ok(()),
    }
  }
}

/// Result of [`MediaStore::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
  /// Path relative to the media root.
  pub path:    String,
  /// `false` when identical content was already stored.
  pub created: bool,
}

/// Lower-cased extension of an uploaded file name, if it is a plain one.
fn extension(file_name: &str) -> Option<String> {
  let (_, ext) = file_name.rsplit_once('.')?;
  if ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
    return None;
  }
  Some(ext.to_ascii_lowercase())
}
