//! Staging directory management.
//!
//! Uploads land in the staging directory under a fresh UUID token and every
//! artifact produced for that request is named after the same token, so
//! concurrent requests never touch each other's files. A [`StagedRequest`]
//! owns all of those paths and deletes them when it is dropped, which makes
//! release happen exactly once on every exit path.

use futures::{Stream, StreamExt};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::models::upload::UploadedFile;

/// Process-wide staging area, created once at startup.
#[derive(Debug, Clone)]
pub struct Staging {
    dir: PathBuf,
}

impl Staging {
    /// Use `dir` as the staging area, creating it if absent.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StagingError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(StagingError::Io)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist an upload body into the staging area.
    ///
    /// A body that fails part-way is removed before the error is returned.
    pub async fn acquire<S, B, E>(
        &self,
        original_filename: Option<String>,
        body: S,
    ) -> Result<StagedRequest, StagingError>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: std::fmt::Display,
    {
        let token = Uuid::new_v4().to_string();
        let path = self.dir.join(&token);

        // The guard exists before the first byte is written.
        let mut staged = StagedRequest::new(UploadedFile {
            path: path.clone(),
            token,
            original_filename,
            size: 0,
        });

        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(StagingError::Io)?;

        let mut body = std::pin::pin!(body);
        let mut size: u64 = 0;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| StagingError::Upload(e.to_string()))?;
            let bytes = chunk.as_ref();
            file.write_all(bytes).await.map_err(StagingError::Io)?;
            size += bytes.len() as u64;
        }
        file.flush().await.map_err(StagingError::Io)?;

        staged.upload.size = size;

        tracing::debug!(
            token = %staged.upload.token,
            size_bytes = size,
            filename = ?staged.upload.original_filename,
            "Upload staged"
        );

        Ok(staged)
    }

    /// Whether the staging directory currently exists and accepts writes.
    pub async fn is_writable(&self) -> bool {
        match tokio::fs::metadata(&self.dir).await {
            Ok(meta) => meta.is_dir() && !meta.permissions().readonly(),
            Err(_) => false,
        }
    }
}

/// Every staged path belonging to one request. Dropping it releases them all.
#[derive(Debug)]
pub struct StagedRequest {
    upload: UploadedFile,
    artifacts: Vec<PathBuf>,
}

impl StagedRequest {
    fn new(upload: UploadedFile) -> Self {
        Self {
            upload,
            artifacts: Vec::new(),
        }
    }

    pub fn upload(&self) -> &UploadedFile {
        &self.upload
    }

    pub fn token(&self) -> &str {
        &self.upload.token
    }

    /// Reserve an artifact path derived from the upload path. The path is
    /// tracked for release whether or not anything is ever written to it.
    pub fn artifact_path(&mut self, suffix: &str) -> PathBuf {
        let path = self.upload.derived_path(suffix);
        self.artifacts.push(path.clone());
        path
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.upload.path()).chain(self.artifacts.iter().map(PathBuf::as_path))
    }
}

impl Drop for StagedRequest {
    fn drop(&mut self) {
        release(self.paths());
        tracing::debug!(token = %self.upload.token, "Staged files released");
    }
}

/// Delete each path if present. Already-absent files count as released;
/// any other failure is logged and otherwise ignored.
pub fn release<'a>(paths: impl IntoIterator<Item = &'a Path>) {
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                metrics::counter!("staging_cleanup_failures_total").increment(1);
                tracing::warn!(path = %path.display(), error = %e, "Failed to delete staged file");
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("Staging I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upload body could not be read: {0}")]
    Upload(String),
}
