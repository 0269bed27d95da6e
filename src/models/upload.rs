use std::path::{Path, PathBuf};

/// A caller-supplied file persisted in the staging directory.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// `<staging>/<token>`
    pub path: PathBuf,
    /// Per-upload unique token; every artifact path for the request derives from it.
    pub token: String,
    /// Client-supplied name. Advisory only, never used to build paths.
    pub original_filename: Option<String>,
    pub size: u64,
}

impl UploadedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Artifact path derived from the upload path, e.g. `<upload>_outlined.pdf`.
    pub fn derived_path(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    }
}

/// A finished artifact ready to be sent back to the caller.
#[derive(Debug, Clone)]
pub struct ConvertedArtifact {
    pub path: PathBuf,
    /// Name suggested to the caller in `Content-Disposition`.
    pub filename: &'static str,
}
