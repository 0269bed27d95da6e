use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use crate::models::job::{opaque_id, ConversionJob, JobStatus};

/// Job-based remote conversion API: submit, poll status, fetch result.
#[async_trait]
pub trait RemoteConverter: Send + Sync {
    /// Upload `source` as a new job targeting `target_format`. Returns the job id.
    async fn submit(&self, source: &Path, target_format: &str) -> Result<String, RemoteError>;

    /// Current state of a job.
    async fn status(&self, job_id: &str) -> Result<ConversionJob, RemoteError>;

    /// Stream a result file into `dest`. Returns bytes written.
    async fn download(&self, file_id: &str, dest: &Path) -> Result<u64, RemoteError>;
}

/// Client for the Zamzar file conversion API.
pub struct ZamzarClient {
    http: Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct JobResponse {
    #[serde(deserialize_with = "opaque_id")]
    id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    target_files: Vec<TargetFile>,
}

#[derive(Deserialize)]
struct TargetFile {
    #[serde(deserialize_with = "opaque_id")]
    id: String,
}

impl ZamzarClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl RemoteConverter for ZamzarClient {
    async fn submit(&self, source: &Path, target_format: &str) -> Result<String, RemoteError> {
        let file = tokio::fs::File::open(source).await.map_err(RemoteError::Io)?;
        let length = file.metadata().await.map_err(RemoteError::Io)?.len();
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "source".to_string());

        let form = Form::new()
            .part(
                "source_file",
                Part::stream_with_length(Body::wrap_stream(ReaderStream::new(file)), length)
                    .file_name(file_name),
            )
            .text("target_format", target_format.to_string());

        let response = self
            .http
            .post(self.url("/jobs"))
            .basic_auth(&self.api_key, None::<&str>)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        let job: JobResponse = response.json().await?;
        Ok(job.id)
    }

    async fn status(&self, job_id: &str) -> Result<ConversionJob, RemoteError> {
        let response = self
            .http
            .get(self.url(&format!("/jobs/{job_id}")))
            .basic_auth(&self.api_key, None::<&str>)
            .send()
            .await?
            .error_for_status()?;

        let job: JobResponse = response.json().await?;
        let status = job
            .status
            .as_deref()
            .map(JobStatus::from_remote)
            .unwrap_or(JobStatus::Processing);

        let target_file_id = match status {
            JobStatus::Successful => job.target_files.into_iter().next().map(|f| f.id),
            _ => None,
        };

        Ok(ConversionJob {
            id: job.id,
            status,
            target_file_id,
        })
    }

    async fn download(&self, file_id: &str, dest: &Path) -> Result<u64, RemoteError> {
        let mut response = self
            .http
            .get(self.url(&format!("/files/{file_id}/content")))
            .basic_auth(&self.api_key, None::<&str>)
            .send()
            .await?
            .error_for_status()?;

        let mut file = tokio::fs::File::create(dest).await.map_err(RemoteError::Io)?;
        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await.map_err(RemoteError::Io)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(RemoteError::Io)?;

        Ok(written)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Local file error: {0}")]
    Io(std::io::Error),
}
