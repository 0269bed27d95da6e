//! CDR to PDF conversion through the remote job API, or a fixed notice PDF
//! when no credential is configured.

use std::ops::ControlFlow;
use std::sync::Arc;

use crate::error::ConversionError;
use crate::models::job::JobStatus;
use crate::models::upload::ConvertedArtifact;
use crate::services::fallback::FallbackDocument;
use crate::services::retry::RetryPolicy;
use crate::services::staging::StagedRequest;
use crate::services::zamzar::RemoteConverter;

pub const NOTICE_FILENAME: &str = "CDR_Notice.pdf";
pub const CONVERTED_FILENAME: &str = "Converted_CDR.pdf";
const TARGET_FORMAT: &str = "pdf";

enum PollOutcome {
    Ready(String),
    Failed,
}

pub struct CdrConverter {
    remote: Option<Arc<dyn RemoteConverter>>,
    policy: RetryPolicy,
    fallback: FallbackDocument,
}

impl CdrConverter {
    /// `remote: None` puts the converter in fallback mode; the network is never touched.
    pub fn new(
        remote: Option<Arc<dyn RemoteConverter>>,
        policy: RetryPolicy,
        fallback: FallbackDocument,
    ) -> Self {
        Self {
            remote,
            policy,
            fallback,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.remote.is_some()
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub async fn convert(
        &self,
        staged: &mut StagedRequest,
    ) -> Result<ConvertedArtifact, ConversionError> {
        match &self.remote {
            Some(remote) => self.convert_remote(remote.as_ref(), staged).await,
            None => self.write_fallback(staged).await,
        }
    }

    async fn write_fallback(
        &self,
        staged: &mut StagedRequest,
    ) -> Result<ConvertedArtifact, ConversionError> {
        let path = staged.artifact_path("_fallback.pdf");
        self.fallback.write_to(&path).await.map_err(|e| {
            tracing::error!(token = %staged.token(), error = %e, "Failed to write fallback notice");
            ConversionError::Staging(e.to_string())
        })?;

        tracing::info!(token = %staged.token(), "Remote conversion not configured, serving notice");

        Ok(ConvertedArtifact {
            path,
            filename: NOTICE_FILENAME,
        })
    }

    async fn convert_remote(
        &self,
        remote: &dyn RemoteConverter,
        staged: &mut StagedRequest,
    ) -> Result<ConvertedArtifact, ConversionError> {
        let token = staged.token().to_string();

        let job_id = remote
            .submit(staged.upload().path(), TARGET_FORMAT)
            .await
            .map_err(|e| {
                tracing::error!(token = %token, error = %e, "Remote job submission failed");
                ConversionError::RemoteSubmission(e.to_string())
            })?;

        tracing::info!(token = %token, job_id = %job_id, "Remote job submitted");

        let outcome = {
            let job_id = job_id.as_str();
            self.policy
                .run(move |attempt| async move {
                    metrics::counter!("remote_poll_attempts_total").increment(1);
                    match remote.status(job_id).await {
                        Ok(job) if job.is_successful() => {
                            ControlFlow::Break(PollOutcome::Ready(job.target_file_id.unwrap_or_default()))
                        }
                        Ok(job) if job.status == JobStatus::Failed => {
                            ControlFlow::Break(PollOutcome::Failed)
                        }
                        Ok(job) => {
                            tracing::debug!(job_id = %job_id, attempt, status = %job.status, "Remote job pending");
                            ControlFlow::Continue(())
                        }
                        Err(e) => {
                            tracing::warn!(job_id = %job_id, attempt, error = %e, "Job status query failed");
                            ControlFlow::Continue(())
                        }
                    }
                })
                .await
        };

        let file_id = match outcome {
            Some(PollOutcome::Ready(file_id)) => file_id,
            Some(PollOutcome::Failed) => {
                tracing::error!(token = %token, job_id = %job_id, "Remote job reported failure");
                return Err(ConversionError::RemoteJobFailed { job_id });
            }
            None => {
                tracing::error!(
                    token = %token,
                    job_id = %job_id,
                    attempts = self.policy.max_attempts,
                    "Remote job timed out"
                );
                return Err(ConversionError::RemotePollTimeout {
                    attempts: self.policy.max_attempts,
                });
            }
        };

        let output = staged.artifact_path("_converted.pdf");
        let size = remote.download(&file_id, &output).await.map_err(|e| {
            tracing::error!(token = %token, file_id = %file_id, error = %e, "Result download failed");
            ConversionError::RemoteDownload(e.to_string())
        })?;

        tracing::info!(token = %token, job_id = %job_id, size_bytes = size, "Remote conversion complete");

        Ok(ConvertedArtifact {
            path: output,
            filename: CONVERTED_FILENAME,
        })
    }
}
