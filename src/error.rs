use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Text returned when an upload request carries no `file` field.
pub const MISSING_UPLOAD_MESSAGE: &str = "No file uploaded.";
pub const OUTLINE_FAILURE_MESSAGE: &str =
    "Error converting text to outline. Is Ghostscript installed?";
pub const CDR_FAILURE_MESSAGE: &str = "CDR Conversion failed.";
const INVALID_UPLOAD_MESSAGE: &str = "Malformed upload.";
const INTERNAL_MESSAGE: &str = "Internal server error.";

/// Request-level failure taxonomy. Everything is resolved at the request
/// boundary; internal causes are logged where they occur and only the fixed
/// caller-facing text leaves the process.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("no file uploaded")]
    MissingUpload,

    #[error("malformed multipart body: {0}")]
    InvalidUpload(String),

    #[error("staging failure: {0}")]
    Staging(String),

    #[error("tool invocation failed: {0}")]
    ToolInvocation(String),

    #[error("remote job submission failed: {0}")]
    RemoteSubmission(String),

    #[error("remote job did not complete within {attempts} status checks")]
    RemotePollTimeout { attempts: u32 },

    #[error("remote job {job_id} reported failure")]
    RemoteJobFailed { job_id: String },

    #[error("remote result download failed: {0}")]
    RemoteDownload(String),
}

impl ConversionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ConversionError::MissingUpload | ConversionError::InvalidUpload(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ConversionError::MissingUpload => "missing_upload",
            ConversionError::InvalidUpload(_) => "invalid_upload",
            ConversionError::Staging(_) => "staging_failure",
            ConversionError::ToolInvocation(_) => "tool_invocation_failure",
            ConversionError::RemoteSubmission(_) => "remote_submission_failure",
            ConversionError::RemotePollTimeout { .. } => "remote_poll_timeout",
            ConversionError::RemoteJobFailed { .. } => "remote_job_failed",
            ConversionError::RemoteDownload(_) => "remote_download_failure",
        }
    }

    /// Fixed text shown to the caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            ConversionError::MissingUpload => MISSING_UPLOAD_MESSAGE,
            ConversionError::InvalidUpload(_) => INVALID_UPLOAD_MESSAGE,
            ConversionError::Staging(_) => INTERNAL_MESSAGE,
            ConversionError::ToolInvocation(_) => OUTLINE_FAILURE_MESSAGE,
            ConversionError::RemoteSubmission(_)
            | ConversionError::RemotePollTimeout { .. }
            | ConversionError::RemoteJobFailed { .. }
            | ConversionError::RemoteDownload(_) => CDR_FAILURE_MESSAGE,
        }
    }
}

impl IntoResponse for ConversionError {
    fn into_response(self) -> Response {
        (self.status_code(), self.public_message()).into_response()
    }
}
