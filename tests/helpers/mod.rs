//! Test helpers: in-process router, multipart builders, and substitute
//! implementations of the external tool and the remote conversion service.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

use cdr_outline_gateway::app_state::AppState;
use cdr_outline_gateway::models::job::{ConversionJob, JobStatus};
use cdr_outline_gateway::routes;
use cdr_outline_gateway::services::{
    cdr::CdrConverter,
    fallback::FallbackDocument,
    ghostscript::{GhostscriptOutliner, ToolOutput, ToolRunner},
    retry::RetryPolicy,
    staging::Staging,
    zamzar::{RemoteConverter, RemoteError},
};

use crate::fixtures::CONVERTED_PDF;

const BOUNDARY: &str = "gateway-test-boundary";

/// How the substitute Ghostscript behaves.
#[derive(Debug, Clone, Copy)]
pub enum ToolBehavior {
    /// Exit 0 and write the `-o` target.
    Succeed,
    /// Exit with the given nonzero code, writing nothing.
    Exit(i32),
    /// Binary not on the search path.
    Missing,
}

pub struct FakeGhostscript {
    behavior: ToolBehavior,
    pub calls: AtomicU32,
}

impl FakeGhostscript {
    pub fn new(behavior: ToolBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl ToolRunner for FakeGhostscript {
    async fn run(&self, _program: &str, args: &[OsString]) -> std::io::Result<ToolOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            ToolBehavior::Succeed => {
                let output = args
                    .iter()
                    .position(|a| a == "-o")
                    .and_then(|i| args.get(i + 1))
                    .expect("outline invocation carries -o <output>");
                tokio::fs::write(output, b"%PDF-1.7\n% outlined\n%%EOF\n").await?;
                Ok(ToolOutput {
                    success: true,
                    exit_code: Some(0),
                    ..ToolOutput::default()
                })
            }
            ToolBehavior::Exit(code) => Ok(ToolOutput {
                success: false,
                exit_code: Some(code),
                stderr: "Unrecoverable error, exit code 1".to_string(),
                ..ToolOutput::default()
            }),
            ToolBehavior::Missing => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No such file or directory (os error 2)",
            )),
        }
    }
}

/// Where the substitute remote service breaks, if anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteFault {
    None,
    /// The job upload is refused.
    Submit,
    /// The job reports `failed` on its first status check.
    Job,
    /// The result stream breaks after part of the file was written.
    Download,
}

/// Remote service that reports `successful` on poll `succeed_on`
/// (never, if `None`), counting every call.
pub struct FakeRemote {
    succeed_on: Option<u32>,
    fault: RemoteFault,
    pub submits: AtomicU32,
    pub polls: AtomicU32,
    pub downloads: AtomicU32,
}

impl FakeRemote {
    pub fn succeeding_on(poll: u32) -> Self {
        Self {
            succeed_on: Some(poll),
            fault: RemoteFault::None,
            submits: AtomicU32::new(0),
            polls: AtomicU32::new(0),
            downloads: AtomicU32::new(0),
        }
    }

    pub fn never_finishing() -> Self {
        Self {
            succeed_on: None,
            ..Self::succeeding_on(0)
        }
    }

    pub fn rejecting_submit() -> Self {
        Self {
            fault: RemoteFault::Submit,
            ..Self::succeeding_on(1)
        }
    }

    pub fn failing_job() -> Self {
        Self {
            fault: RemoteFault::Job,
            ..Self::never_finishing()
        }
    }

    /// Job succeeds on poll `poll`, then the download breaks midway.
    pub fn failing_download_on(poll: u32) -> Self {
        Self {
            fault: RemoteFault::Download,
            ..Self::succeeding_on(poll)
        }
    }
}

#[async_trait]
impl RemoteConverter for FakeRemote {
    async fn submit(&self, source: &Path, _target_format: &str) -> Result<String, RemoteError> {
        assert!(source.exists(), "upload must be staged before submission");
        self.submits.fetch_add(1, Ordering::SeqCst);
        if self.fault == RemoteFault::Submit {
            return Err(RemoteError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "401 Unauthorized",
            )));
        }
        Ok("job-42".to_string())
    }

    async fn status(&self, job_id: &str) -> Result<ConversionJob, RemoteError> {
        let n = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        let done = self.succeed_on == Some(n);
        let status = if self.fault == RemoteFault::Job {
            JobStatus::Failed
        } else if done {
            JobStatus::Successful
        } else {
            JobStatus::Processing
        };
        Ok(ConversionJob {
            id: job_id.to_string(),
            status,
            target_file_id: done.then(|| "file-7".to_string()),
        })
    }

    async fn download(&self, _file_id: &str, dest: &Path) -> Result<u64, RemoteError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if self.fault == RemoteFault::Download {
            tokio::fs::write(dest, &CONVERTED_PDF[..CONVERTED_PDF.len() / 2])
                .await
                .map_err(RemoteError::Io)?;
            return Err(RemoteError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "result stream ended early",
            )));
        }
        tokio::fs::write(dest, CONVERTED_PDF)
            .await
            .map_err(RemoteError::Io)?;
        Ok(CONVERTED_PDF.len() as u64)
    }
}

/// Router wired to substitute services and a private staging directory.
pub struct TestApp {
    pub router: Router,
    pub staging_dir: TempDir,
    pub tool: Arc<FakeGhostscript>,
    pub remote: Option<Arc<FakeRemote>>,
    pub policy: RetryPolicy,
}

impl TestApp {
    pub fn new(tool: ToolBehavior, remote: Option<FakeRemote>, policy: RetryPolicy) -> Self {
        let staging_dir = tempfile::tempdir().expect("create temp staging dir");
        let staging = Staging::new(staging_dir.path()).expect("init staging");

        let tool = Arc::new(FakeGhostscript::new(tool));
        let outliner = GhostscriptOutliner::new(None, tool.clone() as Arc<dyn ToolRunner>);

        let remote = remote.map(Arc::new);
        let cdr = CdrConverter::new(
            remote.clone().map(|r| r as Arc<dyn RemoteConverter>),
            policy,
            FallbackDocument::render().expect("render fallback"),
        );

        let state = AppState::new(staging, outliner, cdr);
        Self {
            router: routes::api_router(state, 10 * 1024 * 1024),
            staging_dir,
            tool,
            remote,
            policy,
        }
    }

    /// No remote credential, Ghostscript present.
    pub fn unconfigured() -> Self {
        Self::new(ToolBehavior::Succeed, None, fast_policy(20))
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub fn staging_path(&self) -> PathBuf {
        self.staging_dir.path().to_path_buf()
    }

    /// Number of files currently in the staging directory.
    pub fn staged_files(&self) -> usize {
        std::fs::read_dir(self.staging_dir.path())
            .expect("read staging dir")
            .count()
    }

    pub fn remote(&self) -> &FakeRemote {
        self.remote.as_deref().expect("remote configured")
    }
}

pub fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::from_millis(10))
}

/// POST `uri` with a single multipart file field.
pub fn upload_request(uri: &str, field: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    multipart_request(uri, body)
}

/// POST `uri` with a multipart form holding only a text field.
pub fn form_without_file(uri: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nno attachment\r\n--{BOUNDARY}--\r\n"
    );
    multipart_request(uri, body.into_bytes())
}

/// POST `uri` with a `file` field sent as plain text, without a filename.
pub fn text_file_field(uri: &str, value: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"\r\n\r\n{value}\r\n--{BOUNDARY}--\r\n"
    );
    multipart_request(uri, body.into_bytes())
}

/// POST `uri` with an empty body and no multipart content type.
pub fn bare_post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("valid request")
}

/// Read the whole body. Consuming it drops the stream, which releases staged files.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes()
        .to_vec()
}

pub fn attachment_name(response: &Response<Body>) -> Option<String> {
    let value = response
        .headers()
        .get(header::CONTENT_DISPOSITION)?
        .to_str()
        .ok()?;
    let start = value.find("filename=\"")? + "filename=\"".len();
    let end = value[start..].find('"')? + start;
    Some(value[start..end].to_string())
}
