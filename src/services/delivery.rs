use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;

use crate::error::ConversionError;
use crate::models::upload::ConvertedArtifact;
use crate::services::staging::StagedRequest;

/// Turn a conversion outcome into the HTTP response.
///
/// On success the artifact file is streamed as an attachment and `staged` is
/// moved into the body stream, so every file of the request is released once
/// the body has been sent (or the client goes away). On failure `staged` is
/// released before the error text is returned. Never fails.
pub async fn deliver(
    outcome: Result<ConvertedArtifact, ConversionError>,
    staged: Option<StagedRequest>,
) -> Response {
    let artifact = match outcome {
        Ok(artifact) => artifact,
        Err(err) => {
            drop(staged);
            return err.into_response();
        }
    };

    let file = match tokio::fs::File::open(&artifact.path).await {
        Ok(file) => file,
        Err(e) => {
            tracing::error!(path = %artifact.path.display(), error = %e, "Failed to open artifact");
            drop(staged);
            return ConversionError::Staging(e.to_string()).into_response();
        }
    };
    let length = file.metadata().await.ok().map(|meta| meta.len());

    let path_display = artifact.path.display().to_string();
    let body_stream = tokio_util::io::ReaderStream::new(file).map(move |chunk| {
        // Keeps the request's files alive until the stream itself is dropped.
        let _held = &staged;
        chunk.inspect_err(|e| {
            tracing::error!(path = %path_display, error = %e, "Artifact stream interrupted");
        })
    });

    let mut response = axum::http::Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", artifact.filename),
        );
    if let Some(length) = length {
        response = response.header(header::CONTENT_LENGTH, length);
    }

    match response.body(Body::from_stream(body_stream)) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build artifact response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
