use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::response::Response;
use std::time::Instant;

use crate::app_state::AppState;
use crate::error::ConversionError;
use crate::models::upload::ConvertedArtifact;
use crate::services::delivery::deliver;
use crate::services::staging::{Staging, StagedRequest, StagingError};

const UPLOAD_FIELD: &str = "file";

/// POST /api/outline: convert all text in a PDF to vector outlines.
pub async fn outline(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let started = Instant::now();
    let mut staged = match receive_upload(&state.staging, multipart).await {
        Ok(staged) => staged,
        Err(err) => return finish("outline", started, Err(err), None).await,
    };

    let outcome = state.outliner.outline_staged(&mut staged).await;
    finish("outline", started, outcome, Some(staged)).await
}

/// POST /api/cdr-to-pdf: convert a CorelDRAW document to PDF, or return the
/// not-configured notice.
pub async fn cdr_to_pdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let started = Instant::now();
    let mut staged = match receive_upload(&state.staging, multipart).await {
        Ok(staged) => staged,
        Err(err) => return finish("cdr_to_pdf", started, Err(err), None).await,
    };

    let outcome = state.cdr.convert(&mut staged).await;
    finish("cdr_to_pdf", started, outcome, Some(staged)).await
}

/// Stage the `file` field of the form. Other fields are skipped, and so is a
/// `file` field sent as plain text. A request that is not a multipart form at
/// all carries no upload.
async fn receive_upload(
    staging: &Staging,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<StagedRequest, ConversionError> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(reason = %rejection.body_text(), "Request is not a multipart form");
        ConversionError::MissingUpload
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ConversionError::InvalidUpload(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            tracing::debug!("Ignoring `file` field without a filename");
            continue;
        };

        return staging.acquire(Some(filename), field).await.map_err(|e| match e {
            StagingError::Upload(msg) => ConversionError::InvalidUpload(msg),
            StagingError::Io(io) => {
                tracing::error!(error = %io, "Failed to stage upload");
                ConversionError::Staging(io.to_string())
            }
        });
    }

    Err(ConversionError::MissingUpload)
}

async fn finish(
    route: &'static str,
    started: Instant,
    outcome: Result<ConvertedArtifact, ConversionError>,
    staged: Option<StagedRequest>,
) -> Response {
    let token = staged.as_ref().map(|s| s.token().to_string());
    let outcome_label = match &outcome {
        Ok(_) => "success",
        Err(err) => err.kind(),
    };

    metrics::counter!("conversions_total", "route" => route, "outcome" => outcome_label)
        .increment(1);
    metrics::histogram!("conversion_duration_seconds", "route" => route)
        .record(started.elapsed().as_secs_f64());

    match &outcome {
        Ok(artifact) => tracing::info!(
            route,
            token = ?token,
            filename = artifact.filename,
            duration_ms = started.elapsed().as_millis() as u64,
            "Conversion succeeded"
        ),
        Err(err) => tracing::warn!(
            route,
            token = ?token,
            kind = err.kind(),
            error = %err,
            "Conversion failed"
        ),
    }

    deliver(outcome, staged).await
}
