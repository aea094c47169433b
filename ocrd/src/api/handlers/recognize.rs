use axum::extract::State;
use axum::Json;
use tracing::info;

use crate::api::extractors::{AppBytes, AppJson, AppQuery};
use crate::api::AppState;
use crate::error::{PipelineError, Result};
use crate::models::{
    ImageResult, ImageSource, ImageSourceBody, ItemError, Outcome, RecognitionOptions,
};

use super::ensure_revision;

/// `POST /`
///
/// The body is an `ImageSource` object. Anything else is taken as the raw
/// image bytes.
#[utoipa::path(
    post,
    path = "/",
    tag = "recognition",
    params(RecognitionOptions),
    request_body(
        content = ImageSourceBody,
        description = "An image source object, or the raw image bytes",
    ),
    responses(
        (status = 200, description = "Recognition result, or an item error", body = ImageResult),
        (status = 400, description = "Invalid options or revision", body = ItemError),
        (status = 413, description = "Body too large", body = ItemError),
    )
)]
pub async fn recognize(
    State(state): State<AppState>,
    AppQuery(options): AppQuery<RecognitionOptions>,
    AppBytes(body): AppBytes,
) -> Result<Json<Outcome<ImageResult>>> {
    ensure_revision(&state, options.revision.as_ref())?;

    if body.is_empty() {
        return Ok(Json(Outcome::Error(PipelineError::PayloadEmpty)));
    }

    let source = serde_json::from_slice::<ImageSource>(&body)
        .unwrap_or_else(|_| ImageSource::Bytes(body.to_vec()));

    let config = state.pipeline.configure(&options);
    let outcome = state.pipeline.run(source, &config).await;

    Ok(Json(outcome))
}

/// `POST /batch`
///
/// One result per source, in input order. Item failures never fail the
/// request.
#[utoipa::path(
    post,
    path = "/batch",
    tag = "recognition",
    params(RecognitionOptions),
    request_body = Vec<ImageSourceBody>,
    responses(
        (status = 200, description = "Per-item results or item errors", body = Vec<ImageResult>),
        (status = 400, description = "Invalid body, options or revision", body = ItemError),
        (status = 413, description = "Body too large", body = ItemError),
    )
)]
pub async fn recognize_batch(
    State(state): State<AppState>,
    AppQuery(options): AppQuery<RecognitionOptions>,
    AppJson(sources): AppJson<Vec<ImageSource>>,
) -> Result<Json<Vec<Outcome<ImageResult>>>> {
    ensure_revision(&state, options.revision.as_ref())?;

    let total = sources.len();
    let config = state.pipeline.configure(&options);
    let outcomes = state.pipeline.run_batch(sources, config).await;

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    info!(total, failed, "Batch recognized");

    Ok(Json(outcomes))
}
