use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ocrd",
        description = "Stateless text recognition over HTTP. Send an image by URL, base64 or raw bytes and get back pixel-space text observations.",
    ),
    paths(
        handlers::metadata::health,
        handlers::metadata::revisions,
        handlers::metadata::image_types,
        handlers::metadata::languages,
        handlers::recognize::recognize,
        handlers::recognize::recognize_batch,
    ),
    components(schemas(
        models::ImageSourceBody,
        models::Mode,
        models::BoundingBox,
        models::TextObservation,
        models::ImageResult,
        models::ItemError,
    )),
    tags(
        (name = "meta", description = "Service metadata"),
        (name = "recognition", description = "Single and batch text recognition"),
    ),
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
