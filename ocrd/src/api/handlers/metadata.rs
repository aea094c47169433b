use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::api::extractors::AppQuery;
use crate::api::AppState;
use crate::error::Result;
use crate::models::{LanguageTag, Revision};
use crate::pipeline::supported_image_types;

use super::ensure_revision;

/// `GET /`
#[utoipa::path(
    get,
    path = "/",
    tag = "meta",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

/// `GET /revisions`
#[utoipa::path(
    get,
    path = "/revisions",
    tag = "meta",
    responses((status = 200, description = "Engine revisions, default first", body = Vec<String>))
)]
pub async fn revisions(State(state): State<AppState>) -> Json<Vec<Revision>> {
    Json(state.engine().revisions())
}

/// `GET /image-types`
#[utoipa::path(
    get,
    path = "/image-types",
    tag = "meta",
    responses((status = 200, description = "Decodable image MIME types", body = Vec<String>))
)]
pub async fn image_types() -> Json<Vec<String>> {
    Json(supported_image_types())
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LanguagesQuery {
    /// Engine revision; the default revision when absent.
    #[param(value_type = Option<String>)]
    pub revision: Option<Revision>,
}

/// `GET /languages`
#[utoipa::path(
    get,
    path = "/languages",
    tag = "meta",
    params(LanguagesQuery),
    responses(
        (status = 200, description = "Language tags supported by the revision", body = Vec<String>),
        (status = 400, description = "Unknown revision", body = crate::models::ItemError),
    )
)]
pub async fn languages(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<LanguagesQuery>,
) -> Result<Json<Vec<LanguageTag>>> {
    ensure_revision(&state, query.revision.as_ref())?;

    let revision = query
        .revision
        .unwrap_or_else(|| state.engine().default_revision());
    let languages = state
        .engine()
        .supported_languages(&revision)
        .unwrap_or_default();

    Ok(Json(languages))
}
