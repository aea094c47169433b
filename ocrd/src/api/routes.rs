use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::{handlers, openapi, AppState};

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_body_bytes = state.config.server.max_body_bytes;
    let max_batch_body_bytes = state.config.server.max_batch_body_bytes;

    Router::new()
        .route(
            "/",
            get(handlers::health)
                .post(handlers::recognize)
                .layer(DefaultBodyLimit::max(max_body_bytes)),
        )
        .route(
            "/batch",
            post(handlers::recognize_batch).layer(DefaultBodyLimit::max(max_batch_body_bytes)),
        )
        .route("/revisions", get(handlers::revisions))
        .route("/image-types", get(handlers::image_types))
        .route("/languages", get(handlers::languages))
        .route("/openapi.json", get(openapi::openapi_json))
        .merge(openapi::redoc_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
