mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use ocrd::config::Config;
use ocrd::models::{LanguageTag, Revision};
use ocrd::ocr::{RecognitionEngine, RecognitionLevel};
use pretty_assertions::assert_eq;
use serde_json::json;
use tower::ServiceExt;

use common::{
    body_json, body_text, default_app, get, png, post_json, post_raw, test_app, SpyFetcher,
    StubEngine, TRUSTED_HOST,
};

fn expected_result() -> serde_json::Value {
    json!({
        "width": 100,
        "height": 50,
        "content": "hello",
        "observations": [{
            "box": { "x": 19, "y": 9, "width": 39, "height": 24 },
            "content": "hello",
            "confidence": 0.75
        }]
    })
}

#[tokio::test]
async fn health_returns_ok() {
    let app = default_app();

    let response = app.router.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn revisions_lists_engine_revisions() {
    let app = default_app();

    let response = app.router.oneshot(get("/revisions")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!(["default", "best"]));
}

#[tokio::test]
async fn image_types_lists_mime_types() {
    let app = default_app();

    let response = app.router.oneshot(get("/image-types")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let types: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert!(types.contains(&"image/png"));
    assert!(types.contains(&"image/jpeg"));
}

#[tokio::test]
async fn languages_for_default_and_named_revision() {
    let app = default_app();

    let response = app.router.clone().oneshot(get("/languages")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!(["en", "de"]));

    let response = app
        .router
        .oneshot(get("/languages?revision=best"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!(["en", "de"]));
}

#[tokio::test]
async fn languages_rejects_unknown_revision() {
    let app = default_app();

    let response = app
        .router
        .oneshot(get("/languages?revision=nope"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], true);
    assert!(json["reason"].as_str().unwrap().contains("Invalid Revision"));
}

#[tokio::test]
async fn recognize_base64_source() {
    let app = default_app();
    let body = json!({ "base64": STANDARD.encode(png(100, 50)) });

    let response = app.router.oneshot(post_json("/", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, expected_result());
}

#[tokio::test]
async fn recognize_bytes_source() {
    let app = default_app();
    let body = json!({ "bytes": png(100, 50) });

    let response = app.router.oneshot(post_json("/", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, expected_result());
}

#[tokio::test]
async fn recognize_raw_body_fallback() {
    let app = default_app();

    let response = app.router.oneshot(post_raw("/", png(100, 50))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, expected_result());
}

#[tokio::test]
async fn empty_body_is_payload_empty() {
    let app = default_app();

    let response = app.router.oneshot(post_raw("/", Vec::new())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "error": true, "reason": "Payload Empty" })
    );
    assert_eq!(app.engine.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn bad_base64_is_invalid_base64() {
    let app = default_app();

    let response = app
        .router
        .oneshot(post_json("/", json!({ "base64": "***not base64***" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "error": true, "reason": "Invalid Base64" })
    );
}

#[tokio::test]
async fn garbage_bytes_are_invalid_image() {
    let app = default_app();

    let response = app
        .router
        .oneshot(post_raw("/", b"this is not an image".to_vec()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "error": true, "reason": "Invalid Image" })
    );
}

#[tokio::test]
async fn trusted_url_is_fetched_directly() {
    let app = test_app(
        Config::default(),
        StubEngine::default(),
        SpyFetcher::with(vec![("/a.png", 200, png(100, 50))]),
        SpyFetcher::default(),
    );
    let body = json!({ "url": format!("https://{TRUSTED_HOST}/a.png") });

    let response = app.router.oneshot(post_json("/", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, expected_result());
    assert_eq!(app.direct.calls(), 1);
    assert_eq!(app.proxied.calls(), 0);
}

#[tokio::test]
async fn untrusted_url_goes_through_proxy() {
    let app = test_app(
        Config::default(),
        StubEngine::default(),
        SpyFetcher::default(),
        SpyFetcher::with(vec![("/a.png", 200, png(100, 50))]),
    );
    let body = json!({ "url": "https://elsewhere.example/a.png" });

    let response = app.router.oneshot(post_json("/", body)).await.unwrap();

    assert_eq!(body_json(response).await, expected_result());
    assert_eq!(app.direct.calls(), 0);
    assert_eq!(app.proxied.calls(), 1);
}

#[tokio::test]
async fn error_status_is_http_error() {
    let app = test_app(
        Config::default(),
        StubEngine::default(),
        SpyFetcher::default(),
        SpyFetcher::with(vec![("/gone.png", 404, b"missing".to_vec())]),
    );
    let body = json!({ "url": "https://elsewhere.example/gone.png" });

    let response = app.router.oneshot(post_json("/", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "error": true, "reason": "HTTP Error" })
    );
}

#[tokio::test]
async fn empty_fetched_body_is_payload_empty() {
    let app = test_app(
        Config::default(),
        StubEngine::default(),
        SpyFetcher::default(),
        SpyFetcher::with(vec![("/empty.png", 200, Vec::new())]),
    );
    let body = json!({ "url": "https://elsewhere.example/empty.png" });

    let response = app.router.oneshot(post_json("/", body)).await.unwrap();

    assert_eq!(
        body_json(response).await,
        json!({ "error": true, "reason": "Payload Empty" })
    );
}

#[tokio::test]
async fn failed_recognition_is_reported() {
    let engine = StubEngine {
        fail_width: Some(100),
        ..StubEngine::default()
    };
    let app = test_app(
        Config::default(),
        engine,
        SpyFetcher::default(),
        SpyFetcher::default(),
    );

    let response = app.router.oneshot(post_raw("/", png(100, 50))).await.unwrap();

    assert_eq!(
        body_json(response).await,
        json!({ "error": true, "reason": "Recognition Failed" })
    );
}

#[tokio::test]
async fn query_options_reach_the_engine() {
    let app = default_app();
    let uri = "/?mode=fast&languages=en_us&languages=DE&words=foo&words=bar\
               &autocorrect=false&detectLanguage=true&revision=best";

    let response = app.router.oneshot(post_raw(uri, png(10, 10))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let configs = app.engine.seen_configs.lock().unwrap();
    assert_eq!(configs.len(), 1);
    let config = &configs[0];
    assert_eq!(config.revision, Revision::new("best"));
    assert_eq!(config.level, RecognitionLevel::Fast);
    assert_eq!(config.custom_words, vec!["foo".to_string(), "bar".to_string()]);
    assert!(!config.uses_language_correction);
    assert!(config.detect_language);
    let languages: Vec<LanguageTag> = vec!["en-US".parse().unwrap(), "de".parse().unwrap()];
    assert_eq!(config.languages, languages);
}

#[tokio::test]
async fn absent_options_keep_engine_defaults() {
    let app = default_app();

    app.router.oneshot(post_raw("/", png(10, 10))).await.unwrap();

    let configs = app.engine.seen_configs.lock().unwrap();
    assert_eq!(configs[0], app.engine.defaults());
}

#[tokio::test]
async fn unknown_revision_is_rejected() {
    let app = default_app();

    let response = app
        .router
        .oneshot(post_raw("/?revision=ancient", png(10, 10)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], true);
    assert_eq!(app.engine.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_query_is_rejected() {
    let app = default_app();

    let response = app
        .router
        .oneshot(post_raw("/?mode=sloppy", png(10, 10)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], true);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let mut config = Config::default();
    config.server.max_body_bytes = 64;
    let app = test_app(
        config,
        StubEngine::default(),
        SpyFetcher::default(),
        SpyFetcher::default(),
    );

    let response = app
        .router
        .oneshot(post_raw("/", vec![7u8; 1024]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(response).await["error"], true);
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let app = default_app();

    let request = Request::builder()
        .uri("/")
        .header("origin", "https://somewhere.example")
        .body(Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn openapi_document_lists_routes() {
    let app = default_app();

    let response = app.router.oneshot(get("/openapi.json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    for path in ["/", "/batch", "/revisions", "/image-types", "/languages"] {
        assert!(json["paths"][path].is_object(), "missing path {path}");
    }
}
