#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use image::{DynamicImage, ImageFormat};
use reqwest::StatusCode;
use url::Url;

use ocrd::api::{create_router, AppState};
use ocrd::config::Config;
use ocrd::egress::{EgressPolicy, FetchError, FetchResponse, Fetcher};
use ocrd::error::PipelineError;
use ocrd::models::{LanguageTag, Revision};
use ocrd::ocr::{
    NormalizedPoint, RawObservation, RecognitionConfig, RecognitionEngine, RecognitionLevel,
    TextCandidate,
};
use ocrd::pipeline::Bitmap;

/// Encode a blank image of the given size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

pub fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut out = Vec::new();
    DynamicImage::new_rgb8(width, height)
        .write_to(&mut Cursor::new(&mut out), format)
        .unwrap();
    out
}

pub fn observation(text: &str, tl: (f64, f64), br: (f64, f64)) -> RawObservation {
    RawObservation {
        top_left: NormalizedPoint::new(tl.0, tl.1),
        bottom_right: NormalizedPoint::new(br.0, br.1),
        confidence: 0.5,
        candidates: vec![TextCandidate {
            text: text.to_string(),
            confidence: 0.75,
        }],
    }
}

/// Deterministic engine for tests.
///
/// Every image yields `observations`. Recognition sleeps
/// `delay_per_pixel * width`, and images exactly `fail_width` wide fail.
pub struct StubEngine {
    pub revisions: Vec<Revision>,
    pub languages: Vec<LanguageTag>,
    pub observations: Vec<RawObservation>,
    pub delay_per_pixel: Duration,
    pub fail_width: Option<u32>,
    pub calls: AtomicUsize,
    pub completed: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub seen_configs: Mutex<Vec<RecognitionConfig>>,
}

impl Default for StubEngine {
    fn default() -> Self {
        Self {
            revisions: vec![Revision::new("default"), Revision::new("best")],
            languages: vec!["en".parse().unwrap(), "de".parse().unwrap()],
            observations: vec![observation("hello", (0.2, 0.8), (0.6, 0.3))],
            delay_per_pixel: Duration::ZERO,
            fail_width: None,
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            seen_configs: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RecognitionEngine for StubEngine {
    fn revisions(&self) -> Vec<Revision> {
        self.revisions.clone()
    }

    fn default_revision(&self) -> Revision {
        self.revisions[0].clone()
    }

    fn supported_languages(&self, revision: &Revision) -> Option<Vec<LanguageTag>> {
        self.revisions
            .contains(revision)
            .then(|| self.languages.clone())
    }

    fn defaults(&self) -> RecognitionConfig {
        RecognitionConfig {
            revision: self.default_revision(),
            level: RecognitionLevel::Accurate,
            custom_words: Vec::new(),
            uses_language_correction: true,
            languages: Vec::new(),
            detect_language: false,
        }
    }

    async fn recognize(
        &self,
        bitmap: &Bitmap,
        config: &RecognitionConfig,
    ) -> Result<Vec<RawObservation>, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_configs.lock().unwrap().push(config.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay_per_pixel * bitmap.width()).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);

        if self.fail_width == Some(bitmap.width()) {
            return Err(PipelineError::RecognitionFailed);
        }
        Ok(self.observations.clone())
    }
}

/// Fetcher that serves fixed responses by URL path and counts calls.
/// Unknown paths fail like a transport error.
#[derive(Default)]
pub struct SpyFetcher {
    pub routes: Vec<(String, u16, Vec<u8>)>,
    pub calls: AtomicUsize,
}

impl SpyFetcher {
    pub fn with(routes: Vec<(&str, u16, Vec<u8>)>) -> Self {
        Self {
            routes: routes
                .into_iter()
                .map(|(path, status, body)| (path.to_string(), status, body))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for SpyFetcher {
    async fn get(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.routes.iter().find(|(path, _, _)| path == url.path()) {
            Some((_, status, body)) => Ok(FetchResponse {
                status: StatusCode::from_u16(*status).unwrap(),
                body: body.clone(),
            }),
            None => Err(FetchError::TooLarge { limit: 0 }),
        }
    }
}

pub const TRUSTED_HOST: &str = "trusted.example";

pub struct TestApp {
    pub router: Router,
    pub engine: Arc<StubEngine>,
    pub direct: Arc<SpyFetcher>,
    pub proxied: Arc<SpyFetcher>,
}

/// Router over a stub engine. `direct` serves [`TRUSTED_HOST`], `proxied`
/// every other host.
pub fn test_app(
    config: Config,
    engine: StubEngine,
    direct: SpyFetcher,
    proxied: SpyFetcher,
) -> TestApp {
    let engine = Arc::new(engine);
    let direct = Arc::new(direct);
    let proxied = Arc::new(proxied);

    let egress = Arc::new(EgressPolicy::new(
        [TRUSTED_HOST],
        direct.clone(),
        proxied.clone(),
    ));
    let state = AppState::new(config, egress, engine.clone());

    TestApp {
        router: create_router(state),
        engine,
        direct,
        proxied,
    }
}

pub fn default_app() -> TestApp {
    test_app(
        Config::default(),
        StubEngine::default(),
        SpyFetcher::default(),
        SpyFetcher::default(),
    )
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, json: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

pub fn post_raw(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/octet-stream")
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
