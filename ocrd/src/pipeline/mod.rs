//! Per-image recognition pipeline and batch fan-out.
//!
//! One item goes resolve → decode → recognize → map. Each stage returns a
//! [`PipelineError`] on failure and the first failure ends the item; it
//! never fails the surrounding request.

pub mod configure;
pub mod decode;
pub mod geometry;
pub mod resolve;

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::models::{ImageResult, ImageSource, Outcome, RecognitionOptions};
use crate::ocr::{RecognitionConfig, RecognitionEngine};

pub use decode::{supported_image_types, Bitmap};
pub use resolve::SourceResolver;

#[derive(Clone)]
pub struct Pipeline {
    resolver: SourceResolver,
    engine: Arc<dyn RecognitionEngine>,
    /// 0 means no limit.
    batch_concurrency: usize,
}

impl Pipeline {
    pub fn new(
        resolver: SourceResolver,
        engine: Arc<dyn RecognitionEngine>,
        batch_concurrency: usize,
    ) -> Self {
        Self {
            resolver,
            engine,
            batch_concurrency,
        }
    }

    pub fn engine(&self) -> &Arc<dyn RecognitionEngine> {
        &self.engine
    }

    /// Engine defaults with `options` applied.
    pub fn configure(&self, options: &RecognitionOptions) -> RecognitionConfig {
        configure::build(options, self.engine.defaults())
    }

    pub async fn run(&self, source: ImageSource, config: &RecognitionConfig) -> Outcome<ImageResult> {
        let kind = source.kind();
        let outcome: Outcome<ImageResult> = self.run_inner(source, config).await.into();

        if let Some(e) = outcome.error() {
            debug!(source = kind, reason = %e, "Item failed");
        }
        outcome
    }

    async fn run_inner(
        &self,
        source: ImageSource,
        config: &RecognitionConfig,
    ) -> Result<ImageResult, PipelineError> {
        let bytes = self.resolver.resolve(source).await?;
        let bitmap = decode::decode(bytes).await?;
        let (width, height) = bitmap.dimensions();

        let observations = self
            .engine
            .recognize(&bitmap, config)
            .await?
            .iter()
            .map(|raw| geometry::map_observation(raw, width, height))
            .collect();

        Ok(ImageResult::new(width, height, observations))
    }

    /// Run every source through its own pipeline; results keep input order.
    ///
    /// At most `batch_concurrency` items are in flight. Dropping the returned
    /// future aborts every outstanding item.
    pub async fn run_batch(
        &self,
        sources: Vec<ImageSource>,
        config: RecognitionConfig,
    ) -> Vec<Outcome<ImageResult>> {
        let total = sources.len();
        let config = Arc::new(config);
        let permits = match self.batch_concurrency {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n))),
        };

        let mut tasks = JoinSet::new();
        for (index, source) in sources.into_iter().enumerate() {
            let pipeline = self.clone();
            let config = Arc::clone(&config);
            let permits = permits.clone();

            tasks.spawn(async move {
                // The semaphore is never closed, so acquiring only fails if it were.
                let _permit = match &permits {
                    Some(permits) => permits.acquire().await.ok(),
                    None => None,
                };
                (index, pipeline.run(source, &config).await)
            });
        }

        let mut slots: Vec<Option<Outcome<ImageResult>>> = vec![None; total];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => warn!(error = %e, "Batch item task failed"),
            }
        }

        slots
            .into_iter()
            .map(|slot| slot.unwrap_or(Outcome::Error(PipelineError::RecognitionFailed)))
            .collect()
    }
}
