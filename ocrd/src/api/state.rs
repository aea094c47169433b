use std::sync::Arc;

use crate::config::Config;
use crate::egress::EgressPolicy;
use crate::ocr::RecognitionEngine;
use crate::pipeline::{Pipeline, SourceResolver};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Pipeline,
}

impl AppState {
    pub fn new(
        config: Config,
        egress: Arc<EgressPolicy>,
        engine: Arc<dyn RecognitionEngine>,
    ) -> Self {
        let pipeline = Pipeline::new(
            SourceResolver::new(egress),
            engine,
            config.batch.max_concurrency,
        );

        Self {
            config: Arc::new(config),
            pipeline,
        }
    }

    pub fn engine(&self) -> &Arc<dyn RecognitionEngine> {
        self.pipeline.engine()
    }
}
