use async_trait::async_trait;

use crate::error::PipelineError;
use crate::models::{LanguageTag, Mode, Revision};
use crate::pipeline::decode::Bitmap;

/// Quality/speed tradeoff as the engine sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecognitionLevel {
    Fast,
    #[default]
    Accurate,
}

impl From<Mode> for RecognitionLevel {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Fast => Self::Fast,
            Mode::Accurate => Self::Accurate,
        }
    }
}

/// Fully resolved settings for one recognition call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionConfig {
    pub revision: Revision,
    pub level: RecognitionLevel,
    pub custom_words: Vec<String>,
    pub uses_language_correction: bool,
    /// Priority-ordered languages. Empty means the engine's own default set.
    pub languages: Vec<LanguageTag>,
    pub detect_language: bool,
}

/// Point in normalized image space: both axes in `0.0..=1.0`, origin at the
/// bottom-left corner, y growing upward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextCandidate {
    pub text: String,
    pub confidence: f32,
}

/// One region as reported by the engine, before pixel mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    pub top_left: NormalizedPoint,
    pub bottom_right: NormalizedPoint,
    pub confidence: f32,
    /// Best candidate first.
    pub candidates: Vec<TextCandidate>,
}

/// Text recognition capability.
///
/// Revisions and their languages are fixed for the lifetime of the engine.
#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    fn revisions(&self) -> Vec<Revision>;

    fn default_revision(&self) -> Revision;

    /// Languages available under `revision`, or `None` if the revision is
    /// unknown.
    fn supported_languages(&self, revision: &Revision) -> Option<Vec<LanguageTag>>;

    /// Settings used for every option the caller leaves out.
    fn defaults(&self) -> RecognitionConfig;

    async fn recognize(
        &self,
        bitmap: &Bitmap,
        config: &RecognitionConfig,
    ) -> Result<Vec<RawObservation>, PipelineError>;

    fn supports_revision(&self, revision: &Revision) -> bool {
        self.revisions().contains(revision)
    }
}
