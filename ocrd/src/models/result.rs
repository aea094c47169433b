use serde::{Serialize, Serializer};

use crate::error::PipelineError;

/// Pixel-space rectangle, origin top-left, y growing downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, utoipa::ToSchema)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One recognized text region.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct TextObservation {
    #[serde(rename = "box")]
    pub bounding_box: BoundingBox,
    pub content: String,
    pub confidence: f32,
}

/// Recognition result for one image.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct ImageResult {
    pub width: u32,
    pub height: u32,
    /// Every observation's text, newline-joined in engine order.
    pub content: String,
    pub observations: Vec<TextObservation>,
}

impl ImageResult {
    pub fn new(width: u32, height: u32, observations: Vec<TextObservation>) -> Self {
        let content = observations
            .iter()
            .map(|o| o.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            width,
            height,
            content,
            observations,
        }
    }
}

/// Per-item result: the value itself, or one of the [`PipelineError`] reasons.
///
/// Serializes as the bare value on success and as
/// `{"error": true, "reason": "..."}` on failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ok(T),
    Error(PipelineError),
}

impl<T> Outcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn error(&self) -> Option<PipelineError> {
        match self {
            Self::Ok(_) => None,
            Self::Error(e) => Some(*e),
        }
    }
}

impl<T> From<Result<T, PipelineError>> for Outcome<T> {
    fn from(result: Result<T, PipelineError>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(e) => Self::Error(e),
        }
    }
}

/// Wire form of a failed item, used for the OpenAPI document.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ItemError {
    /// Always `true`.
    pub error: bool,
    /// One of `Payload Empty`, `Invalid Image`, `Invalid Base64`,
    /// `HTTP Error`, `Recognition Failed`.
    pub reason: String,
}

impl From<PipelineError> for ItemError {
    fn from(e: PipelineError) -> Self {
        Self {
            error: true,
            reason: e.to_string(),
        }
    }
}

impl<T: Serialize> Serialize for Outcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Ok(value) => value.serialize(serializer),
            Self::Error(e) => ItemError::from(*e).serialize(serializer),
        }
    }
}
