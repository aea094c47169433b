//! Text recognition engines.
//!
//! [`RecognitionEngine`] is the capability the pipeline drives. The bundled
//! implementation runs Tesseract locally through `leptess`; a missing or
//! broken Tesseract install degrades to an engine that fails every item with
//! `Recognition Failed` instead of stopping the service.

pub mod engine;
mod preprocessing;
pub mod tesseract;
mod vocabulary;

pub use engine::{
    NormalizedPoint, RawObservation, RecognitionConfig, RecognitionEngine, RecognitionLevel,
    TextCandidate,
};
pub use preprocessing::{prepare_for_engine, PreparedImage};
pub use tesseract::TesseractEngine;
