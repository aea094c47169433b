//! ocrd: a stateless HTTP text-recognition service.
//!
//! Images arrive by URL, raw bytes or base64, are fetched under an egress
//! policy, decoded, handed to a recognition engine and returned as
//! pixel-space text observations. Batches fan out one pipeline per item and
//! keep the input order in the response.

pub mod api;
pub mod config;
pub mod egress;
pub mod error;
pub mod models;
pub mod ocr;
pub mod pipeline;
