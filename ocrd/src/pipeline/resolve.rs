use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, warn};

use crate::egress::EgressPolicy;
use crate::error::PipelineError;
use crate::models::ImageSource;

/// Turns an [`ImageSource`] into image bytes.
#[derive(Debug, Clone)]
pub struct SourceResolver {
    egress: Arc<EgressPolicy>,
}

impl SourceResolver {
    pub fn new(egress: Arc<EgressPolicy>) -> Self {
        Self { egress }
    }

    pub async fn resolve(&self, source: ImageSource) -> Result<Vec<u8>, PipelineError> {
        match source {
            ImageSource::Bytes(bytes) => Ok(bytes),
            ImageSource::Base64(encoded) => STANDARD.decode(encoded.trim()).map_err(|e| {
                debug!(error = %e, "Invalid base64 payload");
                PipelineError::InvalidBase64
            }),
            ImageSource::Url(url) => {
                let response = self.egress.fetch(&url).await.map_err(|e| {
                    warn!(host = url.host_str().unwrap_or(""), error = %e, "Image fetch failed");
                    PipelineError::HttpError
                })?;

                if !response.status.is_success() {
                    warn!(
                        host = url.host_str().unwrap_or(""),
                        status = %response.status,
                        "Image fetch returned error status"
                    );
                    return Err(PipelineError::HttpError);
                }
                if response.body.is_empty() {
                    return Err(PipelineError::PayloadEmpty);
                }

                Ok(response.body)
            }
        }
    }
}
