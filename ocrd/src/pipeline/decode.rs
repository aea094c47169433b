use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use tracing::debug;

use crate::error::PipelineError;

/// A decoded raster image. Cloning shares the pixel data.
#[derive(Debug, Clone)]
pub struct Bitmap {
    image: Arc<DynamicImage>,
}

impl Bitmap {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }
}

/// Decode on the current thread, sniffing the format from the content.
pub fn decode_blocking(bytes: &[u8]) -> Result<Bitmap, PipelineError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| {
            debug!(error = %e, "Failed to read image");
            PipelineError::InvalidImage
        })?;

    if reader.format().is_none() {
        debug!(len = bytes.len(), "Unrecognized image format");
        return Err(PipelineError::InvalidImage);
    }

    let image = reader.decode().map_err(|e| {
        debug!(error = %e, "Failed to decode image");
        PipelineError::InvalidImage
    })?;

    Ok(Bitmap::new(image))
}

/// Decode on the blocking pool.
pub async fn decode(bytes: Vec<u8>) -> Result<Bitmap, PipelineError> {
    tokio::task::spawn_blocking(move || decode_blocking(&bytes))
        .await
        .map_err(|e| {
            debug!(error = %e, "Decode task failed");
            PipelineError::InvalidImage
        })?
}

/// MIME types of every format this build can decode.
pub fn supported_image_types() -> Vec<String> {
    let mut types: Vec<String> = ImageFormat::all()
        .filter(|format| format.reading_enabled())
        .map(|format| format.to_mime_type().to_string())
        .collect();
    types.sort();
    types.dedup();
    types
}
