use image::{DynamicImage, GenericImageView, GrayImage, ImageFormat, Luma};

/// Engine input: a re-encoded PNG plus its pixel size.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Prepare a decoded image for Tesseract.
///
/// 1. Downscale so neither side exceeds `max_dim`, keeping the aspect ratio
/// 2. Flatten to 8-bit grayscale, compositing any alpha onto white
/// 3. Stretch the histogram to the full 0..=255 range
/// 4. Encode as PNG
///
/// Callers normalize engine coordinates against `width`/`height` of the
/// result, so downscaling does not shift boxes on the original grid.
pub fn prepare_for_engine(
    image: &DynamicImage,
    max_dim: u32,
) -> Result<PreparedImage, image::ImageError> {
    let gray = flatten_to_gray(&resize_if_needed(image, max_dim));
    let gray = stretch_contrast(gray);

    let (width, height) = gray.dimensions();
    let mut png = Vec::new();
    DynamicImage::ImageLuma8(gray).write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)?;

    Ok(PreparedImage { png, width, height })
}

fn resize_if_needed(image: &DynamicImage, max_dim: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    if max_dim == 0 || (width <= max_dim && height <= max_dim) {
        return image.clone();
    }

    // `resize` keeps the aspect ratio within the given bounds.
    image.resize(max_dim, max_dim, image::imageops::FilterType::Lanczos3)
}

/// Transparent pixels become white rather than black.
fn flatten_to_gray(image: &DynamicImage) -> GrayImage {
    if !image.color().has_alpha() {
        return image.to_luma8();
    }

    let luma_alpha = image.to_luma_alpha8();
    GrayImage::from_fn(luma_alpha.width(), luma_alpha.height(), |x, y| {
        let [value, alpha] = luma_alpha.get_pixel(x, y).0;
        let (value, alpha) = (u32::from(value), u32::from(alpha));
        let blended = (value * alpha + 255 * (255 - alpha)) / 255;
        Luma([blended as u8])
    })
}

fn stretch_contrast(gray: GrayImage) -> GrayImage {
    let (min, max) = gray
        .pixels()
        .fold((u8::MAX, u8::MIN), |(min, max), p| (min.min(p[0]), max.max(p[0])));

    if max <= min {
        return gray;
    }

    let range = f32::from(max - min);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let value = gray.get_pixel(x, y)[0];
        Luma([((f32::from(value - min) / range) * 255.0).round() as u8])
    })
}
