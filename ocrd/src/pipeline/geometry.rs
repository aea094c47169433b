use crate::models::{BoundingBox, TextObservation};
use crate::ocr::RawObservation;

/// Scale a normalized coordinate onto `0..=(extent - 1)`, truncating toward
/// zero. Negative and NaN results clamp to 0.
fn scale(value: f64, extent: u32) -> u32 {
    let scaled = (value * f64::from(extent.saturating_sub(1))).trunc();
    if scaled.is_nan() || scaled <= 0.0 {
        0
    } else if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        scaled as u32
    }
}

/// Convert a bottom-left-origin normalized observation into a top-left
/// pixel box on a `width` x `height` image.
pub fn map_observation(raw: &RawObservation, width: u32, height: u32) -> TextObservation {
    let tl = raw.top_left;
    let br = raw.bottom_right;

    let bounding_box = BoundingBox {
        x: scale(tl.x, width),
        y: scale(1.0 - tl.y, height),
        width: scale(br.x - tl.x, width),
        height: scale(tl.y - br.y, height),
    };

    let (content, confidence) = match raw.candidates.first() {
        Some(top) => (top.text.clone(), top.confidence),
        None => (String::new(), raw.confidence),
    };

    TextObservation {
        bounding_box,
        content,
        confidence,
    }
}
