//! Bounding box to pixel rectangle conversion.

use crate::types::{BoundingBox, PixelRect};

/// Scale a fractional bounding box to the pixel space of a `width`×`height` image.
///
/// No clamping and no rounding: out-of-range, negative, or NaN inputs come
/// out scaled but otherwise unchanged. Integer edges are derived later by
/// [`PixelRect::edges`].
pub fn to_pixel_rect(bbox: &BoundingBox, width: u32, height: u32) -> PixelRect {
    let w = f64::from(width);
    let h = f64::from(height);
    PixelRect {
        left: w * bbox.left,
        top: h * bbox.top,
        width: w * bbox.width,
        height: h * bbox.height,
    }
}
