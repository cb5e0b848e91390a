//! Image transforms used to build search results: crop, outline, paste.
//!
//! Every operation returns a new image and leaves its inputs untouched, so
//! several derived views of one source image can coexist. Results keep the
//! colour type of the image they were derived from.

use crate::geometry::to_pixel_rect;
use crate::types::{BoundingBox, PixelEdges};
use image::{imageops, ColorType, DynamicImage, GenericImageView, ImageBuffer, ImageFormat, Rgba};
use imageproc::drawing::{draw_hollow_rect_mut, Canvas};
use imageproc::rect::Rect;
use std::io::Cursor;
use thiserror::Error;

// --- Annotation and thumbnail constants ---
const BOX_COLOR: Rgba<u8> = Rgba([200, 0, 0, 255]);
const BOX_STROKE: i64 = 4;
const THUMBNAIL_BOUND: u32 = 128;
const PASTE_OFFSET: i64 = 10;

/// A crop may overhang the image by at most one image size on each side.
const MAX_CROP_SCALE: u64 = 3;

type Rgba16Image = ImageBuffer<Rgba<u16>, Vec<u16>>;

#[derive(Error, Debug)]
pub enum CompositeError {
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
    #[error("crop of {width}x{height} exceeds a {image_width}x{image_height} image")]
    OversizedCrop {
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },
}

fn edges_for(image: &DynamicImage, bbox: &BoundingBox) -> PixelEdges {
    let (width, height) = GenericImageView::dimensions(image);
    to_pixel_rect(bbox, width, height).edges()
}

/// Extract the region of `image` covered by `bbox`.
///
/// The crop always spans the rounded box edges. Parts of the box outside
/// the image are filled with zero pixels (black, transparent when the image
/// has alpha). A box with no area yields an empty image.
pub fn crop_by_bounding_box(
    image: &DynamicImage,
    bbox: &BoundingBox,
) -> Result<DynamicImage, CompositeError> {
    let (width, height) = GenericImageView::dimensions(image);
    let edges = edges_for(image, bbox);
    let crop_width = to_u32(edges.x1.saturating_sub(edges.x0));
    let crop_height = to_u32(edges.y1.saturating_sub(edges.y0));

    if u64::from(crop_width) > MAX_CROP_SCALE * u64::from(width)
        || u64::from(crop_height) > MAX_CROP_SCALE * u64::from(height)
    {
        return Err(CompositeError::OversizedCrop {
            width: crop_width,
            height: crop_height,
            image_width: width,
            image_height: height,
        });
    }

    let (x, y, w, h) = edges.clamped(width, height);
    let inside = image.crop_imm(x, y, w, h);
    if (w, h) == (crop_width, crop_height) || crop_width == 0 || crop_height == 0 {
        return Ok(restore(inside, image.color()));
    }

    // Offsets are bounded by the scale check above.
    let dx = i64::from(x) - edges.x0;
    let dy = i64::from(y) - edges.y0;
    let padded = if is_deep(image.color()) {
        let mut canvas = Rgba16Image::new(crop_width, crop_height);
        imageops::replace(&mut canvas, &inside.to_rgba16(), dx, dy);
        DynamicImage::ImageRgba16(canvas)
    } else {
        let mut canvas = image::RgbaImage::new(crop_width, crop_height);
        imageops::replace(&mut canvas, &inside.to_rgba8(), dx, dy);
        DynamicImage::ImageRgba8(canvas)
    };
    Ok(restore(padded, image.color()))
}

/// Copy `image` and outline `bbox` on the copy.
///
/// The stroke grows inwards from the same edges [`crop_by_bounding_box`]
/// uses, so the outline's outer border encloses exactly the cropped pixels.
pub fn draw_bounding_box(image: &DynamicImage, bbox: &BoundingBox) -> DynamicImage {
    let edges = edges_for(image, bbox);
    let drawn = if is_deep(image.color()) {
        let mut canvas = image.to_rgba16();
        outline(&mut canvas, edges, Rgba(BOX_COLOR.0.map(widen)));
        DynamicImage::ImageRgba16(canvas)
    } else {
        let mut canvas = image.to_rgba8();
        outline(&mut canvas, edges, BOX_COLOR);
        DynamicImage::ImageRgba8(canvas)
    };
    restore(drawn, image.color())
}

fn outline<C: Canvas>(canvas: &mut C, edges: PixelEdges, color: C::Pixel) {
    // Pulling far-off edges in to just past the stroke leaves the visible
    // pixels unchanged and keeps the arithmetic small.
    let (width, height) = canvas.dimensions();
    let margin = BOX_STROKE + 1;
    let x0 = edges.x0.clamp(-margin, i64::from(width) + margin);
    let x1 = edges.x1.clamp(-margin, i64::from(width) + margin);
    let y0 = edges.y0.clamp(-margin, i64::from(height) + margin);
    let y1 = edges.y1.clamp(-margin, i64::from(height) + margin);

    for inset in 0..BOX_STROKE {
        let w = x1 - x0 - 2 * inset;
        let h = y1 - y0 - 2 * inset;
        if w <= 0 || h <= 0 {
            break;
        }
        let rect = Rect::at(to_i32(x0 + inset), to_i32(y0 + inset)).of_size(to_u32(w), to_u32(h));
        draw_hollow_rect_mut(canvas, rect, color);
    }
}

/// Copy `base` and paste a thumbnail of `overlay` near its upper-left corner.
///
/// The thumbnail fits within 128×128 with the overlay's aspect ratio; smaller
/// overlays are pasted at their own size. Pixels are replaced, not blended.
pub fn paste_on_upper_left(overlay: &DynamicImage, base: &DynamicImage) -> DynamicImage {
    let thumbnail = thumbnail(overlay);
    let pasted = if is_deep(base.color()) {
        let mut canvas = base.to_rgba16();
        imageops::replace(&mut canvas, &thumbnail.to_rgba16(), PASTE_OFFSET, PASTE_OFFSET);
        DynamicImage::ImageRgba16(canvas)
    } else {
        let mut canvas = base.to_rgba8();
        imageops::replace(&mut canvas, &thumbnail.to_rgba8(), PASTE_OFFSET, PASTE_OFFSET);
        DynamicImage::ImageRgba8(canvas)
    };
    restore(pasted, base.color())
}

/// Shrink to fit the thumbnail bound; never enlarges.
fn thumbnail(image: &DynamicImage) -> DynamicImage {
    let (width, height) = GenericImageView::dimensions(image);
    if width <= THUMBNAIL_BOUND && height <= THUMBNAIL_BOUND {
        image.clone()
    } else {
        image.thumbnail(THUMBNAIL_BOUND, THUMBNAIL_BOUND)
    }
}

/// Encode an image as PNG bytes for submission to the recognition service.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, CompositeError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// More than 8 bits per channel.
fn is_deep(color: ColorType) -> bool {
    color.bytes_per_pixel() > color.channel_count()
}

/// Convert a working copy back to `color`. Float images come back as
/// 16-bit, the deepest colour type PNG can hold.
fn restore(image: DynamicImage, color: ColorType) -> DynamicImage {
    match color {
        ColorType::L8 => DynamicImage::ImageLuma8(image.into_luma8()),
        ColorType::La8 => DynamicImage::ImageLumaA8(image.into_luma_alpha8()),
        ColorType::Rgb8 => DynamicImage::ImageRgb8(image.into_rgb8()),
        ColorType::Rgba8 => DynamicImage::ImageRgba8(image.into_rgba8()),
        ColorType::L16 => DynamicImage::ImageLuma16(image.into_luma16()),
        ColorType::La16 => DynamicImage::ImageLumaA16(image.into_luma_alpha16()),
        ColorType::Rgb16 | ColorType::Rgb32F => DynamicImage::ImageRgb16(image.into_rgb16()),
        _ => DynamicImage::ImageRgba16(image.into_rgba16()),
    }
}

fn widen(channel: u8) -> u16 {
    u16::from(channel) * 257
}

fn to_i32(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

fn to_u32(v: i64) -> u32 {
    v.clamp(0, i64::from(u32::MAX)) as u32
}
