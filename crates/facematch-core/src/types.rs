use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Face location as fractions of the image width and height, origin top-left.
///
/// Values come from the remote service and are not validated locally;
/// upstream rounding can push them slightly outside [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// A [`BoundingBox`] scaled to absolute pixel units of one image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Integer pixel edges of a [`PixelRect`]: columns `x0..x1`, rows `y0..y1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelEdges {
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
}

impl PixelRect {
    /// Round each edge to the nearest pixel.
    ///
    /// This is the only place fractional pixels become integers. Cropping
    /// and box drawing both go through it, so they always select the same
    /// pixels. NaN saturates to 0.
    pub fn edges(&self) -> PixelEdges {
        PixelEdges {
            x0: self.left.round() as i64,
            y0: self.top.round() as i64,
            x1: (self.left + self.width).round() as i64,
            y1: (self.top + self.height).round() as i64,
        }
    }
}

impl PixelEdges {
    /// Clamp the edges into an image of the given size.
    ///
    /// Returns `(x, y, width, height)`; width or height is 0 when the
    /// rectangle lies entirely outside the image or is inverted.
    pub fn clamped(&self, image_width: u32, image_height: u32) -> (u32, u32, u32, u32) {
        let w = i64::from(image_width);
        let h = i64::from(image_height);
        let x0 = self.x0.clamp(0, w);
        let y0 = self.y0.clamp(0, h);
        let x1 = self.x1.clamp(x0, w);
        let y1 = self.y1.clamp(y0, h);
        (x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32)
    }
}

/// Metadata for a face detected, indexed, or matched by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceRecord {
    pub face_id: Option<String>,
    pub bounding_box: BoundingBox,
    /// Label attached at indexing time (the portrait's file name).
    pub external_image_id: Option<String>,
    /// Detection confidence in percent.
    pub confidence: Option<f32>,
    /// Match similarity in percent, only set on search results.
    pub similarity: Option<f32>,
}

impl FaceRecord {
    /// A record carrying only a location, as returned by face detection.
    pub fn at(bounding_box: BoundingBox) -> Self {
        Self {
            face_id: None,
            bounding_box,
            external_image_id: None,
            confidence: None,
            similarity: None,
        }
    }
}

/// Name of a face collection on the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(String);

impl CollectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A composite produced by the search pipeline: the matched portrait with the
/// match outlined and the query face pasted on its upper left.
#[derive(Debug, Clone)]
pub struct ResultImage {
    pub image: DynamicImage,
    /// Portrait the query face matched.
    pub external_image_id: String,
    pub similarity: Option<f32>,
    /// Query image the face was cropped from.
    pub source: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(left: f64, top: f64, width: f64, height: f64) -> PixelRect {
        PixelRect { left, top, width, height }
    }

    #[test]
    fn test_edges_round_to_nearest() {
        let edges = rect(10.4, 20.5, 30.2, 9.9).edges();
        assert_eq!(edges, PixelEdges { x0: 10, y0: 21, x1: 41, y1: 30 });
    }

    #[test]
    fn test_edges_nan_saturates_to_zero() {
        let edges = rect(f64::NAN, 5.0, 10.0, f64::NAN).edges();
        assert_eq!(edges.x0, 0);
        assert_eq!(edges.x1, 0);
        assert_eq!(edges.y0, 5);
        assert_eq!(edges.y1, 0);
    }

    #[test]
    fn test_clamped_inside_image() {
        let edges = PixelEdges { x0: 2, y0: 3, x1: 12, y1: 8 };
        assert_eq!(edges.clamped(100, 100), (2, 3, 10, 5));
    }

    #[test]
    fn test_clamped_overhanging_edges() {
        // Negative origin and far edge past the image (upstream rounding).
        let edges = PixelEdges { x0: -4, y0: 95, x1: 20, y1: 103 };
        assert_eq!(edges.clamped(100, 100), (0, 95, 20, 5));
    }

    #[test]
    fn test_clamped_outside_or_inverted_is_empty() {
        let outside = PixelEdges { x0: 150, y0: 10, x1: 170, y1: 20 };
        assert_eq!(outside.clamped(100, 100).2, 0);

        let inverted = PixelEdges { x0: 50, y0: 50, x1: 40, y1: 60 };
        let (_, _, w, h) = inverted.clamped(100, 100);
        assert_eq!((w, h), (0, 10));
    }

    #[test]
    fn test_collection_id_display() {
        let id = CollectionId::new("team");
        assert_eq!(id.to_string(), "team");
        assert_eq!(id.as_str(), "team");
    }
}
