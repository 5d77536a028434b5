//! Dimension calculation: anchor points to five scalar measurements.
//!
//! Every value is non-negative by construction (distances and a clamped
//! arccosine). Coincident anchors produce zero widths or a defined angle
//! rather than an error.

use crate::anchors::AnchorPoints;
use crate::types::{FaceBoundingBox, FaceDimensions, Point};

/// Smallest denominator allowed in the jaw-angle cosine.
const MIN_NORM_PRODUCT: f64 = 1.0;

/// Measure the face from its anchors.
///
/// `face_length` runs from the higher of the forehead anchor and the box
/// top down to the chin.
#[must_use]
pub fn measure(anchors: &AnchorPoints, face: &FaceBoundingBox) -> FaceDimensions {
    let top = anchors.forehead.y.min(face.min_y);
    FaceDimensions {
        forehead_width: anchors.left_brow.distance(anchors.right_brow),
        cheekbone_width: anchors.left_cheek.distance(anchors.right_cheek),
        jaw_width: anchors.jaw_left.distance(anchors.jaw_right),
        face_length: (anchors.chin.y - top).abs(),
        jaw_angle: jaw_angle(anchors.chin, anchors.jaw_left, anchors.jaw_right),
    }
}

/// Angle at `chin` between the rays to `jaw_left` and `jaw_right`.
///
/// Uses `acos(clamp(dot / max(|v1||v2|, 1), -1, 1))`, so the result is
/// always within `[0, π]`.
#[must_use]
pub fn jaw_angle(chin: Point, jaw_left: Point, jaw_right: Point) -> f64 {
    let (lx, ly) = (jaw_left.x - chin.x, jaw_left.y - chin.y);
    let (rx, ry) = (jaw_right.x - chin.x, jaw_right.y - chin.y);
    let dot = lx.mul_add(rx, ly * ry);
    let norms = chin.distance(jaw_left) * chin.distance(jaw_right);
    (dot / norms.max(MIN_NORM_PRODUCT)).clamp(-1.0, 1.0).acos()
}
