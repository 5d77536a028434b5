//! Geometry extraction: landmark regions to named anchor points.
//!
//! Every anchor always resolves to a concrete point. A region the
//! detector omitted (or returned without any finite point) is replaced by
//! a fixed position derived from the face bounding box, so the
//! measurement stages never see absence.
//!
//! Contour-derived anchors are picked at proportional indices rather than
//! fixed ones, which keeps them stable across detectors that emit contour
//! sequences of different lengths.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{EngineConfig, FaceBoundingBox, LandmarkRegion, LandmarkSet, Point};

/// Contour position of the left cheek anchor.
pub const LEFT_CHEEK_FRACTION: f64 = 0.20;
/// Contour position of the right cheek anchor.
pub const RIGHT_CHEEK_FRACTION: f64 = 0.80;
/// Contour position of the left jaw anchor.
pub const JAW_LEFT_FRACTION: f64 = 0.35;
/// Contour position of the right jaw anchor.
pub const JAW_RIGHT_FRACTION: f64 = 0.65;

/// Fallback brow inset from the box sides, as a fraction of width.
const BROW_FALLBACK_INSET: f64 = 0.3;
/// Fallback brow height below the box top, as a fraction of height.
const BROW_FALLBACK_DROP: f64 = 0.35;

/// Named reference points used for measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorPoints {
    /// Brow midpoint lifted toward the hairline.
    pub forehead: Point,
    /// Centre of the lower-x eyebrow.
    pub left_brow: Point,
    /// Centre of the higher-x eyebrow.
    pub right_brow: Point,
    /// Contour point at [`LEFT_CHEEK_FRACTION`].
    pub left_cheek: Point,
    /// Contour point at [`RIGHT_CHEEK_FRACTION`].
    pub right_cheek: Point,
    /// Contour point at [`JAW_LEFT_FRACTION`].
    pub jaw_left: Point,
    /// Contour point at [`JAW_RIGHT_FRACTION`].
    pub jaw_right: Point,
    /// Contour midpoint.
    pub chin: Point,
}

/// Index at `fraction` of a sequence of length `len`.
///
/// Rounds to the nearest index and clamps to the last element. Returns
/// `None` for an empty sequence.
#[must_use]
pub fn proportional_index(len: usize, fraction: f64) -> Option<usize> {
    let last = len.checked_sub(1)?;
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let index = (fraction * len as f64).round() as usize;
    Some(index.min(last))
}

/// Resolve every anchor from `landmarks`, falling back to positions on
/// `face` for anything missing.
///
/// Never fails. Non-finite landmark points are dropped before any anchor
/// is chosen.
#[must_use]
pub fn extract_anchors(
    landmarks: &LandmarkSet,
    face: &FaceBoundingBox,
    config: &EngineConfig,
) -> AnchorPoints {
    let width = face.width();
    let height = face.height();

    let left_brow = resolve(
        "left_brow",
        Point::centroid(&landmarks.finite_points(LandmarkRegion::LeftEyebrow)),
        Point::new(
            width.mul_add(BROW_FALLBACK_INSET, face.min_x),
            height.mul_add(BROW_FALLBACK_DROP, face.min_y),
        ),
    );
    let right_brow = resolve(
        "right_brow",
        Point::centroid(&landmarks.finite_points(LandmarkRegion::RightEyebrow)),
        Point::new(
            width.mul_add(-BROW_FALLBACK_INSET, face.max_x),
            height.mul_add(BROW_FALLBACK_DROP, face.min_y),
        ),
    );

    let brow_mid = left_brow.midpoint(right_brow);
    let forehead = Point::new(
        brow_mid.x,
        height.mul_add(-config.forehead_lift, brow_mid.y),
    );

    let contour = landmarks.finite_points(LandmarkRegion::FaceContour);
    let at = |fraction: f64| proportional_index(contour.len(), fraction).map(|i| contour[i]);

    let left_cheek = resolve(
        "left_cheek",
        at(LEFT_CHEEK_FRACTION),
        Point::new(face.min_x, face.center_y()),
    );
    let right_cheek = resolve(
        "right_cheek",
        at(RIGHT_CHEEK_FRACTION),
        Point::new(face.max_x, face.center_y()),
    );
    let jaw_left = resolve(
        "jaw_left",
        at(JAW_LEFT_FRACTION),
        Point::new(face.min_x, face.max_y),
    );
    let jaw_right = resolve(
        "jaw_right",
        at(JAW_RIGHT_FRACTION),
        Point::new(face.max_x, face.max_y),
    );
    let chin = resolve(
        "chin",
        contour.get(contour.len() / 2).copied(),
        Point::new(face.center_x(), face.max_y),
    );

    AnchorPoints {
        forehead,
        left_brow,
        right_brow,
        left_cheek,
        right_cheek,
        jaw_left,
        jaw_right,
        chin,
    }
}

fn resolve(name: &str, found: Option<Point>, fallback: Point) -> Point {
    found.unwrap_or_else(|| {
        debug!(anchor = name, x = fallback.x, y = fallback.y, "anchor defaulted from bounding box");
        fallback
    })
}
