//! Overlay generation: per-shape application zones in image coordinates.
//!
//! Zone placement is a fixed design table keyed by [`ShapeLabel`]. The
//! contour zone is a four-point trapezoid; blush and highlight are
//! twelve-point ellipses. All parameters are fractions of the face box,
//! so every zone stays inside it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{FaceBoundingBox, Point, ShapeLabel};

/// Inward slant of the trapezoid's top corners, as a fraction of box width.
const TRAPEZOID_SHOULDER: f64 = 0.05;
/// Angular step between ellipse samples.
const ELLIPSE_STEP_DEGREES: usize = 30;

/// Named application zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneName {
    /// Shading under the cheekbones and along the jaw.
    Contour,
    /// Colour on the cheeks.
    Blush,
    /// Brightening on the high points.
    Highlight,
}

/// Ordered polygon vertices, serialized as `[[x, y], ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon(Vec<Point>);

impl Polygon {
    /// Create a polygon from its vertices.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Number of vertices.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the polygon has no vertices.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Vertices in winding order.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }
}

impl Serialize for Polygon {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let pairs: Vec<[f64; 2]> = self.0.iter().map(|p| [p.x, p.y]).collect();
        pairs.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Polygon {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pairs = Vec::<[f64; 2]>::deserialize(deserializer)?;
        Ok(Self(pairs.into_iter().map(|[x, y]| Point::new(x, y)).collect()))
    }
}

/// Zones for one analysis, plus the box they were laid out in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    /// `[min_x, min_y, max_x, max_y]` of the face box.
    pub bounding_box: [f64; 4],
    /// One polygon per zone; empty when the box is degenerate.
    pub zones: BTreeMap<ZoneName, Polygon>,
}

/// Trapezoid placement, as fractions of the face box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrapezoidParams {
    /// Top edge, down from `min_y`, as a fraction of height.
    pub offset_y: f64,
    /// Height as a fraction of box height.
    pub height: f64,
    /// Bottom corner inset from each side, as a fraction of width.
    pub inset: f64,
}

/// Ellipse placement, as fractions of the face box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EllipseParams {
    /// Centre, down from `min_y`, as a fraction of height.
    pub center_y: f64,
    /// Full width as a fraction of box width.
    pub width: f64,
    /// Full height as a fraction of box height.
    pub height: f64,
}

/// The three zone parameter sets of one face shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneParams {
    /// Contour trapezoid.
    pub contour: TrapezoidParams,
    /// Blush ellipse.
    pub blush: EllipseParams,
    /// Highlight ellipse.
    pub highlight: EllipseParams,
}

const fn zone(
    contour: (f64, f64, f64),
    blush: (f64, f64, f64),
    highlight: (f64, f64, f64),
) -> ZoneParams {
    ZoneParams {
        contour: TrapezoidParams {
            offset_y: contour.0,
            height: contour.1,
            inset: contour.2,
        },
        blush: EllipseParams {
            center_y: blush.0,
            width: blush.1,
            height: blush.2,
        },
        highlight: EllipseParams {
            center_y: highlight.0,
            width: highlight.1,
            height: highlight.2,
        },
    }
}

/// Zone parameters for `shape`.
#[must_use]
pub const fn zone_params(shape: ShapeLabel) -> ZoneParams {
    match shape {
        ShapeLabel::Round => zone((0.35, 0.4, 0.15), (0.55, 0.35, 0.25), (0.4, 0.2, 0.2)),
        ShapeLabel::Oval => zone((0.3, 0.4, 0.18), (0.6, 0.3, 0.2), (0.38, 0.2, 0.18)),
        ShapeLabel::Square => zone((0.3, 0.5, 0.1), (0.58, 0.32, 0.18), (0.38, 0.22, 0.18)),
        ShapeLabel::Heart => zone((0.25, 0.45, 0.12), (0.55, 0.28, 0.18), (0.35, 0.2, 0.2)),
        ShapeLabel::Oblong => zone((0.25, 0.5, 0.18), (0.6, 0.28, 0.18), (0.42, 0.22, 0.18)),
        ShapeLabel::Diamond => zone((0.28, 0.45, 0.1), (0.55, 0.32, 0.2), (0.36, 0.2, 0.18)),
    }
}

/// Four-point trapezoid: bottom-left, top-left, top-right, bottom-right.
#[must_use]
pub fn make_zone(face: &FaceBoundingBox, params: &TrapezoidParams) -> Polygon {
    let (w, h) = (face.width(), face.height());
    let x1 = w.mul_add(params.inset, face.min_x);
    let x2 = w.mul_add(-params.inset, face.max_x);
    let top = h.mul_add(params.offset_y, face.min_y);
    let bottom = h.mul_add(params.height, top);
    let shoulder = w * TRAPEZOID_SHOULDER;
    Polygon::new(vec![
        Point::new(x1, bottom),
        Point::new(x1 + shoulder, top),
        Point::new(x2 - shoulder, top),
        Point::new(x2, bottom),
    ])
}

/// Ellipse centred horizontally in the box, sampled every 30° from 0°.
#[must_use]
pub fn ellipse(face: &FaceBoundingBox, params: &EllipseParams) -> Polygon {
    let (w, h) = (face.width(), face.height());
    let center_x = face.center_x();
    let center_y = h.mul_add(params.center_y, face.min_y);
    let radius_x = w * params.width / 2.0;
    let radius_y = h * params.height / 2.0;
    let points = (0..360u16)
        .step_by(ELLIPSE_STEP_DEGREES)
        .map(|degrees| {
            let (sin, cos) = f64::from(degrees).to_radians().sin_cos();
            Point::new(cos.mul_add(radius_x, center_x), sin.mul_add(radius_y, center_y))
        })
        .collect();
    Polygon::new(points)
}

/// Lay out the contour, blush, and highlight zones for `shape`.
///
/// A degenerate face box produces an overlay with no zones.
#[must_use]
pub fn generate_overlay(shape: ShapeLabel, face: &FaceBoundingBox) -> Overlay {
    let bounding_box = face.to_array();
    if face.is_degenerate() {
        return Overlay {
            bounding_box,
            zones: BTreeMap::new(),
        };
    }
    let params = zone_params(shape);
    let zones = BTreeMap::from([
        (ZoneName::Contour, make_zone(face, &params.contour)),
        (ZoneName::Blush, ellipse(face, &params.blush)),
        (ZoneName::Highlight, ellipse(face, &params.highlight)),
    ]);
    Overlay {
        bounding_box,
        zones,
    }
}
