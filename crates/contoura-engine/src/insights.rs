//! Insights: symmetry, balance, feature ratios, and a tone summary.
//!
//! Every score is in `[0, 1]` and every part falls back to a bounding-box
//! derived value when its landmarks are missing, so this stage never fails.

use serde::{Deserialize, Serialize};

use crate::anchors::AnchorPoints;
use crate::types::{
    FaceBoundingBox, FaceDimensions, LandmarkRegion, LandmarkSet, Point, ShapeLabel, ToneResult,
    Undertone,
};

/// Floor for every ratio denominator.
const MIN_DENOMINATOR: f64 = 1e-6;
/// Brow balance reported when either eyebrow is missing.
const MISSING_BROW_SCORE: f64 = 0.8;
/// Brow height difference is scaled by this before scoring.
const BROW_DELTA_GAIN: f64 = 3.0;
/// Jaw angle (degrees) mapped to a zero normalized jaw definition.
const JAW_DEFINITION_FLOOR_DEGREES: f64 = 25.0;
/// Width of the jaw-angle window (degrees) that maps onto `[0, 1]`.
const JAW_DEFINITION_SPAN_DEGREES: f64 = 25.0;

/// Everything the insights stage reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    /// 1.0 for a mirror-symmetric face, falling towards 0.
    pub symmetry_score: f64,
    /// Short label for the symmetry score.
    pub symmetry_description: String,
    /// Eye line tilt in degrees.
    pub eye_alignment_difference: f64,
    /// Application advice matching the symmetry score.
    pub guidance: String,
    /// How level the brows sit, in `[0, 1]`.
    pub brow_balance_score: f64,
    /// Peaks at 1.0 for a jaw angle of 37.5°.
    pub jaw_definition_score: f64,
    /// Width-to-length proportions against reference values.
    pub feature_ratios: Vec<FeatureRatio>,
    /// Display summary of the skin sample.
    pub tone_summary: ToneSummary,
    /// Shape the insights were computed for.
    pub face_shape: ShapeLabel,
}

/// Left/right balance of the face around the nose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symmetry {
    /// Symmetry score in `[0, 1]`.
    pub score: f64,
    /// Short label for the score.
    pub description: String,
    /// Application advice for the score.
    pub guidance: String,
    /// Eye line tilt in degrees.
    pub eye_alignment_degrees: f64,
}

/// One measured proportion compared against its reference value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRatio {
    /// Display name of the proportion.
    pub name: String,
    /// Measured ratio.
    pub value: f64,
    /// Reference ratio.
    pub ideal: f64,
    /// `value - ideal`.
    pub delta: f64,
    /// Guidance for this deviation.
    pub message: String,
}

/// Display-oriented summary of the skin sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToneSummary {
    /// Uppercase `#RRGGBB`.
    pub hex: String,
    /// Descriptive words for the undertone.
    pub keywords: Vec<String>,
    /// Product finish suggestions for the undertone.
    pub finish_tips: Vec<String>,
}

/// Run every insight over one analysis.
#[must_use]
pub fn build_insights(
    landmarks: &LandmarkSet,
    face: &FaceBoundingBox,
    anchors: &AnchorPoints,
    dimensions: &FaceDimensions,
    tone: &ToneResult,
    shape: ShapeLabel,
) -> Insights {
    let symmetry = compute_symmetry(landmarks, face, anchors);
    Insights {
        symmetry_score: symmetry.score,
        symmetry_description: symmetry.description,
        eye_alignment_difference: symmetry.eye_alignment_degrees,
        guidance: symmetry.guidance,
        brow_balance_score: compute_brow_balance(landmarks, face, anchors),
        jaw_definition_score: compute_jaw_definition(dimensions.jaw_angle),
        feature_ratios: build_feature_ratios(dimensions),
        tone_summary: build_tone_summary(tone),
        face_shape: shape,
    }
}

fn region_centroid(landmarks: &LandmarkSet, region: LandmarkRegion) -> Option<Point> {
    Point::centroid(&landmarks.finite_points(region))
}

/// Compare the cheek anchors' distances to the nose, and the eye heights.
#[must_use]
pub fn compute_symmetry(
    landmarks: &LandmarkSet,
    face: &FaceBoundingBox,
    anchors: &AnchorPoints,
) -> Symmetry {
    let nose = region_centroid(landmarks, LandmarkRegion::NoseBottom)
        .unwrap_or_else(|| Point::new(face.center_x(), face.center_y()));
    let left = anchors.left_cheek.distance(nose);
    let right = anchors.right_cheek.distance(nose);
    let delta = (left - right).abs() / left.max(right).max(MIN_DENOMINATOR);
    let score = (1.0 - delta.min(1.0)).max(0.0);

    let description = if score >= 0.9 {
        "Highly balanced proportions across both sides of the face."
    } else if score >= 0.75 {
        "Soft asymmetric accents add character and are easy to balance."
    } else {
        "Cheek widths vary more noticeably; thoughtful contour can even things out."
    };
    let guidance = if score >= 0.85 {
        "Mirror highlight and blush placement to emphasize your natural balance."
    } else if score >= 0.65 {
        "Concentrate highlight on the higher cheekbone and blend contour upward on the fuller side."
    } else {
        "Use diagonal blush placement and tapered contour strokes to visually lift the softer side."
    };

    let left_eye = region_centroid(landmarks, LandmarkRegion::LeftEye)
        .unwrap_or_else(|| Point::new(face.min_x, nose.y));
    let right_eye = region_centroid(landmarks, LandmarkRegion::RightEye)
        .unwrap_or_else(|| Point::new(face.max_x, nose.y));
    let eye_delta = (left_eye.y - right_eye.y).abs();
    let eye_alignment_degrees = eye_delta
        .atan2(face.width().max(MIN_DENOMINATOR))
        .to_degrees();

    Symmetry {
        score,
        description: description.to_owned(),
        guidance: guidance.to_owned(),
        eye_alignment_degrees,
    }
}

/// Score how level the brows sit, relative to face height.
#[must_use]
pub fn compute_brow_balance(
    landmarks: &LandmarkSet,
    face: &FaceBoundingBox,
    anchors: &AnchorPoints,
) -> f64 {
    if landmarks.is_missing(LandmarkRegion::LeftEyebrow)
        || landmarks.is_missing(LandmarkRegion::RightEyebrow)
    {
        return MISSING_BROW_SCORE;
    }
    let delta =
        (anchors.left_brow.y - anchors.right_brow.y).abs() / face.height().max(MIN_DENOMINATOR);
    (1.0 - (delta * BROW_DELTA_GAIN).min(1.0)).max(0.0)
}

/// Peaks at 1.0 for a jaw angle of 37.5° and falls to 0.5 outside 25°..50°.
#[must_use]
pub fn compute_jaw_definition(jaw_angle: f64) -> f64 {
    let normalized = ((jaw_angle - JAW_DEFINITION_FLOOR_DEGREES.to_radians())
        / JAW_DEFINITION_SPAN_DEGREES.to_radians())
    .clamp(0.0, 1.0);
    1.0 - (normalized - 0.5).abs()
}

fn feature_ratio(
    name: &str,
    value: f64,
    ideal: f64,
    message: impl Fn(f64) -> &'static str,
) -> FeatureRatio {
    let delta = value - ideal;
    FeatureRatio {
        name: name.to_owned(),
        value,
        ideal,
        delta,
        message: message(delta).to_owned(),
    }
}

/// Face length, forehead, and cheekbone proportions against reference values.
#[must_use]
pub fn build_feature_ratios(dimensions: &FaceDimensions) -> Vec<FeatureRatio> {
    let jaw = dimensions.jaw_width.max(MIN_DENOMINATOR);
    vec![
        feature_ratio(
            "Face length vs. width",
            dimensions.face_length / dimensions.cheekbone_width.max(MIN_DENOMINATOR),
            1.33,
            |delta| {
                if delta > 0.15 {
                    "Elongated"
                } else if delta.abs() < 0.05 {
                    "Balanced"
                } else {
                    "Softly wider"
                }
            },
        ),
        feature_ratio(
            "Forehead vs. jaw width",
            dimensions.forehead_width / jaw,
            1.0,
            |delta| {
                if delta > 0.1 {
                    "Stronger forehead"
                } else if delta.abs() < 0.05 {
                    "Even width"
                } else {
                    "Defined jaw"
                }
            },
        ),
        feature_ratio(
            "Cheekbone vs. jaw width",
            dimensions.cheekbone_width / jaw,
            1.05,
            |delta| {
                if delta > 0.1 {
                    "Pronounced cheekbones"
                } else if delta.abs() < 0.05 {
                    "Balanced"
                } else {
                    "Softer cheeks"
                }
            },
        ),
    ]
}

const fn undertone_keywords(undertone: Undertone) -> [&'static str; 3] {
    match undertone {
        Undertone::Warm => ["Golden", "Sunlit", "Honey"],
        Undertone::Cool => ["Rosy", "Berry", "Icy"],
        Undertone::Neutral => ["Balanced", "Adaptive", "Versatile"],
    }
}

const fn finish_tips(undertone: Undertone) -> [&'static str; 2] {
    match undertone {
        Undertone::Warm => [
            "Lean toward softly glazed or dewy finishes to amplify warmth.",
            "Use bronze or caramel contour shades for seamless blending.",
        ],
        Undertone::Cool => [
            "Pearl or opal highlights complement cooler undertones.",
            "Cool mauve or berry lip finishes add balance.",
        ],
        Undertone::Neutral => [
            "You can mix warm and cool blushes to shift the look effortlessly.",
            "Try satin finishes for contour to maintain flexibility.",
        ],
    }
}

/// Hex colour, keywords, and finish tips for the sampled tone.
#[must_use]
pub fn build_tone_summary(tone: &ToneResult) -> ToneSummary {
    ToneSummary {
        hex: tone.sample_rgb.to_hex(),
        keywords: undertone_keywords(tone.undertone)
            .into_iter()
            .map(str::to_owned)
            .collect(),
        finish_tips: finish_tips(tone.undertone)
            .into_iter()
            .map(str::to_owned)
            .collect(),
    }
}
