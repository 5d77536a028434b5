//! Shared types for the contoura analysis engine.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::insights::Insights;
use crate::overlay::Overlay;
use crate::recommend::{Category, RecommendationRecord};

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Point halfway between `self` and `other`.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Returns `true` if both coordinates are finite.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Arithmetic mean of `points`, or `None` for an empty slice.
    #[must_use]
    pub fn centroid(points: &[Self]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = points.len() as f64;
        let (sx, sy) = points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Some(Self::new(sx / n, sy / n))
    }
}

/// Axis-aligned face rectangle in pixel coordinates.
///
/// Non-degenerate boxes satisfy `min_x < max_x` and `min_y < max_y`.
/// Degenerate boxes are representable: every stage has a documented
/// result for them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBoundingBox {
    /// Left edge.
    pub min_x: f64,
    /// Top edge.
    pub min_y: f64,
    /// Right edge.
    pub max_x: f64,
    /// Bottom edge.
    pub max_y: f64,
}

impl FaceBoundingBox {
    /// Create a bounding box from its edges.
    #[must_use]
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Horizontal extent (`max_x - min_x`), negative for inverted boxes.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Vertical extent (`max_y - min_y`), negative for inverted boxes.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Horizontal centre.
    #[must_use]
    pub fn center_x(&self) -> f64 {
        (self.min_x + self.max_x) / 2.0
    }

    /// Vertical centre.
    #[must_use]
    pub fn center_y(&self) -> f64 {
        (self.min_y + self.max_y) / 2.0
    }

    /// Returns `true` if all four edges are finite.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
    }

    /// Returns `true` if the box has non-positive area or a non-finite edge.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !(self.is_finite() && self.width() > 0.0 && self.height() > 0.0)
    }

    /// Edges as `[min_x, min_y, max_x, max_y]`.
    #[must_use]
    pub const fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

/// A named group of detector landmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkRegion {
    /// Outline of the face, ordered around the perimeter.
    FaceContour,
    /// Eyebrow on the lower-x side of the image.
    LeftEyebrow,
    /// Eyebrow on the higher-x side of the image.
    RightEyebrow,
    /// Eye outline on the lower-x side of the image.
    LeftEye,
    /// Eye outline on the higher-x side of the image.
    RightEye,
    /// Ridge of the nose.
    NoseBridge,
    /// Underside of the nose.
    NoseBottom,
    /// Upper lip outline.
    UpperLip,
    /// Lower lip outline.
    LowerLip,
}

impl LandmarkRegion {
    /// Every region the engine reads.
    pub const ALL: [Self; 9] = [
        Self::FaceContour,
        Self::LeftEyebrow,
        Self::RightEyebrow,
        Self::LeftEye,
        Self::RightEye,
        Self::NoseBridge,
        Self::NoseBottom,
        Self::UpperLip,
        Self::LowerLip,
    ];

    /// Detector key of the region.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FaceContour => "face_contour",
            Self::LeftEyebrow => "left_eyebrow",
            Self::RightEyebrow => "right_eyebrow",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::NoseBridge => "nose_bridge",
            Self::NoseBottom => "nose_bottom",
            Self::UpperLip => "upper_lip",
            Self::LowerLip => "lower_lip",
        }
    }

    /// Region for a detector key, or `None` for keys the engine ignores.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|region| region.as_str() == key)
    }
}

/// Landmark regions reported by the external detector.
///
/// Any region may be missing; [`region`](Self::region) returns an empty
/// slice for those. The set is built once and not mutated afterwards.
///
/// Deserializing skips regions the engine does not read (a detector may
/// report pupils or a median line), whatever their value shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    regions: BTreeMap<LandmarkRegion, Vec<Point>>,
}

impl LandmarkSet {
    /// Create an empty landmark set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            regions: BTreeMap::new(),
        }
    }

    /// Return a copy of the set with `region` replaced by `points`.
    #[must_use]
    pub fn with_region(mut self, region: LandmarkRegion, points: Vec<Point>) -> Self {
        self.regions.insert(region, points);
        self
    }

    /// Points of `region`, or an empty slice when absent.
    #[must_use]
    pub fn region(&self, region: LandmarkRegion) -> &[Point] {
        self.regions
            .get(&region)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Finite points of `region`, in detector order.
    #[must_use]
    pub fn finite_points(&self, region: LandmarkRegion) -> Vec<Point> {
        self.region(region)
            .iter()
            .copied()
            .filter(|p| p.is_finite())
            .collect()
    }

    /// Returns `true` if `region` has no finite points.
    #[must_use]
    pub fn is_missing(&self, region: LandmarkRegion) -> bool {
        !self.region(region).iter().any(|p| p.is_finite())
    }

    /// Number of non-finite points across every region.
    #[must_use]
    pub fn non_finite_count(&self) -> usize {
        self.regions
            .values()
            .flatten()
            .filter(|p| !p.is_finite())
            .count()
    }
}

impl FromIterator<(LandmarkRegion, Vec<Point>)> for LandmarkSet {
    fn from_iter<I: IntoIterator<Item = (LandmarkRegion, Vec<Point>)>>(iter: I) -> Self {
        Self {
            regions: iter.into_iter().collect(),
        }
    }
}

impl<'de> Deserialize<'de> for LandmarkSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(LandmarkSetVisitor)
    }
}

struct LandmarkSetVisitor;

impl<'de> serde::de::Visitor<'de> for LandmarkSetVisitor {
    type Value = LandmarkSet;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of landmark region names to point lists")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut regions = BTreeMap::new();
        while let Some(key) = map.next_key::<String>()? {
            if let Some(region) = LandmarkRegion::from_key(&key) {
                regions.insert(region, map.next_value::<Vec<Point>>()?);
            } else {
                map.next_value::<serde::de::IgnoredAny>()?;
                debug!(region = %key, "ignoring unrecognized landmark region");
            }
        }
        Ok(LandmarkSet { regions })
    }
}

/// One face as reported by the landmark detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Face rectangle in pixel coordinates.
    pub bounding_box: FaceBoundingBox,
    /// Named landmark regions; any may be absent.
    #[serde(default)]
    pub landmarks: LandmarkSet,
}

/// Five scalar face measurements derived from anchor points.
///
/// All values are non-negative; `jaw_angle` is in radians within `[0, π]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceDimensions {
    /// Distance between the brow anchors.
    pub forehead_width: f64,
    /// Distance between the cheek anchors.
    pub cheekbone_width: f64,
    /// Distance between the jaw anchors.
    pub jaw_width: f64,
    /// Vertical extent from the topmost reference point to the chin.
    pub face_length: f64,
    /// Angle at the chin between the two jaw anchors (radians).
    pub jaw_angle: f64,
}

/// Discrete face shape label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeLabel {
    /// Width and length roughly equal, soft jaw.
    Round,
    /// Slightly longer than wide, balanced widths.
    Oval,
    /// Angular jaw.
    Square,
    /// Wide cheekbones tapering to a narrow jaw.
    Heart,
    /// Noticeably longer than wide.
    Oblong,
    /// Long with wide cheekbones and a narrow forehead.
    Diamond,
}

impl ShapeLabel {
    /// Every label, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Round,
        Self::Oval,
        Self::Square,
        Self::Heart,
        Self::Oblong,
        Self::Diamond,
    ];

    /// Wire name of the label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Round => "round",
            Self::Oval => "oval",
            Self::Square => "square",
            Self::Heart => "heart",
            Self::Oblong => "oblong",
            Self::Diamond => "diamond",
        }
    }
}

/// Skin tone bucket derived from the Individual Typology Angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkinTone {
    /// ITA ≥ 55°.
    VeryLight,
    /// 41° ≤ ITA < 55°.
    Light,
    /// 28° ≤ ITA < 41°.
    Medium,
    /// 10° ≤ ITA < 28°.
    Tan,
    /// ITA < 10°.
    Deep,
}

impl SkinTone {
    /// Every tone, from lightest to deepest.
    pub const ALL: [Self; 5] = [
        Self::VeryLight,
        Self::Light,
        Self::Medium,
        Self::Tan,
        Self::Deep,
    ];

    /// Wire name of the tone.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VeryLight => "very_light",
            Self::Light => "light",
            Self::Medium => "medium",
            Self::Tan => "tan",
            Self::Deep => "deep",
        }
    }
}

/// Undertone derived from the Lab a*/b* channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Undertone {
    /// Pink or blue leaning.
    Cool,
    /// Neither warm nor cool.
    Neutral,
    /// Yellow or golden leaning.
    Warm,
}

impl Undertone {
    /// Every undertone.
    pub const ALL: [Self; 3] = [Self::Cool, Self::Neutral, Self::Warm];

    /// Wire name of the undertone.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cool => "cool",
            Self::Neutral => "neutral",
            Self::Warm => "warm",
        }
    }
}

macro_rules! impl_label_text {
    ($ty:ty, $kind:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = EngineError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .into_iter()
                    .find(|label| label.as_str() == s)
                    .ok_or_else(|| EngineError::UnknownLabel {
                        kind: $kind,
                        value: s.to_owned(),
                    })
            }
        }
    };
}

impl_label_text!(ShapeLabel, "face shape");
impl_label_text!(SkinTone, "skin tone");
impl_label_text!(Undertone, "undertone");

/// An 8-bit sRGB colour, serialized as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    /// Create a colour from its channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    /// Uppercase `#RRGGBB` form.
    #[must_use]
    pub fn to_hex(self) -> String {
        let [r, g, b] = self.0;
        format!("#{r:02X}{g:02X}{b:02X}")
    }
}

/// Skin tone estimate from a single averaged pixel sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToneResult {
    /// Lightness bucket.
    pub tone: SkinTone,
    /// Undertone bucket.
    pub undertone: Undertone,
    /// The averaged sample the labels were derived from.
    pub sample_rgb: Rgb,
}

impl ToneResult {
    /// Result used when the sample rectangle has no area.
    pub const FALLBACK: Self = Self {
        tone: SkinTone::Medium,
        undertone: Undertone::Neutral,
        sample_rgb: Rgb::new(200, 170, 160),
    };
}

/// Sample rectangle placement, as fractions of the face box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRegion {
    /// Left edge offset from `min_x`, as a fraction of box width.
    pub x_offset: f64,
    /// Top edge offset from `min_y`, as a fraction of box height.
    pub y_offset: f64,
    /// Width as a fraction of box width.
    pub width: f64,
    /// Height as a fraction of box height.
    pub height: f64,
}

impl Default for SampleRegion {
    fn default() -> Self {
        Self {
            x_offset: 0.3,
            y_offset: 0.45,
            width: 0.4,
            height: 0.2,
        }
    }
}

/// Configuration for an analysis run.
///
/// Defaults reproduce the tuned product behaviour; changing them changes
/// labels on boundary cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Where the tone sample is taken inside the face box.
    pub sample_region: SampleRegion,

    /// Upward shift of the forehead anchor from the brow midpoint, as a
    /// fraction of box height.
    pub forehead_lift: f64,

    /// Whether to attach [`Insights`] to the result.
    pub include_insights: bool,
}

impl EngineConfig {
    /// Default upward forehead shift.
    pub const DEFAULT_FOREHEAD_LIFT: f64 = 0.15;

    /// Default for [`include_insights`](Self::include_insights).
    pub const DEFAULT_INCLUDE_INSIGHTS: bool = true;

    /// Check every fraction is finite and keeps the sample inside the box.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] naming the first offending
    /// field.
    pub fn validate(&self) -> Result<(), EngineError> {
        let region = &self.sample_region;
        let fractions = [
            ("sample_region.x_offset", region.x_offset),
            ("sample_region.y_offset", region.y_offset),
            ("sample_region.width", region.width),
            ("sample_region.height", region.height),
            ("forehead_lift", self.forehead_lift),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if region.x_offset + region.width > 1.0 {
            return Err(EngineError::InvalidConfig(
                "sample_region.x_offset + sample_region.width exceeds 1".to_owned(),
            ));
        }
        if region.y_offset + region.height > 1.0 {
            return Err(EngineError::InvalidConfig(
                "sample_region.y_offset + sample_region.height exceeds 1".to_owned(),
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_region: SampleRegion::default(),
            forehead_lift: Self::DEFAULT_FOREHEAD_LIFT,
            include_insights: Self::DEFAULT_INCLUDE_INSIGHTS,
        }
    }
}

/// Result of a full analysis, in the wire shape consumed downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Measurements the shape was classified from.
    pub dimensions: FaceDimensions,
    /// Face shape label.
    pub face_shape: ShapeLabel,
    /// Skin tone label.
    pub skin_tone: SkinTone,
    /// Undertone label.
    pub undertone: Undertone,
    /// Averaged skin sample.
    pub skin_sample_rgb: Rgb,
    /// Application zones in image coordinates.
    pub overlay: Overlay,
    /// Per-category guidance and shade suggestions.
    pub recommendations: BTreeMap<Category, RecommendationRecord>,
    /// Symmetry, balance, and tone summaries (when enabled).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insights: Option<Insights>,
}

impl AnalysisResult {
    /// The tone fields regrouped as a [`ToneResult`].
    #[must_use]
    pub const fn tone(&self) -> ToneResult {
        ToneResult {
            tone: self.skin_tone,
            undertone: self.undertone,
            sample_rgb: self.skin_sample_rgb,
        }
    }
}

/// Errors reported at the engine boundary.
///
/// The stages themselves are total; these cover inputs a caller must
/// reject before analysis.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Engine configuration is invalid.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// The face bounding box has a NaN or infinite edge.
    #[error("face bounding box has non-finite coordinates")]
    NonFiniteBoundingBox,

    /// A label string did not name any known variant.
    #[error("unknown {kind} label: {value:?}")]
    UnknownLabel {
        /// Which label family was being parsed.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}

/// Serde-compatible proxy for `EngineError`.
///
/// `UnknownLabel::kind` is a `&'static str`, which cannot be
/// deserialized; the proxy carries it as an owned string and maps it
/// back onto the known label families.
#[derive(Serialize, Deserialize)]
enum EngineErrorProxy {
    InvalidConfig(String),
    NonFiniteBoundingBox,
    UnknownLabel { kind: String, value: String },
}

impl Serialize for EngineError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::InvalidConfig(s) => EngineErrorProxy::InvalidConfig(s.clone()),
            Self::NonFiniteBoundingBox => EngineErrorProxy::NonFiniteBoundingBox,
            Self::UnknownLabel { kind, value } => EngineErrorProxy::UnknownLabel {
                kind: (*kind).to_owned(),
                value: value.clone(),
            },
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EngineError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = EngineErrorProxy::deserialize(deserializer)?;
        Ok(match proxy {
            EngineErrorProxy::InvalidConfig(s) => Self::InvalidConfig(s),
            EngineErrorProxy::NonFiniteBoundingBox => Self::NonFiniteBoundingBox,
            EngineErrorProxy::UnknownLabel { kind, value } => {
                let kind = match kind.as_str() {
                    "face shape" => "face shape",
                    "skin tone" => "skin tone",
                    "undertone" => "undertone",
                    _ => "label",
                };
                Self::UnknownLabel { kind, value }
            }
        })
    }
}
