//! contoura-engine: Facial geometry and tone classification (sans-IO).
//!
//! Turns detector landmarks, a face bounding box, and the decoded image
//! into:
//! anchors -> dimensions -> face shape -> {overlay zones, recommendations},
//! with the skin tone sampled independently from the same box.
//!
//! This crate has **no I/O dependencies**. Landmark detection and image
//! decoding belong to the caller; pixels are read through the
//! [`RegionSampler`] trait. Every stage is a pure function of its inputs,
//! so one analysis can run on any thread alongside others.

pub mod anchors;
pub mod classify;
pub mod color;
pub mod diagnostics;
pub mod dimensions;
pub mod insights;
pub mod overlay;
pub mod recommend;
pub mod tone;
pub mod types;

pub use anchors::AnchorPoints;
pub use overlay::{Overlay, Polygon, ZoneName};
pub use recommend::{Category, RecommendationRecord};
pub use tone::{RegionSampler, SampleRect};
pub use types::{
    AnalysisResult, Detection, EngineConfig, EngineError, FaceBoundingBox, FaceDimensions,
    LandmarkRegion, LandmarkSet, Point, Rgb, SampleRegion, ShapeLabel, SkinTone, ToneResult,
    Undertone,
};

/// Run the full analysis.
///
/// # Pipeline steps
///
/// 1. Extract anchor points from the landmarks (box fallbacks for gaps)
/// 2. Measure the five face dimensions
/// 3. Classify the face shape
/// 4. Sample and classify the skin tone
/// 5. Lay out the overlay zones for the shape
/// 6. Look up recommendations for the shape and undertone
/// 7. Optional insights
///
/// # Errors
///
/// Returns [`EngineError::InvalidConfig`] if `config` fails validation.
/// Returns [`EngineError::NonFiniteBoundingBox`] if any coordinate of
/// `face` is NaN or infinite. Degenerate but finite boxes are accepted
/// and produce fallback results.
pub fn analyze<S>(
    landmarks: &LandmarkSet,
    face: &FaceBoundingBox,
    image: &S,
    config: &EngineConfig,
) -> Result<AnalysisResult, EngineError>
where
    S: RegionSampler + ?Sized,
{
    config.validate()?;
    if !face.is_finite() {
        return Err(EngineError::NonFiniteBoundingBox);
    }

    let anchors = anchors::extract_anchors(landmarks, face, config);
    let dims = dimensions::measure(&anchors, face);
    let shape = classify::classify(&dims);
    let tone = tone::sample_tone(image, face, config);
    let overlay = overlay::generate_overlay(shape, face);
    let recommendations = recommend::build_recommendations(shape, tone.undertone);
    let insights = config
        .include_insights
        .then(|| insights::build_insights(landmarks, face, &anchors, &dims, &tone, shape));

    Ok(AnalysisResult {
        dimensions: dims,
        face_shape: shape,
        skin_tone: tone.tone,
        undertone: tone.undertone,
        skin_sample_rgb: tone.sample_rgb,
        overlay,
        recommendations,
        insights,
    })
}
