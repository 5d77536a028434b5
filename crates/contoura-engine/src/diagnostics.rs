//! Analysis diagnostics: timing and per-stage metrics.
//!
//! [`analyze_with_diagnostics`] produces the same result as
//! [`analyze`](crate::analyze) and records how long each stage took and
//! what it saw along the way. The engine does no I/O, so time comes from
//! a caller-supplied [`Clock`].
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::tone::{RegionSampler, SampleRect, sample_rect};
use crate::types::{
    AnalysisResult, EngineConfig, EngineError, FaceBoundingBox, LandmarkRegion, LandmarkSet,
    ShapeLabel, SkinTone, Undertone,
};
use crate::{anchors, classify, dimensions, insights, overlay, recommend, tone};

/// Source of monotonic time for stage measurements.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisDiagnostics {
    /// Anchor extraction.
    pub extract: StageDiagnostics,
    /// Dimension measurement.
    pub measure: StageDiagnostics,
    /// Shape classification.
    pub classify: StageDiagnostics,
    /// Tone sampling.
    pub sample: StageDiagnostics,
    /// Overlay generation.
    pub overlay: StageDiagnostics,
    /// Recommendation lookup.
    pub recommend: StageDiagnostics,
    /// Insights (only when `config.include_insights == true`).
    pub insights: Option<StageDiagnostics>,
    /// Total wall-clock duration of the analysis (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Headline results.
    pub summary: AnalysisSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Anchor extraction metrics.
    Extract {
        /// Finite points in the face contour.
        contour_points: usize,
        /// Finite points in the left eyebrow.
        left_brow_points: usize,
        /// Finite points in the right eyebrow.
        right_brow_points: usize,
        /// Non-finite points dropped across all regions.
        ignored_points: usize,
    },
    /// Dimension measurement metrics.
    Measure {
        /// Face length in pixels.
        face_length: f64,
        /// Cheekbone width in pixels.
        cheekbone_width: f64,
        /// Jaw angle in degrees.
        jaw_angle_degrees: f64,
    },
    /// Shape classification metrics.
    Classify {
        /// Name of the matched rule.
        rule: String,
        /// Face length over mean width.
        length_ratio: f64,
        /// Cheekbone width over jaw width.
        cheek_to_jaw: f64,
        /// Forehead width over jaw width.
        forehead_to_jaw: f64,
    },
    /// Tone sampling metrics.
    Sample {
        /// Image width in pixels.
        image_width: u32,
        /// Image height in pixels.
        image_height: u32,
        /// Sampled rectangle, `None` when the fallback tone was used.
        rect: Option<SampleRect>,
        /// Sampled colour as `#RRGGBB`.
        sample_hex: String,
    },
    /// Overlay generation metrics.
    Overlay {
        /// Number of zones produced.
        zone_count: usize,
        /// Total vertices across all zones.
        point_count: usize,
    },
    /// Recommendation metrics.
    Recommend {
        /// Number of category records.
        record_count: usize,
    },
    /// Insights metrics.
    Insights {
        /// Left/right symmetry score.
        symmetry_score: f64,
        /// Number of feature ratios reported.
        feature_ratio_count: usize,
    },
}

/// Headline results of the analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Face shape label.
    pub face_shape: ShapeLabel,
    /// Skin tone label.
    pub skin_tone: SkinTone,
    /// Undertone label.
    pub undertone: Undertone,
}

fn timed<C: Clock, T>(clock: &C, stage: impl FnOnce() -> T) -> (T, Duration) {
    let start = clock.now();
    let value = stage();
    (value, clock.elapsed(&start))
}

/// Run the analysis and collect diagnostics for every stage.
///
/// # Errors
///
/// Same as [`analyze`](crate::analyze): an invalid config or a face box
/// with non-finite coordinates.
pub fn analyze_with_diagnostics<S, C>(
    landmarks: &LandmarkSet,
    face: &FaceBoundingBox,
    image: &S,
    config: &EngineConfig,
    clock: &C,
) -> Result<(AnalysisResult, AnalysisDiagnostics), EngineError>
where
    S: RegionSampler + ?Sized,
    C: Clock,
{
    config.validate()?;
    if !face.is_finite() {
        return Err(EngineError::NonFiniteBoundingBox);
    }
    let total_start = clock.now();

    let (anchors, extract_duration) =
        timed(clock, || anchors::extract_anchors(landmarks, face, config));
    let extract = StageDiagnostics {
        duration: extract_duration,
        metrics: StageMetrics::Extract {
            contour_points: landmarks.finite_points(LandmarkRegion::FaceContour).len(),
            left_brow_points: landmarks.finite_points(LandmarkRegion::LeftEyebrow).len(),
            right_brow_points: landmarks.finite_points(LandmarkRegion::RightEyebrow).len(),
            ignored_points: landmarks.non_finite_count(),
        },
    };

    let (dims, measure_duration) = timed(clock, || dimensions::measure(&anchors, face));
    let measure = StageDiagnostics {
        duration: measure_duration,
        metrics: StageMetrics::Measure {
            face_length: dims.face_length,
            cheekbone_width: dims.cheekbone_width,
            jaw_angle_degrees: dims.jaw_angle.to_degrees(),
        },
    };

    let (classification, classify_duration) =
        timed(clock, || classify::classify_with_rule(&dims));
    let classify = StageDiagnostics {
        duration: classify_duration,
        metrics: StageMetrics::Classify {
            rule: classification.rule.to_owned(),
            length_ratio: classification.ratios.length_ratio,
            cheek_to_jaw: classification.ratios.cheek_to_jaw,
            forehead_to_jaw: classification.ratios.forehead_to_jaw,
        },
    };
    let shape = classification.label;

    let (tone, sample_duration) = timed(clock, || tone::sample_tone(image, face, config));
    let (image_width, image_height) = image.size();
    let sample = StageDiagnostics {
        duration: sample_duration,
        metrics: StageMetrics::Sample {
            image_width,
            image_height,
            rect: sample_rect(face, (image_width, image_height), &config.sample_region),
            sample_hex: tone.sample_rgb.to_hex(),
        },
    };

    let (overlay, overlay_duration) = timed(clock, || overlay::generate_overlay(shape, face));
    let overlay_diag = StageDiagnostics {
        duration: overlay_duration,
        metrics: StageMetrics::Overlay {
            zone_count: overlay.zones.len(),
            point_count: overlay.zones.values().map(overlay::Polygon::len).sum(),
        },
    };

    let (recommendations, recommend_duration) = timed(clock, || {
        recommend::build_recommendations(shape, tone.undertone)
    });
    let recommend = StageDiagnostics {
        duration: recommend_duration,
        metrics: StageMetrics::Recommend {
            record_count: recommendations.len(),
        },
    };

    let (insights, insights_diag) = if config.include_insights {
        let (built, duration) = timed(clock, || {
            insights::build_insights(landmarks, face, &anchors, &dims, &tone, shape)
        });
        let diag = StageDiagnostics {
            duration,
            metrics: StageMetrics::Insights {
                symmetry_score: built.symmetry_score,
                feature_ratio_count: built.feature_ratios.len(),
            },
        };
        (Some(built), Some(diag))
    } else {
        (None, None)
    };

    let result = AnalysisResult {
        dimensions: dims,
        face_shape: shape,
        skin_tone: tone.tone,
        undertone: tone.undertone,
        skin_sample_rgb: tone.sample_rgb,
        overlay,
        recommendations,
        insights,
    };
    let diagnostics = AnalysisDiagnostics {
        extract,
        measure,
        classify,
        sample,
        overlay: overlay_diag,
        recommend,
        insights: insights_diag,
        total_duration: clock.elapsed(&total_start),
        summary: AnalysisSummary {
            face_shape: shape,
            skin_tone: tone.tone,
            undertone: tone.undertone,
        },
    };
    Ok((result, diagnostics))
}

impl AnalysisDiagnostics {
    /// Stages in execution order, skipping any that did not run.
    #[must_use]
    pub fn stages(&self) -> Vec<(&'static str, &StageDiagnostics)> {
        let mut stages = vec![
            ("Extract", &self.extract),
            ("Measure", &self.measure),
            ("Classify", &self.classify),
            ("Sample", &self.sample),
            ("Overlay", &self.overlay),
            ("Recommend", &self.recommend),
        ];
        if let Some(ref insights) = self.insights {
            stages.push(("Insights", insights));
        }
        stages
    }

    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Analysis Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Result: {} face, {} skin, {} undertone",
            self.summary.face_shape, self.summary.skin_tone, self.summary.undertone,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for (name, diag) in self.stages() {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
#[must_use]
pub fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Extract {
            contour_points,
            left_brow_points,
            right_brow_points,
            ignored_points,
        } => format!(
            "contour={contour_points} brows={left_brow_points}/{right_brow_points} ignored={ignored_points}",
        ),
        StageMetrics::Measure {
            face_length,
            cheekbone_width,
            jaw_angle_degrees,
        } => format!(
            "length={face_length:.1}px cheeks={cheekbone_width:.1}px jaw={jaw_angle_degrees:.1}°",
        ),
        StageMetrics::Classify {
            rule,
            length_ratio,
            cheek_to_jaw,
            forehead_to_jaw,
        } => format!(
            "{rule} (length={length_ratio:.3} cheek/jaw={cheek_to_jaw:.3} forehead/jaw={forehead_to_jaw:.3})",
        ),
        StageMetrics::Sample {
            image_width,
            image_height,
            rect,
            sample_hex,
        } => match rect {
            Some(r) => format!(
                "{image_width}x{image_height} rect=[{},{})x[{},{}) {sample_hex}",
                r.left, r.right, r.top, r.bottom,
            ),
            None => format!("{image_width}x{image_height} fallback {sample_hex}"),
        },
        StageMetrics::Overlay {
            zone_count,
            point_count,
        } => format!("{zone_count} zones, {point_count} pts"),
        StageMetrics::Recommend { record_count } => format!("{record_count} records"),
        StageMetrics::Insights {
            symmetry_score,
            feature_ratio_count,
        } => format!("symmetry={symmetry_score:.3} ratios={feature_ratio_count}"),
    }
}
