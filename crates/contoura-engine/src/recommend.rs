//! Recommendation engine: static lookups keyed by face shape and undertone.
//!
//! Both tables are exhaustive matches, so a new [`ShapeLabel`] or
//! [`Undertone`] variant cannot compile until every table covers it.
//! Unknown labels only exist at the string boundary
//! ([`build_recommendations_by_name`]), where they fall back to oval and
//! neutral.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{ShapeLabel, Undertone};

/// Shape used when a shape name is not recognised.
pub const FALLBACK_SHAPE: ShapeLabel = ShapeLabel::Oval;
/// Undertone used when an undertone name is not recognised.
pub const FALLBACK_UNDERTONE: Undertone = Undertone::Neutral;

const CONTOUR_FINISHES: [&str; 3] = ["Soft matte stick", "Sheer cream", "Buildable powder"];
const HIGHLIGHT_FINISHES: [&str; 3] = ["Cream luminizer", "Soft pearl powder", "Liquid glow"];
const EYES_DETAILS: &str =
    "Choose shades that complement your undertone and layer from matte to shimmer.";
const LIPS_DETAILS: &str =
    "Match lip families to undertone; adjust intensity for day or night looks.";

/// Recommendation category, one record each per analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Cheek colour.
    Blush,
    /// Shading along the face outline.
    Contour,
    /// Brightening on the high planes.
    Highlight,
    /// Eyeshadow.
    Eyes,
    /// Lip colour.
    Lips,
}

impl Category {
    /// All categories in output order.
    pub const ALL: [Self; 5] = [
        Self::Blush,
        Self::Contour,
        Self::Highlight,
        Self::Eyes,
        Self::Lips,
    ];
}

/// Categories that carry an undertone-keyed shade palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaletteCategory {
    /// Blush shades.
    Blush,
    /// Eyeshadow shades.
    Eyes,
    /// Lip shades.
    Lips,
}

/// Placement guidance for the three shape-dependent categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeGuidance {
    /// Where to place blush.
    pub blush: &'static str,
    /// Where to place contour.
    pub contour: &'static str,
    /// Where to place highlight.
    pub highlight: &'static str,
}

/// One category's advice. Absent fields are left out of the JSON.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecommendationRecord {
    /// Placement or technique text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Shade names for the sampled undertone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_shades: Option<Vec<String>>,
    /// Product finishes to try.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_finishes: Option<Vec<String>>,
}

impl RecommendationRecord {
    fn with_shades(details: &str, shades: [&str; 3]) -> Self {
        Self {
            details: Some(details.to_owned()),
            suggested_shades: Some(owned(shades)),
            suggested_finishes: None,
        }
    }

    fn with_finishes(details: &str, finishes: [&str; 3]) -> Self {
        Self {
            details: Some(details.to_owned()),
            suggested_shades: None,
            suggested_finishes: Some(owned(finishes)),
        }
    }
}

fn owned(items: [&str; 3]) -> Vec<String> {
    items.iter().map(|&s| s.to_owned()).collect()
}

/// Shade suggestions for `category` under `undertone`.
#[must_use]
pub const fn shade_palette(undertone: Undertone, category: PaletteCategory) -> [&'static str; 3] {
    match (undertone, category) {
        (Undertone::Warm, PaletteCategory::Blush) => ["Peach", "Apricot", "Warm coral"],
        (Undertone::Warm, PaletteCategory::Eyes) => ["Bronze", "Warm taupe", "Olive green"],
        (Undertone::Warm, PaletteCategory::Lips) => ["Terracotta", "Warm nude", "Rust red"],
        (Undertone::Cool, PaletteCategory::Blush) => ["Rose", "Soft berry", "Cool pink"],
        (Undertone::Cool, PaletteCategory::Eyes) => ["Plum", "Soft grey", "Slate blue"],
        (Undertone::Cool, PaletteCategory::Lips) => ["Berry", "Cool mauve", "Blue-based red"],
        (Undertone::Neutral, PaletteCategory::Blush) => {
            ["Dusty rose", "Neutral coral", "Soft mauve"]
        }
        (Undertone::Neutral, PaletteCategory::Eyes) => {
            ["Champagne", "Neutral brown", "Soft copper"]
        }
        (Undertone::Neutral, PaletteCategory::Lips) => {
            ["Rosewood", "Balanced nude", "Classic red"]
        }
    }
}

/// Blush, contour, and highlight placement text for `shape`.
#[must_use]
pub const fn shape_guidance(shape: ShapeLabel) -> ShapeGuidance {
    match shape {
        ShapeLabel::Round => ShapeGuidance {
            blush: "Sweep blush above the apples and pull back toward temples.",
            contour: "Contour beneath cheekbones and jawline for definition.",
            highlight: "Highlight center of forehead, nose bridge, and chin.",
        },
        ShapeLabel::Oval => ShapeGuidance {
            blush: "Apply to apples and blend outward along cheekbones.",
            contour: "Light contour under cheekbones and temples.",
            highlight: "Highlight cheekbone tops, brow bone, and cupid's bow.",
        },
        ShapeLabel::Square => ShapeGuidance {
            blush: "Focus on cheek centers and blend softly to diffuse angles.",
            contour: "Soften jawline and outer forehead, blending well.",
            highlight: "Highlight center of face and cheekbone peaks.",
        },
        ShapeLabel::Heart => ShapeGuidance {
            blush: "Place blush lower on cheeks and blend upward.",
            contour: "Shade sides of forehead and lightly under cheekbones.",
            highlight: "Highlight cheekbones and cupid's bow subtly on forehead.",
        },
        ShapeLabel::Oblong => ShapeGuidance {
            blush: "Apply horizontally across cheeks to add width.",
            contour: "Contour forehead top and chin to shorten appearance.",
            highlight: "Highlight cheekbones and cupid's bow, skip chin.",
        },
        ShapeLabel::Diamond => ShapeGuidance {
            blush: "Tap blush on apples and curve outward to soften cheekbones.",
            contour: "Contour under cheekbones tapering toward temples.",
            highlight: "Highlight forehead center, nose bridge, and chin.",
        },
    }
}

/// Build the five category records for a shape and undertone.
#[must_use]
pub fn build_recommendations(
    shape: ShapeLabel,
    undertone: Undertone,
) -> BTreeMap<Category, RecommendationRecord> {
    let guidance = shape_guidance(shape);
    Category::ALL
        .into_iter()
        .map(|category| {
            let record = match category {
                Category::Blush => RecommendationRecord::with_shades(
                    guidance.blush,
                    shade_palette(undertone, PaletteCategory::Blush),
                ),
                Category::Contour => {
                    RecommendationRecord::with_finishes(guidance.contour, CONTOUR_FINISHES)
                }
                Category::Highlight => {
                    RecommendationRecord::with_finishes(guidance.highlight, HIGHLIGHT_FINISHES)
                }
                Category::Eyes => RecommendationRecord::with_shades(
                    EYES_DETAILS,
                    shade_palette(undertone, PaletteCategory::Eyes),
                ),
                Category::Lips => RecommendationRecord::with_shades(
                    LIPS_DETAILS,
                    shade_palette(undertone, PaletteCategory::Lips),
                ),
            };
            (category, record)
        })
        .collect()
}

/// String-keyed entry point. Unrecognised names fall back to
/// [`FALLBACK_SHAPE`] and [`FALLBACK_UNDERTONE`]; this never fails.
#[must_use]
pub fn build_recommendations_by_name(
    shape: &str,
    undertone: &str,
) -> BTreeMap<Category, RecommendationRecord> {
    let shape = shape.parse().unwrap_or_else(|_| {
        debug!(shape, "unknown face shape, using oval guidance");
        FALLBACK_SHAPE
    });
    let undertone = undertone.parse().unwrap_or_else(|_| {
        debug!(undertone, "unknown undertone, using neutral palette");
        FALLBACK_UNDERTONE
    });
    build_recommendations(shape, undertone)
}
