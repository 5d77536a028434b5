//! Face shape classification from dimension ratios.
//!
//! A hand-tuned decision tree, flattened into an ordered rule list.
//! Rules are evaluated top to bottom and the first match wins; the
//! branch conditions are folded into each rule's predicate so the list
//! reads exactly like the tree. Reordering rules changes labels on
//! boundary cases.
//!
//! The two jaw-angle thresholds ([`SHORT_SQUARE_JAW_ANGLE`] and
//! [`MEDIUM_SQUARE_JAW_ANGLE`]) differ on purpose; both values are part of
//! the tuning.

use std::f64::consts::PI;

use serde::Serialize;
use tracing::debug;

use crate::types::{FaceDimensions, ShapeLabel};

/// `length_ratio` below this is a short face.
pub const SHORT_FACE_MAX_RATIO: f64 = 1.05;
/// `length_ratio` at or above this is a long face.
pub const LONG_FACE_MIN_RATIO: f64 = 1.35;
/// Jaw angle under which a short face is square (≈ 52.9°).
pub const SHORT_SQUARE_JAW_ANGLE: f64 = PI / 3.4;
/// Jaw angle under which a medium-length face is square (≈ 51.4°).
pub const MEDIUM_SQUARE_JAW_ANGLE: f64 = PI / 3.5;

/// Label when no rule matches.
pub const FALLBACK_LABEL: ShapeLabel = ShapeLabel::Oval;
/// Rule name reported for [`FALLBACK_LABEL`].
pub const FALLBACK_RULE: &str = "medium-oval";

/// Ratios the rules are written against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShapeRatios {
    /// Mean of forehead, cheekbone, and jaw widths.
    pub width_avg: f64,
    /// `face_length / max(width_avg, 1)`.
    pub length_ratio: f64,
    /// `cheekbone_width / max(jaw_width, 1)`.
    pub cheek_to_jaw: f64,
    /// `forehead_width / max(jaw_width, 1)`.
    pub forehead_to_jaw: f64,
    /// Jaw angle in radians, copied from the dimensions.
    pub jaw_angle: f64,
}

impl ShapeRatios {
    /// Derive the ratios from a set of dimensions.
    #[must_use]
    pub fn from_dimensions(d: &FaceDimensions) -> Self {
        let width_avg = (d.forehead_width + d.cheekbone_width + d.jaw_width) / 3.0;
        let jaw = d.jaw_width.max(1.0);
        Self {
            width_avg,
            length_ratio: d.face_length / width_avg.max(1.0),
            cheek_to_jaw: d.cheekbone_width / jaw,
            forehead_to_jaw: d.forehead_width / jaw,
            jaw_angle: d.jaw_angle,
        }
    }

    fn is_short(&self) -> bool {
        self.length_ratio < SHORT_FACE_MAX_RATIO
    }

    fn is_long(&self) -> bool {
        self.length_ratio >= LONG_FACE_MIN_RATIO
    }
}

/// One entry of the ordered rule list.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Stable identifier, reported by [`classify_with_rule`].
    pub name: &'static str,
    /// Label emitted when [`matches`](Self::matches) holds.
    pub label: ShapeLabel,
    /// Predicate over the ratios.
    pub matches: fn(&ShapeRatios) -> bool,
}

/// The decision tree, in evaluation order.
pub const RULES: &[Rule] = &[
    Rule {
        name: "short-square",
        label: ShapeLabel::Square,
        matches: |r| r.is_short() && r.jaw_angle < SHORT_SQUARE_JAW_ANGLE,
    },
    Rule {
        name: "short-heart",
        label: ShapeLabel::Heart,
        matches: |r| r.is_short() && r.cheek_to_jaw > 1.05,
    },
    Rule {
        name: "short-round",
        label: ShapeLabel::Round,
        matches: ShapeRatios::is_short,
    },
    Rule {
        name: "long-diamond",
        label: ShapeLabel::Diamond,
        matches: |r| r.is_long() && r.cheek_to_jaw > 1.1 && r.forehead_to_jaw < 0.95,
    },
    Rule {
        name: "long-oblong",
        label: ShapeLabel::Oblong,
        matches: ShapeRatios::is_long,
    },
    Rule {
        name: "medium-heart-cheeks",
        label: ShapeLabel::Heart,
        matches: |r| r.cheek_to_jaw > 1.15,
    },
    Rule {
        name: "medium-square",
        label: ShapeLabel::Square,
        matches: |r| r.jaw_angle < MEDIUM_SQUARE_JAW_ANGLE,
    },
    Rule {
        name: "medium-heart-forehead",
        label: ShapeLabel::Heart,
        matches: |r| r.cheek_to_jaw > 1.05 && r.forehead_to_jaw > 1.05,
    },
];

/// Outcome of classification with the reasoning attached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    /// The chosen label.
    pub label: ShapeLabel,
    /// Name of the rule that produced it.
    pub rule: &'static str,
    /// Ratios the rules were evaluated against.
    pub ratios: ShapeRatios,
}

/// Classify, reporting which rule matched.
#[must_use]
pub fn classify_with_rule(dimensions: &FaceDimensions) -> Classification {
    let ratios = ShapeRatios::from_dimensions(dimensions);
    let (label, rule) = RULES
        .iter()
        .find(|rule| (rule.matches)(&ratios))
        .map_or((FALLBACK_LABEL, FALLBACK_RULE), |rule| (rule.label, rule.name));
    debug!(
        %label,
        rule,
        length_ratio = ratios.length_ratio,
        cheek_to_jaw = ratios.cheek_to_jaw,
        forehead_to_jaw = ratios.forehead_to_jaw,
        "face shape classified"
    );
    Classification {
        label,
        rule,
        ratios,
    }
}

/// Classify the face shape. Total: every input maps to exactly one label.
#[must_use]
pub fn classify(dimensions: &FaceDimensions) -> ShapeLabel {
    classify_with_rule(dimensions).label
}
