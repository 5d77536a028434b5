//! Colour space conversion: 8-bit sRGB to CIE XYZ (D65) to CIE L\*a\*b\*.

use serde::{Deserialize, Serialize};

use crate::types::Rgb;

/// D65 reference white, X component.
pub const WHITE_X: f64 = 0.95047;
/// D65 reference white, Y component.
pub const WHITE_Y: f64 = 1.0;
/// D65 reference white, Z component.
pub const WHITE_Z: f64 = 1.08883;

/// Linear sRGB to XYZ matrix (rows X, Y, Z).
const SRGB_TO_XYZ: [[f64; 3]; 3] = [
    [0.4124, 0.3576, 0.1805],
    [0.2126, 0.7152, 0.0722],
    [0.0193, 0.1192, 0.9505],
];

/// Below this normalized value the Lab transfer function is linear.
const LAB_EPSILON: f64 = 0.008_856;
/// Slope of the linear segment of the Lab transfer function.
const LAB_KAPPA: f64 = 7.787;

/// A colour in CIE XYZ.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Xyz {
    /// X tristimulus value.
    pub x: f64,
    /// Y tristimulus value (relative luminance).
    pub y: f64,
    /// Z tristimulus value.
    pub z: f64,
}

/// A colour in CIE L\*a\*b\*.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lab {
    /// Lightness, 0 (black) to 100 (white).
    pub l: f64,
    /// Green (negative) to red (positive).
    pub a: f64,
    /// Blue (negative) to yellow (positive).
    pub b: f64,
}

impl Lab {
    /// Individual Typology Angle in degrees: `atan2(L* - 50, b*)`.
    #[must_use]
    pub fn ita_degrees(&self) -> f64 {
        (self.l - 50.0).atan2(self.b).to_degrees()
    }
}

/// Undo the sRGB transfer curve for a channel in `[0, 1]`.
#[must_use]
pub fn srgb_to_linear(channel: f64) -> f64 {
    if channel <= 0.040_45 {
        channel / 12.92
    } else {
        ((channel + 0.055) / 1.055).powf(2.4)
    }
}

/// Convert linear RGB to XYZ.
#[must_use]
pub fn linear_rgb_to_xyz(rgb: [f64; 3]) -> Xyz {
    let row = |m: [f64; 3]| m[0].mul_add(rgb[0], m[1].mul_add(rgb[1], m[2] * rgb[2]));
    Xyz {
        x: row(SRGB_TO_XYZ[0]),
        y: row(SRGB_TO_XYZ[1]),
        z: row(SRGB_TO_XYZ[2]),
    }
}

/// Convert XYZ to Lab relative to the D65 white point.
#[must_use]
pub fn xyz_to_lab(xyz: Xyz) -> Lab {
    let f = |t: f64| {
        if t > LAB_EPSILON {
            t.cbrt()
        } else {
            LAB_KAPPA.mul_add(t, 16.0 / 116.0)
        }
    };
    let fx = f(xyz.x / WHITE_X);
    let fy = f(xyz.y / WHITE_Y);
    let fz = f(xyz.z / WHITE_Z);
    Lab {
        l: 116.0f64.mul_add(fy, -16.0),
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}

/// Convert an 8-bit sRGB colour to Lab.
#[must_use]
pub fn rgb_to_lab(rgb: Rgb) -> Lab {
    let linear = rgb.0.map(|c| srgb_to_linear(f64::from(c) / 255.0));
    xyz_to_lab(linear_rgb_to_xyz(linear))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linearization_is_piecewise() {
        assert!(srgb_to_linear(0.0).abs() < f64::EPSILON);
        assert!((srgb_to_linear(0.04) - 0.04 / 12.92).abs() < 1e-15);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-12);
        // Continuous at the knee.
        let below = srgb_to_linear(0.040_45);
        let above = srgb_to_linear(0.040_450_001);
        assert!((above - below).abs() < 1e-6);
    }

    #[test]
    fn black_is_zero_lab() {
        let lab = rgb_to_lab(Rgb::new(0, 0, 0));
        assert!(lab.l.abs() < 1e-9);
        assert!(lab.a.abs() < 1e-9);
        assert!(lab.b.abs() < 1e-9);
    }

    #[test]
    fn white_is_full_lightness() {
        let lab = rgb_to_lab(Rgb::new(255, 255, 255));
        assert!((lab.l - 100.0).abs() < 1e-6);
        assert!(lab.a.abs() < 0.02);
        assert!(lab.b.abs() < 0.02);
    }

    #[test]
    fn skin_sample_lab_values() {
        let lab = rgb_to_lab(Rgb::new(210, 170, 150));
        assert!((lab.l - 72.662_884).abs() < 1e-4, "L* = {}", lab.l);
        assert!((lab.a - 11.694_607).abs() < 1e-4, "a* = {}", lab.a);
        assert!((lab.b - 15.831_314).abs() < 1e-4, "b* = {}", lab.b);
        assert!((lab.ita_degrees() - 55.063_509).abs() < 1e-4);
    }

    #[test]
    fn ita_uses_atan2_quadrants() {
        // Negative b* with high lightness stays above 90°.
        let lab = Lab {
            l: 80.0,
            a: 0.0,
            b: -5.0,
        };
        assert!(lab.ita_degrees() > 90.0);
        // Zero b* is a vertical angle instead of a division by zero.
        let dark = Lab {
            l: 20.0,
            a: 0.0,
            b: 0.0,
        };
        assert!((dark.ita_degrees() + 90.0).abs() < 1e-12);
    }
}
