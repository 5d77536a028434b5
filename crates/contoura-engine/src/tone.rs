//! Skin tone sampling: average a patch of the face, convert to Lab, and
//! bucket the result into a tone and an undertone.
//!
//! The patch sits on the lower-middle of the face box (by default the
//! central 40% horizontally, from 45% to 65% vertically), which lands on
//! the cheeks and nose rather than hair, eyes, or lips.
//!
//! Pixel access goes through the [`RegionSampler`] trait so the engine
//! stays independent of how the caller decoded the image. Every 8-bit
//! [`image::GenericImageView`] implements it.

use image::{GenericImageView, Pixel};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::color::{Lab, rgb_to_lab};
use crate::types::{
    EngineConfig, FaceBoundingBox, Rgb, SampleRegion, SkinTone, ToneResult, Undertone,
};

/// Lower ITA bound (inclusive) of [`SkinTone::VeryLight`].
pub const VERY_LIGHT_MIN_ITA: f64 = 55.0;
/// Lower ITA bound (inclusive) of [`SkinTone::Light`].
pub const LIGHT_MIN_ITA: f64 = 41.0;
/// Lower ITA bound (inclusive) of [`SkinTone::Medium`].
pub const MEDIUM_MIN_ITA: f64 = 28.0;
/// Lower ITA bound (inclusive) of [`SkinTone::Tan`].
pub const TAN_MIN_ITA: f64 = 10.0;

/// Integer pixel rectangle, `[left, right) × [top, bottom)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRect {
    /// First column.
    pub left: u32,
    /// First row.
    pub top: u32,
    /// One past the last column.
    pub right: u32,
    /// One past the last row.
    pub bottom: u32,
}

impl SampleRect {
    /// Columns covered.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    /// Rows covered.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Pixels covered.
    #[must_use]
    pub const fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }
}

/// Rectangular pixel-average queries over a decoded image.
pub trait RegionSampler {
    /// Image `(width, height)` in pixels.
    fn size(&self) -> (u32, u32);

    /// Mean colour of the pixels in `rect`, ignoring alpha.
    ///
    /// The rectangle is clipped to the image first. Returns `None` when
    /// nothing remains.
    fn average_rgb(&self, rect: SampleRect) -> Option<Rgb>;
}

impl<I> RegionSampler for I
where
    I: GenericImageView,
    I::Pixel: Pixel<Subpixel = u8>,
{
    fn size(&self) -> (u32, u32) {
        GenericImageView::dimensions(self)
    }

    fn average_rgb(&self, rect: SampleRect) -> Option<Rgb> {
        let (width, height) = GenericImageView::dimensions(self);
        let right = rect.right.min(width);
        let bottom = rect.bottom.min(height);

        let mut sums = [0u64; 3];
        let mut count = 0u64;
        for y in rect.top..bottom {
            for x in rect.left..right {
                let image::Rgb(channels) = self.get_pixel(x, y).to_rgb();
                for (sum, channel) in sums.iter_mut().zip(channels) {
                    *sum += u64::from(channel);
                }
                count += 1;
            }
        }

        if count == 0 {
            return None;
        }
        let mean = sums.map(|sum| u8::try_from((sum + count / 2) / count).unwrap_or(u8::MAX));
        Some(Rgb(mean))
    }
}

/// Place the sample rectangle inside `face`, clipped to an image of
/// `image_size`.
///
/// Returns `None` when the face box is degenerate or the clipped
/// rectangle has no pixels.
#[must_use]
pub fn sample_rect(
    face: &FaceBoundingBox,
    image_size: (u32, u32),
    region: &SampleRegion,
) -> Option<SampleRect> {
    if face.is_degenerate() {
        return None;
    }
    let (image_width, image_height) = (f64::from(image_size.0), f64::from(image_size.1));
    let (w, h) = (face.width(), face.height());

    let x0 = w.mul_add(region.x_offset, face.min_x);
    let y0 = h.mul_add(region.y_offset, face.min_y);
    let x1 = w.mul_add(region.width, x0);
    let y1 = h.mul_add(region.height, y0);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let snap = |v: f64, max: f64| v.clamp(0.0, max).round() as u32;

    let rect = SampleRect {
        left: snap(x0, image_width),
        top: snap(y0, image_height),
        right: snap(x1, image_width),
        bottom: snap(y1, image_height),
    };
    (rect.area() > 0).then_some(rect)
}

/// Bucket an Individual Typology Angle into a tone label.
///
/// Each bucket includes its lower bound.
#[must_use]
pub fn classify_ita(ita: f64) -> SkinTone {
    if ita >= VERY_LIGHT_MIN_ITA {
        SkinTone::VeryLight
    } else if ita >= LIGHT_MIN_ITA {
        SkinTone::Light
    } else if ita >= MEDIUM_MIN_ITA {
        SkinTone::Medium
    } else if ita >= TAN_MIN_ITA {
        SkinTone::Tan
    } else {
        SkinTone::Deep
    }
}

/// Bucket Lab chroma into an undertone label.
#[must_use]
pub fn classify_undertone(lab: &Lab) -> Undertone {
    if lab.a < -2.0 && lab.b < 10.0 {
        Undertone::Cool
    } else if lab.b > 15.0 {
        Undertone::Warm
    } else {
        Undertone::Neutral
    }
}

/// Classify an averaged sample.
#[must_use]
pub fn tone_from_rgb(sample: Rgb) -> ToneResult {
    let lab = rgb_to_lab(sample);
    let ita = lab.ita_degrees();
    trace!(l = lab.l, a = lab.a, b = lab.b, ita, "skin sample converted to Lab");
    ToneResult {
        tone: classify_ita(ita),
        undertone: classify_undertone(&lab),
        sample_rgb: sample,
    }
}

/// Sample `image` inside `face` and classify the skin tone.
///
/// Falls back to [`ToneResult::FALLBACK`] when the sample rectangle is
/// empty instead of failing.
#[must_use]
pub fn sample_tone<S>(image: &S, face: &FaceBoundingBox, config: &EngineConfig) -> ToneResult
where
    S: RegionSampler + ?Sized,
{
    let Some(rect) = sample_rect(face, image.size(), &config.sample_region) else {
        debug!("tone sample rectangle is empty; using fallback tone");
        return ToneResult::FALLBACK;
    };
    let Some(sample) = image.average_rgb(rect) else {
        debug!(?rect, "tone sample produced no pixels; using fallback tone");
        return ToneResult::FALLBACK;
    };
    let result = tone_from_rgb(sample);
    debug!(
        ?rect,
        tone = %result.tone,
        undertone = %result.undertone,
        "skin tone sampled"
    );
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> RgbaImage {
        RgbaImage::from_fn(width, height, |_, _| Rgba([rgb[0], rgb[1], rgb[2], 255]))
    }

    // --- ITA buckets ---

    #[test]
    fn ita_bounds_are_lower_inclusive() {
        assert_eq!(classify_ita(55.0), SkinTone::VeryLight);
        assert_eq!(classify_ita(54.999), SkinTone::Light);
        assert_eq!(classify_ita(41.0), SkinTone::Light);
        assert_eq!(classify_ita(40.999), SkinTone::Medium);
        assert_eq!(classify_ita(28.0), SkinTone::Medium);
        assert_eq!(classify_ita(27.999), SkinTone::Tan);
        assert_eq!(classify_ita(10.0), SkinTone::Tan);
        assert_eq!(classify_ita(9.999), SkinTone::Deep);
        assert_eq!(classify_ita(-80.0), SkinTone::Deep);
    }

    // --- Undertone ---

    #[test]
    fn undertone_rules() {
        let lab = |a, b| Lab { l: 60.0, a, b };
        assert_eq!(classify_undertone(&lab(-3.0, 5.0)), Undertone::Cool);
        // Cool needs both conditions.
        assert_eq!(classify_undertone(&lab(-3.0, 12.0)), Undertone::Neutral);
        assert_eq!(classify_undertone(&lab(-1.0, 5.0)), Undertone::Neutral);
        assert_eq!(classify_undertone(&lab(5.0, 15.5)), Undertone::Warm);
        assert_eq!(classify_undertone(&lab(5.0, 15.0)), Undertone::Neutral);
    }

    // --- Known samples ---

    #[test]
    fn documented_sample_is_very_light_warm() {
        // L* ≈ 72.66, b* ≈ 15.83, ITA ≈ 55.06°.
        let result = tone_from_rgb(Rgb::new(210, 170, 150));
        assert_eq!(result.tone, SkinTone::VeryLight);
        assert_eq!(result.undertone, Undertone::Warm);
        assert_eq!(result.sample_rgb, Rgb::new(210, 170, 150));
    }

    #[test]
    fn samples_across_every_tone_bucket() {
        let cases = [
            ([225, 185, 160], SkinTone::VeryLight), // ITA ≈ 57.2
            ([215, 170, 140], SkinTone::Light),     // ITA ≈ 46.5
            ([200, 150, 120], SkinTone::Medium),    // ITA ≈ 34.8
            ([175, 125, 95], SkinTone::Tan),        // ITA ≈ 15.6
            ([160, 110, 80], SkinTone::Deep),       // ITA ≈ 2.1
            ([90, 60, 45], SkinTone::Deep),         // ITA ≈ -56.0
        ];
        for (rgb, expected) in cases {
            let result = tone_from_rgb(Rgb(rgb));
            assert_eq!(result.tone, expected, "sample {rgb:?}");
        }
    }

    #[test]
    fn samples_across_every_undertone() {
        // a* ≈ -8.7, b* ≈ 2.7.
        assert_eq!(tone_from_rgb(Rgb::new(180, 200, 190)).undertone, Undertone::Cool);
        // b* ≈ 9.1.
        assert_eq!(
            tone_from_rgb(Rgb::new(210, 180, 170)).undertone,
            Undertone::Neutral
        );
        // b* ≈ 23.1.
        assert_eq!(tone_from_rgb(Rgb::new(200, 150, 120)).undertone, Undertone::Warm);
    }

    // --- Sample rectangle ---

    #[test]
    fn sample_rect_default_placement() {
        let face = FaceBoundingBox::new(100.0, 100.0, 200.0, 300.0);
        let rect = sample_rect(&face, (400, 400), &SampleRegion::default()).unwrap();
        assert_eq!(
            rect,
            SampleRect {
                left: 130,
                top: 190,
                right: 170,
                bottom: 230,
            }
        );
        assert_eq!(rect.area(), 1600);
    }

    #[test]
    fn sample_rect_is_clipped_to_image() {
        let face = FaceBoundingBox::new(-100.0, -100.0, 100.0, 100.0);
        let rect = sample_rect(&face, (50, 20), &SampleRegion::default());
        // x: [-40, 40) -> [0, 40); y: [-10, 30) -> [0, 20).
        assert_eq!(
            rect,
            Some(SampleRect {
                left: 0,
                top: 0,
                right: 40,
                bottom: 20,
            })
        );
    }

    #[test]
    fn sample_rect_outside_image_is_none() {
        let face = FaceBoundingBox::new(500.0, 500.0, 600.0, 600.0);
        assert_eq!(sample_rect(&face, (100, 100), &SampleRegion::default()), None);
    }

    #[test]
    fn zero_width_face_yields_fallback_tone() {
        let image = solid(100, 100, [90, 60, 45]);
        let face = FaceBoundingBox::new(50.0, 10.0, 50.0, 90.0);
        assert_eq!(
            sample_tone(&image, &face, &EngineConfig::default()),
            ToneResult::FALLBACK
        );
    }

    #[test]
    fn zero_height_face_yields_fallback_tone() {
        let image = solid(100, 100, [90, 60, 45]);
        let face = FaceBoundingBox::new(10.0, 40.0, 90.0, 40.0);
        let result = sample_tone(&image, &face, &EngineConfig::default());
        assert_eq!(result.tone, SkinTone::Medium);
        assert_eq!(result.undertone, Undertone::Neutral);
        assert_eq!(result.sample_rgb, Rgb::new(200, 170, 160));
    }

    #[test]
    fn empty_image_yields_fallback_tone() {
        let image = RgbaImage::new(0, 0);
        let face = FaceBoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(
            sample_tone(&image, &face, &EngineConfig::default()),
            ToneResult::FALLBACK
        );
    }

    // --- Sampling ---

    #[test]
    fn average_rounds_to_nearest() {
        // Left column 10, right column 13: mean 11.5 rounds to 12.
        let image = RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgba([10, 0, 255, 255])
            } else {
                Rgba([13, 1, 255, 0])
            }
        });
        let rect = SampleRect {
            left: 0,
            top: 0,
            right: 2,
            bottom: 1,
        };
        assert_eq!(image.average_rgb(rect), Some(Rgb::new(12, 1, 255)));
    }

    #[test]
    fn average_only_reads_inside_rect() {
        let image = RgbaImage::from_fn(10, 10, |x, _| {
            if x < 5 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([200, 100, 50, 255])
            }
        });
        let rect = SampleRect {
            left: 5,
            top: 2,
            right: 10,
            bottom: 8,
        };
        assert_eq!(image.average_rgb(rect), Some(Rgb::new(200, 100, 50)));
    }

    #[test]
    fn average_of_empty_rect_is_none() {
        let image = solid(4, 4, [1, 2, 3]);
        let rect = SampleRect {
            left: 2,
            top: 2,
            right: 2,
            bottom: 4,
        };
        assert_eq!(image.average_rgb(rect), None);
    }

    #[test]
    fn dynamic_image_is_a_sampler() {
        let image = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            8,
            8,
            image::Rgb([175, 125, 95]),
        ));
        let face = FaceBoundingBox::new(0.0, 0.0, 8.0, 8.0);
        let result = sample_tone(&image, &face, &EngineConfig::default());
        assert_eq!(result.sample_rgb, Rgb::new(175, 125, 95));
        assert_eq!(result.tone, SkinTone::Tan);
    }

    #[test]
    fn solid_face_samples_its_colour() {
        let image = solid(200, 200, [200, 150, 120]);
        let face = FaceBoundingBox::new(20.0, 20.0, 180.0, 180.0);
        let result = sample_tone(&image, &face, &EngineConfig::default());
        assert_eq!(result.sample_rgb, Rgb::new(200, 150, 120));
        assert_eq!(result.tone, SkinTone::Medium);
        assert_eq!(result.undertone, Undertone::Warm);
    }
}
