//! Integration test: synthetic detections through the full analysis.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use contoura_engine::{
    Category, Detection, EngineConfig, FaceBoundingBox, LandmarkRegion, LandmarkSet, Point,
    ShapeLabel, SkinTone, Undertone, ZoneName, analyze,
};

/// Face outline parameters: half-widths and heights of the key contour
/// points, mirrored about `x = 200`.
struct Outline {
    temple: (f64, f64),
    cheek: (f64, f64),
    jaw: (f64, f64),
    chin_y: f64,
}

/// 20-point contour, linearly interpolated between key points at the
/// indices the anchor extractor reads (4, 7, 10, 13, 16).
fn contour(o: &Outline) -> Vec<Point> {
    let keys = [
        (0, Point::new(200.0 - o.temple.0, o.temple.1)),
        (4, Point::new(200.0 - o.cheek.0, o.cheek.1)),
        (7, Point::new(200.0 - o.jaw.0, o.jaw.1)),
        (10, Point::new(200.0, o.chin_y)),
        (13, Point::new(200.0 + o.jaw.0, o.jaw.1)),
        (16, Point::new(200.0 + o.cheek.0, o.cheek.1)),
        (19, Point::new(200.0 + o.temple.0, o.temple.1)),
    ];
    (0..20)
        .map(|i| {
            let (a, b) = keys
                .windows(2)
                .map(|w| (w[0], w[1]))
                .find(|((start, _), (end, _))| (*start..=*end).contains(&i))
                .unwrap();
            let t = f64::from(i - a.0) / f64::from(b.0 - a.0);
            Point::new(
                (b.1.x - a.1.x).mul_add(t, a.1.x),
                (b.1.y - a.1.y).mul_add(t, a.1.y),
            )
        })
        .collect()
}

fn landmarks(outline: &Outline, brow_width: f64, brow_y: f64) -> LandmarkSet {
    let half = brow_width / 2.0;
    LandmarkSet::new()
        .with_region(LandmarkRegion::FaceContour, contour(outline))
        .with_region(
            LandmarkRegion::LeftEyebrow,
            vec![
                Point::new(200.0 - half - 10.0, brow_y),
                Point::new(200.0 - half + 10.0, brow_y),
            ],
        )
        .with_region(
            LandmarkRegion::RightEyebrow,
            vec![
                Point::new(200.0 + half - 10.0, brow_y),
                Point::new(200.0 + half + 10.0, brow_y),
            ],
        )
}

fn skin(rgb: [u8; 3]) -> image::RgbaImage {
    image::RgbaImage::from_fn(400, 420, |_, _| image::Rgba([rgb[0], rgb[1], rgb[2], 255]))
}

struct Case {
    expected: ShapeLabel,
    outline: Outline,
    brow_width: f64,
    brow_y: f64,
    face: FaceBoundingBox,
}

fn cases() -> Vec<Case> {
    vec![
        Case {
            expected: ShapeLabel::Round,
            outline: Outline {
                temple: (85.0, 120.0),
                cheek: (90.0, 170.0),
                jaw: (88.0, 240.0),
                chin_y: 260.0,
            },
            brow_width: 170.0,
            brow_y: 110.0,
            face: FaceBoundingBox::new(110.0, 80.0, 290.0, 260.0),
        },
        Case {
            expected: ShapeLabel::Oval,
            outline: Outline {
                temple: (85.0, 120.0),
                cheek: (95.0, 180.0),
                jaw: (85.0, 280.0),
                chin_y: 300.0,
            },
            brow_width: 170.0,
            brow_y: 120.0,
            face: FaceBoundingBox::new(105.0, 70.0, 295.0, 300.0),
        },
        Case {
            expected: ShapeLabel::Square,
            outline: Outline {
                temple: (130.0, 90.0),
                cheek: (130.0, 95.0),
                jaw: (120.0, 100.0),
                chin_y: 380.0,
            },
            brow_width: 280.0,
            brow_y: 90.0,
            face: FaceBoundingBox::new(60.0, 60.0, 340.0, 380.0),
        },
        Case {
            expected: ShapeLabel::Heart,
            outline: Outline {
                temple: (90.0, 120.0),
                cheek: (90.0, 180.0),
                jaw: (70.0, 240.0),
                chin_y: 270.0,
            },
            brow_width: 170.0,
            brow_y: 120.0,
            face: FaceBoundingBox::new(110.0, 70.0, 290.0, 270.0),
        },
        Case {
            expected: ShapeLabel::Oblong,
            outline: Outline {
                temple: (70.0, 120.0),
                cheek: (70.0, 190.0),
                jaw: (65.0, 300.0),
                chin_y: 400.0,
            },
            brow_width: 130.0,
            brow_y: 120.0,
            face: FaceBoundingBox::new(130.0, 60.0, 270.0, 400.0),
        },
        Case {
            expected: ShapeLabel::Diamond,
            outline: Outline {
                temple: (60.0, 120.0),
                cheek: (80.0, 190.0),
                jaw: (60.0, 300.0),
                chin_y: 400.0,
            },
            brow_width: 100.0,
            brow_y: 120.0,
            face: FaceBoundingBox::new(120.0, 60.0, 280.0, 400.0),
        },
    ]
}

#[test]
fn every_shape_is_reachable_from_landmarks() {
    let image = skin([210, 170, 150]);
    let config = EngineConfig::default();
    for case in cases() {
        let landmarks = landmarks(&case.outline, case.brow_width, case.brow_y);
        let result = analyze(&landmarks, &case.face, &image, &config).unwrap();
        assert_eq!(result.face_shape, case.expected);
        assert_eq!(result.overlay.zones.len(), 3);
        assert_eq!(result.overlay.bounding_box, case.face.to_array());
        let insights = result.insights.expect("insights enabled by default");
        assert_eq!(insights.face_shape, case.expected);
        // Symmetric fixtures.
        assert!((insights.symmetry_score - 1.0).abs() < 1e-9);
        assert!((insights.brow_balance_score - 1.0).abs() < 1e-9);
    }
}

#[test]
fn tone_and_recommendations_follow_the_sample() {
    let cases = cases();
    let case = &cases[1];
    let landmarks = landmarks(&case.outline, case.brow_width, case.brow_y);
    let result = analyze(
        &landmarks,
        &case.face,
        &skin([210, 170, 150]),
        &EngineConfig::default(),
    )
    .unwrap();
    assert_eq!(result.skin_tone, SkinTone::VeryLight);
    assert_eq!(result.undertone, Undertone::Warm);
    let blush = &result.recommendations[&Category::Blush];
    assert_eq!(
        blush.suggested_shades.as_deref().unwrap(),
        ["Peach", "Apricot", "Warm coral"],
    );
    assert_eq!(
        blush.details.as_deref(),
        Some("Apply to apples and blend outward along cheekbones."),
    );
}

#[test]
fn concurrent_analyses_agree() {
    let image = skin([150, 110, 90]);
    let config = EngineConfig::default();
    let inputs: Vec<(LandmarkSet, FaceBoundingBox)> = cases()
        .iter()
        .map(|c| (landmarks(&c.outline, c.brow_width, c.brow_y), c.face))
        .collect();
    let serial: Vec<_> = inputs
        .iter()
        .map(|(l, f)| analyze(l, f, &image, &config).unwrap())
        .collect();
    let parallel: Vec<_> = std::thread::scope(|scope| {
        let (image, config) = (&image, &config);
        let handles: Vec<_> = inputs
            .iter()
            .map(|(l, f)| scope.spawn(move || analyze(l, f, image, config).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(serial, parallel);
}

#[test]
fn detector_json_to_wire_json() {
    let detection: Detection = serde_json::from_str(
        r#"{
            "bounding_box": {"min_x": 100, "min_y": 50, "max_x": 300, "max_y": 350},
            "landmarks": {
                "left_eyebrow": [{"x": 140, "y": 120}, {"x": 170, "y": 115}],
                "right_eyebrow": [{"x": 230, "y": 115}, {"x": 260, "y": 120}],
                "left_pupil": [{"x": 160, "y": 150}]
            }
        }"#,
    )
    .unwrap();

    // Encode and decode a real PNG to exercise the DynamicImage sampler.
    let source = skin([200, 150, 120]);
    let mut png = Vec::new();
    source
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    let decoded = image::load_from_memory(&png).unwrap();

    let result = analyze(
        &detection.landmarks,
        &detection.bounding_box,
        &decoded,
        &EngineConfig::default(),
    )
    .unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["skin_sample_rgb"], serde_json::json!([200, 150, 120]));
    let zones = json["overlay"]["zones"].as_object().unwrap();
    assert_eq!(zones.len(), 3);
    assert_eq!(
        zones["highlight"].as_array().unwrap().len(),
        12,
        "highlight ellipse has 12 vertices",
    );
    for category in ["blush", "eyes", "lips"] {
        let record = &json["recommendations"][category];
        assert!(record["details"].is_string(), "{category}");
        assert!(record["suggested_shades"].is_array(), "{category}");
        assert!(record.get("suggested_finishes").is_none(), "{category}");
    }
    for category in ["contour", "highlight"] {
        let record = &json["recommendations"][category];
        assert!(record["details"].is_string(), "{category}");
        assert!(record.get("suggested_shades").is_none(), "{category}");
        assert!(record["suggested_finishes"].is_array(), "{category}");
    }
    assert!(json["insights"]["tone_summary"]["hex"].is_string());
    assert!(result.overlay.zones.contains_key(&ZoneName::Contour));
}

#[test]
fn missing_contour_falls_back_to_box() {
    let face = FaceBoundingBox::new(100.0, 50.0, 300.0, 350.0);
    let result = analyze(
        &LandmarkSet::new(),
        &face,
        &skin([210, 170, 150]),
        &EngineConfig::default(),
    )
    .unwrap();
    // Cheeks at the box edges, jaw at the bottom corners.
    assert!((result.dimensions.cheekbone_width - 200.0).abs() < 1e-9);
    assert!((result.dimensions.jaw_width - 200.0).abs() < 1e-9);
    // Fallback brows sit 0.3 of the width in from each side.
    assert!((result.dimensions.forehead_width - 80.0).abs() < 1e-9);
}
