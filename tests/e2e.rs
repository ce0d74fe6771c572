mod common;

use common::synthetic_meter::{blit, digit_glyph};
use gauge_reader::classify::{Classifier, KnnClassifier, TemplateClassifier};
use gauge_reader::frame::Frame;
use gauge_reader::gauge::Circle;
use gauge_reader::params::ReaderParams;
use gauge_reader::reading::RejectReason;
use gauge_reader::segment::{BoundingBox, Segmenter};
use gauge_reader::{Geometry, MeterReader, ReaderError, Verdict};
use std::f32::consts::FRAC_PI_2;

/// Frozen geometry for the synthetic meter: the face fills a 300 px square
/// crop of a 400x400 frame, and the dominant line angle is such that the
/// leveling rotation is zero.
fn geometry() -> Geometry {
    Geometry::Calibrated {
        circle: Circle {
            cx: 200.0,
            cy: 200.0,
            r: 150.0,
        },
        angle_rad: -FRAC_PI_2,
    }
}

/// Seven 30x30 digit windows in crop coordinates.
fn digit_boxes() -> Vec<BoundingBox> {
    (0..7)
        .map(|i| BoundingBox {
            x: 45 + i * 32,
            y: 135,
            w: 30,
            h: 30,
        })
        .collect()
}

/// Render the given digits into the calibrated windows of a black frame.
fn meter_frame(digits: &[u8]) -> Frame {
    let mut frame = Frame::new(400, 400);
    for (i, &d) in digits.iter().enumerate() {
        let b = digit_boxes()[i];
        // window coordinates are relative to the crop at (50, 50)
        blit(&mut frame, &digit_glyph(d), 50 + b.x, 50 + b.y);
    }
    frame
}

fn template_library() -> Classifier {
    let samples = (0u8..10).map(|d| (d, digit_glyph(d))).collect();
    Classifier::Template(TemplateClassifier::from_samples(samples))
}

fn knn_library() -> Classifier {
    let mut samples = Vec::new();
    for d in 0u8..10 {
        let raster = digit_glyph(d);
        for _ in 0..5 {
            samples.push((d, raster.data.clone()));
        }
    }
    Classifier::Knn(KnnClassifier::from_samples(5, samples))
}

fn reader(classifier: Classifier) -> MeterReader {
    MeterReader::new(
        ReaderParams::default(),
        geometry(),
        Segmenter::Static {
            boxes: digit_boxes(),
        },
        classifier,
    )
}

#[test]
fn template_round_trip_reads_745_23() {
    let frame = meter_frame(&[0, 0, 7, 4, 5, 2, 3]);
    let outcome = reader(template_library())
        .process(&frame, None, false)
        .unwrap();

    let digits: Vec<u8> = outcome.reading.digits.iter().map(|p| p.digit).collect();
    assert_eq!(digits, vec![0, 0, 7, 4, 5, 2, 3]);
    assert!(
        (outcome.reading.value - 745.23).abs() < 1e-9,
        "value={}",
        outcome.reading.value
    );
    assert!(
        outcome.reading.aggregate_confidence > 0.95,
        "aggregate={}",
        outcome.reading.aggregate_confidence
    );
    assert_eq!(
        outcome.verdict,
        Verdict::Accepted {
            value: outcome.reading.value
        }
    );
}

#[test]
fn knn_round_trip_reads_745_23() {
    let frame = meter_frame(&[0, 0, 7, 4, 5, 2, 3]);
    let outcome = reader(knn_library()).process(&frame, None, false).unwrap();

    let digits: Vec<u8> = outcome.reading.digits.iter().map(|p| p.digit).collect();
    assert_eq!(digits, vec![0, 0, 7, 4, 5, 2, 3]);
    assert!((outcome.reading.value - 745.23).abs() < 1e-9);
    assert!(outcome.verdict.is_accepted());
}

#[test]
fn same_frame_yields_identical_readings() {
    let frame = meter_frame(&[0, 0, 7, 4, 5, 2, 3]);
    let r = reader(template_library());
    let a = r.process(&frame, None, false).unwrap();
    let b = r.process(&frame, None, false).unwrap();
    assert_eq!(a.reading.digits, b.reading.digits);
    assert_eq!(a.reading.value, b.reading.value);
}

#[test]
fn plausible_increment_is_accepted() {
    let frame = meter_frame(&[0, 0, 7, 4, 5, 2, 3]);
    let outcome = reader(template_library())
        .process(&frame, Some(741.0), false)
        .unwrap();
    assert!(outcome.verdict.is_accepted());
}

#[test]
fn decreasing_value_is_rejected_not_errored() {
    let frame = meter_frame(&[0, 0, 7, 4, 5, 2, 3]);
    let outcome = reader(template_library())
        .process(&frame, Some(746.0), false)
        .unwrap();
    match outcome.verdict {
        Verdict::Rejected {
            reason: RejectReason::ImplausibleValue {
                last_known_good, ..
            },
        } => assert_eq!(last_known_good, 746.0),
        other => panic!("expected implausible-value rejection, got {other:?}"),
    }
}

#[test]
fn force_overrides_a_rejection() {
    let frame = meter_frame(&[0, 0, 7, 4, 5, 2, 3]);
    let outcome = reader(template_library())
        .process(&frame, Some(900.0), true)
        .unwrap();
    assert!(outcome.verdict.is_accepted());
}

#[test]
fn blank_digit_window_fails_the_confidence_floor() {
    // six rendered digits, seventh window left black: flat glyph,
    // zero correlation against every template
    let mut frame = Frame::new(400, 400);
    for (i, &d) in [0u8, 0, 7, 4, 5, 2].iter().enumerate() {
        let b = digit_boxes()[i];
        blit(&mut frame, &digit_glyph(d), 50 + b.x, 50 + b.y);
    }
    let outcome = reader(template_library())
        .process(&frame, None, false)
        .unwrap();
    assert!(matches!(
        outcome.verdict,
        Verdict::Rejected {
            reason: RejectReason::LowConfidence { .. }
        }
    ));
}

#[test]
fn featureless_frame_fails_with_no_gauge() {
    let frame = Frame::new(700, 700);
    let r = MeterReader::new(
        ReaderParams::default(),
        Geometry::Discover,
        Segmenter::Static {
            boxes: digit_boxes(),
        },
        template_library(),
    );
    let err = r.process(&frame, None, false).unwrap_err();
    assert!(matches!(err, ReaderError::NoGaugeFound { .. }));
}
