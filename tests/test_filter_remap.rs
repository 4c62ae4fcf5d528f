//! Tests for per-model class filtering and output id remapping.

mod common;

use std::sync::Arc;

use detfusion::detection::filter_detections;
use common::*;

#[test]
fn test_filter_keeps_only_allowed_classes_above_threshold() {
    let classes = allowed(&[(0, "People"), (1, "Bike")]);
    let detections = vec![
        raw([0.0, 0.0, 10.0, 10.0], 0.95, 0),
        raw([0.0, 0.0, 10.0, 10.0], 0.50, 0),
        raw([0.0, 0.0, 10.0, 10.0], 0.99, 7),
        raw([5.0, 5.0, 20.0, 20.0], 0.91, 1),
    ];

    let kept = filter_detections(&detections, &classes, 0.9);

    assert_eq!(kept.len(), 2);
    for k in &kept {
        assert!(k.raw.confidence >= 0.9);
        assert!(classes.contains(k.raw.class_id));
    }
    assert_eq!(kept[0].label, "People");
    assert_eq!(kept[1].label, "Bike");
}

#[test]
fn test_filter_threshold_is_inclusive() {
    let classes = allowed(&[(0, "People")]);
    let detections = vec![raw([1.0, 2.0, 3.0, 4.0], 0.6, 0)];

    let kept = filter_detections(&detections, &classes, 0.6);

    assert_eq!(kept.len(), 1, "confidence equal to threshold must be kept");
}

#[test]
fn test_filter_preserves_input_order() {
    let classes = allowed(&[(0, "A"), (2, "B")]);
    let detections = vec![
        raw([30.0, 0.0, 40.0, 10.0], 0.7, 2),
        raw([10.0, 0.0, 20.0, 10.0], 0.1, 0),
        raw([0.0, 0.0, 5.0, 5.0], 0.8, 0),
        raw([50.0, 0.0, 60.0, 10.0], 0.9, 2),
    ];

    let kept = filter_detections(&detections, &classes, 0.5);
    let xs: Vec<f32> = kept.iter().map(|k| k.raw.bbox[0]).collect();

    assert_eq!(xs, vec![30.0, 0.0, 50.0]);
}

#[test]
fn test_remap_uses_map_then_falls_back_to_raw_id() {
    let ids = OutputIdMap::new([("Light", 2), ("Roadblock", 3)]).unwrap();

    assert_eq!(ids.remap("Light", 0), 2);
    assert_eq!(ids.remap("Roadblock", 2), 3);
    assert_eq!(ids.remap("People", 0), 0);
    assert_eq!(ids.remap("Bike", 1), 1);
}

#[test]
fn test_select_labels_remaps_and_truncates_coordinates() {
    let model = spec(
        FixedDetector::new("m", vec![]),
        &[(0, "Light"), (2, "Roadblock"), (5, "Cone")],
        0.6,
    );
    let ids = OutputIdMap::new([("Light", 2), ("Roadblock", 3)]).unwrap();
    let detections = vec![
        raw([10.9, 20.2, 30.7, 40.99], 0.8, 0),
        raw([1.0, 1.0, 2.0, 2.0], 0.7, 5),
        raw([1.0, 1.0, 2.0, 2.0], 0.59, 2),
    ];

    let selected = model.select(&detections, &ids);

    assert_eq!(selected.len(), 2);
    assert_eq!(selected[0].label, "Light");
    assert_eq!(selected[0].class_id, 2);
    assert_eq!(selected[0].bbox, BoundingBox::new(10, 20, 30, 40));
    assert_eq!(selected[1].label, "Cone");
    assert_eq!(selected[1].class_id, 5, "unmapped label keeps raw id");
}

#[test]
fn test_allow_list_rejects_empty_label() {
    let result = AllowedClasses::new([(0u32, "People"), (1, "  ")]);
    assert!(matches!(result, Err(FusionError::Config(_))));
}

#[test]
fn test_model_spec_rejects_threshold_out_of_range() {
    for threshold in [-0.1, 1.5, f32::NAN] {
        let result = ModelSpec::new(
            Arc::new(FixedDetector::new("m", vec![])),
            allowed(&[(0, "People")]),
            threshold,
        );
        assert!(
            matches!(result, Err(FusionError::Config(_))),
            "threshold {threshold} should be rejected"
        );
    }
}

#[test]
fn test_model_spec_rejects_empty_allow_list() {
    let result = ModelSpec::new(
        Arc::new(FixedDetector::new("m", vec![])),
        AllowedClasses::default(),
        0.5,
    );
    assert!(matches!(result, Err(FusionError::Config(_))));
}

#[test]
fn test_threshold_forwarded_to_detector_only_when_enabled() -> anyhow::Result<()> {
    let image = gray_image();
    let frame = Frame {
        image: &image,
        name: "a.png",
    };

    let detector = Arc::new(FixedDetector::new("m", vec![]));
    let plain = ModelSpec::new(detector.clone(), allowed(&[(0, "People")]), 0.125)?;
    plain.infer(&frame)?;
    let forwarding = plain.clone().with_inference_threshold(true);
    forwarding.infer(&frame)?;

    let seen = detector.seen_thresholds.lock().unwrap().clone();
    assert_eq!(seen, vec![None, Some(0.125)]);
    Ok(())
}

#[test]
fn test_non_finite_confidence_is_an_inference_error() {
    let image = gray_image();
    let frame = Frame {
        image: &image,
        name: "a.png",
    };
    let model = spec(
        FixedDetector::new("broken", vec![raw([0.0, 0.0, 1.0, 1.0], f32::NAN, 0)]),
        &[(0, "People")],
        0.5,
    );

    let err = model.infer(&frame).unwrap_err();
    match err {
        FusionError::Inference { model, .. } => assert_eq!(model, "broken"),
        other => panic!("expected inference error, got {other:?}"),
    }
}

#[test]
fn test_frame_stem() {
    let image = gray_image();
    let frame = Frame {
        image: &image,
        name: "D_TOTAL.jpg",
    };
    assert_eq!(frame.stem(), "D_TOTAL");

    let frame = Frame {
        image: &image,
        name: "noext",
    };
    assert_eq!(frame.stem(), "noext");
}
