//! End-to-end tests: annotation document -> extraction -> adjustment.

use visaid_core::{AdjustOptions, AnnotationDocument, adjust_frames, extract_timeline};

/// A compact document in the detector's shape: bars at the head, a slate, a
/// long silence, then credits long enough to trigger subsampling.
const DOC: &str = r#"{
    "views": [
        {
            "id": "v_1",
            "metadata": { "app": "http://apps.clams.ai/swt-detection/v7.5" },
            "annotations": [
                { "@type": "http://mmif.clams.ai/vocabulary/TimePoint/v4",
                  "properties": { "id": "tp_1", "timePoint": 0, "label": "bars" } },
                { "@type": "http://mmif.clams.ai/vocabulary/TimePoint/v4",
                  "properties": { "id": "tp_2", "timePoint": 20000, "label": "bars" } },
                { "@type": "http://mmif.clams.ai/vocabulary/TimePoint/v4",
                  "properties": { "id": "tp_3", "timePoint": 25000, "label": "slate" } },
                { "@type": "http://mmif.clams.ai/vocabulary/TimePoint/v4",
                  "properties": { "id": "tp_4", "timePoint": 32000, "label": "slate" } },
                { "@type": "http://mmif.clams.ai/vocabulary/TimePoint/v4",
                  "properties": { "id": "tp_5", "timePoint": 1500000, "label": "credits" } },
                { "@type": "http://mmif.clams.ai/vocabulary/TimePoint/v4",
                  "properties": { "id": "tp_6", "timePoint": 1560000, "label": "credits" } },
                { "@type": "http://mmif.clams.ai/vocabulary/TimeFrame/v5",
                  "properties": { "id": "tf_1", "frameType": "bars",
                    "targets": ["tp_1", "tp_2"], "representatives": ["tp_1", "tp_2"] } },
                { "@type": "http://mmif.clams.ai/vocabulary/TimeFrame/v5",
                  "properties": { "id": "tf_2", "frameType": "slate",
                    "targets": ["tp_3", "tp_4"], "representatives": ["tp_4"] } },
                { "@type": "http://mmif.clams.ai/vocabulary/TimeFrame/v5",
                  "properties": { "id": "tf_3", "frameType": "credits",
                    "targets": ["tp_5", "tp_6"], "representatives": ["tp_5"] } }
            ]
        }
    ]
}"#;

#[test]
fn extraction_feeds_adjustment() {
    let doc = AnnotationDocument::from_str(DOC).unwrap();
    let extracted = extract_timeline(&doc).unwrap();
    assert_eq!(extracted.frames.len(), 3);
    assert_eq!(extracted.first_time, 0);
    assert_eq!(extracted.final_time, 1_560_000);

    let outcome = adjust_frames(
        &extracted.frames,
        extracted.first_time,
        extracted.final_time,
        &AdjustOptions::recommended(),
    )
    .unwrap();
    assert!(outcome.warnings.is_empty());

    // Sorted, representative inside every span.
    for pair in outcome.frames.windows(2) {
        assert!(pair[0].start <= pair[1].start);
    }
    for frame in &outcome.frames {
        assert!(frame.start <= frame.rep_time && frame.rep_time <= frame.end);
    }

    // The 1468000ms silence between the slate and the credits gets sampled.
    let samples = outcome
        .frames
        .iter()
        .filter(|f| f.label == "unlabeled sample")
        .count();
    assert_eq!(samples, 1_468_000 / 60_000);

    // The 60s credits roll exceeds its 1900ms threshold and gets subsampled;
    // the parent stays.
    assert!(outcome.frames.iter().any(|f| f.id == "tf_3"));
    assert!(
        outcome
            .frames
            .iter()
            .any(|f| f.label == "credits subsample")
    );

    // Sentinels are gone by default.
    assert!(!outcome.frames.iter().any(|f| f.id == "f_0" || f.id == "f_n"));
}

#[test]
fn repeated_runs_are_identical() {
    let doc = AnnotationDocument::from_str(DOC).unwrap();
    let extracted = extract_timeline(&doc).unwrap();
    let options = AdjustOptions::recommended();
    let a = adjust_frames(&extracted.frames, 0, 1_560_000, &options).unwrap();
    let b = adjust_frames(&extracted.frames, 0, 1_560_000, &options).unwrap();
    assert_eq!(a, b);
}
