//! Annotation-document extraction.
//!
//! This module translates an MMIF-shaped annotation document (the detector's
//! output: views containing timepoint, timeframe, text-document, and
//! alignment annotations) into the flat `TimeFrame` list the adjuster
//! consumes, plus the first/final analyzed instants.
//!
//! View selection conventions, inherited from the detector:
//! - the *last* view whose app id mentions the detector holds the current
//!   timepoint and timeframe annotations (re-runs append views);
//! - the *first* view whose app id mentions a captioner holds text
//!   documents aligned to timepoints.
//!
//! A frame's span is the min/max of its target timepoints. Its
//! representative instant is the timepoint a captioner aligned text to, when
//! that timepoint is among the frame's flagged representatives; otherwise
//! the middle flagged representative.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::timeline::TimeFrame;
use crate::timeline::representative::{RepCandidate, choose_representative};

/// Substring identifying detector views in view metadata.
pub const DETECTOR_APP_SUBSTRING: &str = "swt-detection";

/// Substring identifying captioner views in view metadata.
pub const CAPTIONER_APP_SUBSTRING: &str = "captioner";

// ---- Structs for the annotation document JSON ----

#[derive(Deserialize, Debug, Clone)]
pub struct AnnotationDocument {
    #[serde(default)]
    pub views: Vec<View>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct View {
    pub id: String,
    pub metadata: ViewMetadata,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ViewMetadata {
    #[serde(default)]
    pub app: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Annotation {
    #[serde(rename = "@type")]
    pub at_type: String,
    #[serde(default)]
    pub properties: serde_json::Map<String, Value>,
}

impl AnnotationDocument {
    pub fn from_str(serialized: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(serialized)?)
    }

    pub fn from_path(path: &Path) -> CoreResult<Self> {
        Self::from_str(&fs::read_to_string(path)?)
    }
}

impl Annotation {
    /// True if the `@type` URI names the given annotation type, ignoring the
    /// vocabulary prefix and version suffix.
    fn is_type(&self, name: &str) -> bool {
        self.at_type
            .split('/')
            .any(|segment| segment == name)
    }

    fn str_prop(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    fn int_prop(&self, key: &str) -> Option<i64> {
        self.properties.get(key).and_then(Value::as_i64)
    }

    fn id_list_prop(&self, key: &str) -> Vec<&str> {
        self.properties
            .get(key)
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Strips a `view_id:` prefix from a cross-view annotation reference.
fn local_id(id: &str) -> &str {
    id.rsplit(':').next().unwrap_or(id)
}

/// The extraction adapter's output: the raw frame list plus the earliest
/// and latest instants the detector actually analyzed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTimeline {
    pub frames: Vec<TimeFrame>,
    pub first_time: i64,
    pub final_time: i64,
}

/// One timepoint annotation, keyed by local id during extraction.
#[derive(Debug, Clone)]
struct TimePoint {
    time: i64,
    label: String,
}

/// Picks the last detector view containing the given annotation type.
fn last_detector_view<'a>(doc: &'a AnnotationDocument, type_name: &str) -> Option<&'a View> {
    doc.views
        .iter()
        .filter(|view| view.metadata.app.contains(DETECTOR_APP_SUBSTRING))
        .filter(|view| view.annotations.iter().any(|a| a.is_type(type_name)))
        .next_back()
}

/// Picks the first captioner view containing text documents.
fn first_captioner_view(doc: &AnnotationDocument) -> Option<&View> {
    doc.views
        .iter()
        .filter(|view| view.metadata.app.contains(CAPTIONER_APP_SUBSTRING))
        .find(|view| view.annotations.iter().any(|a| a.is_type("TextDocument")))
}

/// Extracts the raw frame list and analysis boundaries from an annotation
/// document.
///
/// Returns an empty frame list (with valid boundaries) when the document has
/// timepoints but no timeframe annotations; fails when the document lacks a
/// detector timepoint view entirely, since no boundaries can be established.
pub fn extract_timeline(doc: &AnnotationDocument) -> CoreResult<ExtractedTimeline> {
    let tp_view = last_detector_view(doc, "TimePoint").ok_or_else(|| {
        CoreError::Annotation("document has no detector TimePoint view".to_string())
    })?;

    // Collect timepoints and the analysis boundaries in one pass.
    let mut timepoints = std::collections::HashMap::new();
    let mut first_time = i64::MAX;
    let mut final_time = i64::MIN;
    for ann in tp_view.annotations.iter().filter(|a| a.is_type("TimePoint")) {
        let id = ann.str_prop("id").ok_or_else(|| {
            CoreError::Annotation("TimePoint annotation without an id".to_string())
        })?;
        let time = ann.int_prop("timePoint").ok_or_else(|| {
            CoreError::Annotation(format!("TimePoint '{id}' has no timePoint property"))
        })?;
        first_time = first_time.min(time);
        final_time = final_time.max(time);
        timepoints.insert(
            id.to_string(),
            TimePoint {
                time,
                label: ann.str_prop("label").unwrap_or_default().to_string(),
            },
        );
    }
    if timepoints.is_empty() {
        return Err(CoreError::Annotation(
            "detector view contains no TimePoint annotations".to_string(),
        ));
    }

    let Some(tf_view) = last_detector_view(doc, "TimeFrame") else {
        log::info!("document contains no detector TimeFrame annotations");
        return Ok(ExtractedTimeline {
            frames: Vec::new(),
            first_time,
            final_time,
        });
    };

    // Captioner text, mapped to the timeframe it originated from and the
    // timepoint it was aligned with.
    struct Caption {
        tp_id: String,
        text: String,
    }
    let mut captions = std::collections::HashMap::new();
    if let Some(td_view) = first_captioner_view(doc) {
        let mut aligned_sources = std::collections::HashMap::new();
        for ann in td_view.annotations.iter().filter(|a| a.is_type("Alignment")) {
            if let (Some(target), Some(source)) = (ann.str_prop("target"), ann.str_prop("source")) {
                aligned_sources.insert(local_id(target).to_string(), local_id(source).to_string());
            }
        }
        for ann in td_view
            .annotations
            .iter()
            .filter(|a| a.is_type("TextDocument"))
        {
            let (Some(td_id), Some(origin)) = (ann.str_prop("id"), ann.str_prop("origin")) else {
                continue;
            };
            let Some(tp_id) = aligned_sources.get(local_id(td_id)) else {
                continue;
            };
            let text = ann
                .properties
                .get("text")
                .and_then(|t| t.get("@value"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            if captions
                .insert(
                    local_id(origin).to_string(),
                    Caption {
                        tp_id: tp_id.clone(),
                        text: text.to_string(),
                    },
                )
                .is_some()
            {
                log::info!("more than one TextDocument for TimeFrame {origin}; keeping the last");
            }
        }
    } else {
        log::info!("document contains no captioner TextDocument annotations");
    }

    let mut frames = Vec::new();
    for ann in tf_view.annotations.iter().filter(|a| a.is_type("TimeFrame")) {
        let id = ann.str_prop("id").ok_or_else(|| {
            CoreError::Annotation("TimeFrame annotation without an id".to_string())
        })?;
        let label = ann.str_prop("frameType").unwrap_or_default().to_string();

        let mut start = i64::MAX;
        let mut end = i64::MIN;
        for target in ann.id_list_prop("targets") {
            let tp = timepoints.get(local_id(target)).ok_or_else(|| {
                CoreError::Annotation(format!(
                    "TimeFrame '{id}' targets unknown TimePoint '{target}'"
                ))
            })?;
            start = start.min(tp.time);
            end = end.max(tp.time);
        }
        if start > end {
            return Err(CoreError::Annotation(format!(
                "TimeFrame '{id}' has no targets"
            )));
        }

        let representatives: Vec<&str> = ann
            .id_list_prop("representatives")
            .into_iter()
            .map(local_id)
            .collect();

        // A caption aligned to one of the flagged representatives pins the
        // choice; otherwise fall back to the middle pick.
        let caption = captions.get(id);
        let rep_id = match caption {
            Some(c) if representatives.contains(&c.tp_id.as_str()) => c.tp_id.clone(),
            _ => {
                let candidates: Vec<RepCandidate> = representatives
                    .iter()
                    .filter_map(|rep_id| {
                        timepoints.get(*rep_id).map(|tp| RepCandidate {
                            id: (*rep_id).to_string(),
                            time: tp.time,
                            label: tp.label.clone(),
                        })
                    })
                    .collect();
                choose_representative(&candidates, id)?.id.clone()
            }
        };
        let rep = timepoints.get(&rep_id).ok_or_else(|| {
            CoreError::Annotation(format!(
                "TimeFrame '{id}' representative '{rep_id}' is not a known TimePoint"
            ))
        })?;

        frames.push(TimeFrame {
            id: id.to_string(),
            label,
            start,
            end,
            rep_time: rep.time,
            rep_label: Some(rep.label.clone()),
            text: caption.map(|c| c.text.clone()),
        });
    }

    frames.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
    Ok(ExtractedTimeline {
        frames,
        first_time,
        final_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "views": [
            {
                "id": "v_0",
                "metadata": { "app": "http://apps.clams.ai/swt-detection/v5.0" },
                "annotations": [
                    { "@type": "http://mmif.clams.ai/vocabulary/TimePoint/v4",
                      "properties": { "id": "tp_0", "timePoint": 0, "label": "stale" } }
                ]
            },
            {
                "id": "v_1",
                "metadata": { "app": "http://apps.clams.ai/swt-detection/v7.5" },
                "annotations": [
                    { "@type": "http://mmif.clams.ai/vocabulary/TimePoint/v4",
                      "properties": { "id": "tp_1", "timePoint": 0, "label": "bars" } },
                    { "@type": "http://mmif.clams.ai/vocabulary/TimePoint/v4",
                      "properties": { "id": "tp_2", "timePoint": 1000, "label": "bars" } },
                    { "@type": "http://mmif.clams.ai/vocabulary/TimePoint/v4",
                      "properties": { "id": "tp_3", "timePoint": 2000, "label": "bars" } },
                    { "@type": "http://mmif.clams.ai/vocabulary/TimePoint/v4",
                      "properties": { "id": "tp_4", "timePoint": 6000, "label": "slate" } },
                    { "@type": "http://mmif.clams.ai/vocabulary/TimePoint/v4",
                      "properties": { "id": "tp_5", "timePoint": 7000, "label": "slate" } },
                    { "@type": "http://mmif.clams.ai/vocabulary/TimePoint/v4",
                      "properties": { "id": "tp_6", "timePoint": 9000, "label": "slate" } },
                    { "@type": "http://mmif.clams.ai/vocabulary/TimeFrame/v5",
                      "properties": { "id": "tf_1", "frameType": "bars",
                        "targets": ["tp_1", "tp_2", "tp_3"],
                        "representatives": ["tp_1", "tp_2", "tp_3"] } },
                    { "@type": "http://mmif.clams.ai/vocabulary/TimeFrame/v5",
                      "properties": { "id": "tf_2", "frameType": "slate",
                        "targets": ["tp_4", "tp_5", "tp_6"],
                        "representatives": ["tp_4", "tp_6"] } }
                ]
            },
            {
                "id": "v_2",
                "metadata": { "app": "http://apps.clams.ai/llava-captioner/v1.2" },
                "annotations": [
                    { "@type": "http://mmif.clams.ai/vocabulary/TextDocument/v1",
                      "properties": { "id": "td_1", "origin": "tf_2",
                        "text": { "@value": "PROGRAM SLATE 1974" } } },
                    { "@type": "http://mmif.clams.ai/vocabulary/Alignment/v1",
                      "properties": { "source": "v_1:tp_6", "target": "v_2:td_1" } }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_extracts_frames_and_boundaries() {
        let doc = AnnotationDocument::from_str(SAMPLE).unwrap();
        let timeline = extract_timeline(&doc).unwrap();
        assert_eq!(timeline.first_time, 0);
        assert_eq!(timeline.final_time, 9000);
        assert_eq!(timeline.frames.len(), 2);

        let bars = &timeline.frames[0];
        assert_eq!(bars.id, "tf_1");
        assert_eq!(bars.label, "bars");
        assert_eq!(bars.start, 0);
        assert_eq!(bars.end, 2000);
        assert!(bars.text.is_none());
    }

    #[test]
    fn test_middle_representative_pick() {
        let doc = AnnotationDocument::from_str(SAMPLE).unwrap();
        let timeline = extract_timeline(&doc).unwrap();
        // tf_1 has three representatives; the middle one is tp_2 at 1000ms.
        let bars = &timeline.frames[0];
        assert_eq!(bars.rep_time, 1000);
        assert_eq!(bars.rep_label.as_deref(), Some("bars"));
    }

    #[test]
    fn test_caption_alignment_overrides_middle_pick() {
        let doc = AnnotationDocument::from_str(SAMPLE).unwrap();
        let timeline = extract_timeline(&doc).unwrap();
        // The caption is aligned to tp_6, which is a flagged representative
        // of tf_2, so it wins over the middle pick (tp_4).
        let slate = &timeline.frames[1];
        assert_eq!(slate.id, "tf_2");
        assert_eq!(slate.rep_time, 9000);
        assert_eq!(slate.text.as_deref(), Some("PROGRAM SLATE 1974"));
    }

    #[test]
    fn test_caption_aligned_to_unknown_timepoint_fails() {
        // The alignment names a representative the detector view never
        // produced; that is a malformed document, not a panic.
        let doc = AnnotationDocument::from_str(
            r#"{
            "views": [
                { "id": "v_1",
                  "metadata": { "app": "http://apps.clams.ai/swt-detection/v7.5" },
                  "annotations": [
                      { "@type": "http://mmif.clams.ai/vocabulary/TimePoint/v4",
                        "properties": { "id": "tp_1", "timePoint": 0, "label": "bars" } },
                      { "@type": "http://mmif.clams.ai/vocabulary/TimeFrame/v5",
                        "properties": { "id": "tf_1", "frameType": "bars",
                          "targets": ["tp_1"],
                          "representatives": ["tp_1", "tp_9"] } }
                  ] },
                { "id": "v_2",
                  "metadata": { "app": "http://apps.clams.ai/llava-captioner/v1.2" },
                  "annotations": [
                      { "@type": "http://mmif.clams.ai/vocabulary/TextDocument/v1",
                        "properties": { "id": "td_1", "origin": "tf_1",
                          "text": { "@value": "COLOR BARS" } } },
                      { "@type": "http://mmif.clams.ai/vocabulary/Alignment/v1",
                        "properties": { "source": "v_1:tp_9", "target": "v_2:td_1" } }
                  ] }
            ]
        }"#,
        )
        .unwrap();
        assert!(matches!(
            extract_timeline(&doc),
            Err(CoreError::Annotation(_))
        ));
    }

    #[test]
    fn test_last_detector_view_wins() {
        let doc = AnnotationDocument::from_str(SAMPLE).unwrap();
        let timeline = extract_timeline(&doc).unwrap();
        // v_0 is an older detector run; its lone timepoint must not widen
        // the boundaries or leak its label.
        assert_eq!(timeline.first_time, 0);
        assert!(
            timeline
                .frames
                .iter()
                .all(|f| f.rep_label.as_deref() != Some("stale"))
        );
    }

    #[test]
    fn test_timepoints_without_frames() {
        let doc = AnnotationDocument::from_str(
            r#"{
            "views": [
                { "id": "v_1",
                  "metadata": { "app": "http://apps.clams.ai/swt-detection/v7.5" },
                  "annotations": [
                      { "@type": "http://mmif.clams.ai/vocabulary/TimePoint/v4",
                        "properties": { "id": "tp_1", "timePoint": 500, "label": "bars" } }
                  ] }
            ]
        }"#,
        )
        .unwrap();
        let timeline = extract_timeline(&doc).unwrap();
        assert!(timeline.frames.is_empty());
        assert_eq!(timeline.first_time, 500);
        assert_eq!(timeline.final_time, 500);
    }

    #[test]
    fn test_document_without_detector_views_fails() {
        let doc = AnnotationDocument::from_str(r#"{ "views": [] }"#).unwrap();
        assert!(matches!(
            extract_timeline(&doc),
            Err(CoreError::Annotation(_))
        ));
    }

    #[test]
    fn test_frame_without_representatives_fails() {
        let doc = AnnotationDocument::from_str(
            r#"{
            "views": [
                { "id": "v_1",
                  "metadata": { "app": "http://apps.clams.ai/swt-detection/v7.5" },
                  "annotations": [
                      { "@type": "http://mmif.clams.ai/vocabulary/TimePoint/v4",
                        "properties": { "id": "tp_1", "timePoint": 0, "label": "bars" } },
                      { "@type": "http://mmif.clams.ai/vocabulary/TimeFrame/v5",
                        "properties": { "id": "tf_1", "frameType": "bars",
                          "targets": ["tp_1"], "representatives": [] } }
                  ] }
            ]
        }"#,
        )
        .unwrap();
        assert!(matches!(
            extract_timeline(&doc),
            Err(CoreError::Contract(_))
        ));
    }
}
