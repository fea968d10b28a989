//! Scene-timeline data model.
//!
//! This module defines the `TimeFrame` record shared by the extraction
//! adapter, the timeline adjuster, and the reporting adapters, along with the
//! label and id conventions for synthetic frames. All times are integer
//! milliseconds from the start of the media item.

pub mod adjust;
pub mod representative;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Id of the sentinel frame bracketing the start of the analyzed timeline.
pub const FIRST_FRAME_ID: &str = "f_0";

/// Id of the sentinel frame bracketing the end of the analyzed timeline.
pub const FINAL_FRAME_ID: &str = "f_n";

/// Label of the start sentinel frame.
pub const FIRST_FRAME_LABEL: &str = "first frame checked";

/// Label of the end sentinel frame.
pub const FINAL_FRAME_LABEL: &str = "last frame checked";

/// Label assigned to synthetic gap-sample frames.
pub const UNLABELED_SAMPLE_LABEL: &str = "unlabeled sample";

/// Suffix appended to a parent label to form a subsample label.
pub const SUBSAMPLE_SUFFIX: &str = " subsample";

/// A labeled span of time within one media item, with a designated
/// representative instant whose extracted still exemplifies the span.
///
/// Degenerate frames (`start == end`) are legal; the sentinel frames are
/// always degenerate. Within one adjusted timeline, ids are unique and
/// frames are sorted by `(start, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFrame {
    /// Frame id, unique within one timeline. Synthetic gap samples use
    /// `s_N`, subsamples use `<parent_id>_s_N`, sentinels use `f_0`/`f_n`.
    pub id: String,

    /// The coarse scene bin (e.g. "bars", "slate", "chyron", "credits").
    pub label: String,

    /// Start of the span, in milliseconds.
    pub start: i64,

    /// End of the span, in milliseconds. Must be >= `start`.
    pub end: i64,

    /// The representative instant, in `start..=end`.
    pub rep_time: i64,

    /// The fine-grained annotation label at `rep_time`, when the frame came
    /// from a real detection. Always `None` for synthetic frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rep_label: Option<String>,

    /// Free text associated with the representative instant (e.g. OCR or
    /// caption output). Always `None` for synthetic frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl TimeFrame {
    /// Builds a frame with no representative label or text, as used for all
    /// synthetic frames.
    pub fn synthetic(id: String, label: String, start: i64, end: i64, rep_time: i64) -> Self {
        TimeFrame {
            id,
            label,
            start,
            end,
            rep_time,
            rep_label: None,
            text: None,
        }
    }

    /// Span duration in milliseconds.
    #[must_use]
    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    /// True for frames manufactured by the adjuster rather than detected
    /// upstream: sentinels, gap samples, and subsamples.
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.id == FIRST_FRAME_ID
            || self.id == FINAL_FRAME_ID
            || self.label == UNLABELED_SAMPLE_LABEL
            || self.label.ends_with(SUBSAMPLE_SUFFIX)
    }

    /// Checks the structural invariants every frame must satisfy on entry to
    /// the adjuster: a non-negative, forward span containing its
    /// representative instant.
    pub fn validate(&self) -> CoreResult<()> {
        if self.start < 0 {
            return Err(CoreError::Contract(format!(
                "frame '{}' has negative start ({})",
                self.id, self.start
            )));
        }
        if self.start > self.end {
            return Err(CoreError::Contract(format!(
                "frame '{}' has start ({}) after end ({})",
                self.id, self.start, self.end
            )));
        }
        if self.rep_time < self.start || self.rep_time > self.end {
            return Err(CoreError::Contract(format!(
                "frame '{}' has rep_time ({}) outside span {}..{}",
                self.id, self.rep_time, self.start, self.end
            )));
        }
        Ok(())
    }
}

/// A pair of frames whose spans overlap, reported by `find_overlaps`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlap {
    pub id: String,
    pub label: String,
    pub other_id: String,
    pub other_label: String,
    pub start: i64,
    pub end: i64,
    pub duration: i64,
}

/// Diagnostic scan for overlapping frames.
///
/// Reports every ordered pair `(a, b)` where `b` starts within `a`'s span.
/// Subsamples overlapping their parent are reported too; callers that only
/// care about real detections should filter synthetics first.
#[must_use]
pub fn find_overlaps(frames: &[TimeFrame]) -> Vec<Overlap> {
    let mut sorted: Vec<&TimeFrame> = frames.iter().collect();
    sorted.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));

    let mut overlaps = Vec::new();
    for a in &sorted {
        for b in &sorted {
            if a.start <= b.start && a.end >= b.start && a.id != b.id {
                overlaps.push(Overlap {
                    id: a.id.clone(),
                    label: a.label.clone(),
                    other_id: b.id.clone(),
                    other_label: b.label.clone(),
                    start: b.start,
                    end: a.end.min(b.end),
                    duration: a.end.min(b.end) - b.start,
                });
            }
        }
    }
    overlaps
}

/// Formats milliseconds as `H:MM:SS` or, with `frac`, `H:MM:SS.mmm`.
#[must_use]
pub fn format_ms(ms: i64, frac: bool) -> String {
    let ms = ms.max(0);
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    if frac {
        format!("{hours}:{minutes:02}:{seconds:02}.{millis:03}")
    } else {
        format!("{hours}:{minutes:02}:{seconds:02}")
    }
}
