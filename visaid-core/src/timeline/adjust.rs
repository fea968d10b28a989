//! The timeline adjuster.
//!
//! Takes the raw frame list produced by extraction plus a policy
//! configuration, and produces a clean, gap-free, appropriately dense
//! timeline: unlabeled gaps get synthetic sample frames, overly long scenes
//! of selected types get subsample frames, and the whole list comes out
//! sorted with every frame's representative instant inside its span.
//!
//! This is a pure function of `(frames, first_time, final_time, options)`.
//! It performs no I/O and never mutates its input. Configuration problems
//! (unknown keys, bad thresholds) are collected as warnings and worked
//! around; structural problems in the input (reversed spans, reversed
//! boundaries) are caller bugs and raise `CoreError::Contract`.
//!
//! Stage order is fixed: type filtering, sentinel insertion, gap sampling,
//! scene subsampling, sentinel removal, final sort. Subsampling thresholds
//! are resolved against the labels of the original input and applied only to
//! original frames, never to gap samples or sentinels.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::timeline::{
    FINAL_FRAME_ID, FINAL_FRAME_LABEL, FIRST_FRAME_ID, FIRST_FRAME_LABEL, SUBSAMPLE_SUFFIX,
    TimeFrame, UNLABELED_SAMPLE_LABEL,
};

/// Upper sanity bound for a per-type subsampling threshold (2.5 hours).
/// Thresholds at or above this are treated as configuration errors.
pub const MAX_SUBSAMPLING_THRESHOLD_MS: i64 = 9_000_000;

/// Policy configuration for one `adjust_frames` invocation.
///
/// Immutable per call. `AdjustOptions::default()` is the no-op
/// configuration: no filtering, no gap sampling, no subsampling, sentinels
/// dropped. `AdjustOptions::recommended()` carries the production defaults
/// tuned for broadcast material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustOptions {
    /// If set, only frames with these labels survive filtering.
    pub include_only: Option<Vec<String>>,

    /// Frames with these labels are dropped.
    pub exclude: Vec<String>,

    /// Largest permitted silence between consecutive frames before synthetic
    /// gap samples are inserted. `None` or `Some(0)` disables gap sampling.
    pub max_unsampled_gap: Option<i64>,

    /// Per-label subsampling thresholds in milliseconds. A frame whose
    /// duration exceeds its label's threshold is subdivided.
    pub subsampling: BTreeMap<String, i64>,

    /// Fallback threshold applied to every label present in the input but
    /// absent from `subsampling`. `None` disables the fallback.
    pub default_subsampling: Option<i64>,

    /// Keep the `f_0` sentinel in the output.
    pub include_first_time: bool,

    /// Keep the `f_n` sentinel in the output.
    pub include_final_time: bool,
}

impl Default for AdjustOptions {
    fn default() -> Self {
        AdjustOptions {
            include_only: None,
            exclude: Vec::new(),
            max_unsampled_gap: None,
            subsampling: BTreeMap::new(),
            default_subsampling: None,
            include_first_time: false,
            include_final_time: false,
        }
    }
}

impl AdjustOptions {
    /// The production defaults tuned for broadcast material: sample any
    /// silence over a minute, and subsample long scenes with thresholds
    /// chosen per bin (credits move fast, bars barely change).
    #[must_use]
    pub fn recommended() -> Self {
        let subsampling = BTreeMap::from([
            ("bars".to_string(), 120_100),
            ("credits".to_string(), 1_900),
            ("chyron".to_string(), 15_100),
            ("person & chyron".to_string(), 15_100),
            ("other text".to_string(), 4_900),
            ("slate".to_string(), 9_900),
        ]);
        AdjustOptions {
            max_unsampled_gap: Some(60_000),
            subsampling,
            default_subsampling: Some(30_100),
            ..AdjustOptions::default()
        }
    }

    /// Parses options from a JSON object, collecting a warning for every
    /// unrecognized key instead of failing. Recognized keys that are present
    /// override the no-op defaults.
    pub fn from_json(value: &serde_json::Value) -> CoreResult<(Self, Vec<String>)> {
        const KNOWN_KEYS: [&str; 7] = [
            "include_only",
            "exclude",
            "max_unsampled_gap",
            "subsampling",
            "default_subsampling",
            "include_first_time",
            "include_final_time",
        ];

        let map = value.as_object().ok_or_else(|| {
            CoreError::Annotation("adjustment options must be a JSON object".to_string())
        })?;

        let mut warnings = Vec::new();
        for key in map.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                log::warn!("'{key}' is not a valid adjustment option; ignoring");
                warnings.push(format!("unknown option '{key}' ignored"));
            }
        }

        let mut known = serde_json::Map::new();
        for (key, val) in map {
            if KNOWN_KEYS.contains(&key.as_str()) {
                known.insert(key.clone(), val.clone());
            }
        }
        let options = serde_json::from_value(serde_json::Value::Object(known))?;
        Ok((options, warnings))
    }
}

/// Result of one adjuster invocation: the adjusted frame list plus any
/// configuration warnings collected along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustOutcome {
    pub frames: Vec<TimeFrame>,
    pub warnings: Vec<String>,
}

/// Adjusts a raw frame list into a review-ready timeline.
///
/// `first_time` and `final_time` are the earliest and latest instants the
/// upstream detector actually analyzed; they bound the sentinel frames and
/// therefore the gap detection at the edges of the timeline.
///
/// The output is sorted by `(start, id)` and satisfies every frame
/// invariant, including for synthetic frames. Given identical inputs the
/// output is identical.
pub fn adjust_frames(
    frames: &[TimeFrame],
    first_time: i64,
    final_time: i64,
    options: &AdjustOptions,
) -> CoreResult<AdjustOutcome> {
    if first_time > final_time {
        return Err(CoreError::Contract(format!(
            "first_time ({first_time}) after final_time ({final_time})"
        )));
    }
    for frame in frames {
        frame.validate()?;
    }

    let mut warnings = Vec::new();

    // Stage 1: type filtering.
    let mut working: Vec<TimeFrame> = frames.to_vec();
    if let Some(only) = &options.include_only {
        working.retain(|f| only.contains(&f.label));
    }
    if !options.exclude.is_empty() {
        working.retain(|f| !options.exclude.contains(&f.label));
    }

    // Keep the filtered originals aside: subsampling applies to these and
    // only these, never to gap samples or sentinels.
    let originals = working.clone();

    // Stage 2: sentinel insertion. Gaps can only exist between two frames,
    // so bracketing the list lets stage 3 find silence at the very beginning
    // and end of the analyzed span.
    working.insert(
        0,
        TimeFrame::synthetic(
            FIRST_FRAME_ID.to_string(),
            FIRST_FRAME_LABEL.to_string(),
            first_time,
            first_time,
            first_time,
        ),
    );
    working.push(TimeFrame::synthetic(
        FINAL_FRAME_ID.to_string(),
        FINAL_FRAME_LABEL.to_string(),
        final_time,
        final_time,
        final_time,
    ));
    sort_frames(&mut working);

    // Stage 3: gap sampling.
    if let Some(max_gap) = options.max_unsampled_gap.filter(|g| *g > 0) {
        working.extend(gap_samples(&working, max_gap));
        sort_frames(&mut working);
    }

    // Stage 4: scene subsampling.
    let thresholds = resolve_thresholds(frames, options, &mut warnings);
    if !thresholds.is_empty() {
        let mut children = Vec::new();
        for frame in &originals {
            if let Some(&threshold) = thresholds.get(&frame.label) {
                if frame.duration() > threshold {
                    children.extend(subsample(frame, threshold));
                }
            }
        }
        working.extend(children);
    }

    // Stage 5: sentinel removal, unless opted in.
    if !options.include_first_time {
        working.retain(|f| f.id != FIRST_FRAME_ID);
    }
    if !options.include_final_time {
        working.retain(|f| f.id != FINAL_FRAME_ID);
    }

    // Stage 6: final sort.
    sort_frames(&mut working);

    Ok(AdjustOutcome {
        frames: working,
        warnings,
    })
}

/// Stable ordering for adjusted timelines: start time, then id, so a parent
/// and its first subsample order deterministically.
fn sort_frames(frames: &mut [TimeFrame]) {
    frames.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
}

/// Walks adjacent pairs of the sorted frame list and manufactures sample
/// frames for every silence longer than `max_gap`.
///
/// A gap of length `full_gap` is divided into `full_gap / max_gap` equal-ish
/// sub-gaps, and one sample of duration `max_gap / 2` is centered in each.
/// Sample numbering is a single monotonic counter across the whole timeline.
fn gap_samples(sorted: &[TimeFrame], max_gap: i64) -> Vec<TimeFrame> {
    // Samples exist for their central still; any duration under the gap
    // threshold works, half of it keeps them visually distinct.
    let sample_dur = max_gap / 2;

    let mut samples = Vec::new();
    let mut next_sample_num = 1;

    for pair in sorted.windows(2) {
        let full_gap = pair[1].start - pair[0].end;
        if full_gap > max_gap {
            let num_samples = full_gap / max_gap;
            let gap_size = full_gap / num_samples;

            for k in 0..num_samples {
                let gap_start = pair[0].end + k * gap_size;
                let sample_start = gap_start + (gap_size - sample_dur) / 2;
                samples.push(TimeFrame::synthetic(
                    format!("s_{next_sample_num}"),
                    UNLABELED_SAMPLE_LABEL.to_string(),
                    sample_start,
                    sample_start + sample_dur,
                    sample_start + sample_dur / 2,
                ));
                next_sample_num += 1;
            }
        }
    }
    samples
}

/// Resolves the effective per-label threshold map: the fallback threshold
/// applied to every label present in the input, overlaid with the explicit
/// per-label entries. Entries outside the sane range are dropped with a
/// warning.
fn resolve_thresholds(
    input: &[TimeFrame],
    options: &AdjustOptions,
    warnings: &mut Vec<String>,
) -> BTreeMap<String, i64> {
    let mut thresholds = BTreeMap::new();

    if let Some(default) = options.default_subsampling {
        for frame in input {
            thresholds.insert(frame.label.clone(), default);
        }
    }
    for (label, &threshold) in &options.subsampling {
        thresholds.insert(label.clone(), threshold);
    }

    thresholds.retain(|label, &mut threshold| {
        let valid = threshold > 0 && threshold < MAX_SUBSAMPLING_THRESHOLD_MS;
        if !valid {
            log::warn!("ignoring invalid subsampling threshold for '{label}': {threshold}");
            warnings.push(format!(
                "invalid subsampling threshold for '{label}' ignored: {threshold}"
            ));
        }
        valid
    });
    thresholds
}

/// Subdivides one long frame into enough contiguous children that each is
/// shorter than the threshold. Example: a 36s scene with a 10s threshold
/// yields 4 children of 9s each.
///
/// Children cover the parent span end to end; the last child ends exactly at
/// the parent's end, absorbing integer-division drift. Each child's
/// representative instant is its own midpoint. The parent is left in place;
/// consumers tell the two apart by the label suffix.
fn subsample(parent: &TimeFrame, threshold: i64) -> Vec<TimeFrame> {
    let duration = parent.duration();
    let num_subsamples = duration / threshold + 1;
    let subsample_dur = duration / num_subsamples;

    let mut children = Vec::with_capacity(num_subsamples as usize);
    let mut next_start = parent.start;

    for index in 0..num_subsamples {
        let end = if index == num_subsamples - 1 {
            parent.end
        } else {
            next_start + subsample_dur
        };
        children.push(TimeFrame::synthetic(
            format!("{}_s_{index}", parent.id),
            format!("{}{}", parent.label, SUBSAMPLE_SUFFIX),
            next_start,
            end,
            next_start + (end - next_start) / 2,
        ));
        next_start = end;
    }
    children
}
