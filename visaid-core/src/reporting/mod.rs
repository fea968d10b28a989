//! Reporting adapters: consumers of an adjusted timeline.
//!
//! Three artifacts come out of this module: the HTML visual index (see
//! `visaid`), the inferred-data JSON summary, and the flat image index used
//! by the manual labeling tool. All three take the adjuster's output as
//! given; none of them re-derive timeline structure.

pub mod visaid;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde_json::json;

use crate::error::CoreResult;
use crate::media::still_filename;
use crate::timeline::TimeFrame;

/// Labels treated as color bars when inferring the program start. The
/// detector has emitted both spellings over time.
pub const BARS_BINS: [&str; 2] = ["bars", "Bars"];

/// Labels treated as slates when inferring the program start, including the
/// single-letter subtype bins from older detector versions.
pub const SLATE_BINS: [&str; 8] = ["slate", "Slate", "S", "S:H", "S:C", "S:D", "S:B", "S:G"];

/// Bounds for program-start inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramStartOptions {
    /// Inferred starts below this are floored to zero (too close to the
    /// beginning to be meaningful).
    pub min_start_ms: i64,
    /// Bars/slate frames ending after this are ignored; a slate detected
    /// deep into the program is almost certainly a false positive.
    pub max_start_ms: i64,
}

impl Default for ProgramStartOptions {
    fn default() -> Self {
        ProgramStartOptions {
            min_start_ms: 1_000,
            max_start_ms: 300_000,
        }
    }
}

/// The inferred program start and the evidence behind it, all in
/// milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramStart {
    /// End of the last bars frame near the head of the timeline.
    pub bars_end: Option<i64>,
    /// Start of the first slate frame near the head of the timeline.
    pub slate_begin: Option<i64>,
    /// Where the program proper is believed to begin. Zero when neither
    /// bars nor slate were found, or when the evidence sat below the
    /// plausibility floor.
    pub proxy_start: i64,
}

/// Infers where the program content begins: after the bars end or at the
/// slate start, whichever is later.
#[must_use]
pub fn infer_program_start(frames: &[TimeFrame], options: &ProgramStartOptions) -> ProgramStart {
    let mut sorted: Vec<&TimeFrame> = frames.iter().collect();
    sorted.sort_by_key(|f| f.start);

    let bars_end = sorted
        .iter()
        .filter(|f| BARS_BINS.contains(&f.label.as_str()) && f.end <= options.max_start_ms)
        .next_back()
        .map(|f| f.end);

    let slate_begin = sorted
        .iter()
        .find(|f| SLATE_BINS.contains(&f.label.as_str()) && f.end <= options.max_start_ms)
        .map(|f| f.start);

    let mut proxy_start = match (bars_end, slate_begin) {
        (Some(bars), Some(slate)) => bars.max(slate),
        (Some(bars), None) => bars,
        (None, Some(slate)) => slate,
        (None, None) => 0,
    };
    if proxy_start < options.min_start_ms {
        proxy_start = 0;
    }

    ProgramStart {
        bars_end,
        slate_begin,
        proxy_start,
    }
}

/// Writes the inferred-data JSON artifact: the adjusted frames plus the
/// program-start evidence, with second-granularity values for the catalog.
///
/// A proxy start of 0 carries no information for the catalog, so nothing is
/// written and `false` is returned.
pub fn write_inferred_data(
    out_path: &Path,
    item_id: &str,
    frames: &[TimeFrame],
    program_start: &ProgramStart,
    options: &ProgramStartOptions,
) -> CoreResult<bool> {
    if program_start.proxy_start == 0 {
        log::info!("proxy start is 0 for {item_id}; not writing inferred data");
        return Ok(false);
    }

    let artifact = json!([{
        "metadata": {
            "asset_id": item_id,
            "timestamp": chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
            "process": "visaid-core/reporting",
            "process_version": env!("CARGO_PKG_VERSION"),
            "process_details": {
                "min_proxy_start_ms": options.min_start_ms,
                "max_proxy_start_ms": options.max_start_ms,
            },
        },
        "data": {
            "time_frames": frames,
            "bars_end_time": program_start.bars_end.map(|ms| ms / 1000),
            "slate_begin_time": program_start.slate_begin.map(|ms| ms / 1000),
            "proxy_start_time": program_start.proxy_start / 1000,
        },
    }]);

    let file = File::create(out_path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), &artifact)?;
    Ok(true)
}

/// Writes the flat image index consumed by the manual labeling tool: one CSV
/// row per frame, naming the still extracted at its representative instant.
///
/// Filenames follow the still-extraction convention,
/// `<item>_<duration_ms:08>_<rep_ms:08>.jpg`, so rows pair up with the files
/// `media::extract_stills` writes.
pub fn write_image_index(
    out_path: &Path,
    item_id: &str,
    duration_ms: i64,
    frames: &[TimeFrame],
) -> CoreResult<()> {
    let file = File::create(out_path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "filename,label,start,end,rep_time")?;
    for frame in frames {
        writeln!(
            writer,
            "{filename},{label},{start},{end},{rep}",
            filename = still_filename(item_id, duration_ms, frame.rep_time),
            rep = frame.rep_time,
            label = csv_field(&frame.label),
            start = frame.start,
            end = frame.end,
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Quotes a CSV field when it contains a comma or quote.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
