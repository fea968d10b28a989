//! Command implementations for the CLI.
//!
//! Each submodule implements one subcommand. The shared plumbing here loads
//! the annotation document, resolves the adjustment policy, and runs the
//! adjuster once per invocation.

pub mod data;
pub mod extract;
pub mod index;
pub mod visaid;

use std::fs;
use std::path::Path;

use anyhow::Context;
use visaid_core::timeline::TimeFrame;
use visaid_core::{AdjustOptions, AnnotationDocument, adjust_frames, extract_timeline};

use crate::cli::TimelineArgs;

/// An extracted-and-adjusted timeline plus the identifier artifacts are
/// named after.
pub struct LoadedTimeline {
    pub frames: Vec<TimeFrame>,
    pub first_time: i64,
    pub final_time: i64,
    pub item_id: String,
}

/// Loads the annotation document and runs the adjuster with the resolved
/// policy. Configuration warnings are logged here so every subcommand
/// surfaces them the same way.
pub fn load_timeline(args: &TimelineArgs) -> anyhow::Result<LoadedTimeline> {
    let doc = AnnotationDocument::from_path(&args.mmif_path)
        .with_context(|| format!("reading annotation file {}", args.mmif_path.display()))?;
    let extracted = extract_timeline(&doc).context("extracting timeline from annotations")?;
    log::info!(
        "extracted {} frames spanning {}..{} ms",
        extracted.frames.len(),
        extracted.first_time,
        extracted.final_time
    );

    let (options, mut warnings) = resolve_adjust_options(args)?;
    let outcome = adjust_frames(
        &extracted.frames,
        extracted.first_time,
        extracted.final_time,
        &options,
    )
    .context("adjusting timeline")?;
    warnings.extend(outcome.warnings);
    for warning in &warnings {
        log::warn!("{warning}");
    }

    Ok(LoadedTimeline {
        frames: outcome.frames,
        first_time: extracted.first_time,
        final_time: extracted.final_time,
        item_id: resolve_item_id(args),
    })
}

/// Resolves the adjustment policy: an options file wins, then the
/// recommended defaults if requested, then the no-op configuration.
fn resolve_adjust_options(args: &TimelineArgs) -> anyhow::Result<(AdjustOptions, Vec<String>)> {
    if let Some(path) = &args.adjust_options {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading adjustment options {}", path.display()))?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("parsing adjustment options {}", path.display()))?;
        let (options, warnings) = AdjustOptions::from_json(&value)?;
        return Ok((options, warnings));
    }
    if args.recommended {
        return Ok((AdjustOptions::recommended(), Vec::new()));
    }
    Ok((AdjustOptions::default(), Vec::new()))
}

/// The item id named on the command line, or the annotation filename stem.
fn resolve_item_id(args: &TimelineArgs) -> String {
    args.item_id.clone().unwrap_or_else(|| {
        args.mmif_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "item".to_string())
    })
}

/// Validates that a video path exists before handing it to ffmpeg.
pub fn check_video_path(path: &Path) -> anyhow::Result<()> {
    if !path.is_file() {
        anyhow::bail!("video file not found: {}", path.display());
    }
    Ok(())
}
