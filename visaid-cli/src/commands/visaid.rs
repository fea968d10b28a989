//! The `visaid` command: build the HTML visual index.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use visaid_core::{VisaidOptions, create_visaid};

use crate::cli::VisaidArgs;
use crate::commands::{check_video_path, load_timeline};

pub fn run(args: &VisaidArgs) -> anyhow::Result<()> {
    check_video_path(&args.video_path)?;
    let timeline = load_timeline(&args.timeline)?;

    let options = match &args.visaid_options {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading visaid options {}", path.display()))?;
            let value: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("parsing visaid options {}", path.display()))?;
            let (options, warnings) = VisaidOptions::from_json(&value)?;
            for warning in &warnings {
                log::warn!("{warning}");
            }
            options
        }
        None => VisaidOptions::default(),
    };

    let out_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}_visaid.html", timeline.item_id)));

    create_visaid(
        &args.video_path,
        &timeline.frames,
        Some(&timeline.item_id),
        &options,
        &out_path,
    )
    .context("building visual index")?;

    println!("visual index written to {}", out_path.display());
    Ok(())
}
