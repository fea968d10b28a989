//! The `extract` command: save one representative still per frame.

use std::path::PathBuf;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use visaid_core::{media, write_image_index};

use crate::cli::ExtractArgs;
use crate::commands::{check_video_path, load_timeline};

pub fn run(args: &ExtractArgs) -> anyhow::Result<()> {
    check_video_path(&args.video_path)?;
    let timeline = load_timeline(&args.timeline)?;

    let out_dir = args
        .out_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}_stills", timeline.item_id)));

    let duration_ms = media::media_duration_ms(&args.video_path)
        .with_context(|| format!("probing {}", args.video_path.display()))?;

    let bar = ProgressBar::new(timeline.frames.len() as u64).with_style(
        ProgressStyle::with_template("{msg} [{bar:30}] {pos}/{len}")
            .expect("valid progress template"),
    );
    bar.set_message("extracting stills");

    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut written = 0usize;
    for frame in &timeline.frames {
        let out_path = out_dir.join(media::still_filename(
            &timeline.item_id,
            duration_ms,
            frame.rep_time,
        ));
        match media::extract_still(&args.video_path, frame.rep_time, None, &out_path) {
            Ok(()) => written += 1,
            Err(e) => log::warn!(
                "skipping still at {}ms for {}: {e}",
                frame.rep_time,
                args.video_path.display()
            ),
        }
        bar.inc(1);
    }
    bar.finish_and_clear();
    println!(
        "{written} of {} stills written to {}",
        timeline.frames.len(),
        out_dir.display()
    );

    if args.image_index {
        let index_path = out_dir.join(format!("{}_image_index.csv", timeline.item_id));
        write_image_index(&index_path, &timeline.item_id, duration_ms, &timeline.frames)?;
        println!("image index written to {}", index_path.display());
    }
    Ok(())
}
