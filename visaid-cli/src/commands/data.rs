//! The `data` command: write the inferred-metadata JSON summary.

use std::path::PathBuf;

use visaid_core::{ProgramStartOptions, infer_program_start, write_inferred_data};

use crate::cli::DataArgs;
use crate::commands::load_timeline;

pub fn run(args: &DataArgs) -> anyhow::Result<()> {
    if args.min_start > args.max_start {
        anyhow::bail!(
            "--min-start ({}) must not exceed --max-start ({})",
            args.min_start,
            args.max_start
        );
    }
    let timeline = load_timeline(&args.timeline)?;

    let options = ProgramStartOptions {
        min_start_ms: args.min_start,
        max_start_ms: args.max_start,
    };
    let inferred = infer_program_start(&timeline.frames, &options);
    log::info!(
        "bars end: {:?} ms, slate begin: {:?} ms, proxy start: {} ms",
        inferred.bars_end,
        inferred.slate_begin,
        inferred.proxy_start
    );

    let out_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}_inferred_data.json", timeline.item_id)));
    let wrote = write_inferred_data(
        &out_path,
        &timeline.item_id,
        &timeline.frames,
        &inferred,
        &options,
    )?;

    if wrote {
        println!(
            "proxy start {} s; data written to {}",
            inferred.proxy_start / 1000,
            out_path.display()
        );
    } else {
        println!("no usable proxy start inferred; no data written");
    }
    Ok(())
}
