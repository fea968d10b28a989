//! The `index` command: print a table of adjusted frames.

use console::style;
use visaid_core::{find_overlaps, format_ms};

use crate::cli::IndexArgs;
use crate::commands::load_timeline;

pub fn run(args: &IndexArgs) -> anyhow::Result<()> {
    let timeline = load_timeline(&args.timeline)?;

    println!(
        "{} frames in {} ({}..{} ms analyzed):\n",
        timeline.frames.len(),
        style(&timeline.item_id).bold(),
        timeline.first_time,
        timeline.final_time
    );
    for frame in &timeline.frames {
        println!(
            "{:>10}  {}  {}  {}",
            frame.id,
            format_ms(frame.start, false),
            format_ms(frame.end, false),
            frame.label
        );
    }

    if args.overlaps {
        let overlaps = find_overlaps(&timeline.frames);
        println!("\n{} overlapping pairs:", overlaps.len());
        for o in overlaps {
            println!(
                "  {} ({}) overlaps {} ({}) for {} ms",
                o.id, o.label, o.other_id, o.other_label, o.duration
            );
        }
    }
    Ok(())
}
