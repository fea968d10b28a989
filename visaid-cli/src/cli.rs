//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "visaid: scene-timeline adjustment and visual-index building",
    long_about = "Turns a detector's annotation document into review artifacts: \
                  a printed frame index, extracted stills, an HTML visual index, \
                  or an inferred-metadata JSON summary."
)]
pub struct Cli {
    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a table of the adjusted frames
    Index(IndexArgs),

    /// Extract a representative still per frame into a directory
    Extract(ExtractArgs),

    /// Build the HTML visual index with embedded stills
    Visaid(VisaidArgs),

    /// Write the inferred-metadata JSON summary (program start, frames)
    Data(DataArgs),
}

/// Arguments shared by every subcommand: the annotation document and the
/// adjustment policy.
#[derive(Args, Debug)]
pub struct TimelineArgs {
    /// Path to the annotation (MMIF) file
    #[arg(value_name = "MMIF")]
    pub mmif_path: PathBuf,

    /// JSON file with adjustment options (unknown keys are warned about)
    #[arg(long, value_name = "FILE")]
    pub adjust_options: Option<PathBuf>,

    /// Use the recommended production adjustment defaults instead of the
    /// no-op configuration
    #[arg(long)]
    pub recommended: bool,

    /// Item identifier used in artifact names and catalog links
    /// (defaults to the annotation filename stem)
    #[arg(long, value_name = "ID")]
    pub item_id: Option<String>,
}

#[derive(Args, Debug)]
pub struct IndexArgs {
    #[command(flatten)]
    pub timeline: TimelineArgs,

    /// Also report overlapping frames
    #[arg(long)]
    pub overlaps: bool,
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub timeline: TimelineArgs,

    /// Path to the video file
    #[arg(value_name = "VIDEO")]
    pub video_path: PathBuf,

    /// Directory for the extracted stills (defaults to "<item_id>_stills")
    #[arg(short, long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Also write the labeling-tool image index CSV alongside the stills
    #[arg(long)]
    pub image_index: bool,
}

#[derive(Args, Debug)]
pub struct VisaidArgs {
    #[command(flatten)]
    pub timeline: TimelineArgs,

    /// Path to the video file
    #[arg(value_name = "VIDEO")]
    pub video_path: PathBuf,

    /// Output HTML path (defaults to "<item_id>_visaid.html")
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// JSON file with visaid display options
    #[arg(long, value_name = "FILE")]
    pub visaid_options: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DataArgs {
    #[command(flatten)]
    pub timeline: TimelineArgs,

    /// Output JSON path (defaults to "<item_id>_inferred_data.json")
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Floor: inferred starts below this many milliseconds become zero
    #[arg(long, value_name = "MS", default_value_t = 1_000)]
    pub min_start: i64,

    /// Cutoff: bars/slate frames ending after this many milliseconds are
    /// ignored
    #[arg(long, value_name = "MS", default_value_t = 300_000)]
    pub max_start: i64,
}
