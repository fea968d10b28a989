//! Core library for turning machine-generated scene annotations into
//! review-ready timelines and visual indexes.
//!
//! The algorithmic heart is the timeline adjuster: given the sparse,
//! possibly gappy frame list a detector produced for one video, it fills
//! unlabeled gaps with synthetic sample frames, subdivides long scenes into
//! subsamples, applies type filters, and returns a sorted, internally
//! consistent timeline. Everything around it is adapters: extraction from
//! the annotation document on one side, and the HTML visual index, inferred
//! metadata, and labeling-tool image index on the other.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use visaid_core::{AdjustOptions, AnnotationDocument, adjust_frames, extract_timeline};
//!
//! let doc = AnnotationDocument::from_path(Path::new("item.mmif")).unwrap();
//! let timeline = extract_timeline(&doc).unwrap();
//!
//! let options = AdjustOptions::recommended();
//! let adjusted = adjust_frames(
//!     &timeline.frames,
//!     timeline.first_time,
//!     timeline.final_time,
//!     &options,
//! ).unwrap();
//!
//! for warning in &adjusted.warnings {
//!     log::warn!("{warning}");
//! }
//! for frame in &adjusted.frames {
//!     println!("{} {}..{} {}", frame.id, frame.start, frame.end, frame.label);
//! }
//! ```

pub mod error;
pub mod extraction;
pub mod media;
pub mod reporting;
pub mod timeline;

// Re-exports for public API
pub use error::{CoreError, CoreResult};
pub use extraction::{AnnotationDocument, ExtractedTimeline, extract_timeline};
pub use reporting::visaid::{VisaidOptions, create_visaid};
pub use reporting::{
    ProgramStart, ProgramStartOptions, infer_program_start, write_image_index,
    write_inferred_data,
};
pub use timeline::adjust::{AdjustOptions, AdjustOutcome, adjust_frames};
pub use timeline::{TimeFrame, find_overlaps, format_ms};
