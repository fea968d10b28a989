//! The visual index ("visaid"): a self-contained HTML document with one
//! embedded still per frame, grouped and toggleable by scene type.
//!
//! Rendering is split from media access: `render_visaid_html` is a pure
//! function over frames and pre-encoded stills, and `create_visaid` wires it
//! to ffmpeg-backed still extraction.

use std::fs;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::media;
use crate::timeline::{
    FINAL_FRAME_LABEL, FIRST_FRAME_LABEL, SUBSAMPLE_SUFFIX, TimeFrame, UNLABELED_SAMPLE_LABEL,
    format_ms,
};

const CSS_STR: &str = include_str!("ingredients/visaid_styles.css");
const JS_STR: &str = include_str!("ingredients/visaid_logic.js");
const STRUCTURE_STR: &str = include_str!("ingredients/visaid_structure.html");

/// Scene types manufactured by the adjuster rather than the detector; they
/// get their own checkbox group and start hidden.
pub const SPECIAL_SCENE_TYPES: [&str; 3] =
    [FIRST_FRAME_LABEL, FINAL_FRAME_LABEL, UNLABELED_SAMPLE_LABEL];

/// Display options for the visual index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisaidOptions {
    /// Scene types whose checkboxes start unchecked.
    pub deselected_scene_types: Vec<String>,

    /// Show the media duration next to the identifier.
    pub display_video_duration: bool,

    /// Show millisecond captions under each still.
    pub display_image_ms: bool,

    /// Link each frame's start time to its catalog page (requires an item
    /// id).
    pub aapb_timecode_link: bool,

    /// Cap on embedded still height, in pixels.
    pub max_img_height: u32,
}

impl Default for VisaidOptions {
    fn default() -> Self {
        VisaidOptions {
            deselected_scene_types: Vec::new(),
            display_video_duration: true,
            display_image_ms: true,
            aapb_timecode_link: false,
            max_img_height: 360,
        }
    }
}

impl VisaidOptions {
    /// Parses options from a JSON object, collecting a warning for every
    /// unrecognized key instead of failing.
    pub fn from_json(value: &serde_json::Value) -> CoreResult<(Self, Vec<String>)> {
        const KNOWN_KEYS: [&str; 5] = [
            "deselected_scene_types",
            "display_video_duration",
            "display_image_ms",
            "aapb_timecode_link",
            "max_img_height",
        ];

        let map = value.as_object().ok_or_else(|| {
            CoreError::Annotation("visaid options must be a JSON object".to_string())
        })?;

        let mut warnings = Vec::new();
        for key in map.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                log::warn!("'{key}' is not a valid visaid option; ignoring");
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

/// Builds the visual index for an adjusted timeline and writes it to
/// `out_path`.
///
/// Stills that fail to extract are logged and rendered as captions without
/// an image; a corrupt stretch of media should not sink the whole index.
pub fn create_visaid(
    video: &Path,
    frames: &[TimeFrame],
    item_id: Option<&str>,
    options: &VisaidOptions,
    out_path: &Path,
) -> CoreResult<()> {
    let duration_ms = media::media_duration_ms(video)?;

    let mut stills = Vec::with_capacity(frames.len());
    for frame in frames {
        match media::still_jpeg_bytes(video, frame.rep_time, Some(options.max_img_height)) {
            Ok(bytes) => stills.push(Some(BASE64.encode(bytes))),
            Err(e) => {
                log::warn!(
                    "no still for frame '{}' at {}ms: {e}",
                    frame.id,
                    frame.rep_time
                );
                stills.push(None);
            }
        }
    }

    let identifier = item_id
        .map(str::to_string)
        .or_else(|| {
            video
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_default();

    let html = render_visaid_html(
        frames,
        &stills,
        item_id,
        &identifier,
        Some(duration_ms),
        options,
    );
    fs::write(out_path, html)?;
    log::info!("visual index written to {}", out_path.display());
    Ok(())
}

/// Renders the visual index HTML. `stills` holds one optional base64 JPEG
/// per frame, in frame order.
#[must_use]
pub fn render_visaid_html(
    frames: &[TimeFrame],
    stills: &[Option<String>],
    item_id: Option<&str>,
    identifier: &str,
    duration_ms: Option<i64>,
    options: &VisaidOptions,
) -> String {
    // Scene types in first-appearance order. Specials and subsamples render
    // in their own checkbox group.
    let mut scene_types: Vec<&str> = Vec::new();
    let mut sample_types: Vec<&str> = Vec::new();
    let mut subsamples_present = false;
    for frame in frames {
        let label = frame.label.as_str();
        if label.ends_with(SUBSAMPLE_SUFFIX) {
            subsamples_present = true;
        } else if SPECIAL_SCENE_TYPES.contains(&label) {
            if !sample_types.contains(&label) {
                sample_types.push(label);
            }
        } else if !scene_types.contains(&label) {
            scene_types.push(label);
        }
    }

    let mut scene_type_checkboxes = String::new();
    for (i, scene_type) in scene_types.iter().enumerate() {
        let checked = if options
            .deselected_scene_types
            .iter()
            .any(|t| t == scene_type)
        {
            ""
        } else {
            "checked"
        };
        scene_type_checkboxes.push_str(&format!(
            "<label><input type='checkbox' id='stcb{i}' data-role='scenetype' \
             value='{v}' {checked}>{t}</label>\n",
            v = escape_html(scene_type),
            t = escape_html(scene_type),
        ));
    }

    let mut sample_type_checkboxes = String::new();
    for (i, sample_type) in sample_types.iter().enumerate() {
        sample_type_checkboxes.push_str(&format!(
            "<label><input type='checkbox' id='sacb{i}' data-role='scenetype' \
             value='{v}'>{t}</label>\n",
            v = escape_html(sample_type),
            t = escape_html(sample_type),
        ));
    }
    if subsamples_present {
        sample_type_checkboxes.push_str(
            "<label><input type='checkbox' id='sscb' data-role='subsample' \
             value='scene subsample'>scene subsample</label>\n",
        );
    }

    let mut body = String::new();
    if frames.is_empty() {
        body.push_str("<div>(No annotated scenes.)</div>\n");
    }
    for (frame, still) in frames.iter().zip(stills) {
        body.push_str(&render_item(frame, still.as_deref(), item_id, options));
    }

    let video_duration = match duration_ms {
        Some(ms) if options.display_video_duration => format!("[{}]", format_ms(ms, false)),
        _ => String::new(),
    };
    let options_str = serde_json::to_string_pretty(options).unwrap_or_default();

    STRUCTURE_STR
        .replace("{{video_identifier}}", &escape_html(identifier))
        .replace("{{css_str}}", CSS_STR)
        .replace("{{js_str}}", JS_STR)
        .replace("{{video_duration}}", &video_duration)
        .replace("{{scene_type_checkboxes}}", &scene_type_checkboxes)
        .replace("{{sample_type_checkboxes}}", &sample_type_checkboxes)
        .replace("{{visaid_body}}", &body)
        .replace("{{visaid_options_str}}", &escape_html(&options_str))
        .replace("{{module_version}}", env!("CARGO_PKG_VERSION"))
}

/// Renders one scene item div.
fn render_item(
    frame: &TimeFrame,
    still: Option<&str>,
    item_id: Option<&str>,
    options: &VisaidOptions,
) -> String {
    let label = frame.label.as_str();
    let (div_class, scene_type) = if let Some(parent) = label.strip_suffix(SUBSAMPLE_SUFFIX) {
        ("item subsample", parent)
    } else if label == UNLABELED_SAMPLE_LABEL {
        ("item unsample", label)
    } else {
        ("item", label)
    };

    let start_str = format_ms(frame.start, false);
    let end_str = format_ms(frame.end, false);
    let html_start = match item_id {
        Some(id) if options.aapb_timecode_link => format!(
            "<a href='https://americanarchive.org/catalog/{id}?proxy_start_time={}'>{start_str}</a>",
            frame.start as f64 / 1000.0,
        ),
        _ => start_str,
    };

    let image = match still {
        Some(data) => format!("<img src=\"data:image/jpeg;base64,{data}\">"),
        None => "<span class='no-still'>(no still)</span>".to_string(),
    };

    let ms_class = if options.display_image_ms {
        "img-ms"
    } else {
        "img-ms hidden"
    };

    format!(
        "<div class='{div_class}' data-label='{label_attr}' data-scenetype='{scene_attr}'>\
         <span>{html_start}-{end_str}: </span><span class=\"label\">{label_text}</span><br>\
         {image}\n<div class='img-caption'>\
         <span class='{ms_class}'>{rep:08}</span>\
         </div></div>\n",
        label_attr = escape_html(label),
        scene_attr = escape_html(scene_type),
        label_text = escape_html(label),
        rep = frame.rep_time,
    )
}

/// Minimal HTML escaping for text and attribute values.
fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
