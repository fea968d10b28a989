//! Media access: still-frame extraction and duration probing.
//!
//! The core algorithm never touches media; these helpers exist for the
//! reporting adapters, which need one JPEG still per frame's representative
//! instant and the overall media duration for display.

use std::fs;
use std::path::{Path, PathBuf};

use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;

use crate::error::{CoreError, CoreResult};

/// Probes the media duration in milliseconds.
pub fn media_duration_ms(path: &Path) -> CoreResult<i64> {
    let metadata = ffprobe::ffprobe(path).map_err(|e| CoreError::FfprobeFailed {
        path: path.to_path_buf(),
        message: format!("{e:?}"),
    })?;

    let has_video = metadata
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("video"));
    if !has_video {
        return Err(CoreError::NoVideoStream(path.to_path_buf()));
    }

    metadata
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .map(|secs| (secs * 1000.0) as i64)
        .ok_or_else(|| CoreError::FfprobeFailed {
            path: path.to_path_buf(),
            message: "no duration in format metadata".to_string(),
        })
}

/// Extracts the frame nearest `target_ms` as a JPEG at `out_path`,
/// optionally capped to `max_height` pixels (width follows, even).
///
/// Seeking happens before the input for speed; ffmpeg then decodes forward
/// to the first frame at or after the target.
pub fn extract_still(
    video: &Path,
    target_ms: i64,
    max_height: Option<u32>,
    out_path: &Path,
) -> CoreResult<()> {
    let seek = format!("{}.{:03}", target_ms.max(0) / 1000, target_ms.max(0) % 1000);

    let mut cmd = FfmpegCommand::new();
    cmd.hide_banner()
        .seek(&seek)
        .input(video.to_string_lossy().as_ref())
        .args(["-frames:v", "1", "-q:v", "2"]);
    if let Some(height) = max_height {
        cmd.args(["-vf", &format!("scale=-2:'min(ih,{height})'")]);
    }
    let mut child = cmd
        .overwrite()
        .output(out_path.to_string_lossy().as_ref())
        .spawn()
        .map_err(|e| CoreError::CommandFailed("ffmpeg".to_string(), format!("failed to start: {e}")))?;

    let mut errors = Vec::new();
    for event in child
        .iter()
        .map_err(|e| CoreError::CommandFailed("ffmpeg".to_string(), e.to_string()))?
    {
        if let FfmpegEvent::Error(message) = event {
            errors.push(message);
        }
    }

    let status = child
        .wait()
        .map_err(|e| CoreError::CommandFailed("ffmpeg".to_string(), e.to_string()))?;
    if !status.success() || !out_path.exists() {
        return Err(CoreError::CommandFailed(
            "ffmpeg".to_string(),
            format!(
                "still extraction at {target_ms}ms failed: {}",
                errors.join("; ")
            ),
        ));
    }
    Ok(())
}

/// Filename for a still at `target_ms`, zero-padded so files sort by time.
pub fn still_filename(prefix: &str, duration_ms: i64, target_ms: i64) -> String {
    format!("{prefix}_{duration_ms:08}_{target_ms:08}.jpg")
}

/// Extracts one still per target instant into `out_dir`, named per
/// [`still_filename`].
///
/// Failed targets are logged and skipped; the returned list holds only the
/// stills actually written.
pub fn extract_stills(
    video: &Path,
    targets: &[i64],
    duration_ms: i64,
    out_dir: &Path,
    prefix: &str,
) -> CoreResult<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;

    let mut written = Vec::with_capacity(targets.len());
    for &target in targets {
        let out_path = out_dir.join(still_filename(prefix, duration_ms, target));
        match extract_still(video, target, None, &out_path) {
            Ok(()) => written.push(out_path),
            Err(e) => log::warn!(
                "skipping still at {target}ms for {}: {e}",
                video.display()
            ),
        }
    }
    Ok(written)
}

/// Extracts a still into a temporary file and returns the JPEG bytes.
pub fn still_jpeg_bytes(video: &Path, target_ms: i64, max_height: Option<u32>) -> CoreResult<Vec<u8>> {
    let dir = tempfile::tempdir()?;
    let out_path = dir.path().join("still.jpg");
    extract_still(video, target_ms, max_height, &out_path)?;
    Ok(fs::read(&out_path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_still_filename_is_zero_padded() {
        assert_eq!(
            still_filename("item1", 3_600_000, 16_000),
            "item1_03600000_00016000.jpg"
        );
    }

    #[test]
    fn test_extract_stills_skips_failed_targets() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("stills");
        let written = extract_stills(
            Path::new("/nonexistent/video.mp4"),
            &[0, 1000],
            3_600_000,
            &out_dir,
            "item1",
        )
        .unwrap();
        assert!(written.is_empty());
        assert!(out_dir.is_dir());
    }

    #[test]
    fn test_extract_still_fails_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.jpg");
        let result = extract_still(Path::new("/nonexistent/video.mp4"), 1000, None, &out);
        assert!(result.is_err());
    }

    #[test]
    fn test_media_duration_fails_for_missing_file() {
        let result = media_duration_ms(Path::new("/nonexistent/video.mp4"));
        assert!(matches!(result, Err(CoreError::FfprobeFailed { .. })));
    }
}
