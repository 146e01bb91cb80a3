// src/video/ffmpeg.rs - external ffmpeg/ffprobe processes

use std::io::Read;
use std::path::Path;
use std::process::{ChildStderr, Command, Stdio};
use std::thread::JoinHandle;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Result, VideoError};
use crate::video::sink::FfmpegSink;
use crate::video::source::FfmpegSource;
use crate::video::stream::{FrameSink, FrameSource, MediaBackend, VideoEncoding};
use crate::video::types::{FrameRate, VideoMetadata};

/// First line of `ffmpeg -version`
pub fn ffmpeg_version() -> Option<String> {
    let output = Command::new("ffmpeg").arg("-version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|line| line.trim().to_string())
}

/// Run a command to completion, returning its stderr on failure
pub(crate) fn run_command(cmd: &mut Command) -> std::result::Result<(), String> {
    debug!("Running {:?}", cmd);
    let output = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|e| format!("failed to spawn {:?}: {}", cmd.get_program(), e))?;

    if output.status.success() {
        Ok(())
    } else {
        Err(format!(
            "{} ({})",
            String::from_utf8_lossy(&output.stderr).trim(),
            output.status
        ))
    }
}

/// Collect a child's stderr on a helper thread so the pipe never fills up
pub(crate) fn drain_stderr(stderr: Option<ChildStderr>) -> Option<JoinHandle<String>> {
    stderr.map(|mut stderr| {
        std::thread::spawn(move || {
            let mut text = String::new();
            let _ = stderr.read_to_string(&mut text);
            text
        })
    })
}

pub(crate) fn join_stderr(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    codec_name: Option<String>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
    #[serde(default)]
    side_data_list: Vec<ProbeSideData>,
    tags: Option<ProbeTags>,
}

#[derive(Debug, Deserialize)]
struct ProbeSideData {
    rotation: Option<f64>,
}

/// Older containers carry rotation as a stream tag instead of a display matrix
#[derive(Debug, Deserialize)]
struct ProbeTags {
    rotate: Option<String>,
}

impl ProbeStream {
    /// Display rotation in degrees, normalised to 0..360
    fn rotation(&self) -> i64 {
        let degrees = self
            .side_data_list
            .iter()
            .find_map(|side| side.rotation)
            .or_else(|| {
                self.tags
                    .as_ref()
                    .and_then(|t| t.rotate.as_deref())
                    .and_then(|r| r.trim().parse::<f64>().ok())
            })
            .unwrap_or(0.0);
        (degrees.round() as i64).rem_euclid(360)
    }
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Read width, height, rate and length of the first video stream
pub fn probe<P: AsRef<Path>>(path: P) -> Result<VideoMetadata> {
    let path = path.as_ref();
    let unavailable = |reason: String| VideoError::SourceUnavailable {
        path: path.display().to_string(),
        reason,
    };

    let output = Command::new("ffprobe")
        .args([
            "-v", "error",
            "-select_streams", "v:0",
            "-show_entries",
            "stream=width,height,codec_name,avg_frame_rate,r_frame_rate,nb_frames,duration\
             :stream_side_data=rotation:stream_tags=rotate:format=duration",
            "-of", "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| unavailable(format!("ffprobe could not be started: {}", e)))?;

    if !output.status.success() {
        return Err(unavailable(String::from_utf8_lossy(&output.stderr).trim().to_string()).into());
    }

    let json = String::from_utf8_lossy(&output.stdout);
    let metadata = parse_probe_output(&json).map_err(unavailable)?;

    info!(
        "Video metadata: {}x{} @ {:.2}fps, {} frames",
        metadata.width,
        metadata.height,
        metadata.fps(),
        metadata
            .estimated_frames()
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    );
    Ok(metadata)
}

/// Parse ffprobe's JSON into validated stream metadata
pub(crate) fn parse_probe_output(json: &str) -> std::result::Result<VideoMetadata, String> {
    let probe: ProbeOutput =
        serde_json::from_str(json).map_err(|e| format!("invalid ffprobe output: {}", e))?;

    let stream = probe
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| "no video stream".to_string())?;

    let (stored_width, stored_height) = (stream.width.unwrap_or(0), stream.height.unwrap_or(0));
    if stored_width == 0 || stored_height == 0 {
        return Err(format!("invalid dimensions {}x{}", stored_width, stored_height));
    }

    // The decoder applies the display rotation, so quarter turns swap the frame size.
    let (width, height) = match stream.rotation() {
        90 | 270 => (stored_height, stored_width),
        _ => (stored_width, stored_height),
    };

    let frame_rate = stream
        .avg_frame_rate
        .as_deref()
        .and_then(FrameRate::parse)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(FrameRate::parse))
        .ok_or_else(|| "stream has no usable frame rate".to_string())?;

    let duration = stream
        .duration
        .as_deref()
        .or(probe.format.as_ref().and_then(|f| f.duration.as_deref()))
        .and_then(|d| d.parse::<f64>().ok());

    Ok(VideoMetadata {
        width,
        height,
        frame_rate,
        duration,
        frame_count: stream.nb_frames.and_then(|n| n.parse().ok()),
        codec: stream.codec_name.unwrap_or_else(|| "unknown".to_string()),
    })
}

/// Decodes and encodes through `ffmpeg` child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegBackend;

impl MediaBackend for FfmpegBackend {
    fn open_source(&self, path: &Path) -> Result<Box<dyn FrameSource>> {
        Ok(Box::new(FfmpegSource::open(path)?))
    }

    fn open_sink(
        &self,
        path: &Path,
        metadata: &VideoMetadata,
        encoding: &VideoEncoding,
    ) -> Result<Box<dyn FrameSink>> {
        Ok(Box::new(FfmpegSink::open(path, metadata, encoding)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_output() {
        let json = r#"{
            "programs": [],
            "streams": [{
                "codec_name": "h264",
                "width": 1280,
                "height": 720,
                "r_frame_rate": "30000/1001",
                "avg_frame_rate": "30000/1001",
                "duration": "10.010000",
                "nb_frames": "300"
            }],
            "format": { "duration": "10.050000" }
        }"#;

        let metadata = parse_probe_output(json).unwrap();
        assert_eq!((metadata.width, metadata.height), (1280, 720));
        assert_eq!(metadata.frame_rate, FrameRate::new(30000, 1001));
        assert_eq!(metadata.frame_count, Some(300));
        assert_eq!(metadata.duration, Some(10.01));
        assert_eq!(metadata.codec, "h264");
    }

    #[test]
    fn test_parse_probe_falls_back_to_r_frame_rate_and_format_duration() {
        let json = r#"{
            "streams": [{ "width": 64, "height": 48, "avg_frame_rate": "0/0", "r_frame_rate": "25/1" }],
            "format": { "duration": "4.0" }
        }"#;

        let metadata = parse_probe_output(json).unwrap();
        assert_eq!(metadata.frame_rate, FrameRate::new(25, 1));
        assert_eq!(metadata.duration, Some(4.0));
        assert_eq!(metadata.estimated_frames(), Some(100));
    }

    #[test]
    fn test_parse_probe_swaps_size_for_display_matrix_rotation() {
        let json = r#"{
            "streams": [{
                "codec_name": "h264",
                "width": 1920,
                "height": 1080,
                "avg_frame_rate": "30/1",
                "side_data_list": [{ "side_data_type": "Display Matrix", "rotation": -90 }]
            }]
        }"#;

        let metadata = parse_probe_output(json).unwrap();
        assert_eq!((metadata.width, metadata.height), (1080, 1920));
        assert_eq!(metadata.frame_size(), 1080 * 1920 * 3);
    }

    #[test]
    fn test_parse_probe_rotation_from_tags() {
        let rotated = r#"{
            "streams": [{ "width": 640, "height": 480, "r_frame_rate": "25/1", "tags": { "rotate": "270" } }]
        }"#;
        let metadata = parse_probe_output(rotated).unwrap();
        assert_eq!((metadata.width, metadata.height), (480, 640));

        let upside_down = r#"{
            "streams": [{
                "width": 640, "height": 480, "r_frame_rate": "25/1",
                "side_data_list": [{ "rotation": 180 }]
            }]
        }"#;
        let metadata = parse_probe_output(upside_down).unwrap();
        assert_eq!((metadata.width, metadata.height), (640, 480));
    }

    #[test]
    fn test_parse_probe_rejects_missing_stream() {
        assert!(parse_probe_output(r#"{ "streams": [] }"#).is_err());
        assert!(parse_probe_output("not json").is_err());
        assert!(parse_probe_output(r#"{ "streams": [{ "width": 0, "height": 10, "r_frame_rate": "25/1" }] }"#).is_err());
    }
}
