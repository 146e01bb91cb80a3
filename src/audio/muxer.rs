use std::path::Path;
use std::process::Command;

use tracing::info;

use crate::error::{ensure_exists, AudioError, Result};
use crate::stage::{should_skip, PartialFile, StageOutcome};
use crate::video::ffmpeg::run_command;

/// Puts an external audio file next to a video stream in one container.
///
/// Both streams are copied as they are. Any audio already in the video is
/// dropped, and the result ends with the shorter of the two.
#[derive(Debug, Default, Clone, Copy)]
pub struct AudioMuxer;

impl AudioMuxer {
    pub fn new() -> Self {
        Self
    }

    pub fn mux<P, Q, R>(&self, video: P, audio: Q, output: R, overwrite: bool) -> Result<StageOutcome>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        R: AsRef<Path>,
    {
        let (video, audio, output) = (video.as_ref(), audio.as_ref(), output.as_ref());

        if should_skip("mux", output, overwrite) {
            return Ok(StageOutcome::Skipped);
        }
        ensure_exists(video)?;
        ensure_exists(audio)?;

        let partial = PartialFile::for_target(output);
        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-v", "error", "-y", "-i"])
            .arg(video)
            .arg("-i")
            .arg(audio)
            .args([
                "-map", "0:v:0",
                "-map", "1:a:0",
                "-c:v", "copy",
                "-c:a", "copy",
                "-shortest",
            ])
            .arg(partial.path());

        let failed = |reason: String| AudioError::MuxFailed {
            path: output.display().to_string(),
            reason,
        };
        run_command(&mut cmd).map_err(failed)?;
        partial.commit().map_err(|e| failed(e.to_string()))?;

        info!("Muxed {} + {} -> {}", video.display(), audio.display(), output.display());
        Ok(StageOutcome::completed())
    }
}
