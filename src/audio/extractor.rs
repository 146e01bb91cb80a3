use std::path::Path;
use std::process::Command;

use tracing::info;

use crate::error::{ensure_exists, AudioError, Result};
use crate::stage::{should_skip, PartialFile, StageOutcome};
use crate::video::ffmpeg::run_command;

/// Header fields of an extracted WAV file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavSummary {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub duration: f64,
}

impl WavSummary {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = hound::WavReader::open(path).map_err(|e| AudioError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let spec = reader.spec();
        // duration() counts frames per channel
        let duration = if spec.sample_rate > 0 {
            reader.duration() as f64 / spec.sample_rate as f64
        } else {
            0.0
        };

        Ok(Self {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            bits_per_sample: spec.bits_per_sample,
            duration,
        })
    }
}

/// Pulls the audio track out of a video as 16-bit PCM WAV.
///
/// Sample rate and channel layout are kept as they are in the source.
#[derive(Debug, Default, Clone, Copy)]
pub struct AudioExtractor;

impl AudioExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        video: P,
        wav: Q,
        overwrite: bool,
    ) -> Result<StageOutcome> {
        let video = video.as_ref();
        let wav = wav.as_ref();

        if should_skip("extract", wav, overwrite) {
            return Ok(StageOutcome::Skipped);
        }
        ensure_exists(video)?;

        let failed = |reason: String| AudioError::ExtractionFailed {
            path: video.display().to_string(),
            reason,
        };

        let partial = PartialFile::for_target(wav);
        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-v", "error", "-y", "-i"])
            .arg(video)
            .args(["-vn", "-acodec", "pcm_s16le"])
            .arg(partial.path());
        run_command(&mut cmd).map_err(failed)?;

        let summary = WavSummary::read(partial.path()).map_err(|e| failed(e.to_string()))?;
        partial.commit().map_err(|e| failed(e.to_string()))?;
        info!(
            "Extracted audio to {}: {} Hz, {} channels, {:.2}s",
            wav.display(),
            summary.sample_rate,
            summary.channels,
            summary.duration
        );
        Ok(StageOutcome::completed())
    }
}
