use std::path::{Path, PathBuf};

use tokio::task;
use tracing::{info, warn};

use crate::{
    audio::{AudioExtractor, AudioMuxer},
    config::Config,
    error::{ensure_exists, LineArtError, Result},
    playback::{PlaybackEnd, Player},
    stage::StageOutcome,
    video::{ffmpeg_version, VideoConverter},
    workflow::paths::OutputPaths,
};

/// What each stage of a run did
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowReport {
    pub paths: OutputPaths,
    pub converted: StageOutcome,
    pub audio: StageOutcome,
    /// `None` when the preview was disabled or could not be shown
    pub preview: Option<PlaybackEnd>,
    pub muxed: StageOutcome,
}

/// Runs the whole tool on one input video.
///
/// The stages are:
/// 1. Convert - line-art rendering of the video stream
/// 2. Extract - the source audio as WAV
/// 3. Preview - converted video plus audio in a window (optional)
/// 4. Mux - converted video with the extracted audio
pub struct Workflow {
    config: Config,
    overwrite: bool,
    preview: bool,
}

impl Workflow {
    pub fn new(config: Config) -> Self {
        let preview = config.playback.enabled;
        Self { config, overwrite: false, preview }
    }

    /// Recompute stages whose output already exists
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Turn the preview off even when the configuration enables it
    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview = preview && self.config.playback.enabled;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn run<P: AsRef<Path>, Q: AsRef<Path>>(&self, input: P, output_dir: Q) -> Result<WorkflowReport> {
        let input = input.as_ref();
        let output_dir = output_dir.as_ref();

        ensure_exists(input)?;
        tokio::fs::create_dir_all(output_dir).await?;
        let paths = OutputPaths::derive(input, output_dir, &self.config.output)?;

        info!("Input: {}", input.display());
        info!("Output directory: {}", output_dir.display());
        match ffmpeg_version() {
            Some(version) => info!("Using {}", version),
            None => warn!("ffmpeg not found on PATH; stages that need it will fail"),
        }

        let converted = self.convert(&paths).await?;
        let audio = self.extract_audio(&paths).await?;
        let preview = self.preview(&paths);
        let muxed = self.mux(&paths).await?;

        info!("Done: {}", paths.final_video.display());
        Ok(WorkflowReport { paths, converted, audio, preview, muxed })
    }

    async fn convert(&self, paths: &OutputPaths) -> Result<StageOutcome> {
        info!("Step 1: converting to line art...");
        let config = self.config.clone();
        let (input, output) = (paths.input.clone(), paths.converted.clone());
        let overwrite = self.overwrite;

        run_blocking("convert", move || {
            VideoConverter::new(&config)?.convert(input, output, overwrite)
        })
        .await
    }

    async fn extract_audio(&self, paths: &OutputPaths) -> Result<StageOutcome> {
        info!("Step 2: extracting audio...");
        let (input, wav) = (paths.input.clone(), paths.audio.clone());
        let overwrite = self.overwrite;

        run_blocking("extract", move || AudioExtractor::new().extract(input, wav, overwrite)).await
    }

    /// Shown on the calling thread, since some platforms only open windows
    /// on the main thread. A failed preview does not stop the run.
    fn preview(&self, paths: &OutputPaths) -> Option<PlaybackEnd> {
        if !self.preview {
            return None;
        }

        info!("Step 3: previewing (Esc to stop)...");
        match Player::new(&self.config.playback).play(&paths.converted, &paths.audio) {
            Ok(end) => Some(end),
            Err(e) => {
                warn!("Preview skipped: {}", e);
                None
            }
        }
    }

    async fn mux(&self, paths: &OutputPaths) -> Result<StageOutcome> {
        info!("Step 4: adding audio...");
        let (video, audio, output): (PathBuf, PathBuf, PathBuf) =
            (paths.converted.clone(), paths.audio.clone(), paths.final_video.clone());
        let overwrite = self.overwrite;

        run_blocking("mux", move || AudioMuxer::new().mux(video, audio, output, overwrite)).await
    }
}

async fn run_blocking<T, F>(stage: &str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(f)
        .await
        .map_err(|e| LineArtError::generic(format!("{} task failed: {}", stage, e)))?
}
