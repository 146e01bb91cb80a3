// src/video/converter.rs - read → filter → write, one frame at a time

use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::config::{Config, ProcessingConfig};
use crate::error::{ensure_exists, FrameError, LineArtError, Result};
use crate::lineart::{FrameFilter, LineArtFilter};
use crate::stage::{should_skip, StageOutcome};
use crate::video::ffmpeg::FfmpegBackend;
use crate::video::stream::{FrameSink, FrameSource, MediaBackend, VideoEncoding};
use crate::video::types::VideoMetadata;

/// Drives a [`FrameFilter`] over a whole video stream.
///
/// Frames are read, filtered and written strictly in order; frame N+1 is not
/// read before frame N is written. The filter itself runs inside a dedicated
/// rayon pool so the recolor stage can split rows across workers.
pub struct VideoConverter {
    backend: Box<dyn MediaBackend>,
    filter: Box<dyn FrameFilter>,
    encoding: VideoEncoding,
    pool: rayon::ThreadPool,
    show_progress: bool,
}

impl VideoConverter {
    /// ffmpeg-backed converter applying the line-art filter from `config`
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_parts(
            Box::new(FfmpegBackend),
            Box::new(LineArtFilter::new(&config.pipeline)),
            VideoEncoding::from(&config.output),
            &config.processing,
        )
    }

    pub fn with_parts(
        backend: Box<dyn MediaBackend>,
        filter: Box<dyn FrameFilter>,
        encoding: VideoEncoding,
        processing: &ProcessingConfig,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(processing.threads)
            .thread_name(|i| format!("lineart-worker-{}", i))
            .build()
            .map_err(|e| LineArtError::generic(format!("Failed to build thread pool: {}", e)))?;

        Ok(Self {
            backend,
            filter,
            encoding,
            pool,
            show_progress: processing.show_progress,
        })
    }

    /// Convert `input` into `output`, unless `output` exists and `overwrite` is off
    pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
        overwrite: bool,
    ) -> Result<StageOutcome> {
        let input = input.as_ref();
        let output = output.as_ref();

        if should_skip("convert", output, overwrite) {
            return Ok(StageOutcome::Skipped);
        }
        ensure_exists(input)?;

        let mut source = self.backend.open_source(input)?;
        let metadata = source.metadata().clone();
        info!(
            "width: {}; height: {}; fps: {:.3}; total_frames: {}",
            metadata.width,
            metadata.height,
            metadata.fps(),
            metadata
                .estimated_frames()
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );

        // Declared after the source so it is released first on every exit path.
        let mut sink = self.backend.open_sink(output, &metadata, &self.encoding)?;

        let frames = self.run_stream(source.as_mut(), sink.as_mut(), &metadata)?;
        sink.finish()?;

        info!("Converted {} frames with {} filter -> {}", frames, self.filter.name(), output.display());
        Ok(StageOutcome::Completed { frames: Some(frames) })
    }

    /// Pump every frame of `source` through the filter into `sink`
    pub fn run_stream(
        &self,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
        metadata: &VideoMetadata,
    ) -> Result<u64> {
        let progress = self.progress_bar(metadata.estimated_frames());

        match self.pump(source, sink, metadata, &progress) {
            Ok(processed) => {
                progress.finish_and_clear();
                Ok(processed)
            }
            Err(e) => {
                progress.abandon();
                Err(e)
            }
        }
    }

    fn pump(
        &self,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
        metadata: &VideoMetadata,
        progress: &ProgressBar,
    ) -> Result<u64> {
        let mut processed = 0u64;

        while let Some(frame) = source.next_frame()? {
            if frame.dimensions() != (metadata.width, metadata.height) {
                return Err(FrameError::DimensionMismatch {
                    width: metadata.width,
                    height: metadata.height,
                    actual_width: frame.width(),
                    actual_height: frame.height(),
                }
                .into());
            }

            let rendered = self.pool.install(|| self.filter.apply(&frame))?;
            sink.write_frame(&rendered)?;

            processed += 1;
            progress.inc(1);
            debug!("Frame {} written", processed);
        }

        Ok(processed)
    }

    fn progress_bar(&self, total: Option<u64>) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        match total {
            Some(total) => {
                let bar = ProgressBar::new(total);
                if let Ok(style) = ProgressStyle::with_template(
                    "{spinner:.green} Processing frame... {bar:40.cyan/blue} {pos}/{len} [{elapsed_precise}<{eta_precise}]",
                ) {
                    bar.set_style(style.progress_chars("##-"));
                }
                bar
            }
            None => {
                let spinner = ProgressBar::new_spinner();
                spinner.set_message("Processing frame...");
                spinner
            }
        }
    }
}
