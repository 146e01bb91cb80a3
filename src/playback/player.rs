use std::path::Path;
use std::time::Instant;

use tracing::info;

use crate::config::PlaybackConfig;
use crate::error::{ensure_exists, Result};
use crate::playback::audio::RodioAudio;
use crate::playback::signal::PlaybackSignal;
use crate::playback::window::MinifbSurface;
use crate::video::ffmpeg::FfmpegBackend;
use crate::video::stream::{FrameSource, MediaBackend};
use crate::video::types::Frame;

pub const WINDOW_TITLE: &str = "play";

/// Somewhere frames can be shown
pub trait PlaybackSurface {
    fn present(&mut self, frame: &Frame) -> Result<()>;

    /// True once the viewer asked to stop
    fn interrupted(&self) -> bool;
}

/// Audio that runs alongside the frames
pub trait AudioChannel {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self);
}

/// How a playback session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEnd {
    Finished { frames: u64 },
    Interrupted { frames: u64 },
}

impl PlaybackEnd {
    pub fn frames(&self) -> u64 {
        match self {
            Self::Finished { frames } | Self::Interrupted { frames } => *frames,
        }
    }
}

/// Show every frame of `source` at its native rate with `audio` running.
///
/// The signal is checked once per frame interval; the surface raises it when
/// the viewer interrupts. Audio is stopped on every exit, errors included.
pub fn run_playback_loop(
    source: &mut dyn FrameSource,
    surface: &mut dyn PlaybackSurface,
    audio: &mut dyn AudioChannel,
    signal: &PlaybackSignal,
) -> Result<PlaybackEnd> {
    let interval = source.metadata().frame_rate.frame_interval();

    audio.start()?;
    let result = pace_frames(source, surface, signal, interval);
    audio.stop();

    match &result {
        Ok(PlaybackEnd::Finished { frames }) => info!("play video and audio done ({} frames)", frames),
        Ok(PlaybackEnd::Interrupted { frames }) => info!("Playback interrupted after {} frames", frames),
        Err(_) => {}
    }
    result
}

fn pace_frames(
    source: &mut dyn FrameSource,
    surface: &mut dyn PlaybackSurface,
    signal: &PlaybackSignal,
    interval: std::time::Duration,
) -> Result<PlaybackEnd> {
    let started = Instant::now();
    let mut shown = 0u64;

    loop {
        if surface.interrupted() {
            signal.raise();
        }
        if signal.is_raised() {
            return Ok(PlaybackEnd::Interrupted { frames: shown });
        }

        let Some(frame) = source.next_frame()? else {
            return Ok(PlaybackEnd::Finished { frames: shown });
        };
        surface.present(&frame)?;
        shown += 1;

        // deadlines are absolute so slow frames do not accumulate drift
        let deadline = started + interval.mul_f64(shown as f64);
        let now = Instant::now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
    }
}

/// Previews a converted video with its extracted audio
pub struct Player {
    backend: Box<dyn MediaBackend>,
    window_scale: f32,
    signal: PlaybackSignal,
}

impl Player {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self::with_backend(Box::new(FfmpegBackend), config)
    }

    pub fn with_backend(backend: Box<dyn MediaBackend>, config: &PlaybackConfig) -> Self {
        Self {
            backend,
            window_scale: config.window_scale,
            signal: PlaybackSignal::new(),
        }
    }

    /// Handle that stops playback from elsewhere
    pub fn signal(&self) -> PlaybackSignal {
        self.signal.clone()
    }

    pub fn play<P: AsRef<Path>, Q: AsRef<Path>>(&self, video: P, audio: Q) -> Result<PlaybackEnd> {
        let (video, audio) = (video.as_ref(), audio.as_ref());
        ensure_exists(video)?;
        ensure_exists(audio)?;

        let mut source = self.backend.open_source(video)?;
        let (width, height) = (source.metadata().width, source.metadata().height);
        info!("Playing {} with {} ({}x{})", video.display(), audio.display(), width, height);

        let mut surface = MinifbSurface::open(WINDOW_TITLE, width, height, self.window_scale)?;
        let mut channel = RodioAudio::open(audio)?;
        run_playback_loop(source.as_mut(), &mut surface, &mut channel, &self.signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LineArtError, VideoError};
    use crate::video::types::{FrameRate, VideoMetadata};
    use std::time::Duration;

    struct CountingSource {
        metadata: VideoMetadata,
        remaining: u32,
        fail_at: Option<u32>,
    }

    impl CountingSource {
        fn new(frames: u32) -> Self {
            Self {
                metadata: VideoMetadata {
                    width: 4,
                    height: 4,
                    frame_rate: FrameRate::new(500, 1),
                    duration: None,
                    frame_count: Some(frames as u64),
                    codec: "raw".to_string(),
                },
                remaining: frames,
                fail_at: None,
            }
        }
    }

    impl FrameSource for CountingSource {
        fn metadata(&self) -> &VideoMetadata {
            &self.metadata
        }

        fn next_frame(&mut self) -> Result<Option<Frame>> {
            if self.fail_at == Some(self.remaining) {
                return Err(VideoError::DecodingFailed { reason: "bad frame".to_string() }.into());
            }
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            Ok(Some(Frame::new_filled(4, 4, [0, 0, 0])))
        }
    }

    /// Surface that reports an interrupt once `stop_after` frames were shown
    struct FakeSurface {
        shown: u64,
        stop_after: Option<u64>,
    }

    impl PlaybackSurface for FakeSurface {
        fn present(&mut self, _frame: &Frame) -> Result<()> {
            self.shown += 1;
            Ok(())
        }

        fn interrupted(&self) -> bool {
            self.stop_after.map_or(false, |n| self.shown >= n)
        }
    }

    #[derive(Default)]
    struct FakeAudio {
        started: bool,
        stopped: bool,
    }

    impl AudioChannel for FakeAudio {
        fn start(&mut self) -> Result<()> {
            self.started = true;
            Ok(())
        }

        fn stop(&mut self) {
            self.stopped = true;
        }
    }

    #[test]
    fn test_plays_to_end_of_stream() {
        let mut source = CountingSource::new(5);
        let mut surface = FakeSurface { shown: 0, stop_after: None };
        let mut audio = FakeAudio::default();
        let signal = PlaybackSignal::new();

        let end = run_playback_loop(&mut source, &mut surface, &mut audio, &signal).unwrap();
        assert_eq!(end, PlaybackEnd::Finished { frames: 5 });
        assert!(audio.started && audio.stopped);
        assert!(!signal.is_raised());
    }

    #[test]
    fn test_interrupt_stops_video_and_audio() {
        let mut source = CountingSource::new(100);
        let mut surface = FakeSurface { shown: 0, stop_after: Some(3) };
        let mut audio = FakeAudio::default();
        let signal = PlaybackSignal::new();

        let end = run_playback_loop(&mut source, &mut surface, &mut audio, &signal).unwrap();
        assert_eq!(end, PlaybackEnd::Interrupted { frames: 3 });
        assert_eq!(surface.shown, 3);
        assert!(audio.stopped);
        assert!(signal.is_raised());
    }

    #[test]
    fn test_pre_raised_signal_shows_nothing() {
        let mut source = CountingSource::new(10);
        let mut surface = FakeSurface { shown: 0, stop_after: None };
        let mut audio = FakeAudio::default();
        let signal = PlaybackSignal::new();
        signal.raise();

        let end = run_playback_loop(&mut source, &mut surface, &mut audio, &signal).unwrap();
        assert_eq!(end.frames(), 0);
        assert_eq!(surface.shown, 0);
        assert!(audio.stopped);
    }

    #[test]
    fn test_decode_error_still_stops_audio() {
        let mut source = CountingSource::new(4);
        source.fail_at = Some(2);
        let mut surface = FakeSurface { shown: 0, stop_after: None };
        let mut audio = FakeAudio::default();

        let result = run_playback_loop(&mut source, &mut surface, &mut audio, &PlaybackSignal::new());
        assert!(matches!(result, Err(LineArtError::Video(VideoError::DecodingFailed { .. }))));
        assert_eq!(surface.shown, 2);
        assert!(audio.stopped);
    }

    #[test]
    fn test_frames_are_paced() {
        let mut source = CountingSource::new(10);
        source.metadata.frame_rate = FrameRate::new(100, 1);
        let mut surface = FakeSurface { shown: 0, stop_after: None };
        let mut audio = FakeAudio::default();

        let started = Instant::now();
        run_playback_loop(&mut source, &mut surface, &mut audio, &PlaybackSignal::new()).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn test_play_requires_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("v.avi");
        std::fs::write(&video, b"video").unwrap();

        let player = Player::new(&PlaybackConfig::default());
        let result = player.play(&video, dir.path().join("a.wav"));
        assert!(matches!(result, Err(LineArtError::MissingFile { .. })));
    }
}
