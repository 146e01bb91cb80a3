use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::debug;

use crate::error::{PlaybackError, Result};
use crate::playback::player::AudioChannel;

/// Plays a WAV file on the default output device.
///
/// Nothing is decoded until [`start`](AudioChannel::start); the output stream
/// stays open for as long as this value lives.
pub struct RodioAudio {
    path: PathBuf,
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
}

impl RodioAudio {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| PlaybackError::AudioOutputFailed { reason: e.to_string() })?;

        Ok(Self {
            path: path.as_ref().to_path_buf(),
            _stream: stream,
            handle,
            sink: None,
        })
    }
}

impl AudioChannel for RodioAudio {
    fn start(&mut self) -> Result<()> {
        let failed = |reason: String| PlaybackError::AudioOutputFailed {
            reason: format!("{}: {}", self.path.display(), reason),
        };

        let file = File::open(&self.path).map_err(|e| failed(e.to_string()))?;
        let source = Decoder::new(BufReader::new(file)).map_err(|e| failed(e.to_string()))?;
        let sink = Sink::try_new(&self.handle).map_err(|e| failed(e.to_string()))?;
        sink.append(source);

        debug!("Audio started: {}", self.path.display());
        self.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
            debug!("Audio stopped: {}", self.path.display());
        }
    }
}

impl Drop for RodioAudio {
    fn drop(&mut self) {
        self.stop();
    }
}
