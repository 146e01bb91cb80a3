use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use tracing::{debug, warn};

use crate::error::{Result, VideoError};
use crate::video::ffmpeg::{drain_stderr, join_stderr, probe};
use crate::video::stream::FrameSource;
use crate::video::types::{Frame, VideoMetadata};

/// Raw RGB frames piped out of an `ffmpeg` decoder process.
///
/// The decoder is killed if the source is dropped before end of stream.
pub struct FfmpegSource {
    path: PathBuf,
    metadata: VideoMetadata,
    child: Option<Child>,
    stdout: Option<BufReader<ChildStdout>>,
    stderr: Option<JoinHandle<String>>,
    frames_read: u64,
}

impl FfmpegSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let metadata = probe(path)?;

        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(path)
            .args(["-map", "0:v:0", "-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| VideoError::SourceUnavailable {
                path: path.display().to_string(),
                reason: format!("failed to start ffmpeg: {}", e),
            })?;

        let stdout = child.stdout.take().map(BufReader::new);
        let stderr = drain_stderr(child.stderr.take());

        debug!("Opened decoder for {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            metadata,
            child: Some(child),
            stdout,
            stderr,
            frames_read: 0,
        })
    }

    /// Wait for the decoder after end of stream and surface its failure, if any
    fn finish_decoder(&mut self) -> Result<()> {
        self.stdout = None;
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        let status = child.wait()?;
        let stderr = join_stderr(self.stderr.take());
        if !status.success() {
            return Err(VideoError::DecodingFailed {
                reason: format!("{}: {} ({})", self.path.display(), stderr, status),
            }
            .into());
        }
        Ok(())
    }
}

/// Fill `buf` as far as the reader allows, returning the number of bytes read
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

impl FrameSource for FfmpegSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let mut data = vec![0u8; self.metadata.frame_size()];
        let filled = read_full(stdout, &mut data).map_err(|e| VideoError::DecodingFailed {
            reason: format!("{}: {}", self.path.display(), e),
        })?;

        if filled == 0 {
            self.finish_decoder()?;
            debug!("Decoded {} frames from {}", self.frames_read, self.path.display());
            return Ok(None);
        }

        if filled < data.len() {
            return Err(VideoError::DecodingFailed {
                reason: format!(
                    "{}: truncated frame {} ({} of {} bytes)",
                    self.path.display(),
                    self.frames_read,
                    filled,
                    data.len()
                ),
            }
            .into());
        }

        self.frames_read += 1;
        let frame = Frame::from_raw(self.metadata.width, self.metadata.height, Frame::CHANNELS, data)?;
        Ok(Some(frame))
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                debug!("Decoder for {} already exited: {}", self.path.display(), e);
            }
            if let Err(e) = child.wait() {
                warn!("Failed to reap decoder for {}: {}", self.path.display(), e);
            }
        }
        let _ = join_stderr(self.stderr.take());
    }
}
