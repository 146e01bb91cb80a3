use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use tracing::debug;

use crate::error::{FrameError, Result, VideoError};
use crate::stage::PartialFile;
use crate::video::ffmpeg::{drain_stderr, join_stderr};
use crate::video::stream::{FrameSink, VideoEncoding};
use crate::video::types::{Frame, VideoMetadata};

/// Raw RGB frames piped into an `ffmpeg` encoder process.
///
/// The encoder writes a hidden partial file next to `path`, renamed onto
/// `path` by [`finish`](FrameSink::finish). Dropping the sink earlier kills
/// the encoder and deletes the partial file.
pub struct FfmpegSink {
    path: PathBuf,
    output: Option<PartialFile>,
    width: u32,
    height: u32,
    child: Option<Child>,
    stdin: Option<BufWriter<ChildStdin>>,
    stderr: Option<JoinHandle<String>>,
    frames_written: u64,
}

impl FfmpegSink {
    pub fn open<P: AsRef<Path>>(
        path: P,
        metadata: &VideoMetadata,
        encoding: &VideoEncoding,
    ) -> Result<Self> {
        let path = path.as_ref();
        let unavailable = |reason: String| VideoError::SinkUnavailable {
            path: path.display().to_string(),
            reason,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                return Err(unavailable(format!("directory {} does not exist", parent.display())).into());
            }
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-v", "error", "-y", "-f", "rawvideo", "-pix_fmt", "rgb24"])
            .arg("-s")
            .arg(format!("{}x{}", metadata.width, metadata.height))
            .arg("-r")
            .arg(metadata.frame_rate.to_string())
            .args(["-i", "-", "-an", "-c:v", &encoding.codec]);
        if let Some(tag) = &encoding.tag {
            cmd.args(["-vtag", tag]);
        }
        let output = PartialFile::for_target(path);
        cmd.arg(output.path());

        debug!("Starting encoder {:?}", cmd);
        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| unavailable(format!("failed to start ffmpeg: {}", e)))?;

        let stdin = child.stdin.take().map(BufWriter::new);
        let stderr = drain_stderr(child.stderr.take());

        Ok(Self {
            path: path.to_path_buf(),
            output: Some(output),
            width: metadata.width,
            height: metadata.height,
            child: Some(child),
            stdin,
            stderr,
            frames_written: 0,
        })
    }

    /// Close stdin, wait for the encoder and fetch what it printed
    fn wait_encoder(&mut self) -> Result<(std::process::ExitStatus, String)> {
        if let Some(mut stdin) = self.stdin.take() {
            // a failing flush shows up as a bad exit status below
            let _ = stdin.flush();
        }
        let status = match self.child.take() {
            Some(mut child) => child.wait()?,
            None => {
                return Err(VideoError::EncodingFailed {
                    reason: format!("{}: encoder already closed", self.path.display()),
                }
                .into())
            }
        };
        Ok((status, join_stderr(self.stderr.take())))
    }
}

impl FrameSink for FfmpegSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(FrameError::DimensionMismatch {
                width: self.width,
                height: self.height,
                actual_width: frame.width(),
                actual_height: frame.height(),
            }
            .into());
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(VideoError::EncodingFailed {
                reason: format!("{}: encoder already closed", self.path.display()),
            }
            .into());
        };

        if let Err(e) = stdin.write_all(frame.as_bytes()) {
            let (status, stderr) = self.wait_encoder()?;
            return Err(VideoError::EncodingFailed {
                reason: format!("{}: {} ({}; {})", self.path.display(), e, stderr, status),
            }
            .into());
        }

        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let (status, stderr) = self.wait_encoder()?;
        if !status.success() {
            return Err(VideoError::EncodingFailed {
                reason: format!("{}: {} ({})", self.path.display(), stderr, status),
            }
            .into());
        }

        if let Some(output) = self.output.take() {
            output.commit().map_err(|e| VideoError::EncodingFailed {
                reason: format!("{}: could not move encoded file into place: {}", self.path.display(), e),
            })?;
        }
        debug!("Encoded {} frames into {}", self.frames_written, self.path.display());
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        self.stdin = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let _ = join_stderr(self.stderr.take());
        // the encoder is gone; an uncommitted partial file is removed with it
        self.output = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::types::FrameRate;

    #[test]
    fn test_missing_directory_is_unavailable() {
        let metadata = VideoMetadata {
            width: 8,
            height: 8,
            frame_rate: FrameRate::new(25, 1),
            duration: None,
            frame_count: None,
            codec: "h264".to_string(),
        };
        let encoding = VideoEncoding {
            codec: "mpeg4".to_string(),
            tag: Some("xvid".to_string()),
        };

        let result = FfmpegSink::open("/no/such/dir/out.avi", &metadata, &encoding);
        assert!(matches!(
            result,
            Err(crate::error::LineArtError::Video(VideoError::SinkUnavailable { .. }))
        ));
    }

    fn small_stream() -> (VideoMetadata, VideoEncoding) {
        let metadata = VideoMetadata {
            width: 16,
            height: 16,
            frame_rate: FrameRate::new(25, 1),
            duration: None,
            frame_count: None,
            codec: "rawvideo".to_string(),
        };
        let encoding = VideoEncoding {
            codec: "mpeg4".to_string(),
            tag: Some("xvid".to_string()),
        };
        (metadata, encoding)
    }

    #[test]
    fn test_unfinished_sink_leaves_nothing_behind() {
        if crate::video::ffmpeg::ffmpeg_version().is_none() {
            eprintln!("ffmpeg not installed, skipping");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("clip-[canny].avi");
        let (metadata, encoding) = small_stream();

        let mut sink = FfmpegSink::open(&output, &metadata, &encoding).unwrap();
        for _ in 0..5 {
            sink.write_frame(&Frame::new_filled(16, 16, [200, 10, 10])).unwrap();
        }
        drop(sink);

        assert!(!output.exists());
        assert!(!crate::stage::partial_path(&output).exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_finished_sink_moves_output_into_place() {
        if crate::video::ffmpeg::ffmpeg_version().is_none() {
            eprintln!("ffmpeg not installed, skipping");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("clip-[canny].avi");
        let (metadata, encoding) = small_stream();

        let mut sink = FfmpegSink::open(&output, &metadata, &encoding).unwrap();
        for _ in 0..5 {
            sink.write_frame(&Frame::new_filled(16, 16, [200, 10, 10])).unwrap();
        }
        sink.finish().unwrap();
        drop(sink);

        assert!(output.exists());
        assert!(!crate::stage::partial_path(&output).exists());
    }
}
