use std::path::Path;

use crate::{
    error::Result,
    video::types::{Frame, VideoMetadata},
};

/// Ordered frames decoded from one video, all the same size
pub trait FrameSource: Send {
    /// Stream properties, read once when the source was opened
    fn metadata(&self) -> &VideoMetadata;

    /// Next frame, or `None` at end of stream
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Encoder accepting frames in presentation order
///
/// Dropping a sink without a successful [`finish`](FrameSink::finish) must
/// release it and discard whatever was written.
pub trait FrameSink: Send {
    fn write_frame(&mut self, frame: &Frame) -> Result<()>;

    /// Flush and close the output
    fn finish(&mut self) -> Result<()>;
}

/// Encoder selection for a sink: codec name plus optional fourcc tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoEncoding {
    pub codec: String,
    pub tag: Option<String>,
}

impl From<&crate::config::OutputConfig> for VideoEncoding {
    fn from(config: &crate::config::OutputConfig) -> Self {
        Self {
            codec: config.video_codec.clone(),
            tag: config.codec_tag.clone(),
        }
    }
}

/// Opens frame sources and sinks on files
pub trait MediaBackend: Send + Sync {
    fn open_source(&self, path: &Path) -> Result<Box<dyn FrameSource>>;

    fn open_sink(
        &self,
        path: &Path,
        metadata: &VideoMetadata,
        encoding: &VideoEncoding,
    ) -> Result<Box<dyn FrameSink>>;
}
