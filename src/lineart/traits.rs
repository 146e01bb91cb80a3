use crate::{error::Result, video::types::Frame};

/// A stateless per-frame transform applied by the stream driver
pub trait FrameFilter: Send + Sync {
    /// Returns the unique name of this filter
    fn name(&self) -> &str;

    /// Returns a human-readable description of this filter
    fn description(&self) -> &str;

    /// Transform one frame into a new frame of the same size
    ///
    /// Implementations must not carry state between calls: the driver may
    /// hand frames from one stream to the filter in any thread.
    fn apply(&self, frame: &Frame) -> Result<Frame>;
}
