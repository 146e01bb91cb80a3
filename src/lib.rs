//! # lineart
//!
//! Turn a video into a line-art rendering: Canny edges, thickened by dilation
//! and drawn in one color on a flat background. The original audio is put
//! back afterwards, and the result can be previewed in a window.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lineart::{config::Config, workflow::Workflow};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let report = Workflow::new(Config::default())
//!     .with_preview(false)
//!     .run("clip.mp4", "output")
//!     .await?;
//!
//! println!("Wrote {}", report.paths.final_video.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`lineart`] - the per-frame pipeline (edges, dilation, recolor)
//! - [`video`] - frame types, ffmpeg decoding/encoding, the stream converter
//! - [`audio`] - audio extraction and muxing
//! - [`playback`] - synchronized preview
//! - [`workflow`] - end-to-end orchestration
//! - [`config`] - configuration management
//!
//! The per-frame pipeline works on single images too:
//!
//! ```rust
//! use lineart::{config::PipelineConfig, lineart::{FrameFilter, LineArtFilter}, video::Frame};
//!
//! let filter = LineArtFilter::new(&PipelineConfig::default());
//! let frame = Frame::new_filled(32, 32, [90, 120, 200]);
//! let out = filter.apply(&frame).unwrap();
//! assert_eq!(out.get_pixel(16, 16), [0, 0, 0]);
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod lineart;
pub mod playback;
pub mod stage;
pub mod video;
pub mod workflow;

// Re-export commonly used types for convenience
pub use crate::{
    config::{Config, PipelineConfig},
    error::{LineArtError, Result},
    lineart::{FrameFilter, LineArtFilter},
    stage::StageOutcome,
    video::{Frame, VideoConverter},
    workflow::{Workflow, WorkflowReport},
};
