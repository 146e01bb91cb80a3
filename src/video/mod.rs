//! # Video Module
//!
//! Frame types, ffmpeg-backed decoding and encoding, and the converter that
//! streams a video through the line-art filter.

pub mod converter;
pub mod ffmpeg;
pub mod sink;
pub mod source;
pub mod stream;
pub mod types;

pub use converter::VideoConverter;
pub use ffmpeg::{ffmpeg_version, probe, FfmpegBackend};
pub use sink::FfmpegSink;
pub use source::FfmpegSource;
pub use stream::{FrameSink, FrameSource, MediaBackend, VideoEncoding};
pub use types::{EdgeMask, Frame, FrameRate, VideoMetadata};
