//! # Audio Module
//!
//! Audio never goes through the line-art pipeline. It is pulled out of the
//! source video as PCM WAV and copied back into the converted video
//! untouched.

pub mod extractor;
pub mod muxer;

pub use extractor::{AudioExtractor, WavSummary};
pub use muxer::AudioMuxer;
