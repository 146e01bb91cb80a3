use std::path::Path;

use thiserror::Error;

/// Main error type for the lineart library
#[derive(Error, Debug)]
pub enum LineArtError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid frame: {0}")]
    Frame(#[from] FrameError),

    #[error("Video processing error: {0}")]
    Video(#[from] VideoError),

    #[error("Audio processing error: {0}")]
    Audio(#[from] AudioError),

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("The file {path} does not exist")]
    MissingFile { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path} ({reason})")]
    ParseFailed { path: String, reason: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Malformed frame or mask reaching a processing stage
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },

    #[error("expected {expected} channels, got {actual}")]
    ChannelCount { expected: u8, actual: u8 },

    #[error("buffer holds {actual} bytes, {width}x{height}x{channels} needs {expected}")]
    BufferSize {
        width: u32,
        height: u32,
        channels: u8,
        expected: usize,
        actual: usize,
    },

    #[error("frame is {actual_width}x{actual_height}, stream is {width}x{height}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("mask value {value} at ({x}, {y}) is not binary")]
    NonBinaryMask { x: u32, y: u32, value: u8 },
}

/// Video-specific errors
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Cannot open video source {path}: {reason}")]
    SourceUnavailable { path: String, reason: String },

    #[error("Cannot open video sink {path}: {reason}")]
    SinkUnavailable { path: String, reason: String },

    #[error("Video decoding failed: {reason}")]
    DecodingFailed { reason: String },

    #[error("Video encoding failed: {reason}")]
    EncodingFailed { reason: String },

    #[error("Invalid stream parameters: {details}")]
    InvalidParameters { details: String },
}

/// Audio-specific errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Audio extraction failed for {path}: {reason}")]
    ExtractionFailed { path: String, reason: String },

    #[error("Muxing audio into {path} failed: {reason}")]
    MuxFailed { path: String, reason: String },

    #[error("Failed to read audio file {path}: {reason}")]
    LoadFailed { path: String, reason: String },
}

/// Preview playback errors
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Failed to open preview window: {reason}")]
    WindowFailed { reason: String },

    #[error("Audio output unavailable: {reason}")]
    AudioOutputFailed { reason: String },
}

/// Convenience type alias for Results using LineArtError
pub type Result<T> = std::result::Result<T, LineArtError>;

impl LineArtError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    pub fn missing_file<P: AsRef<Path>>(path: P) -> Self {
        Self::MissingFile {
            path: path.as_ref().display().to_string(),
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingFile { path } => {
                format!("The file '{}' does not exist. Please check the path.", path)
            }
            Self::Video(VideoError::SourceUnavailable { path, .. }) => {
                format!("Could not open video '{}'. Is ffmpeg installed and the file a supported format?", path)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

/// Fail with [`LineArtError::MissingFile`] unless `path` exists.
pub fn ensure_exists<P: AsRef<Path>>(path: P) -> Result<()> {
    if path.as_ref().exists() {
        Ok(())
    } else {
        Err(LineArtError::missing_file(path))
    }
}
