use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Main configuration for lineart
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Edge detection, dilation and recolor settings
    pub pipeline: PipelineConfig,

    /// Output naming and encoding settings
    pub output: OutputConfig,

    /// Thread pool and progress settings
    pub processing: ProcessingConfig,

    /// Preview settings
    pub playback: PlaybackConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;
        self.output.validate()?;
        self.processing.validate()?;
        self.playback.validate()?;
        Ok(())
    }
}

/// Blur kernel sizes the detector supports.
pub const BLUR_KERNEL_SIZES: [u32; 3] = [3, 5, 7];

/// Immutable parameters of the per-frame line-art pipeline.
///
/// A value of this type has always passed [`PipelineConfig::validate`]: the
/// only ways to obtain one are [`PipelineConfig::new`], [`Default`] and
/// deserialization, which goes through the same checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PipelineSettings", into = "PipelineSettings")]
pub struct PipelineConfig {
    blur_kernel: u32,
    low_threshold: f64,
    high_threshold: f64,
    dilation_kernel: (u32, u32),
    background_color: [u8; 3],
    line_color: [u8; 3],
}

/// Plain serialized form of [`PipelineConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Gaussian blur kernel size, must be 3, 5 or 7
    pub blur_kernel: u32,

    /// Hysteresis low threshold on the gradient magnitude
    pub low_threshold: f64,

    /// Hysteresis high threshold, usually 2-3x the low one
    pub high_threshold: f64,

    /// Dilation structuring element `[width, height]`; bigger means thicker lines
    pub dilation_kernel: [u32; 2],

    /// Background color, RGB
    pub background_color: [u8; 3],

    /// Line color, RGB
    pub line_color: [u8; 3],
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            blur_kernel: 3,
            low_threshold: 30.0,
            high_threshold: 90.0,
            dilation_kernel: [2, 2],
            background_color: [0, 0, 0],
            line_color: [248, 248, 255],
        }
    }
}

impl TryFrom<PipelineSettings> for PipelineConfig {
    type Error = ConfigError;

    fn try_from(settings: PipelineSettings) -> std::result::Result<Self, Self::Error> {
        let config = Self {
            blur_kernel: settings.blur_kernel,
            low_threshold: settings.low_threshold,
            high_threshold: settings.high_threshold,
            dilation_kernel: (settings.dilation_kernel[0], settings.dilation_kernel[1]),
            background_color: settings.background_color,
            line_color: settings.line_color,
        };
        config.check()?;
        Ok(config)
    }
}

impl From<PipelineConfig> for PipelineSettings {
    fn from(config: PipelineConfig) -> Self {
        Self {
            blur_kernel: config.blur_kernel,
            low_threshold: config.low_threshold,
            high_threshold: config.high_threshold,
            dilation_kernel: [config.dilation_kernel.0, config.dilation_kernel.1],
            background_color: config.background_color,
            line_color: config.line_color,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let settings = PipelineSettings::default();
        Self {
            blur_kernel: settings.blur_kernel,
            low_threshold: settings.low_threshold,
            high_threshold: settings.high_threshold,
            dilation_kernel: (settings.dilation_kernel[0], settings.dilation_kernel[1]),
            background_color: settings.background_color,
            line_color: settings.line_color,
        }
    }
}

impl PipelineConfig {
    /// Build and validate a pipeline configuration
    pub fn new(
        blur_kernel: u32,
        low_threshold: f64,
        high_threshold: f64,
        dilation_kernel: (u32, u32),
        background_color: [u8; 3],
        line_color: [u8; 3],
    ) -> Result<Self> {
        Ok(Self::try_from(PipelineSettings {
            blur_kernel,
            low_threshold,
            high_threshold,
            dilation_kernel: [dilation_kernel.0, dilation_kernel.1],
            background_color,
            line_color,
        })?)
    }

    pub fn blur_kernel(&self) -> u32 {
        self.blur_kernel
    }

    pub fn low_threshold(&self) -> f64 {
        self.low_threshold
    }

    pub fn high_threshold(&self) -> f64 {
        self.high_threshold
    }

    pub fn dilation_kernel(&self) -> (u32, u32) {
        self.dilation_kernel
    }

    pub fn background_color(&self) -> [u8; 3] {
        self.background_color
    }

    pub fn line_color(&self) -> [u8; 3] {
        self.line_color
    }

    pub fn validate(&self) -> Result<()> {
        Ok(self.check()?)
    }

    fn check(&self) -> std::result::Result<(), ConfigError> {
        if !BLUR_KERNEL_SIZES.contains(&self.blur_kernel) {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.blur_kernel".to_string(),
                value: self.blur_kernel.to_string(),
            });
        }

        for (key, value) in [
            ("pipeline.low_threshold", self.low_threshold),
            ("pipeline.high_threshold", self.high_threshold),
        ] {
            if !(0.0..=255.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                });
            }
        }

        if self.low_threshold >= self.high_threshold {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.threshold_range".to_string(),
                value: format!("{}-{}", self.low_threshold, self.high_threshold),
            });
        }

        let (width, height) = self.dilation_kernel;
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.dilation_kernel".to_string(),
                value: format!("{}x{}", width, height),
            });
        }

        Ok(())
    }
}

/// Output naming and encoding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// ffmpeg encoder for the converted video
    pub video_codec: String,

    /// FourCC tag written into the container
    pub codec_tag: Option<String>,

    /// Container extension of the converted and muxed videos
    pub container: String,

    /// Marker appended to the stem of the edge-detected video
    pub edge_marker: String,

    /// Marker appended to the stem of the video with audio reattached
    pub audio_marker: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            video_codec: "mpeg4".to_string(),
            codec_tag: Some("xvid".to_string()),
            container: "avi".to_string(),
            edge_marker: "[canny]".to_string(),
            audio_marker: "[add-audio]".to_string(),
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("output.video_codec", &self.video_codec),
            ("output.container", &self.container),
            ("output.edge_marker", &self.edge_marker),
            ("output.audio_marker", &self.audio_marker),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.clone(),
                }.into());
            }
        }

        if let Some(tag) = &self.codec_tag {
            if tag.len() != 4 {
                return Err(ConfigError::InvalidValue {
                    key: "output.codec_tag".to_string(),
                    value: tag.clone(),
                }.into());
            }
        }

        Ok(())
    }
}

/// Frame processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of worker threads for per-frame filtering
    pub threads: usize,

    /// Draw a progress bar while converting
    pub show_progress: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            show_progress: true,
        }
    }
}

impl ProcessingConfig {
    fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "processing.threads".to_string(),
                value: self.threads.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Preview playback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Show the converted video with its audio before muxing
    pub enabled: bool,

    /// Window size relative to the video size
    pub window_scale: f32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_scale: 0.5,
        }
    }
}

impl PlaybackConfig {
    fn validate(&self) -> Result<()> {
        if !(self.window_scale > 0.0 && self.window_scale <= 4.0) {
            return Err(ConfigError::InvalidValue {
                key: "playback.window_scale".to_string(),
                value: self.window_scale.to_string()
            }.into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LineArtError;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline.blur_kernel(), 3);
        assert_eq!(config.pipeline.dilation_kernel(), (2, 2));
        assert_eq!(config.pipeline.line_color(), [248, 248, 255]);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        original_config.pipeline =
            PipelineConfig::new(5, 20.0, 60.0, (3, 3), [10, 20, 30], [200, 210, 220]).unwrap();

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(original_config.pipeline, loaded_config.pipeline);
        assert_eq!(original_config.output.container, loaded_config.output.container);
    }

    #[test]
    fn test_threshold_ordering_rejected() {
        for (low, high) in [(90.0, 30.0), (50.0, 50.0)] {
            let result = PipelineConfig::new(3, low, high, (2, 2), [0, 0, 0], [255, 255, 255]);
            assert!(matches!(
                result,
                Err(LineArtError::Config(ConfigError::InvalidValue { ref key, .. }))
                    if key == "pipeline.threshold_range"
            ));
        }
    }

    #[test]
    fn test_bad_kernels_rejected() {
        for blur in [0, 1, 4, 9] {
            assert!(PipelineConfig::new(blur, 30.0, 90.0, (2, 2), [0; 3], [255; 3]).is_err());
        }
        assert!(PipelineConfig::new(3, 30.0, 90.0, (0, 2), [0; 3], [255; 3]).is_err());
        assert!(PipelineConfig::new(3, 30.0, 90.0, (2, 0), [0; 3], [255; 3]).is_err());
        assert!(PipelineConfig::new(3, 30.0, 300.0, (2, 2), [0; 3], [255; 3]).is_err());
        assert!(PipelineConfig::new(3, -1.0, 90.0, (2, 2), [0; 3], [255; 3]).is_err());
    }

    #[test]
    fn test_invalid_pipeline_in_toml_fails_to_parse() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bad.toml");
        std::fs::write(&file_path, "[pipeline]\nblur_kernel = 4\n").unwrap();

        let result = Config::from_file(&file_path);
        assert!(matches!(
            result,
            Err(LineArtError::Config(ConfigError::ParseFailed { .. }))
        ));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            "[pipeline]\nlow_threshold = 40.0\nhigh_threshold = 120.0\n[playback]\nenabled = false\n",
        )
        .unwrap();

        assert_eq!(config.pipeline.low_threshold(), 40.0);
        assert_eq!(config.pipeline.blur_kernel(), 3);
        assert!(!config.playback.enabled);
        assert_eq!(config.output.edge_marker, "[canny]");
    }

    #[test]
    fn test_missing_config_file() {
        let result = Config::from_file("/no/such/lineart.toml");
        assert!(matches!(
            result,
            Err(LineArtError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_invalid_processing_config() {
        let mut config = Config::default();
        config.processing.threads = 0;
        assert!(config.validate().is_err());
    }
}
