use std::path::{Path, PathBuf};

use crate::config::OutputConfig;
use crate::error::{Result, VideoError};

/// Every file a run reads or writes, derived from the input name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub input: PathBuf,
    /// Line-art video without audio: `{stem}-{edge_marker}.{container}`
    pub converted: PathBuf,
    /// Audio pulled from the input: `{stem}.wav`
    pub audio: PathBuf,
    /// Line-art video with audio: `{stem}-{edge_marker}-{audio_marker}.{container}`
    pub final_video: PathBuf,
}

impl OutputPaths {
    pub fn derive<P: AsRef<Path>, Q: AsRef<Path>>(
        input: P,
        output_dir: Q,
        output: &OutputConfig,
    ) -> Result<Self> {
        let input = input.as_ref();
        let dir = output_dir.as_ref();

        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| VideoError::InvalidParameters {
                details: format!("{} has no file name", input.display()),
            })?;

        let converted_name = format!("{}-{}", stem, output.edge_marker);
        Ok(Self {
            input: input.to_path_buf(),
            converted: dir.join(format!("{}.{}", converted_name, output.container)),
            audio: dir.join(format!("{}.wav", stem)),
            final_video: dir.join(format!(
                "{}-{}.{}",
                converted_name, output.audio_marker, output.container
            )),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_markers() {
        let paths = OutputPaths::derive("/videos/clip.mp4", "output", &OutputConfig::default()).unwrap();

        assert_eq!(paths.converted, PathBuf::from("output/clip-[canny].avi"));
        assert_eq!(paths.audio, PathBuf::from("output/clip.wav"));
        assert_eq!(paths.final_video, PathBuf::from("output/clip-[canny]-[add-audio].avi"));
        assert_eq!(paths.input, PathBuf::from("/videos/clip.mp4"));
    }

    #[test]
    fn test_custom_markers_and_dotted_names() {
        let config = OutputConfig {
            container: "mkv".to_string(),
            edge_marker: "edges".to_string(),
            audio_marker: "sound".to_string(),
            ..OutputConfig::default()
        };
        let paths = OutputPaths::derive("my.holiday.mov", "/tmp/out", &config).unwrap();

        assert_eq!(paths.converted, PathBuf::from("/tmp/out/my.holiday-edges.mkv"));
        assert_eq!(paths.audio, PathBuf::from("/tmp/out/my.holiday.wav"));
        assert_eq!(paths.final_video, PathBuf::from("/tmp/out/my.holiday-edges-sound.mkv"));
    }

    #[test]
    fn test_input_without_name() {
        assert!(OutputPaths::derive("/", "out", &OutputConfig::default()).is_err());
    }
}
