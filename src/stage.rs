//! Skip-if-exists bookkeeping shared by convert, extract and mux.
//!
//! A stage is skipped when its output path already exists and overwriting is
//! off. Only existence is checked, so stages never write their output path
//! directly: ffmpeg writes a hidden sibling ([`PartialFile`]) which is renamed
//! into place once the stage has succeeded. A run killed half way leaves at
//! most a stale `.partial` file, which the next run overwrites.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

/// What a stage did with its output path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The output was (re)written; `frames` is set for video stages
    Completed { frames: Option<u64> },

    /// The output already existed and overwrite was off
    Skipped,
}

impl StageOutcome {
    pub fn completed() -> Self {
        Self::Completed { frames: None }
    }

    pub fn was_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

/// True when `output` exists and must be left alone
pub fn should_skip<P: AsRef<Path>>(stage: &str, output: P, overwrite: bool) -> bool {
    let output = output.as_ref();
    if !overwrite && output.exists() {
        info!("{}: {} already exists, skipping", stage, output.display());
        return true;
    }
    false
}

/// Hidden sibling of `target` with the same extension, so ffmpeg still picks
/// the container from the name: `out/clip.avi` → `out/.clip.partial.avi`
pub fn partial_path<P: AsRef<Path>>(target: P) -> PathBuf {
    let target = target.as_ref();
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match target.extension() {
        Some(ext) => format!(".{}.partial.{}", stem, ext.to_string_lossy()),
        None => format!(".{}.partial", stem),
    };
    target.with_file_name(name)
}

/// Output under construction. Dropped without [`commit`](Self::commit), the
/// partial file is deleted and the target is left untouched.
#[derive(Debug)]
pub struct PartialFile {
    partial: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl PartialFile {
    pub fn for_target<P: AsRef<Path>>(target: P) -> Self {
        let target = target.as_ref().to_path_buf();
        Self {
            partial: partial_path(&target),
            target,
            committed: false,
        }
    }

    /// Where the stage should write
    pub fn path(&self) -> &Path {
        &self.partial
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Move the finished file onto the target, replacing any previous one
    pub fn commit(mut self) -> std::io::Result<()> {
        std::fs::rename(&self.partial, &self.target)?;
        self.committed = true;
        debug!("Committed {}", self.target.display());
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.committed || !self.partial.exists() {
            return;
        }
        match std::fs::remove_file(&self.partial) {
            Ok(()) => warn!("Removed incomplete output {}", self.partial.display()),
            Err(e) => warn!("Failed to remove incomplete output {}: {}", self.partial.display(), e),
        }
    }
}
