use crate::{
    config::PipelineConfig,
    error::Result,
    lineart::{Dilator, EdgeDetector, FrameFilter, Recolorer},
    video::types::{EdgeMask, Frame},
};

/// Detect → dilate → recolor, configured once from a [`PipelineConfig`]
#[derive(Debug, Clone)]
pub struct LineArtFilter {
    detector: EdgeDetector,
    dilator: Dilator,
    recolorer: Recolorer,
}

impl LineArtFilter {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            detector: EdgeDetector::new(config),
            dilator: Dilator::new(config),
            recolorer: Recolorer::new(config),
        }
    }

    /// Thickened edge mask, before recoloring
    pub fn mask(&self, frame: &Frame) -> Result<EdgeMask> {
        let edges = self.detector.detect(frame)?;
        self.dilator.dilate(&edges)
    }

    pub fn detector(&self) -> &EdgeDetector {
        &self.detector
    }

    pub fn dilator(&self) -> &Dilator {
        &self.dilator
    }

    pub fn recolorer(&self) -> &Recolorer {
        &self.recolorer
    }
}

impl FrameFilter for LineArtFilter {
    fn name(&self) -> &str {
        "lineart"
    }

    fn description(&self) -> &str {
        "Canny edges, thickened by dilation, drawn in the line color over a flat background"
    }

    fn apply(&self, frame: &Frame) -> Result<Frame> {
        let mask = self.mask(frame)?;
        self.recolorer.recolor(&mask)
    }
}
