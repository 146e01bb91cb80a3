use crate::{
    config::PipelineConfig,
    error::{ConfigError, Result},
    video::types::EdgeMask,
};

/// Binary dilation with a rectangular all-ones structuring element.
///
/// Thickens the one-pixel lines left by the detector. The element is anchored
/// at `(width / 2, height / 2)`; samples falling outside the mask are ignored.
#[derive(Debug, Clone, Copy)]
pub struct Dilator {
    kernel: (u32, u32),
}

impl Dilator {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            kernel: config.dilation_kernel(),
        }
    }

    /// Dilator for an explicit `(width, height)` element
    pub fn with_kernel(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.dilation_kernel".to_string(),
                value: format!("{}x{}", width, height),
            }
            .into());
        }
        Ok(Self { kernel: (width, height) })
    }

    pub fn kernel(&self) -> (u32, u32) {
        self.kernel
    }

    /// One dilation pass; the result has the mask's dimensions
    pub fn dilate(&self, mask: &EdgeMask) -> Result<EdgeMask> {
        let (kw, kh) = (self.kernel.0 as usize, self.kernel.1 as usize);
        if kw == 1 && kh == 1 {
            return Ok(mask.clone());
        }

        let (width, height) = mask.dimensions();
        let (w, h) = (width as usize, height as usize);
        let src = mask.as_bytes();

        // Rectangular element is separable: row maxima, then column maxima.
        let rows = max_filter(src, w, h, kw, Axis::Horizontal);
        let out = max_filter(&rows, w, h, kh, Axis::Vertical);

        Ok(EdgeMask::from_binary_vec(width, height, out)?)
    }
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

fn max_filter(src: &[u8], w: usize, h: usize, size: usize, axis: Axis) -> Vec<u8> {
    let anchor = (size / 2) as i64;
    let mut out = vec![EdgeMask::BACKGROUND; w * h];

    for y in 0..h {
        for x in 0..w {
            let (pos, len) = match axis {
                Axis::Horizontal => (x as i64, w as i64),
                Axis::Vertical => (y as i64, h as i64),
            };
            let start = (pos - anchor).max(0);
            let end = (pos - anchor + size as i64).min(len);

            let hit = (start..end).any(|p| {
                let index = match axis {
                    Axis::Horizontal => y * w + p as usize,
                    Axis::Vertical => p as usize * w + x,
                };
                src[index] == EdgeMask::EDGE
            });
            if hit {
                out[y * w + x] = EdgeMask::EDGE;
            }
        }
    }

    out
}
