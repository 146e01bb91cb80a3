use rayon::prelude::*;

use crate::{
    config::PipelineConfig,
    error::Result,
    video::types::{EdgeMask, Frame},
};

/// Maps mask values onto background and line colors.
///
/// 255 becomes the line color; 0 and any stray value become the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recolorer {
    background: [u8; 3],
    line: [u8; 3],
}

impl Recolorer {
    pub fn new(config: &PipelineConfig) -> Self {
        Self::with_colors(config.background_color(), config.line_color())
    }

    pub fn with_colors(background: [u8; 3], line: [u8; 3]) -> Self {
        Self { background, line }
    }

    pub fn background(&self) -> [u8; 3] {
        self.background
    }

    pub fn line(&self) -> [u8; 3] {
        self.line
    }

    /// Color for one mask value
    #[inline]
    pub fn color_for(&self, value: u8) -> [u8; 3] {
        if value == EdgeMask::EDGE {
            self.line
        } else {
            self.background
        }
    }

    /// Build a 3-channel frame of the mask's size. Rows are split across the
    /// current rayon pool.
    pub fn recolor(&self, mask: &EdgeMask) -> Result<Frame> {
        let (width, height) = mask.dimensions();
        let row_len = width as usize * 3;
        let mut data = vec![0u8; row_len * height as usize];

        if row_len > 0 {
            data.par_chunks_mut(row_len)
                .zip(mask.as_bytes().par_chunks(width as usize))
                .for_each(|(row, mask_row)| {
                    for (pixel, &value) in row.chunks_exact_mut(3).zip(mask_row) {
                        pixel.copy_from_slice(&self.color_for(value));
                    }
                });
        }

        Ok(Frame::from_raw(width, height, Frame::CHANNELS, data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;

    const BG: [u8; 3] = [10, 20, 30];
    const LINE: [u8; 3] = [248, 248, 255];

    #[test]
    fn test_recolor_maps_both_values() {
        let mask = EdgeMask::from_raw(3, 2, vec![0, 255, 0, 255, 255, 0]).unwrap();
        let frame = Recolorer::with_colors(BG, LINE).recolor(&mask).unwrap();

        assert_eq!(frame.dimensions(), (3, 2));
        assert_eq!(frame.get_pixel(0, 0), BG);
        assert_eq!(frame.get_pixel(1, 0), LINE);
        assert_eq!(frame.get_pixel(0, 1), LINE);
        assert_eq!(frame.get_pixel(2, 1), BG);
    }

    #[test]
    fn test_stray_values_become_background() {
        let recolorer = Recolorer::with_colors(BG, LINE);
        assert_eq!(recolorer.color_for(0), BG);
        assert_eq!(recolorer.color_for(255), LINE);
        assert_eq!(recolorer.color_for(128), BG);
        assert_eq!(recolorer.color_for(254), BG);
    }

    #[test]
    fn test_recolor_is_repeatable() {
        let gray = GrayImage::from_fn(17, 9, |x, y| image::Luma([if (x + y) % 3 == 0 { 255 } else { 0 }]));
        let mask = EdgeMask::from_raw(17, 9, gray.into_raw()).unwrap();
        let recolorer = Recolorer::with_colors(BG, LINE);

        let first = recolorer.recolor(&mask).unwrap();
        let second = recolorer.recolor(&mask).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_mask_is_rejected() {
        let mask = EdgeMask::empty(0, 0);
        assert!(Recolorer::with_colors(BG, LINE).recolor(&mask).is_err());
    }
}
