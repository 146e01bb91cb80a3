// src/lineart/edge.rs - grayscale, blur, Sobel and Canny hysteresis

use image::{GrayImage, Luma};
use tracing::trace;

use crate::{
    config::PipelineConfig,
    error::{ConfigError, FrameError, Result},
    video::types::{EdgeMask, Frame},
};

/// Fixed-point luma weights (14 fractional bits) for R, G and B.
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

/// tan(22.5°) in 15-bit fixed point, used to pick the gradient sector.
const CANNY_SHIFT: i64 = 15;
const TAN_22_5: i64 = 13573;

const NOT_EDGE: u8 = 1;
const CANDIDATE: u8 = 0;
const STRONG: u8 = 2;

/// Binary edge detector: grayscale → Gaussian blur → Sobel → Canny.
#[derive(Debug, Clone)]
pub struct EdgeDetector {
    blur_kernel: u32,
    low_threshold: i32,
    high_threshold: i32,
}

impl EdgeDetector {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            blur_kernel: config.blur_kernel(),
            low_threshold: config.low_threshold().floor() as i32,
            high_threshold: config.high_threshold().floor() as i32,
        }
    }

    /// Produce a binary edge mask with the same dimensions as `frame`
    pub fn detect(&self, frame: &Frame) -> Result<EdgeMask> {
        frame.ensure_not_empty()?;

        let gray = to_grayscale(frame);
        let blurred = gaussian_blur(&gray, self.blur_kernel)?;
        let gradients = Gradients::sobel(&blurred);
        let mask = gradients.hysteresis(self.low_threshold, self.high_threshold)?;

        trace!(
            "Detected {} edge pixels in {}x{} frame",
            mask.edge_count(),
            frame.width(),
            frame.height()
        );
        Ok(mask)
    }
}

/// Luma-weighted grayscale with round-half-up fixed-point arithmetic
pub fn to_grayscale(frame: &Frame) -> GrayImage {
    let (width, height) = frame.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let [r, g, b] = frame.get_pixel(x, y);
        let sum = r as u32 * LUMA_R + g as u32 * LUMA_G + b as u32 * LUMA_B;
        Luma([((sum + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8])
    })
}

/// Integer Gaussian taps for a kernel size, with their sum.
///
/// These are the kernels a Gaussian blur derives when sigma is left
/// unspecified (`sigma = 0.3 * ((k - 1) * 0.5 - 1) + 0.8`, tabulated for the
/// small sizes).
fn gaussian_taps(kernel_size: u32) -> Option<(&'static [u32], u32)> {
    match kernel_size {
        3 => Some((&[1, 2, 1], 4)),
        5 => Some((&[1, 4, 6, 4, 1], 16)),
        7 => Some((&[2, 7, 14, 18, 14, 7, 2], 64)),
        _ => None,
    }
}

/// Border index that mirrors without repeating the edge sample (`dcb|abcd|cba`)
pub(crate) fn reflect_101(index: i64, len: usize) -> usize {
    let len = len as i64;
    if len == 1 {
        return 0;
    }

    let mut i = index;
    loop {
        if i < 0 {
            i = -i;
        } else if i >= len {
            i = 2 * len - 2 - i;
        } else {
            return i as usize;
        }
    }
}

/// Separable Gaussian blur with exact integer accumulation
pub fn gaussian_blur(gray: &GrayImage, kernel_size: u32) -> Result<GrayImage> {
    let (taps, norm) = gaussian_taps(kernel_size).ok_or_else(|| ConfigError::InvalidValue {
        key: "pipeline.blur_kernel".to_string(),
        value: kernel_size.to_string(),
    })?;

    let (width, height) = gray.dimensions();
    let (w, h) = (width as usize, height as usize);
    let radius = (taps.len() / 2) as i64;
    let src = gray.as_raw();

    let mut horizontal = vec![0u32; w * h];
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w {
            horizontal[y * w + x] = taps
                .iter()
                .enumerate()
                .map(|(i, &k)| k * row[reflect_101(x as i64 + i as i64 - radius, w)] as u32)
                .sum();
        }
    }

    let total = norm * norm;
    Ok(GrayImage::from_fn(width, height, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let acc: u32 = taps
            .iter()
            .enumerate()
            .map(|(j, &k)| k * horizontal[reflect_101(y as i64 + j as i64 - radius, h) * w + x])
            .sum();
        Luma([((acc + total / 2) / total) as u8])
    }))
}

/// Signed 16-bit horizontal and vertical Sobel responses
#[derive(Debug, Clone)]
pub struct Gradients {
    width: usize,
    height: usize,
    dx: Vec<i16>,
    dy: Vec<i16>,
}

impl Gradients {
    /// 3x3 Sobel on an 8-bit image, reflect-101 borders
    pub fn sobel(image: &GrayImage) -> Self {
        let (w, h) = (image.width() as usize, image.height() as usize);
        let src = image.as_raw();
        let at = |x: i64, y: i64| src[reflect_101(y, h) * w + reflect_101(x, w)] as i32;

        let mut dx = vec![0i16; w * h];
        let mut dy = vec![0i16; w * h];

        for y in 0..h as i64 {
            for x in 0..w as i64 {
                let gx = (at(x + 1, y - 1) - at(x - 1, y - 1))
                    + 2 * (at(x + 1, y) - at(x - 1, y))
                    + (at(x + 1, y + 1) - at(x - 1, y + 1));
                let gy = (at(x - 1, y + 1) - at(x - 1, y - 1))
                    + 2 * (at(x, y + 1) - at(x, y - 1))
                    + (at(x + 1, y + 1) - at(x + 1, y - 1));

                let index = y as usize * w + x as usize;
                dx[index] = gx as i16;
                dy[index] = gy as i16;
            }
        }

        Self { width: w, height: h, dx, dy }
    }

    pub fn dx(&self, x: usize, y: usize) -> i16 {
        self.dx[y * self.width + x]
    }

    pub fn dy(&self, x: usize, y: usize) -> i16 {
        self.dy[y * self.width + x]
    }

    /// L1 magnitudes with a one-pixel zero border, row stride `width + 2`
    fn padded_magnitudes(&self) -> Vec<i32> {
        let stride = self.width + 2;
        let mut magnitudes = vec![0i32; stride * (self.height + 2)];
        for y in 0..self.height {
            for x in 0..self.width {
                let i = y * self.width + x;
                magnitudes[(y + 1) * stride + x + 1] =
                    (self.dx[i] as i32).abs() + (self.dy[i] as i32).abs();
            }
        }
        magnitudes
    }

    /// Non-maximum suppression followed by two-threshold edge linking.
    ///
    /// Pixels above `high` seed edges; pixels above `low` join them when
    /// 8-connected, transitively. Everything else becomes background.
    pub fn hysteresis(&self, low: i32, high: i32) -> std::result::Result<EdgeMask, FrameError> {
        let (w, h) = (self.width, self.height);
        let stride = w + 2;
        let mag = self.padded_magnitudes();
        let m_at = |x: usize, y: usize| mag[y * stride + x];

        let mut map = vec![NOT_EDGE; w * h];
        let mut stack = Vec::new();

        for y in 0..h {
            for x in 0..w {
                // padded coordinates
                let (px, py) = (x + 1, y + 1);
                let m = m_at(px, py);
                if m <= low {
                    continue;
                }

                let xs = self.dx(x, y) as i64;
                let ys = self.dy(x, y) as i64;
                let ax = xs.abs();
                let ay = ys.abs() << CANNY_SHIFT;
                let tg22x = ax * TAN_22_5;

                let is_peak = if ay < tg22x {
                    m > m_at(px - 1, py) && m >= m_at(px + 1, py)
                } else {
                    let tg67x = tg22x + (ax << (CANNY_SHIFT + 1));
                    if ay > tg67x {
                        m > m_at(px, py - 1) && m >= m_at(px, py + 1)
                    } else if (xs ^ ys) < 0 {
                        m > m_at(px + 1, py - 1) && m > m_at(px - 1, py + 1)
                    } else {
                        m > m_at(px - 1, py - 1) && m > m_at(px + 1, py + 1)
                    }
                };

                if !is_peak {
                    continue;
                }

                if m > high {
                    map[y * w + x] = STRONG;
                    stack.push((x, y));
                } else {
                    map[y * w + x] = CANDIDATE;
                }
            }
        }

        while let Some((x, y)) = stack.pop() {
            for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                    let index = ny * w + nx;
                    if map[index] == CANDIDATE {
                        map[index] = STRONG;
                        stack.push((nx, ny));
                    }
                }
            }
        }

        let data = map
            .into_iter()
            .map(|state| if state == STRONG { EdgeMask::EDGE } else { EdgeMask::BACKGROUND })
            .collect();
        EdgeMask::from_binary_vec(w as u32, h as u32, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> EdgeDetector {
        EdgeDetector::new(&PipelineConfig::default())
    }

    fn split_frame(size: u32) -> Frame {
        let mut frame = Frame::new_filled(size, size, [0, 0, 0]);
        for y in 0..size {
            for x in size / 2..size {
                frame.set_pixel(x, y, [255, 255, 255]);
            }
        }
        frame
    }

    #[test]
    fn test_grayscale_weights() {
        let mut frame = Frame::new_filled(3, 1, [0, 0, 0]);
        frame.set_pixel(0, 0, [255, 0, 0]);
        frame.set_pixel(1, 0, [0, 255, 0]);
        frame.set_pixel(2, 0, [0, 0, 255]);

        let gray = to_grayscale(&frame);
        assert_eq!(gray.as_raw(), &vec![76, 150, 29]);

        let white = to_grayscale(&Frame::new_filled(1, 1, [255, 255, 255]));
        assert_eq!(white.as_raw()[0], 255);
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(-3, 2), 1);
        assert_eq!(reflect_101(4, 1), 0);
    }

    #[test]
    fn test_blur_preserves_flat_image() {
        for k in [3, 5, 7] {
            let gray = GrayImage::from_pixel(9, 7, image::Luma([123]));
            let blurred = gaussian_blur(&gray, k).unwrap();
            assert!(blurred.as_raw().iter().all(|&v| v == 123));
        }
    }

    #[test]
    fn test_blur_rounds_half_up() {
        // Row [0, 255, 0] blurs its centre to (255*2)/4 = 127.5 horizontally,
        // then stays constant vertically.
        let gray = GrayImage::from_raw(3, 1, vec![0, 255, 0]).unwrap();
        let blurred = gaussian_blur(&gray, 3).unwrap();
        assert_eq!(blurred.as_raw()[1], 128);
    }

    #[test]
    fn test_blur_keeps_narrow_shapes() {
        // one column: the horizontal pass is the identity, the vertical one is not
        let column = GrayImage::from_fn(1, 6, |_, y| image::Luma([(y * 10) as u8]));
        let blurred = gaussian_blur(&column, 3).unwrap();
        assert_eq!(blurred.dimensions(), (1, 6));
        assert_eq!(blurred.get_pixel(0, 2).0, [20]);
        assert_eq!(blurred.get_pixel(0, 0).0, [5]);

        let row = to_grayscale(&Frame::new_filled(7, 1, [10, 20, 30]));
        assert_eq!(row.dimensions(), (7, 1));
        assert_eq!(gaussian_blur(&row, 7).unwrap().dimensions(), (7, 1));
    }

    #[test]
    fn test_blur_rejects_unsupported_kernel() {
        let gray = GrayImage::new(4, 4);
        assert!(gaussian_blur(&gray, 4).is_err());
    }

    #[test]
    fn test_sobel_on_vertical_step() {
        let gray = GrayImage::from_fn(4, 3, |x, _| image::Luma([if x >= 2 { 100 } else { 0 }]));
        let gradients = Gradients::sobel(&gray);

        assert_eq!(gradients.dx(1, 1), 400);
        assert_eq!(gradients.dx(2, 1), 400);
        assert_eq!(gradients.dx(0, 1), 0);
        assert_eq!(gradients.dy(1, 1), 0);
    }

    #[test]
    fn test_sobel_does_not_saturate() {
        let gray = GrayImage::from_fn(3, 3, |x, _| image::Luma([if x == 2 { 255 } else { 0 }]));
        let gradients = Gradients::sobel(&gray);
        assert_eq!(gradients.dx(1, 1), 1020);
    }

    #[test]
    fn test_flat_frame_has_no_edges() {
        let frame = Frame::new_filled(64, 64, [90, 140, 30]);
        let mask = detector().detect(&frame).unwrap();
        assert_eq!(mask.dimensions(), (64, 64));
        assert_eq!(mask.edge_count(), 0);
    }

    #[test]
    fn test_vertical_split_edges_follow_boundary() {
        let frame = split_frame(64);
        let mask = detector().detect(&frame).unwrap();

        for y in 0..64 {
            for x in 0..64 {
                if mask.is_edge(x, y) {
                    assert!((30..=33).contains(&x), "unexpected edge at ({}, {})", x, y);
                }
            }
            let row_edges = (0..64).filter(|&x| mask.is_edge(x, y)).count();
            assert!(row_edges >= 1 && row_edges <= 2, "row {} has {} edges", y, row_edges);
        }
    }

    #[test]
    fn test_output_is_binary() {
        let frame = Frame::new(image::RgbImage::from_fn(40, 30, |x, y| {
            image::Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x * y) % 256) as u8])
        }));

        for (low, high) in [(10.0, 30.0), (30.0, 90.0), (100.0, 250.0)] {
            let config = PipelineConfig::new(5, low, high, (1, 1), [0; 3], [255; 3]).unwrap();
            let mask = EdgeDetector::new(&config).detect(&frame).unwrap();
            assert!(mask.as_bytes().iter().all(|&v| v == 0 || v == 255));
        }
    }

    #[test]
    fn test_weak_edges_need_strong_neighbour() {
        // A faint step (low contrast) alone never crosses the high threshold.
        let frame = Frame::new(image::RgbImage::from_fn(32, 32, |x, _| {
            if x < 16 { image::Rgb([100, 100, 100]) } else { image::Rgb([110, 110, 110]) }
        }));
        let config = PipelineConfig::new(3, 10.0, 200.0, (1, 1), [0; 3], [255; 3]).unwrap();
        let mask = EdgeDetector::new(&config).detect(&frame).unwrap();
        assert_eq!(mask.edge_count(), 0);

        let config = PipelineConfig::new(3, 10.0, 30.0, (1, 1), [0; 3], [255; 3]).unwrap();
        let mask = EdgeDetector::new(&config).detect(&frame).unwrap();
        assert!(mask.edge_count() > 0);
    }

    #[test]
    fn test_single_pixel_frame() {
        let frame = Frame::new_filled(1, 1, [200, 10, 10]);
        let mask = detector().detect(&frame).unwrap();
        assert_eq!(mask.dimensions(), (1, 1));
        assert_eq!(mask.edge_count(), 0);
    }

    #[test]
    fn test_empty_frame_is_rejected() {
        let frame = Frame::new(image::RgbImage::new(0, 0));
        let result = detector().detect(&frame);
        assert!(matches!(
            result,
            Err(crate::error::LineArtError::Frame(FrameError::Empty { .. }))
        ));
    }
}
