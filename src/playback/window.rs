use minifb::{Key, ScaleMode, Window, WindowOptions};

use crate::error::{FrameError, PlaybackError, Result};
use crate::playback::player::PlaybackSurface;
use crate::video::types::Frame;

/// Pack RGB triples into minifb's `0RGB` words
pub(crate) fn pack_argb(rgb: &[u8], out: &mut Vec<u32>) {
    out.clear();
    out.extend(
        rgb.chunks_exact(3)
            .map(|px| ((px[0] as u32) << 16) | ((px[1] as u32) << 8) | px[2] as u32),
    );
}

/// Window size for a source of `width`x`height` shown at `scale`
pub(crate) fn scaled_size(width: u32, height: u32, scale: f32) -> (usize, usize) {
    let side = |v: u32| ((v as f32 * scale).round() as usize).max(1);
    (side(width), side(height))
}

/// A desktop window showing frames at their source resolution, stretched to
/// the window. Escape or closing the window counts as an interrupt.
pub struct MinifbSurface {
    window: Window,
    width: u32,
    height: u32,
    buffer: Vec<u32>,
}

impl MinifbSurface {
    pub fn open(title: &str, width: u32, height: u32, scale: f32) -> Result<Self> {
        let (window_width, window_height) = scaled_size(width, height, scale);
        let window = Window::new(
            title,
            window_width,
            window_height,
            WindowOptions {
                resize: true,
                scale_mode: ScaleMode::AspectRatioStretch,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| PlaybackError::WindowFailed { reason: e.to_string() })?;

        Ok(Self {
            window,
            width,
            height,
            buffer: Vec::with_capacity(width as usize * height as usize),
        })
    }
}

impl PlaybackSurface for MinifbSurface {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(FrameError::DimensionMismatch {
                width: self.width,
                height: self.height,
                actual_width: frame.width(),
                actual_height: frame.height(),
            }
            .into());
        }

        pack_argb(frame.as_bytes(), &mut self.buffer);
        self.window
            .update_with_buffer(&self.buffer, self.width as usize, self.height as usize)
            .map_err(|e| PlaybackError::WindowFailed { reason: e.to_string() })?;
        Ok(())
    }

    fn interrupted(&self) -> bool {
        !self.window.is_open() || self.window.is_key_down(Key::Escape)
    }
}
