//! # Line-Art Filter
//!
//! Turns a color frame into a two-color line drawing:
//!
//! 1. [`EdgeDetector`] - grayscale, Gaussian blur, Sobel gradients and Canny
//!    hysteresis, giving a binary edge mask
//! 2. [`Dilator`] - thickens the one-pixel edges
//! 3. [`Recolorer`] - paints edges in the line color over the background
//!
//! Every stage is a pure function of its input and the [`PipelineConfig`]
//! it was built from, so frames can be processed independently.
//!
//! [`PipelineConfig`]: crate::config::PipelineConfig

pub mod dilate;
pub mod edge;
pub mod filter;
pub mod recolor;
pub mod traits;

pub use dilate::Dilator;
pub use edge::EdgeDetector;
pub use filter::LineArtFilter;
pub use recolor::Recolorer;
pub use traits::FrameFilter;
