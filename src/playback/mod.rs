//! # Playback Module
//!
//! Preview of a converted video with its extracted audio. The loop in
//! [`player`] only talks to the [`PlaybackSurface`] and [`AudioChannel`]
//! traits; [`MinifbSurface`] and [`RodioAudio`] are the desktop versions.

pub mod audio;
pub mod player;
pub mod signal;
pub mod window;

pub use audio::RodioAudio;
pub use player::{run_playback_loop, AudioChannel, PlaybackEnd, PlaybackSurface, Player};
pub use signal::PlaybackSignal;
pub use window::MinifbSurface;
