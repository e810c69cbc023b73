//! # wavplay
//!
//! Canonical PCM WAVE parsing and single-buffer playback.
//!
//! [`wave`] reads and writes the 44-byte canonical RIFF/WAVE layout,
//! [`format`] maps header fields to device sample formats and [`playback`]
//! uploads a payload to an audio backend and waits for it to finish.
//!
//! ```no_run
//! use wavplay_lib::playback::{self, Context, Device, PlaybackSettings, RodioBackend};
//!
//! fn main() -> Result<(), wavplay_lib::Error> {
//!     let backend = RodioBackend::new();
//!     let device = Device::open(&backend, None)?;
//!     let context = Context::create(&device)?;
//!
//!     let (header, payload) = wavplay_lib::wave::load("tone.wav")?;
//!     playback::play(&header, payload, &context, &PlaybackSettings::for_header(&header))?;
//!     Ok(())
//! }
//! ```

pub mod constants;
mod error;
pub mod format;
pub mod playback;
pub mod wave;

pub use error::Error;
pub use format::SampleFormatTag;
pub use wave::{AudioPayload, ParseError, WaveHeader};
