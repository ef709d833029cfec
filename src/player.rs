//! Playback: the transport state machine and the audio backend it drives.
//!
//! `PlaybackCore` holds the play intent, shuffle/repeat policy, cached
//! progress/duration and the next/previous selection rules. It talks to the
//! audio output only through the `MediaElement` trait; `RodioElement` is the
//! real implementation, running decoding and output on its own thread and
//! reporting back through `MediaEvent`s.

mod backend;
mod keys;
mod media;
mod sink;
mod transport;
mod types;

pub use backend::RodioElement;
pub use transport::{PlaybackCore, TransportState};
pub use keys::{Shortcut, shortcut_for};
pub use media::MediaElement;
pub use types::*;

#[cfg(test)]
mod tests;
