use std::path::Path;

use super::types::{BindingId, PlayToken};

/// The audio output as seen by the playback core.
///
/// Calls never block on decoding. `play` is asynchronous: its outcome comes
/// back later as `MediaEvent::PlayStarted` or `MediaEvent::PlayFailed`
/// carrying the same token. Every event produced after `bind` carries that
/// binding's id.
pub trait MediaElement {
    /// Attach `source` as the current track, paused at position 0.
    fn bind(&mut self, binding: BindingId, source: &Path);
    /// Detach the current source, if any.
    fn unbind(&mut self);
    fn play(&mut self, token: PlayToken);
    fn pause(&mut self);
    /// Current position in seconds.
    fn position(&self) -> f64;
    fn set_position(&mut self, seconds: f64);
    /// Output level in `[0, 1]`, already accounting for mute.
    fn set_volume(&mut self, level: f64);
}
