//! The playback core: transport state and track selection policy.
//!
//! Everything here runs on the event-loop thread. The core never owns the
//! catalog; it reads it through the `Session` and writes the current index
//! back through `Session::set_current_index`, then calls `sync` so the media
//! element is rebound before any later event is processed.

use rand::Rng;

use crate::config::ControlsSettings;
use crate::session::Session;

use super::keys::Shortcut;
use super::media::MediaElement;
use super::types::{BindingId, MediaEvent, PlayToken, PlayerPrefs, RepeatMode};

/// Upper bound for keyboard seeking while the duration is still unknown.
const UNKNOWN_DURATION_SEEK_LIMIT: f64 = 9_007_199_254_740_991.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportState {
    pub is_playing: bool,
    /// Seconds into the bound track.
    pub progress: f64,
    /// Seconds; 0 while unknown.
    pub duration: f64,
    pub volume: f64,
    pub muted: bool,
}

#[derive(Debug, Clone, Copy)]
struct Bound {
    index: usize,
    binding: BindingId,
    revision: u64,
}

pub struct PlaybackCore {
    transport: TransportState,
    shuffle: bool,
    repeat: RepeatMode,

    /// Master indices of the queue the core walks through.
    order: Vec<usize>,
    bound: Option<Bound>,
    next_binding: u64,
    play_attempts: u64,
    pending_play: Option<PlayToken>,

    prefs_dirty: bool,
    seek_step: f64,
    volume_step: f64,
    restart_threshold: f64,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

impl PlaybackCore {
    pub fn new(prefs: PlayerPrefs, controls: &ControlsSettings) -> Self {
        Self {
            transport: TransportState {
                is_playing: false,
                progress: 0.0,
                duration: 0.0,
                volume: prefs.volume.clamp(0.0, 1.0),
                muted: prefs.muted,
            },
            shuffle: prefs.shuffle,
            repeat: prefs.repeat,
            order: Vec::new(),
            bound: None,
            next_binding: 0,
            play_attempts: 0,
            pending_play: None,
            prefs_dirty: false,
            seek_step: controls.seek_seconds,
            volume_step: controls.volume_step,
            restart_threshold: controls.restart_threshold_seconds,
        }
    }

    pub fn transport(&self) -> &TransportState {
        &self.transport
    }

    pub fn is_playing(&self) -> bool {
        self.transport.is_playing
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Master index of the track currently bound to the media element.
    pub fn bound_index(&self) -> Option<usize> {
        self.bound.map(|b| b.index)
    }

    pub fn prefs(&self) -> PlayerPrefs {
        PlayerPrefs {
            volume: self.transport.volume,
            muted: self.transport.muted,
            shuffle: self.shuffle,
            repeat: self.repeat,
        }
    }

    /// Returns whether preferences changed since the last call.
    pub fn take_prefs_dirty(&mut self) -> bool {
        std::mem::take(&mut self.prefs_dirty)
    }

    /// Output level: 0 when muted, otherwise the stored volume.
    pub fn effective_volume(&self) -> f64 {
        if self.transport.muted {
            0.0
        } else {
            self.transport.volume.clamp(0.0, 1.0)
        }
    }

    /// Replace the queue walked by next/previous (master indices).
    pub fn set_track_list(&mut self, order: Vec<usize>) {
        tracing::debug!(len = order.len(), "track list bound");
        self.order = order;
    }

    /// Push the initial volume to a freshly created element.
    pub fn attach(&self, media: &mut dyn MediaElement) {
        media.set_volume(self.effective_volume());
    }

    /// React to a change of the session's current index.
    ///
    /// Runs the track-change protocol when the session points somewhere other
    /// than the bound track: stop, rewind, reset progress/duration, bind the
    /// new source, and play it only if the play intent was set beforehand.
    pub fn sync(&mut self, session: &Session, media: &mut dyn MediaElement) {
        let target = session
            .current_index()
            .filter(|&i| i < session.catalog().len());
        let revision = session.revision();

        if let (Some(bound), Some(index)) = (self.bound, target) {
            if bound.index == index && bound.revision == revision {
                return;
            }
        }
        if self.bound.is_none() && target.is_none() {
            return;
        }

        let was_playing = self.transport.is_playing;
        media.pause();
        media.set_position(0.0);
        self.transport.progress = 0.0;
        self.transport.duration = 0.0;
        self.pending_play = None;

        let Some(index) = target else {
            media.unbind();
            self.bound = None;
            self.transport.is_playing = false;
            return;
        };

        let track = &session.catalog()[index];
        self.next_binding += 1;
        let binding = BindingId(self.next_binding);
        media.bind(binding, &track.source);
        self.bound = Some(Bound {
            index,
            binding,
            revision,
        });
        tracing::info!(index, id = %track.id, binding = binding.0, was_playing, "track bound");

        if was_playing {
            self.start_playback(media);
        }
    }

    fn start_playback(&mut self, media: &mut dyn MediaElement) {
        let Some(bound) = self.bound else {
            return;
        };
        self.play_attempts += 1;
        let token = PlayToken {
            binding: bound.binding,
            attempt: self.play_attempts,
        };
        self.pending_play = Some(token);
        media.play(token);
    }

    /// Set the play intent and start or stop the element accordingly.
    pub fn set_playing(&mut self, playing: bool, media: &mut dyn MediaElement) {
        if playing && self.bound.is_none() {
            return;
        }
        if self.transport.is_playing == playing {
            return;
        }
        self.transport.is_playing = playing;
        if playing {
            self.start_playback(media);
        } else {
            media.pause();
        }
    }

    pub fn toggle_play(&mut self, media: &mut dyn MediaElement) {
        self.set_playing(!self.transport.is_playing, media);
    }

    /// Rewind the bound track, optionally (re)starting playback.
    fn restart_current(&mut self, play: bool, media: &mut dyn MediaElement) {
        if self.bound.is_none() {
            return;
        }
        media.set_position(0.0);
        self.transport.progress = 0.0;
        if play {
            self.transport.is_playing = true;
            self.start_playback(media);
        }
    }

    /// Make `index` current with the play intent set.
    fn play_index(&mut self, index: usize, session: &mut Session, media: &mut dyn MediaElement) {
        if index >= session.catalog().len() {
            return;
        }
        if session.current_index() == Some(index) && self.bound_index() == Some(index) {
            // The index cell does not change, so there is no rebind to start playback.
            self.restart_current(true, media);
            return;
        }
        self.transport.is_playing = true;
        session.set_current_index(index);
        self.sync(session, media);
    }

    /// Random queue entry other than `current`, if one exists.
    fn shuffled_pick(&self, current: Option<usize>) -> Option<usize> {
        if !self.order.iter().any(|&i| Some(i) != current) {
            return None;
        }
        let mut rng = rand::rng();
        loop {
            let pick = self.order[rng.random_range(0..self.order.len())];
            if Some(pick) != current {
                return Some(pick);
            }
        }
    }

    fn position_in_order(&self, current: Option<usize>) -> Option<usize> {
        let current = current?;
        self.order.iter().position(|&i| i == current)
    }

    /// Next track: on user request or when the current one ends.
    pub fn advance(&mut self, session: &mut Session, media: &mut dyn MediaElement) {
        if self.repeat == RepeatMode::One {
            self.restart_current(true, media);
            return;
        }

        let current = self.bound_index();
        if self.shuffle {
            if let Some(next) = self.shuffled_pick(current) {
                self.play_index(next, session, media);
            }
            return;
        }

        if self.order.is_empty() {
            return;
        }
        let next = match self.position_in_order(current) {
            Some(p) if p + 1 < self.order.len() => self.order[p + 1],
            Some(_) if self.repeat == RepeatMode::All => self.order[0],
            Some(_) => {
                tracing::debug!("end of queue reached");
                self.set_playing(false, media);
                return;
            }
            None => self.order[0],
        };
        self.play_index(next, session, media);
    }

    /// Previous track, or a restart of the current one past the threshold.
    pub fn retreat(&mut self, session: &mut Session, media: &mut dyn MediaElement) {
        if self.bound.is_some() && media.position() > self.restart_threshold {
            self.restart_current(false, media);
            return;
        }

        let current = self.bound_index();
        if self.shuffle {
            if let Some(prev) = self.shuffled_pick(current) {
                self.play_index(prev, session, media);
            }
            return;
        }

        let len = self.order.len();
        if len == 0 {
            return;
        }
        let prev = match self.position_in_order(current) {
            Some(p) => self.order[(p + len - 1) % len],
            None => self.order[len - 1],
        };
        self.play_index(prev, session, media);
    }

    /// Seek to `seconds`, clamped to the known duration. No-op while unknown.
    pub fn seek(&mut self, seconds: f64, media: &mut dyn MediaElement) {
        if self.bound.is_none() || self.transport.duration <= 0.0 || seconds.is_nan() {
            return;
        }
        let target = seconds.clamp(0.0, self.transport.duration);
        media.set_position(target);
        self.transport.progress = target;
    }

    /// Seek to `fraction` of the duration (digit keys).
    pub fn seek_to_fraction(&mut self, fraction: f64, media: &mut dyn MediaElement) {
        self.seek(self.transport.duration * fraction.clamp(0.0, 1.0), media);
    }

    /// Relative seek from the element's position (arrow keys).
    pub fn seek_by(&mut self, delta: f64, media: &mut dyn MediaElement) {
        if self.bound.is_none() {
            return;
        }
        let upper = if self.transport.duration > 0.0 {
            self.transport.duration
        } else {
            UNKNOWN_DURATION_SEEK_LIMIT
        };
        let target = (media.position() + delta).min(upper).max(0.0);
        media.set_position(target);
        self.transport.progress = target;
    }

    pub fn set_volume(&mut self, level: f64, media: &mut dyn MediaElement) {
        if !level.is_finite() {
            return;
        }
        let level = level.clamp(0.0, 1.0);
        if level != self.transport.volume {
            self.transport.volume = level;
            self.prefs_dirty = true;
        }
        media.set_volume(self.effective_volume());
    }

    /// Step the volume up or down, rounded to two decimals.
    pub fn nudge_volume(&mut self, up: bool, media: &mut dyn MediaElement) {
        let delta = if up {
            self.volume_step
        } else {
            -self.volume_step
        };
        let level = round2(self.transport.volume + delta).clamp(0.0, 1.0);
        self.set_volume(level, media);
    }

    pub fn toggle_mute(&mut self, media: &mut dyn MediaElement) {
        self.transport.muted = !self.transport.muted;
        self.prefs_dirty = true;
        media.set_volume(self.effective_volume());
    }

    pub fn toggle_shuffle(&mut self) {
        self.shuffle = !self.shuffle;
        self.prefs_dirty = true;
    }

    pub fn cycle_repeat(&mut self) {
        self.repeat = self.repeat.cycled();
        self.prefs_dirty = true;
    }

    fn is_current(&self, binding: BindingId) -> bool {
        self.bound.is_some_and(|b| b.binding == binding)
    }

    pub fn handle_media_event(
        &mut self,
        event: MediaEvent,
        session: &mut Session,
        media: &mut dyn MediaElement,
    ) {
        match event {
            MediaEvent::MetadataReady { binding, duration } => {
                if !self.is_current(binding) {
                    return;
                }
                if duration.is_finite() && duration >= 0.0 {
                    self.transport.duration = duration;
                } else {
                    tracing::debug!(duration, "ignoring invalid duration");
                }
            }
            MediaEvent::PositionChanged { binding, position } => {
                if self.is_current(binding) && position.is_finite() {
                    self.transport.progress = position.max(0.0);
                }
            }
            MediaEvent::Ended { binding } => {
                if self.is_current(binding) {
                    self.advance(session, media);
                }
            }
            MediaEvent::PlayStarted { token } => {
                if self.pending_play != Some(token) {
                    tracing::debug!(?token, "discarding stale play result");
                    return;
                }
                self.pending_play = None;
                // Paused while the attempt was in flight.
                if !self.transport.is_playing {
                    media.pause();
                }
            }
            MediaEvent::PlayFailed { token, reason } => {
                if self.pending_play != Some(token) {
                    tracing::debug!(?token, "discarding stale play failure");
                    return;
                }
                self.pending_play = None;
                tracing::warn!(%reason, "playback failed to start");
                self.transport.is_playing = false;
            }
        }
    }

    /// Apply a global keyboard shortcut.
    pub fn dispatch(
        &mut self,
        shortcut: Shortcut,
        session: &mut Session,
        media: &mut dyn MediaElement,
    ) {
        match shortcut {
            Shortcut::TogglePlay => self.toggle_play(media),
            Shortcut::SeekForward => self.seek_by(self.seek_step, media),
            Shortcut::SeekBackward => self.seek_by(-self.seek_step, media),
            Shortcut::VolumeUp => self.nudge_volume(true, media),
            Shortcut::VolumeDown => self.nudge_volume(false, media),
            Shortcut::Next => self.advance(session, media),
            Shortcut::Previous => self.retreat(session, media),
        }
    }
}
