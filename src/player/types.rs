//! Small shared types: repeat policy, persisted preferences, binding ids,
//! play tokens and the events reported by the media element.

use serde::{Deserialize, Serialize};

use crate::store::{KvStore, StoreError, keys};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop at the end of the queue.
    #[default]
    None,
    /// Replay the current track when it ends.
    One,
    /// Wrap around to the start of the queue.
    All,
}

impl RepeatMode {
    /// `None -> All -> One -> None`.
    pub fn cycled(self) -> Self {
        match self {
            RepeatMode::None => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RepeatMode::None => "Off",
            RepeatMode::One => "One",
            RepeatMode::All => "All",
        }
    }
}

/// Player settings that survive restarts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerPrefs {
    pub volume: f64,
    pub muted: bool,
    pub shuffle: bool,
    pub repeat: RepeatMode,
}

impl Default for PlayerPrefs {
    fn default() -> Self {
        Self {
            volume: 1.0,
            muted: false,
            shuffle: false,
            repeat: RepeatMode::None,
        }
    }
}

impl PlayerPrefs {
    pub fn load(store: &KvStore) -> Self {
        let d = Self::default();
        let volume: f64 = store.get(keys::VOLUME, d.volume);
        Self {
            volume: if volume.is_finite() {
                volume.clamp(0.0, 1.0)
            } else {
                d.volume
            },
            muted: store.get(keys::MUTED, d.muted),
            shuffle: store.get(keys::SHUFFLE, d.shuffle),
            repeat: store.get(keys::REPEAT, d.repeat),
        }
    }

    pub fn save(&self, store: &mut KvStore) -> Result<(), StoreError> {
        store.set(keys::VOLUME, &self.volume)?;
        store.set(keys::MUTED, &self.muted)?;
        store.set(keys::SHUFFLE, &self.shuffle)?;
        store.set(keys::REPEAT, &self.repeat)
    }
}

/// One attachment of a track source to the media element.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BindingId(pub u64);

/// Identifies a single asynchronous play attempt.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PlayToken {
    pub binding: BindingId,
    pub attempt: u64,
}

/// Notifications from the media element, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Duration in seconds became known for `binding`.
    MetadataReady { binding: BindingId, duration: f64 },
    /// Playback position in seconds.
    PositionChanged { binding: BindingId, position: f64 },
    /// The bound source played to its end.
    Ended { binding: BindingId },
    /// A play attempt succeeded.
    PlayStarted { token: PlayToken },
    /// A play attempt failed (missing source, no output device, ...).
    PlayFailed { token: PlayToken, reason: String },
}
