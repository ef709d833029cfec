//! Persistent key-value store.
//!
//! A flat JSON object on disk, read once on open and rewritten on every
//! `set`. Values are typed at the call site; missing or malformed entries
//! yield the caller's default.

mod kv;

pub use kv::*;

/// Keys shared by the player, playlist and favorites layers.
pub mod keys {
    pub const VOLUME: &str = "player:volume";
    pub const MUTED: &str = "player:muted";
    pub const SHUFFLE: &str = "player:shuffle";
    pub const REPEAT: &str = "player:repeat";
    pub const PLAYLISTS: &str = "playlists";
    pub const FAVORITES: &str = "favorites";
}
