//! Saved playlists and favorites.
//!
//! Both live in the key-value store as lists of `TrackRef`s and are turned
//! back into catalog tracks by `resolve_entries`.

mod model;
mod resolve;
mod store;

pub use model::*;
pub use resolve::*;
pub use store::*;

#[cfg(test)]
mod tests;
