use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::library::{Track, TrackId, master_index_of};

/// A stored reference to a track.
///
/// Stored lists mix two shapes: a bare identifier, or a full track snapshot
/// taken when the list was saved. Serialized untagged so both shapes read
/// back as written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackRef {
    ById(TrackId),
    Embedded(Track),
}

impl TrackRef {
    pub fn id(&self) -> &TrackId {
        match self {
            TrackRef::ById(id) => id,
            TrackRef::Embedded(t) => &t.id,
        }
    }

    /// Reference the catalog's copy of `track` by identifier, or keep a
    /// snapshot when the catalog has no match so it still resolves later.
    pub fn for_catalog(track: &Track, catalog: &[Track]) -> Self {
        match master_index_of(catalog, track) {
            Some(i) => TrackRef::ById(catalog[i].id.clone()),
            None => TrackRef::Embedded(track.clone()),
        }
    }
}

impl From<&Track> for TrackRef {
    fn from(track: &Track) -> Self {
        TrackRef::Embedded(track.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: u64,
    pub name: String,
    #[serde(deserialize_with = "skip_bad_refs")]
    pub tracks: Vec<TrackRef>,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Keep the track entries that decode; one bad entry must not hide the
/// whole playlist.
fn skip_bad_refs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<TrackRef>, D::Error> {
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .iter()
        .filter_map(|v| crate::store::decode("playlist tracks", v))
        .collect())
}

#[derive(Debug, thiserror::Error)]
pub enum PlaylistError {
    #[error("the queue is empty, nothing to save")]
    EmptyQueue,
    #[error("playlist name is empty")]
    EmptyName,
    #[error("playlist limit of {limit} reached")]
    Full { limit: usize },
    #[error("no playlist with id {0}")]
    NotFound(u64),
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),
}
