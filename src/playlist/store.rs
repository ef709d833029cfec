use chrono::Utc;

use crate::library::{Track, TrackId};
use crate::store::{KvStore, decode, encode, keys};

use super::model::{Playlist, PlaylistError, TrackRef};
use super::resolve::resolve_entries;

/// Named track collections persisted under the `playlists` key.
pub struct PlaylistStore<'a> {
    store: &'a mut KvStore,
    max_playlists: Option<usize>,
}

impl<'a> PlaylistStore<'a> {
    pub fn new(store: &'a mut KvStore, max_playlists: Option<usize>) -> Self {
        Self {
            store,
            max_playlists,
        }
    }

    /// All saved playlists, oldest first. Stored entries that do not decode
    /// are skipped here and left untouched on disk.
    pub fn list(&self) -> Vec<Playlist> {
        self.store.get_each(keys::PLAYLISTS)
    }

    pub fn get(&self, id: u64) -> Option<Playlist> {
        self.list().into_iter().find(|p| p.id == id)
    }

    /// Name suggested for the next save.
    pub fn default_name(&self) -> String {
        format!("My Playlist {}", self.list().len() + 1)
    }

    pub fn is_full(&self) -> bool {
        self.max_playlists
            .is_some_and(|limit| self.list().len() >= limit)
    }

    /// Save `tracks` as a new playlist. Fails with `Full` at capacity.
    pub fn save(&mut self, name: &str, tracks: &[Track]) -> Result<Playlist, PlaylistError> {
        if let Some(limit) = self.max_playlists {
            if self.list().len() >= limit {
                return Err(PlaylistError::Full { limit });
            }
        }
        self.insert(name, tracks, false)
    }

    /// Save `tracks`, deleting the oldest playlists to stay within capacity.
    pub fn save_replacing_oldest(
        &mut self,
        name: &str,
        tracks: &[Track],
    ) -> Result<Playlist, PlaylistError> {
        self.insert(name, tracks, true)
    }

    fn insert(
        &mut self,
        name: &str,
        tracks: &[Track],
        evict: bool,
    ) -> Result<Playlist, PlaylistError> {
        if tracks.is_empty() {
            return Err(PlaylistError::EmptyQueue);
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(PlaylistError::EmptyName);
        }

        let mut stored = self.store.list_values(keys::PLAYLISTS)?;
        if evict {
            if let Some(limit) = self.max_playlists {
                while decode_playlists(&stored).len() >= limit {
                    let Some(pos) = stored
                        .iter()
                        .position(|v| decode::<Playlist>(keys::PLAYLISTS, v).is_some())
                    else {
                        break;
                    };
                    let removed = stored.remove(pos);
                    tracing::info!(id = %removed["id"], "evicted oldest playlist");
                }
            }
        }

        let created_at = Utc::now();
        let mut id = created_at.timestamp_millis().max(0) as u64;
        if let Some(max_id) = decode_playlists(&stored).iter().map(|p| p.id).max() {
            if id <= max_id {
                id = max_id + 1;
            }
        }

        let playlist = Playlist {
            id,
            name: name.to_string(),
            tracks: tracks.iter().map(TrackRef::from).collect(),
            created_at,
        };
        stored.push(encode(keys::PLAYLISTS, &playlist)?);
        self.store.set(keys::PLAYLISTS, &stored)?;

        tracing::info!(id, name = %playlist.name, tracks = playlist.tracks.len(), "playlist saved");
        Ok(playlist)
    }

    /// Delete playlist `id`. Returns `false` when it did not exist.
    pub fn delete(&mut self, id: u64) -> Result<bool, PlaylistError> {
        let mut stored = self.store.list_values(keys::PLAYLISTS)?;
        let before = stored.len();
        stored.retain(|v| decode::<Playlist>(keys::PLAYLISTS, v).is_none_or(|p| p.id != id));
        if stored.len() == before {
            return Ok(false);
        }
        self.store.set(keys::PLAYLISTS, &stored)?;
        tracing::info!(id, "playlist deleted");
        Ok(true)
    }

    /// Tracks of playlist `id`, normalized against `catalog`.
    pub fn load(&self, id: u64, catalog: &[Track]) -> Result<Vec<Track>, PlaylistError> {
        let playlist = self.get(id).ok_or(PlaylistError::NotFound(id))?;
        Ok(resolve_entries(&playlist.tracks, catalog))
    }
}

fn decode_playlists(stored: &[serde_json::Value]) -> Vec<Playlist> {
    stored
        .iter()
        .filter_map(|v| decode(keys::PLAYLISTS, v))
        .collect()
}

/// The favorites set persisted under the `favorites` key.
pub struct FavoritesStore<'a> {
    store: &'a mut KvStore,
}

impl<'a> FavoritesStore<'a> {
    pub fn new(store: &'a mut KvStore) -> Self {
        Self { store }
    }

    pub fn entries(&self) -> Vec<TrackRef> {
        self.store.get_each(keys::FAVORITES)
    }

    /// Favorites normalized against `catalog`.
    pub fn list(&self, catalog: &[Track]) -> Vec<Track> {
        resolve_entries(&self.entries(), catalog)
    }

    pub fn contains(&self, id: &TrackId) -> bool {
        self.entries().iter().any(|e| e.id() == id)
    }

    /// Add `entry`. Returns `false` when its identifier is already present.
    pub fn add(&mut self, entry: TrackRef) -> Result<bool, PlaylistError> {
        if self.contains(entry.id()) {
            return Ok(false);
        }
        let mut stored = self.store.list_values(keys::FAVORITES)?;
        stored.push(encode(keys::FAVORITES, &entry)?);
        self.store.set(keys::FAVORITES, &stored)?;
        Ok(true)
    }

    /// Remove every entry for `id`, whatever shape it was stored in.
    pub fn remove(&mut self, id: &TrackId) -> Result<bool, PlaylistError> {
        let mut stored = self.store.list_values(keys::FAVORITES)?;
        let before = stored.len();
        stored.retain(|v| decode::<TrackRef>(keys::FAVORITES, v).is_none_or(|e| e.id() != id));
        if stored.len() == before {
            return Ok(false);
        }
        self.store.set(keys::FAVORITES, &stored)?;
        Ok(true)
    }
}
