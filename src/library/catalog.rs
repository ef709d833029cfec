//! Lookups over the master catalog.
//!
//! The catalog is a plain slice; these helpers keep the identifier-first,
//! structural-fallback lookup order in one place.

use super::model::{Track, TrackId};

/// Master index of the track with identifier `id`.
pub fn position_by_id(catalog: &[Track], id: &TrackId) -> Option<usize> {
    catalog.iter().position(|t| &t.id == id)
}

/// Master index of the first track with the same title and artist.
pub fn position_by_song(catalog: &[Track], track: &Track) -> Option<usize> {
    catalog.iter().position(|t| t.same_song(track))
}

/// Master index for `track`: identifier lookup first, then title+artist.
pub fn master_index_of(catalog: &[Track], track: &Track) -> Option<usize> {
    position_by_id(catalog, &track.id).or_else(|| position_by_song(catalog, track))
}

pub fn find_by_id<'a>(catalog: &'a [Track], id: &TrackId) -> Option<&'a Track> {
    catalog.iter().find(|t| &t.id == id)
}
