use crate::library::{Track, find_by_id, position_by_song};

use super::model::TrackRef;

/// Turn stored entries into playable tracks.
///
/// Resolution order, per entry:
/// 1. `ById`: catalog lookup by identifier; dropped when absent.
/// 2. `Embedded`: catalog lookup by identifier, then by title and artist;
///    when neither matches, the snapshot itself is kept.
pub fn resolve_entries(entries: &[TrackRef], catalog: &[Track]) -> Vec<Track> {
    entries
        .iter()
        .filter_map(|entry| {
            let resolved = resolve_entry(entry, catalog);
            if resolved.is_none() {
                tracing::debug!(id = %entry.id(), "dropping unresolvable track entry");
            }
            resolved
        })
        .collect()
}

fn resolve_entry(entry: &TrackRef, catalog: &[Track]) -> Option<Track> {
    match entry {
        TrackRef::ById(id) => find_by_id(catalog, id).cloned(),
        TrackRef::Embedded(snapshot) => find_by_id(catalog, &snapshot.id)
            .or_else(|| position_by_song(catalog, snapshot).map(|i| &catalog[i]))
            .cloned()
            .or_else(|| Some(snapshot.clone())),
    }
}
