use std::path::Path;

use crate::app::App;
use crate::config;
use crate::library::scan;
use crate::player::{PlaybackCore, PlayerPrefs};
use crate::session::Session;
use crate::store::{KvStore, keys};

/// Open the persistent store, falling back to memory when the file is
/// unusable so the player still starts.
pub fn open_store(settings: &config::Settings) -> KvStore {
    let Some(path) = settings.store_path() else {
        tracing::warn!("no data directory found, settings will not persist");
        return KvStore::in_memory();
    };
    match KvStore::open(&path) {
        Ok(store) => {
            tracing::info!(path = ?store.path(), "store opened");
            if !store.contains(keys::VOLUME) {
                tracing::debug!("no saved player preferences, using defaults");
            }
            store
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "store unreadable, using an in-memory store"
            );
            KvStore::in_memory()
        }
    }
}

/// Scan `dir` and assemble the application state around it.
pub fn build_app(settings: &config::Settings, dir: &Path) -> App {
    let catalog = scan(dir, &settings.library);
    let store = open_store(settings);
    let prefs = PlayerPrefs::load(&store);
    tracing::info!(
        tracks = catalog.len(),
        volume = prefs.volume,
        shuffle = prefs.shuffle,
        repeat = prefs.repeat.label(),
        "starting session"
    );

    let core = PlaybackCore::new(prefs, &settings.controls);
    App::new(Session::new(catalog), core, store, settings)
}
