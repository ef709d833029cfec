//! Application model: `App` ties the session, the playback core and the
//! displayed queue together with the library pane (playlists and
//! favorites) and whatever prompt the user is answering.

use crate::config::Settings;
use crate::library::{Track, TrackId, master_index_of};
use crate::player::{MediaElement, MediaEvent, PlaybackCore, Shortcut};
use crate::playlist::{FavoritesStore, Playlist, PlaylistError, PlaylistStore, TrackRef};
use crate::session::Session;
use crate::store::KvStore;

use super::queue::Queue;

/// Which pane has the cursor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Queue,
    Library,
}

/// A destructive action waiting for a y/n answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingAction {
    DeletePlaylist { id: u64, name: String },
    RemoveFavorite { id: TrackId, title: String },
    SaveEvictingOldest { name: String },
}

impl PendingAction {
    pub fn question(&self) -> String {
        match self {
            PendingAction::DeletePlaylist { name, .. } => {
                format!("Delete playlist \"{name}\"? (y/n)")
            }
            PendingAction::RemoveFavorite { title, .. } => {
                format!("Remove \"{title}\" from favorites? (y/n)")
            }
            PendingAction::SaveEvictingOldest { name } => {
                format!("Playlist limit reached. Replace the oldest one with \"{name}\"? (y/n)")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Typing into the queue search box.
    Search,
    /// Typing a name for the playlist about to be saved.
    NamePlaylist(String),
    Confirm(PendingAction),
}

/// One row of the library pane: playlists first, then favorites.
#[derive(Debug, Clone, Copy)]
pub enum LibraryItem<'a> {
    Playlist(&'a Playlist),
    Favorite(&'a Track),
}

pub struct App {
    pub session: Session,
    pub core: PlaybackCore,
    pub queue: Queue,
    pub view: View,
    pub mode: InputMode,

    pub follow_playback: bool,
    pub queue_dirty: bool,
    pub status: Option<String>,

    playlists: Vec<Playlist>,
    favorites: Vec<Track>,
    library_cursor: usize,

    store: KvStore,
    max_playlists: Option<usize>,
}

impl App {
    /// Create an `App` showing the whole catalog as the queue.
    pub fn new(session: Session, core: PlaybackCore, store: KvStore, settings: &Settings) -> Self {
        let queue = Queue::new(session.catalog().to_vec());
        let mut app = Self {
            session,
            core,
            queue,
            view: View::Queue,
            mode: InputMode::Normal,
            follow_playback: settings.ui.follow_playback,
            queue_dirty: true,
            status: None,
            playlists: Vec::new(),
            favorites: Vec::new(),
            library_cursor: 0,
            store,
            max_playlists: settings.storage.max_playlists,
        };
        app.refresh_library();
        app
    }

    /// Attach the media element and bind the session's current track.
    pub fn start(&mut self, media: &mut dyn MediaElement) {
        self.core.attach(media);
        self.sync_queue();
        self.core.sync(&self.session, media);
        self.follow();
    }

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    pub fn favorites(&self) -> &[Track] {
        &self.favorites
    }

    pub fn library_cursor(&self) -> usize {
        self.library_cursor
    }

    pub fn library_len(&self) -> usize {
        self.playlists.len() + self.favorites.len()
    }

    pub fn library_item(&self, row: usize) -> Option<LibraryItem<'_>> {
        match self.playlists.get(row) {
            Some(p) => Some(LibraryItem::Playlist(p)),
            None => self
                .favorites
                .get(row - self.playlists.len())
                .map(LibraryItem::Favorite),
        }
    }

    pub fn is_favorite(&self, id: &TrackId) -> bool {
        self.favorites.iter().any(|t| &t.id == id)
    }

    /// Whether a text prompt owns the keyboard.
    pub fn typing(&self) -> bool {
        matches!(self.mode, InputMode::Search | InputMode::NamePlaylist(_))
    }

    fn notice(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    /// Re-read playlists and favorites from the store.
    pub fn refresh_library(&mut self) {
        self.playlists = PlaylistStore::new(&mut self.store, self.max_playlists).list();
        self.favorites = FavoritesStore::new(&mut self.store).list(self.session.catalog());
        let len = self.library_len();
        if self.library_cursor >= len {
            self.library_cursor = len.saturating_sub(1);
        }
    }

    /// Hand the displayed queue to the core if it changed.
    pub fn sync_queue(&mut self) {
        if !self.queue_dirty {
            return;
        }
        let order = self.queue.bound_indices(self.session.catalog());
        self.core.set_track_list(order);
        self.queue_dirty = false;
    }

    /// Displayed row of the current track, if it is shown.
    pub fn now_playing_row(&self) -> Option<usize> {
        self.queue
            .highlight_position(self.session.current_index(), self.session.catalog())
    }

    /// Keep the queue cursor on the current track while following.
    pub fn follow(&mut self) {
        if !self.follow_playback || self.mode == InputMode::Search {
            return;
        }
        if let Some(row) = self.now_playing_row() {
            self.queue.set_cursor(row);
        }
    }

    pub fn handle_media_event(&mut self, event: MediaEvent, media: &mut dyn MediaElement) {
        self.sync_queue();
        self.core.handle_media_event(event, &mut self.session, media);
        self.follow();
    }

    pub fn dispatch(&mut self, shortcut: Shortcut, media: &mut dyn MediaElement) {
        self.sync_queue();
        self.core.dispatch(shortcut, &mut self.session, media);
        self.follow();
    }

    /// Write volume/mute/shuffle/repeat back to the store when they changed.
    pub fn persist_prefs(&mut self) {
        if !self.core.take_prefs_dirty() {
            return;
        }
        if let Err(e) = self.core.prefs().save(&mut self.store) {
            tracing::warn!(error = %e, "failed to persist player preferences");
        }
    }

    /// Seek to `tenths` × 10 % of the current track.
    pub fn seek_tenths(&mut self, tenths: u32, media: &mut dyn MediaElement) {
        self.core
            .seek_to_fraction(f64::from(tenths.min(10)) / 10.0, media);
    }

    /// Make the queue row under the cursor current.
    ///
    /// The play intent is left alone: a playing session moves on to the new
    /// track, a paused one stays paused.
    pub fn select_at_cursor(&mut self, media: &mut dyn MediaElement) {
        let row = self.queue.cursor();
        let Some(index) = self.queue.master_index_at(row, self.session.catalog()) else {
            tracing::debug!(row, "queue row has no catalog match, ignoring selection");
            return;
        };
        self.sync_queue();
        self.follow_playback = true;
        self.session.set_current_index(index);
        self.core.sync(&self.session, media);
    }

    fn play_master(&mut self, index: usize, media: &mut dyn MediaElement) {
        self.sync_queue();
        self.session.set_current_index(index);
        self.core.sync(&self.session, media);
        self.core.set_playing(true, media);
        self.follow_playback = true;
        self.follow();
    }

    pub fn start_search(&mut self) {
        self.view = View::Queue;
        self.mode = InputMode::Search;
        self.follow_playback = false;
    }

    pub fn search_push(&mut self, c: char) {
        self.queue.push_query(c);
        self.queue_dirty = true;
    }

    pub fn search_pop(&mut self) {
        self.queue.pop_query();
        self.queue_dirty = true;
    }

    /// Leave the search box, keeping the filter.
    pub fn finish_search(&mut self) {
        self.mode = InputMode::Normal;
    }

    /// Leave the search box and drop the filter.
    pub fn cancel_search(&mut self) {
        self.queue.clear_query();
        self.queue_dirty = true;
        self.mode = InputMode::Normal;
        self.follow_playback = true;
        self.follow();
    }

    pub fn toggle_view(&mut self) {
        self.view = match self.view {
            View::Queue => View::Library,
            View::Library => View::Queue,
        };
    }

    pub fn cursor_down(&mut self) {
        match self.view {
            View::Queue => {
                self.follow_playback = false;
                self.queue.cursor_down();
            }
            View::Library => {
                let len = self.library_len();
                if len > 0 {
                    self.library_cursor = (self.library_cursor + 1) % len;
                }
            }
        }
    }

    pub fn cursor_up(&mut self) {
        match self.view {
            View::Queue => {
                self.follow_playback = false;
                self.queue.cursor_up();
            }
            View::Library => {
                let len = self.library_len();
                if len > 0 {
                    self.library_cursor = (self.library_cursor + len - 1) % len;
                }
            }
        }
    }

    pub fn cursor_top(&mut self) {
        match self.view {
            View::Queue => {
                self.follow_playback = false;
                self.queue.cursor_top();
            }
            View::Library => self.library_cursor = 0,
        }
    }

    pub fn cursor_bottom(&mut self) {
        match self.view {
            View::Queue => {
                self.follow_playback = false;
                self.queue.cursor_bottom();
            }
            View::Library => self.library_cursor = self.library_len().saturating_sub(1),
        }
    }

    pub fn cursor_to_now_playing(&mut self) {
        self.view = View::Queue;
        self.follow_playback = true;
        self.follow();
    }

    /// Enter: select in the queue pane, load & play or play in the library.
    pub fn activate(&mut self, media: &mut dyn MediaElement) {
        match self.view {
            View::Queue => self.select_at_cursor(media),
            View::Library => {
                let favorite = match self.library_item(self.library_cursor) {
                    Some(LibraryItem::Playlist(p)) => {
                        let id = p.id;
                        self.load_playlist(id, true, media);
                        return;
                    }
                    Some(LibraryItem::Favorite(t)) => t.clone(),
                    None => return,
                };
                match master_index_of(self.session.catalog(), &favorite) {
                    Some(index) => self.play_master(index, media),
                    None => self.notice(format!("\"{}\" is not in the library", favorite.title)),
                }
            }
        }
    }

    /// `o`: load the playlist under the library cursor without starting it.
    pub fn load_selected_playlist(&mut self, media: &mut dyn MediaElement) {
        let id = match (self.view, self.library_item(self.library_cursor)) {
            (View::Library, Some(LibraryItem::Playlist(p))) => p.id,
            _ => {
                self.notice("Pick a playlist in the library pane (Tab) to load it");
                return;
            }
        };
        self.load_playlist(id, false, media);
    }

    /// Replace the queue with playlist `id` and make its first resolvable
    /// track current. An empty result leaves everything untouched.
    pub fn load_playlist(&mut self, id: u64, play: bool, media: &mut dyn MediaElement) {
        let loaded = PlaylistStore::new(&mut self.store, self.max_playlists)
            .load(id, self.session.catalog());
        let tracks = match loaded {
            Ok(tracks) => tracks,
            Err(e) => {
                tracing::warn!(id, error = %e, "failed to load playlist");
                self.notice(format!("Could not load playlist: {e}"));
                return;
            }
        };
        if tracks.is_empty() {
            self.notice("That playlist has no playable tracks");
            return;
        }

        let count = tracks.len();
        self.queue.replace(tracks);
        self.queue_dirty = true;
        self.view = View::Queue;
        tracing::info!(id, count, play, "playlist loaded into queue");

        let first = self
            .queue
            .tracks()
            .iter()
            .find_map(|t| master_index_of(self.session.catalog(), t));
        match first {
            Some(index) if play => self.play_master(index, media),
            Some(index) => {
                self.sync_queue();
                self.session.set_current_index(index);
                self.core.sync(&self.session, media);
                self.follow_playback = true;
                self.follow();
            }
            None => {}
        }
        self.notice(format!("Loaded {count} tracks"));
    }

    /// `w`: open the name prompt for saving the queue.
    pub fn begin_save(&mut self) {
        if self.queue.tracks().is_empty() {
            self.notice("The queue is empty, nothing to save");
            return;
        }
        let playlists = PlaylistStore::new(&mut self.store, self.max_playlists);
        let name = playlists.default_name();
        if playlists.is_full() {
            self.notice("Playlist limit reached: saving will offer to replace the oldest");
        }
        self.mode = InputMode::NamePlaylist(name);
    }

    pub fn name_push(&mut self, c: char) {
        if let InputMode::NamePlaylist(name) = &mut self.mode {
            name.push(c);
        }
    }

    pub fn name_pop(&mut self) {
        if let InputMode::NamePlaylist(name) = &mut self.mode {
            name.pop();
        }
    }

    pub fn submit_name(&mut self) {
        if let InputMode::NamePlaylist(name) = std::mem::take(&mut self.mode) {
            self.save_playlist(name, false);
        }
    }

    /// Esc in a prompt.
    pub fn cancel_prompt(&mut self) {
        self.mode = InputMode::Normal;
        self.notice("Cancelled");
    }

    fn save_playlist(&mut self, name: String, replace_oldest: bool) {
        let mut playlists = PlaylistStore::new(&mut self.store, self.max_playlists);
        let tracks = self.queue.tracks();
        let saved = if replace_oldest {
            playlists.save_replacing_oldest(&name, tracks)
        } else {
            playlists.save(&name, tracks)
        };

        match saved {
            Ok(p) => {
                self.notice(format!("Saved \"{}\" ({} tracks)", p.name, p.tracks.len()));
                self.refresh_library();
            }
            Err(PlaylistError::Full { .. }) => {
                self.mode = InputMode::Confirm(PendingAction::SaveEvictingOldest { name });
            }
            Err(PlaylistError::EmptyName) => self.notice("Save cancelled: the name is empty"),
            Err(e) => {
                tracing::warn!(error = %e, "failed to save playlist");
                self.notice(format!("Could not save playlist: {e}"));
            }
        }
    }

    /// `f`: favorite the track under the queue cursor. Removing an existing
    /// favorite asks for confirmation first.
    pub fn favorite_at_cursor(&mut self) {
        let track = match self.view {
            View::Queue => self.queue.track_at_cursor().cloned(),
            View::Library => match self.library_item(self.library_cursor) {
                Some(LibraryItem::Favorite(t)) => Some(t.clone()),
                _ => None,
            },
        };
        let Some(track) = track else {
            return;
        };

        let entry = TrackRef::for_catalog(&track, self.session.catalog());
        if FavoritesStore::new(&mut self.store).contains(entry.id()) {
            self.mode = InputMode::Confirm(PendingAction::RemoveFavorite {
                id: entry.id().clone(),
                title: track.title.clone(),
            });
            return;
        }
        match FavoritesStore::new(&mut self.store).add(entry) {
            Ok(_) => {
                self.notice(format!("Added \"{}\" to favorites", track.title));
                self.refresh_library();
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to add favorite");
                self.notice(format!("Could not add favorite: {e}"));
            }
        }
    }

    /// `x`: ask to delete the playlist, or remove the favorite, under the cursor.
    pub fn request_delete(&mut self) {
        let action = match self.view {
            View::Library => match self.library_item(self.library_cursor) {
                Some(LibraryItem::Playlist(p)) => Some(PendingAction::DeletePlaylist {
                    id: p.id,
                    name: p.name.clone(),
                }),
                Some(LibraryItem::Favorite(t)) => Some(PendingAction::RemoveFavorite {
                    id: t.id.clone(),
                    title: t.title.clone(),
                }),
                None => None,
            },
            View::Queue => self
                .queue
                .track_at_cursor()
                .filter(|t| self.is_favorite(&t.id))
                .map(|t| PendingAction::RemoveFavorite {
                    id: t.id.clone(),
                    title: t.title.clone(),
                }),
        };
        if let Some(action) = action {
            self.mode = InputMode::Confirm(action);
        }
    }

    /// Answer the pending y/n question. Declining changes nothing.
    pub fn resolve_confirm(&mut self, accepted: bool) {
        let InputMode::Confirm(action) = std::mem::take(&mut self.mode) else {
            return;
        };
        if !accepted {
            self.notice("Cancelled");
            return;
        }

        match action {
            PendingAction::DeletePlaylist { id, name } => {
                match PlaylistStore::new(&mut self.store, self.max_playlists).delete(id) {
                    Ok(true) => self.notice(format!("Deleted \"{name}\"")),
                    Ok(false) => self.notice(format!("\"{name}\" was already gone")),
                    Err(e) => {
                        tracing::warn!(id, error = %e, "failed to delete playlist");
                        self.notice(format!("Could not delete playlist: {e}"));
                    }
                }
            }
            PendingAction::RemoveFavorite { id, title } => {
                match FavoritesStore::new(&mut self.store).remove(&id) {
                    Ok(_) => self.notice(format!("Removed \"{title}\" from favorites")),
                    Err(e) => {
                        tracing::warn!(%id, error = %e, "failed to remove favorite");
                        self.notice(format!("Could not remove favorite: {e}"));
                    }
                }
            }
            PendingAction::SaveEvictingOldest { name } => self.save_playlist(name, true),
        }
        self.refresh_library();
    }
}
