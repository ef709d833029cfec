//! The displayed queue: the list shown in the queue pane, its search filter
//! and cursor, and the translation between displayed rows and master
//! catalog indices.

use crate::library::{Track, master_index_of};

#[derive(Debug, Default)]
pub struct Queue {
    tracks: Vec<Track>,
    query: String,
    /// Row in the displayed (filtered) list.
    cursor: usize,
}

impl Queue {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            query: String::new(),
            cursor: 0,
        }
    }

    /// The whole queue, ignoring the search filter.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Replace the list wholesale (playlist load). The query is kept.
    pub fn replace(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
        self.cursor = 0;
    }

    fn matches(track: &Track, needle: &str) -> bool {
        needle.is_empty()
            || format!("{} {}", track.title, track.artist)
                .to_lowercase()
                .contains(needle)
    }

    /// Rows currently shown, in queue order.
    pub fn displayed(&self) -> Vec<&Track> {
        let needle = self.query.trim().to_lowercase();
        self.tracks
            .iter()
            .filter(|t| Self::matches(t, &needle))
            .collect()
    }

    pub fn displayed_len(&self) -> usize {
        self.displayed().len()
    }

    pub fn push_query(&mut self, c: char) {
        self.query.push(c);
        self.clamp_cursor();
    }

    pub fn pop_query(&mut self) {
        self.query.pop();
        self.clamp_cursor();
    }

    pub fn clear_query(&mut self) {
        self.query.clear();
        self.clamp_cursor();
    }

    fn clamp_cursor(&mut self) {
        let len = self.displayed_len();
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
    }

    pub fn set_cursor(&mut self, row: usize) {
        self.cursor = row;
        self.clamp_cursor();
    }

    /// Move down one row, wrapping to the top.
    pub fn cursor_down(&mut self) {
        let len = self.displayed_len();
        if len > 0 {
            self.cursor = (self.cursor + 1) % len;
        }
    }

    /// Move up one row, wrapping to the bottom.
    pub fn cursor_up(&mut self) {
        let len = self.displayed_len();
        if len > 0 {
            self.cursor = (self.cursor + len - 1) % len;
        }
    }

    pub fn cursor_top(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_bottom(&mut self) {
        self.cursor = self.displayed_len().saturating_sub(1);
    }

    pub fn track_at_cursor(&self) -> Option<&Track> {
        self.displayed().get(self.cursor).copied()
    }

    /// Master index for displayed row `row`.
    ///
    /// Identifier lookup first, then title+artist. `None` means the pick
    /// cannot be resolved and no navigation should happen.
    pub fn master_index_at(&self, row: usize, catalog: &[Track]) -> Option<usize> {
        let track = self.displayed().get(row).copied()?;
        master_index_of(catalog, track)
    }

    /// Displayed row holding master track `current`, matched by identifier.
    pub fn highlight_position(&self, current: Option<usize>, catalog: &[Track]) -> Option<usize> {
        let id = &catalog.get(current?)?.id;
        self.displayed().iter().position(|t| &t.id == id)
    }

    /// Master indices of the displayed rows, for the playback core.
    /// Rows without a catalog match are left out.
    pub fn bound_indices(&self, catalog: &[Track]) -> Vec<usize> {
        self.displayed()
            .into_iter()
            .filter_map(|t| master_index_of(catalog, t))
            .collect()
    }
}
