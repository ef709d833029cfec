//! Top-level session: the master catalog and the current-index cell.
//!
//! The session is the single owner of "which catalog track is current".
//! The queue layer and the playback core both write through
//! `set_current_index`; the core notices a new value on its next `sync`.

use crate::library::Track;

pub struct Session {
    catalog: Vec<Track>,
    current: Option<usize>,
    revision: u64,
}

impl Session {
    /// Start a session over `catalog`, positioned on the first track if any.
    pub fn new(catalog: Vec<Track>) -> Self {
        let current = if catalog.is_empty() { None } else { Some(0) };
        Self {
            catalog,
            current,
            revision: 0,
        }
    }

    pub fn catalog(&self) -> &[Track] {
        &self.catalog
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.and_then(|i| self.catalog.get(i))
    }

    /// Incremented on every change of the current index.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Point the session at master index `index`.
    ///
    /// Out-of-range indices are rejected. Returns whether the value changed.
    pub fn set_current_index(&mut self, index: usize) -> bool {
        if index >= self.catalog.len() {
            tracing::warn!(index, len = self.catalog.len(), "rejecting out-of-range track index");
            return false;
        }
        if self.current == Some(index) {
            return false;
        }
        self.current = Some(index);
        self.revision += 1;
        tracing::debug!(index, revision = self.revision, "current track changed");
        true
    }
}
