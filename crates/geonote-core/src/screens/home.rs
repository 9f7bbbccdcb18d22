//! Home screen controller: the note snapshot behind the List and Map tabs.
//!
//! The screen re-fetches every time it gains focus, so several fetches can
//! be in flight while the user navigates back and forth. Each fetch is
//! tagged with a generation token; only a completion carrying the current
//! token may replace the snapshot, which makes a late completion from a
//! superseded fetch (or from a screen already left) a safe no-op.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{Coordinates, Note};
use crate::store::NoteStore;

/// Tag identifying one refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshToken(u64);

/// A marker on the map tab.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPin {
    pub coordinates: Coordinates,
    pub title: String,
    pub description: String,
}

pub struct NoteListScreen {
    store: Arc<dyn NoteStore>,
    notes: Vec<Note>,
    generation: u64,
}

impl NoteListScreen {
    #[must_use]
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self {
            store,
            notes: Vec::new(),
            generation: 0,
        }
    }

    /// The current snapshot, in the store's insertion order.
    #[must_use]
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// One pin per note; a note always has coordinates, so every note
    /// appears on the map.
    #[must_use]
    pub fn map_pins(&self) -> Vec<MapPin> {
        self.notes
            .iter()
            .map(|note| MapPin {
                coordinates: note.fields.coordinates,
                title: note.fields.title.clone(),
                description: note.fields.content.clone(),
            })
            .collect()
    }

    /// Start a refresh, superseding any fetch still in flight.
    pub fn begin_refresh(&mut self) -> RefreshToken {
        self.generation += 1;
        RefreshToken(self.generation)
    }

    /// Fetch the notes for a refresh started with [`Self::begin_refresh`].
    pub async fn load(&self) -> Result<Vec<Note>> {
        self.store.list().await
    }

    /// Apply a completed fetch. Returns whether the snapshot was replaced;
    /// a stale token leaves it untouched.
    pub fn complete_refresh(&mut self, token: RefreshToken, notes: Vec<Note>) -> bool {
        if token.0 != self.generation {
            tracing::debug!("Dropping stale note refresh (token {})", token.0);
            return false;
        }
        self.notes = notes;
        true
    }

    /// Run one focus-driven refresh to completion. A fetch failure keeps
    /// the previous snapshot on screen.
    pub async fn refresh(&mut self) -> Result<()> {
        let token = self.begin_refresh();
        match self.load().await {
            Ok(notes) => {
                self.complete_refresh(token, notes);
                Ok(())
            }
            Err(error) => {
                tracing::warn!("Failed to refresh notes: {}", error);
                Err(error)
            }
        }
    }

    /// The screen is leaving; any in-flight completion becomes stale.
    pub fn detach(&mut self) {
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NoteFields, NoteId};
    use crate::store::MemoryNoteStore;
    use pretty_assertions::assert_eq;

    fn fields(title: &str) -> NoteFields {
        NoteFields {
            title: title.to_string(),
            content: format!("{title} details"),
            coordinates: Coordinates::new(31.5, 35.2),
            ..NoteFields::default()
        }
    }

    async fn seeded_screen(titles: &[&str]) -> NoteListScreen {
        let store = Arc::new(MemoryNoteStore::new());
        for title in titles {
            store.create(&fields(title)).await.unwrap();
        }
        NoteListScreen::new(store)
    }

    #[tokio::test]
    async fn refresh_replaces_the_snapshot() {
        let mut screen = seeded_screen(&["First", "Second"]).await;
        assert!(screen.notes().is_empty());

        screen.refresh().await.unwrap();
        let titles: Vec<_> = screen
            .notes()
            .iter()
            .map(|n| n.fields.title.as_str())
            .collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn stale_completion_is_dropped() {
        let mut screen = seeded_screen(&["Old"]).await;

        let stale = screen.begin_refresh();
        let stale_notes = screen.load().await.unwrap();

        // The user refocused before the first fetch landed.
        let current = screen.begin_refresh();
        assert!(!screen.complete_refresh(stale, stale_notes));
        assert!(screen.notes().is_empty());

        let notes = screen.load().await.unwrap();
        assert!(screen.complete_refresh(current, notes));
        assert_eq!(screen.notes().len(), 1);
    }

    #[tokio::test]
    async fn detach_invalidates_in_flight_fetch() {
        let mut screen = seeded_screen(&["Only"]).await;

        let token = screen.begin_refresh();
        let notes = screen.load().await.unwrap();
        screen.detach();

        assert!(!screen.complete_refresh(token, notes));
        assert!(screen.notes().is_empty());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let mut screen = seeded_screen(&["Kept"]).await;
        screen.refresh().await.unwrap();
        assert_eq!(screen.notes().len(), 1);

        struct BrokenStore;

        #[async_trait::async_trait]
        impl NoteStore for BrokenStore {
            async fn list(&self) -> Result<Vec<Note>> {
                Err(crate::error::Error::Backend("HTTP 503".to_string()))
            }
            async fn get(&self, _: &NoteId) -> Result<Option<Note>> {
                unreachable!()
            }
            async fn create(&self, _: &NoteFields) -> Result<Note> {
                unreachable!()
            }
            async fn update(&self, _: &NoteId, _: &crate::models::NotePatch) -> Result<()> {
                unreachable!()
            }
            async fn delete(&self, _: &NoteId) -> Result<()> {
                unreachable!()
            }
        }

        screen.store = Arc::new(BrokenStore);
        assert!(screen.refresh().await.is_err());
        assert_eq!(screen.notes().len(), 1);
    }

    #[tokio::test]
    async fn map_pins_mirror_the_snapshot() {
        let mut screen = seeded_screen(&["Trailhead"]).await;
        screen.refresh().await.unwrap();

        let pins = screen.map_pins();
        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0].title, "Trailhead");
        assert_eq!(pins[0].description, "Trailhead details");
        assert_eq!(pins[0].coordinates, Coordinates::new(31.5, 35.2));
    }
}
