//! In-memory note store.
//!
//! Behaves like the hosted document store at the trait boundary: mints
//! opaque ids, merges patches field-by-field, keeps insertion order, and
//! treats delete of a missing id as success. Used by unit tests and
//! screen-controller tests.

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Note, NoteFields, NoteId, NotePatch};
use crate::store::NoteStore;
use crate::util::unix_timestamp_millis_now;

#[derive(Default)]
pub struct MemoryNoteStore {
    notes: Mutex<Vec<Note>>,
}

impl MemoryNoteStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn list(&self) -> Result<Vec<Note>> {
        Ok(self.notes.lock().await.clone())
    }

    async fn get(&self, id: &NoteId) -> Result<Option<Note>> {
        let notes = self.notes.lock().await;
        Ok(notes.iter().find(|note| &note.id == id).cloned())
    }

    async fn create(&self, fields: &NoteFields) -> Result<Note> {
        let now = unix_timestamp_millis_now();
        let note = Note {
            id: NoteId::new(Uuid::new_v4().to_string()),
            fields: fields.clone(),
            created_at: now,
            updated_at: now,
        };

        self.notes.lock().await.push(note.clone());
        Ok(note)
    }

    async fn update(&self, id: &NoteId, patch: &NotePatch) -> Result<()> {
        let mut notes = self.notes.lock().await;
        let note = notes
            .iter_mut()
            .find(|note| &note.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        if let Some(title) = &patch.title {
            note.fields.title = title.clone();
        }
        if let Some(content) = &patch.content {
            note.fields.content = content.clone();
        }
        if let Some(image_url) = &patch.image_url {
            note.fields.image_url = image_url.clone();
        }
        if let Some(coordinates) = patch.coordinates {
            note.fields.coordinates = coordinates;
        }
        if let Some(date) = patch.date {
            note.fields.date = date;
        }
        note.updated_at = unix_timestamp_millis_now();

        Ok(())
    }

    async fn delete(&self, id: &NoteId) -> Result<()> {
        self.notes.lock().await.retain(|note| &note.id != id);
        Ok(())
    }
}
