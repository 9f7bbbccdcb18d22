//! Editor screen controller.
//!
//! The editor is the sole owner of its draft: it is seeded once on entry
//! (blank, or copied from the note being edited) and never re-fetched.
//! Validation failures come back synchronously and are the user's to fix;
//! backend failures are logged and leave the draft intact so the save can
//! be retried.

use std::sync::Arc;

use thiserror::Error;

use crate::device::{ImagePick, ImagePicker};
use crate::error::Error;
use crate::models::{Note, NoteDraft, NoteId, NotePatch};
use crate::store::NoteStore;
use crate::validate::{validate_draft, ValidationError};

#[derive(Debug, Error)]
pub enum EditorError {
    /// A field rule failed; the message is shown to the user verbatim.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Failed to save note: {0}")]
    Backend(#[from] Error),
}

/// Where an attached image comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Library,
    Camera,
}

pub struct NoteEditor {
    store: Arc<dyn NoteStore>,
    draft: NoteDraft,
}

impl NoteEditor {
    /// Editor over the blank create-form draft.
    #[must_use]
    pub fn for_new(store: Arc<dyn NoteStore>) -> Self {
        Self::with_draft(store, NoteDraft::blank())
    }

    /// Editor over a copy of an existing note.
    #[must_use]
    pub fn for_note(store: Arc<dyn NoteStore>, note: &Note) -> Self {
        Self::with_draft(store, NoteDraft::from_note(note))
    }

    /// Editor over a draft handed through navigation.
    #[must_use]
    pub fn with_draft(store: Arc<dyn NoteStore>, draft: NoteDraft) -> Self {
        Self { store, draft }
    }

    #[must_use]
    pub const fn draft(&self) -> &NoteDraft {
        &self.draft
    }

    /// Field edits go straight onto the draft.
    pub fn draft_mut(&mut self) -> &mut NoteDraft {
        &mut self.draft
    }

    /// Validate the draft and persist it: create for a draft with no id,
    /// full-field merge for an existing one. On success the draft carries
    /// the persisted id; on failure it is untouched.
    pub async fn save(&mut self) -> Result<NoteId, EditorError> {
        let fields = validate_draft(&self.draft)?;

        let id = if let Some(id) = self.draft.id.clone() {
            self.store
                .update(&id, &NotePatch::from_fields(&fields))
                .await
                .map_err(|error| self.backend_failure(error))?;
            id
        } else {
            let note = self
                .store
                .create(&fields)
                .await
                .map_err(|error| self.backend_failure(error))?;
            self.draft.id = Some(note.id.clone());
            note.id
        };

        Ok(id)
    }

    /// Remove the note being edited. A draft that was never saved has
    /// nothing to remove; the call succeeds without touching the store.
    pub async fn delete(&self) -> Result<(), EditorError> {
        let Some(id) = &self.draft.id else {
            return Ok(());
        };
        self.store
            .delete(id)
            .await
            .map_err(|error| self.backend_failure(error))?;
        Ok(())
    }

    /// Run one image-pick interaction and apply its outcome.
    pub async fn attach_image(&mut self, picker: &dyn ImagePicker, source: ImageSource) {
        let pick = match source {
            ImageSource::Library => picker.pick_from_library().await,
            ImageSource::Camera => picker.capture_photo().await,
        };
        self.apply_image_pick(pick);
    }

    /// Only a selected image changes the draft; every other outcome
    /// leaves it as it was.
    pub fn apply_image_pick(&mut self, pick: ImagePick) {
        match pick {
            ImagePick::Selected(uri) => self.draft.image_url = uri,
            ImagePick::Cancelled => {}
            ImagePick::Denied => {
                tracing::info!("Image pick denied by platform permission");
            }
            ImagePick::Failed(message) => {
                tracing::warn!("Image pick failed: {}", message);
            }
        }
    }

    fn backend_failure(&self, error: Error) -> EditorError {
        tracing::error!("Note persistence failed: {}", error);
        EditorError::Backend(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::testing::ScriptedPicker;
    use crate::error::Result;
    use crate::models::{Coordinates, NoteFields};
    use crate::store::MemoryNoteStore;
    use pretty_assertions::assert_eq;

    fn filled_draft() -> NoteDraft {
        NoteDraft {
            title: "Trailhead".to_string(),
            content: "Park by the gate".to_string(),
            latitude_text: "31.5".to_string(),
            longitude_text: "35.2".to_string(),
            ..NoteDraft::blank()
        }
    }

    #[tokio::test]
    async fn save_creates_and_adopts_the_minted_id() {
        let store = Arc::new(MemoryNoteStore::new());
        let mut editor = NoteEditor::with_draft(store.clone(), filled_draft());

        let id = editor.save().await.unwrap();
        assert_eq!(editor.draft().id, Some(id.clone()));

        let note = store.get(&id).await.unwrap().unwrap();
        assert_eq!(note.fields.title, "Trailhead");
        assert_eq!(note.fields.coordinates, Coordinates::new(31.5, 35.2));
    }

    #[tokio::test]
    async fn save_with_id_updates_in_place() {
        let store = Arc::new(MemoryNoteStore::new());
        let mut editor = NoteEditor::with_draft(store.clone(), filled_draft());
        let id = editor.save().await.unwrap();

        editor.draft_mut().title = "Trailhead (north lot)".to_string();
        let second = editor.save().await.unwrap();
        assert_eq!(second, id);

        assert_eq!(store.list().await.unwrap().len(), 1);
        let note = store.get(&id).await.unwrap().unwrap();
        assert_eq!(note.fields.title, "Trailhead (north lot)");
    }

    #[tokio::test]
    async fn validation_failure_reaches_no_store() {
        let store = Arc::new(MemoryNoteStore::new());
        let mut editor = NoteEditor::for_new(store.clone());
        editor.draft_mut().content = "orphan content".to_string();

        let error = editor.save().await.unwrap_err();
        assert_eq!(error.to_string(), "Title is required.");
        assert!(store.list().await.unwrap().is_empty());
        assert_eq!(editor.draft().id, None);
    }

    #[tokio::test]
    async fn backend_failure_preserves_the_draft() {
        struct RejectingStore;

        #[async_trait::async_trait]
        impl NoteStore for RejectingStore {
            async fn list(&self) -> Result<Vec<Note>> {
                unreachable!()
            }
            async fn get(&self, _: &NoteId) -> Result<Option<Note>> {
                unreachable!()
            }
            async fn create(&self, _: &NoteFields) -> Result<Note> {
                Err(Error::Backend("HTTP 503".to_string()))
            }
            async fn update(&self, _: &NoteId, _: &NotePatch) -> Result<()> {
                unreachable!()
            }
            async fn delete(&self, _: &NoteId) -> Result<()> {
                unreachable!()
            }
        }

        let draft = filled_draft();
        let mut editor = NoteEditor::with_draft(Arc::new(RejectingStore), draft.clone());
        let error = editor.save().await.unwrap_err();
        assert!(matches!(error, EditorError::Backend(_)));

        // The draft survives for a retry, still without an id.
        assert_eq!(*editor.draft(), draft);
    }

    #[tokio::test]
    async fn delete_of_unsaved_draft_is_a_no_op() {
        let store = Arc::new(MemoryNoteStore::new());
        let editor = NoteEditor::for_new(store.clone());
        editor.delete().await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_the_saved_note() {
        let store = Arc::new(MemoryNoteStore::new());
        let mut editor = NoteEditor::with_draft(store.clone(), filled_draft());
        let id = editor.save().await.unwrap();

        editor.delete().await.unwrap();
        assert!(store.get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn only_a_selected_image_changes_the_draft() {
        let store = Arc::new(MemoryNoteStore::new());
        let mut editor = NoteEditor::with_draft(store, filled_draft());

        let picker = ScriptedPicker::new(vec![
            ImagePick::Denied,
            ImagePick::Cancelled,
            ImagePick::Failed("camera unavailable".to_string()),
            ImagePick::Selected("file:///photo.jpg".to_string()),
        ]);

        editor.attach_image(&picker, ImageSource::Library).await;
        editor.attach_image(&picker, ImageSource::Camera).await;
        editor.attach_image(&picker, ImageSource::Camera).await;
        assert!(!editor.draft().has_image());

        editor.attach_image(&picker, ImageSource::Library).await;
        assert_eq!(editor.draft().image_url, "file:///photo.jpg");
    }
}
