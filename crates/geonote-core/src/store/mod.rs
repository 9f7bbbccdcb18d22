//! Note storage adapters over the hosted document store.

mod firestore;
mod memory;

pub use firestore::FirestoreNoteStore;
pub use memory::MemoryNoteStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Note, NoteFields, NoteId, NotePatch};

/// Operations the app consumes from the document store.
///
/// Implementations own no note state of their own (the in-memory fake
/// being the stand-in for the backend itself), perform no retries, and
/// surface any backend failure as a rejected operation for the caller to
/// log or display.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// All notes, in insertion order.
    async fn list(&self) -> Result<Vec<Note>>;

    /// A single note, or `None` when the id is unknown.
    async fn get(&self, id: &NoteId) -> Result<Option<Note>>;

    /// Persist a new note. The backend assigns a fresh id, and the store
    /// layer stamps `created_at`/`updated_at`.
    async fn create(&self, fields: &NoteFields) -> Result<Note>;

    /// Merge the patch into an existing note, leaving unspecified fields
    /// untouched and restamping `updated_at`.
    async fn update(&self, id: &NoteId, patch: &NotePatch) -> Result<()>;

    /// Remove a note. Deleting an already-missing id succeeds, matching
    /// the backend's behavior.
    async fn delete(&self, id: &NoteId) -> Result<()>;
}
