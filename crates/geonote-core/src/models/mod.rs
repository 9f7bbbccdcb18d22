//! Data models for Geonote

mod note;

pub use note::{truncate_to_seconds, Coordinates, Note, NoteDraft, NoteFields, NoteId, NotePatch};
