//! UI-toolkit-agnostic screen controllers.
//!
//! Each controller owns the behavioral contract of one screen (what the
//! screen does, not how it is drawn): the home screen's refresh-on-focus
//! snapshot and map pins, and the editor's draft lifecycle.

mod editor;
mod home;

pub use editor::{EditorError, ImageSource, NoteEditor};
pub use home::{MapPin, NoteListScreen, RefreshToken};
