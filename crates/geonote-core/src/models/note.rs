//! Note model

use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// An opaque note identifier assigned by the document store.
///
/// A draft that has never been persisted has no id; the id appears the
/// moment the create call returns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteId(String);

impl NoteId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NoteId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// A geographic position attached to a note.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Both components fall within the geographic ranges.
    ///
    /// (0, 0) is a legal position, not an "unset" sentinel.
    #[must_use]
    pub fn is_in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl Default for Coordinates {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// The user-editable fields of a note, as persisted in the document store.
///
/// Field names serialize exactly as the store keys (`imageUrl`, etc.).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteFields {
    pub title: String,
    pub content: String,
    /// Local-or-remote URI of the attached photo; empty means no image.
    pub image_url: String,
    pub coordinates: Coordinates,
    /// User-assigned note date, held at whole-second precision so it
    /// round-trips the store's timestamp representation.
    pub date: DateTime<Utc>,
}

impl Default for NoteFields {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            image_url: String::new(),
            coordinates: Coordinates::default(),
            date: truncate_to_seconds(Utc::now()),
        }
    }
}

/// A persisted note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    #[serde(flatten)]
    pub fields: NoteFields,
    /// Creation timestamp (Unix ms), owned by the store layer
    pub created_at: i64,
    /// Last update timestamp (Unix ms), owned by the store layer
    pub updated_at: i64,
}

/// A partial update applied by the store as a field merge.
///
/// `None` fields are left untouched on the stored document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub date: Option<DateTime<Utc>>,
}

impl NotePatch {
    /// A patch carrying every user-editable field, used by the editor save.
    #[must_use]
    pub fn from_fields(fields: &NoteFields) -> Self {
        Self {
            title: Some(fields.title.clone()),
            content: Some(fields.content.clone()),
            image_url: Some(fields.image_url.clone()),
            coordinates: Some(fields.coordinates),
            date: Some(fields.date),
        }
    }
}

/// The in-memory editing copy of a note.
///
/// Coordinate entry is kept as raw text exactly as typed; parsing happens
/// in validation. Every field is total: construction fills omitted values
/// with explicit defaults so validation never sees a partial record.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteDraft {
    pub id: Option<NoteId>,
    pub title: String,
    pub content: String,
    pub latitude_text: String,
    pub longitude_text: String,
    pub image_url: String,
    pub date: DateTime<Utc>,
}

impl NoteDraft {
    /// Blank draft for the create form.
    #[must_use]
    pub fn blank() -> Self {
        let defaults = NoteFields::default();
        Self {
            id: None,
            title: defaults.title,
            content: defaults.content,
            latitude_text: "0".to_string(),
            longitude_text: "0".to_string(),
            image_url: defaults.image_url,
            date: defaults.date,
        }
    }

    /// Populated draft for editing an existing note.
    #[must_use]
    pub fn from_note(note: &Note) -> Self {
        Self {
            id: Some(note.id.clone()),
            title: note.fields.title.clone(),
            content: note.fields.content.clone(),
            latitude_text: note.fields.coordinates.latitude.to_string(),
            longitude_text: note.fields.coordinates.longitude.to_string(),
            image_url: note.fields.image_url.clone(),
            date: note.fields.date,
        }
    }

    #[must_use]
    pub fn has_image(&self) -> bool {
        !self.image_url.is_empty()
    }
}

impl Default for NoteDraft {
    fn default() -> Self {
        Self::blank()
    }
}

/// Drop sub-second precision from a timestamp.
#[must_use]
pub fn truncate_to_seconds(value: DateTime<Utc>) -> DateTime<Utc> {
    value.trunc_subsecs(0)
}
