//! Draft validation ahead of any store call.
//!
//! Rules are checked in a fixed order (title, content, latitude,
//! longitude) and only the first failure is reported. Validation is pure:
//! surfacing the failure to the user is the caller's job, and a failed
//! draft never reaches the backend.

use thiserror::Error;

use crate::models::{truncate_to_seconds, Coordinates, NoteDraft, NoteFields};

/// A rule the draft failed, carrying its user-facing message.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title is required.")]
    EmptyTitle,
    #[error("Content is required.")]
    EmptyContent,
    #[error("Invalid latitude value.")]
    InvalidLatitude,
    #[error("Invalid longitude value.")]
    InvalidLongitude,
}

/// Parse a user-entered coordinate component, defaulting unparseable
/// input to 0.
#[must_use]
pub fn parse_coordinate(text: &str) -> f64 {
    text.trim().parse().unwrap_or(0.0)
}

/// Check a draft against the field rules and return the normalized
/// persistable fields: coordinates parsed to numbers, date truncated to
/// whole seconds, everything else as entered.
pub fn validate_draft(draft: &NoteDraft) -> Result<NoteFields, ValidationError> {
    if draft.title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if draft.content.trim().is_empty() {
        return Err(ValidationError::EmptyContent);
    }

    let latitude = parse_coordinate(&draft.latitude_text);
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ValidationError::InvalidLatitude);
    }

    let longitude = parse_coordinate(&draft.longitude_text);
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ValidationError::InvalidLongitude);
    }

    Ok(NoteFields {
        title: draft.title.clone(),
        content: draft.content.clone(),
        image_url: draft.image_url.clone(),
        coordinates: Coordinates::new(latitude, longitude),
        date: truncate_to_seconds(draft.date),
    })
}
