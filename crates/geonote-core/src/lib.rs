//! geonote-core - Core library for Geonote
//!
//! This crate contains the note model and validation, the document-store
//! adapters, the identity/session layer, and the navigation and screen
//! controllers shared by all Geonote interfaces.

pub mod auth;
pub mod config;
pub mod device;
pub mod error;
pub mod models;
pub mod nav;
pub mod screens;
pub mod session;
pub mod store;
pub mod util;
pub mod validate;

pub use error::{Error, Result};
pub use models::{Note, NoteDraft, NoteId};
