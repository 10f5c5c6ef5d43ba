//! notesync-core - Core library for NoteSync
//!
//! This crate contains the note model, the client state controller (note
//! store, view filter, renderer, upload pipeline, sync loop) and the
//! interchangeable backends used by every NoteSync front end.

pub mod auth;
pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod models;
pub mod notify;
pub mod render;
pub mod store;
pub mod sync;
pub mod upload;
pub mod util;

pub use controller::Controller;
pub use error::{Error, ErrorKind, Result};
pub use models::{FileRef, Note, NoteId, NoteType, Subject};
