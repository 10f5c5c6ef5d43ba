//! Data models for NoteSync

mod note;
mod subject;

pub use note::{FileRef, FileRefKind, Note, NoteId, NoteType};
pub use subject::{Subject, SubjectBadge};
