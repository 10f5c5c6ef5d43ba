//! Upload pipeline: validate a submission, hand it to the backend, report.
//!
//! The pipeline walks `Idle -> Validating -> Submitting -> Success | Failed
//! -> Idle`. Validation failures go straight back to `Idle` without touching
//! the backend.

use crate::backend::{Actor, CreateReceipt, NoteBackend, NoteDraft, UploadFile};
use crate::models::NoteType;
use crate::util::normalize_text_option;
use crate::{Error, Result};

pub const MIN_TITLE_CHARS: usize = 5;
pub const MIN_DESCRIPTION_CHARS: usize = 10;

pub const MSG_NOT_SIGNED_IN: &str = "You must be logged in to upload.";
pub const MSG_MISSING_FIELDS: &str = "Please fill all fields and select a file.";
pub const MSG_TITLE_TOO_SHORT: &str = "Title is too short (min 5 chars).";
pub const MSG_DESCRIPTION_TOO_SHORT: &str = "Description is too short (min 10 chars).";

/// Rules a backend imposes on submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ValidationPolicy {
    pub require_actor: bool,
    pub require_description: bool,
    pub require_file: bool,
    pub min_title_chars: Option<usize>,
    pub min_description_chars: Option<usize>,
}

impl ValidationPolicy {
    /// Title and subject only.
    #[must_use]
    pub const fn minimal() -> Self {
        Self {
            require_actor: false,
            require_description: false,
            require_file: false,
            min_title_chars: None,
            min_description_chars: None,
        }
    }

    /// Signed-in actor, every field, a file and minimum lengths.
    #[must_use]
    pub const fn moderated() -> Self {
        Self {
            require_actor: true,
            require_description: true,
            require_file: true,
            min_title_chars: Some(MIN_TITLE_CHARS),
            min_description_chars: Some(MIN_DESCRIPTION_CHARS),
        }
    }
}

/// The submission form as the user filled it in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadForm {
    pub title: String,
    pub subject: String,
    pub note_type: NoteType,
    pub description: String,
    pub author: String,
    pub file: Option<UploadFile>,
}

impl UploadForm {
    /// Check the form against `policy` and turn it into a draft.
    pub fn validate(&self, policy: &ValidationPolicy, actor: Option<&Actor>) -> Result<NoteDraft> {
        if policy.require_actor && actor.is_none() {
            return Err(Error::Validation(MSG_NOT_SIGNED_IN.to_string()));
        }

        let title = self.title.trim();
        let subject = self.subject.trim();
        let description = self.description.trim();
        let missing_required = title.is_empty()
            || subject.is_empty()
            || (policy.require_description && description.is_empty())
            || (policy.require_file && self.file.is_none());
        if missing_required {
            return Err(Error::Validation(MSG_MISSING_FIELDS.to_string()));
        }

        if let Some(min) = policy.min_title_chars {
            if title.chars().count() < min {
                return Err(Error::Validation(MSG_TITLE_TOO_SHORT.to_string()));
            }
        }
        if let Some(min) = policy.min_description_chars {
            let provided = !description.is_empty();
            if (policy.require_description || provided) && description.chars().count() < min {
                return Err(Error::Validation(MSG_DESCRIPTION_TOO_SHORT.to_string()));
            }
        }

        Ok(NoteDraft {
            title: title.to_string(),
            subject: subject.to_string(),
            note_type: self.note_type,
            description: normalize_text_option(Some(self.description.clone())),
            author: normalize_text_option(Some(self.author.clone())),
            file: self.file.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UploadState {
    #[default]
    Idle,
    Validating,
    Submitting,
    Success,
    Failed,
}

/// Drives one submission at a time through validation and persistence.
#[derive(Debug, Default)]
pub struct UploadPipeline {
    state: UploadState,
    trail: Vec<UploadState>,
}

impl UploadPipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> UploadState {
        self.state
    }

    /// States visited by the most recent submission, starting from `Idle`.
    #[must_use]
    pub fn trail(&self) -> &[UploadState] {
        &self.trail
    }

    /// Validate and persist `form`. On return the pipeline rests in
    /// `Success` or `Failed` (call [`UploadPipeline::finish`]), or back in
    /// `Idle` after a validation failure.
    pub async fn submit(
        &mut self,
        form: &UploadForm,
        backend: &dyn NoteBackend,
    ) -> Result<CreateReceipt> {
        self.trail.clear();
        self.trail.push(UploadState::Idle);
        self.transition(UploadState::Validating);

        let policy = backend.validation_policy();
        let actor = if policy.require_actor {
            match backend.current_actor().await {
                Ok(actor) => actor,
                Err(error) => {
                    tracing::warn!("Failed to resolve signed-in user: {}", error);
                    None
                }
            }
        } else {
            None
        };

        let draft = match form.validate(&policy, actor.as_ref()) {
            Ok(draft) => draft,
            Err(error) => {
                self.transition(UploadState::Idle);
                return Err(error);
            }
        };

        self.transition(UploadState::Submitting);
        tracing::info!(
            "Submitting {} '{}' to {} backend",
            draft.note_type,
            draft.title,
            backend.name()
        );
        match backend.create(draft).await {
            Ok(receipt) => {
                self.transition(UploadState::Success);
                Ok(receipt)
            }
            Err(error) => {
                self.transition(UploadState::Failed);
                Err(error)
            }
        }
    }

    /// Return to `Idle` after a terminal state was handled.
    pub fn finish(&mut self) {
        if self.state != UploadState::Idle {
            self.transition(UploadState::Idle);
        }
    }

    fn transition(&mut self, next: UploadState) {
        tracing::debug!("upload pipeline {:?} -> {:?}", self.state, next);
        self.state = next;
        self.trail.push(next);
    }
}
