//! Client state controller.
//!
//! Owns the application state (note cache, view selectors, upload form and
//! pipeline) and mediates every interaction with the backend. Each mutation
//! re-renders the view and surfaces its outcome as a notification.

use std::sync::Arc;

use crate::backend::{CreateReceipt, DeleteCredential, DeletionCapability, NoteBackend};
use crate::filter::{SubjectFilter, ViewFilter};
use crate::models::{Note, NoteId, NoteType};
use crate::notify::{Notification, Notifier};
use crate::render::{render, RenderCapabilities, RenderSink, RenderedView};
use crate::store::NoteStore;
use crate::upload::{UploadForm, UploadPipeline};
use crate::{Error, ErrorKind, Result};

pub const MSG_SYNC_FAILED: &str = "Sync failed. Check your connection.";
pub const MSG_SIGN_IN_TO_UPLOAD: &str = "Please sign in to upload notes!";
pub const MSG_FILE_NOT_FOUND: &str = "File not found.";
pub const MSG_FILE_TOO_LARGE: &str =
    "File is too large (max 2MB). Title and metadata were saved without the file content.";
pub const MSG_DELETE_UNAVAILABLE: &str = "Deletion is not available for this gallery.";
pub const MSG_DELETE_FORBIDDEN: &str = "You are not allowed to delete this note.";
pub use crate::backend::MSG_INCORRECT_PASSWORD;

/// Everything the gallery shows or edits.
#[derive(Debug, Default)]
pub struct AppState {
    pub store: NoteStore,
    pub filter: ViewFilter,
    pub pipeline: UploadPipeline,
    pub form: UploadForm,
    pub upload_surface_open: bool,
    pub capabilities: RenderCapabilities,
}

/// A downloaded artifact and the name to save it under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub struct Controller {
    backend: Arc<dyn NoteBackend>,
    notifier: Arc<dyn Notifier>,
    sink: Option<Arc<dyn RenderSink>>,
    admin_secret_hint: Option<String>,
    state: AppState,
}

impl Controller {
    pub fn new(backend: Arc<dyn NoteBackend>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            backend,
            notifier,
            sink: None,
            admin_secret_hint: None,
            state: AppState::default(),
        }
    }

    #[must_use]
    pub fn with_render_sink(mut self, sink: Arc<dyn RenderSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Configure the client-side delete gate. It only spares a round trip;
    /// the backend still decides.
    #[must_use]
    pub fn with_admin_secret_hint(mut self, hint: Option<String>) -> Self {
        self.admin_secret_hint = crate::util::normalize_text_option(hint);
        self
    }

    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    #[must_use]
    pub fn notes(&self) -> &[Note] {
        self.state.store.notes()
    }

    /// Pull a fresh snapshot. On failure the cache is kept and the user is
    /// told the sync failed.
    pub async fn refresh(&mut self) -> Result<usize> {
        let backend = Arc::clone(&self.backend);
        match self.state.store.refresh(backend.as_ref()).await {
            Ok(count) => {
                tracing::debug!("Refreshed {} notes from {}", count, backend.name());
                self.state.capabilities = RenderCapabilities {
                    can_delete: self.actor_can_delete().await,
                };
                self.render();
                Ok(count)
            }
            Err(error) => {
                tracing::error!("Error fetching notes: {}", error);
                self.notifier.notify(Notification::error(MSG_SYNC_FAILED));
                Err(error)
            }
        }
    }

    pub fn set_view(&mut self, view_type: NoteType) -> RenderedView {
        self.state.filter.set_view(view_type);
        self.render()
    }

    pub fn set_subject(&mut self, subject_filter: SubjectFilter) -> RenderedView {
        self.state.filter.set_subject(subject_filter);
        self.render()
    }

    pub fn set_search(&mut self, search_term: impl Into<String>) -> RenderedView {
        self.state.filter.set_search(search_term);
        self.render()
    }

    /// Recompute the view and hand it to the render sink.
    pub fn render(&self) -> RenderedView {
        let view = render(
            self.state.store.notes(),
            &self.state.filter,
            self.state.capabilities,
        );
        if let Some(sink) = &self.sink {
            sink.show(&view);
        }
        view
    }

    /// Add a note to the cache ahead of the next refresh.
    pub fn insert_note(&mut self, note: Note) -> Result<RenderedView> {
        self.state.store.insert(note)?;
        Ok(self.render())
    }

    pub async fn open_upload(&mut self) -> Result<()> {
        if self.backend.validation_policy().require_actor && self.current_actor_missing().await {
            self.notifier
                .notify(Notification::error(MSG_SIGN_IN_TO_UPLOAD));
            return Err(Error::Validation(MSG_SIGN_IN_TO_UPLOAD.to_string()));
        }
        self.state.upload_surface_open = true;
        Ok(())
    }

    /// Dismiss the upload surface, keeping whatever was typed.
    pub fn close_upload(&mut self) {
        self.state.upload_surface_open = false;
    }

    pub fn upload_form_mut(&mut self) -> &mut UploadForm {
        &mut self.state.form
    }

    pub fn set_form(&mut self, form: UploadForm) {
        self.state.form = form;
    }

    /// Run the current form through the upload pipeline.
    pub async fn submit_upload(&mut self) -> Result<CreateReceipt> {
        let backend = Arc::clone(&self.backend);
        let note_type = self.state.form.note_type;
        let result = self
            .state
            .pipeline
            .submit(&self.state.form, backend.as_ref())
            .await;

        let receipt = match result {
            Ok(receipt) => receipt,
            Err(error) => {
                let message = if error.kind() == ErrorKind::Validation {
                    error.to_string()
                } else {
                    tracing::error!("Upload failed: {}", error);
                    format!("Upload failed. {error}")
                };
                self.notifier.notify(Notification::error(message));
                self.state.pipeline.finish();
                return Err(error);
            }
        };

        self.state.form = UploadForm::default();
        self.state.upload_surface_open = false;
        self.state.filter.set_subject(SubjectFilter::All);
        if let Some(note) = receipt.note.clone() {
            if let Err(error) = self.state.store.insert(note) {
                tracing::debug!("Created note already cached: {}", error);
            }
        }
        if receipt.file_dropped {
            self.notifier
                .notify(Notification::error(MSG_FILE_TOO_LARGE));
        }
        self.notifier.notify(Notification::success(format!(
            "{} uploaded successfully!",
            note_type.label()
        )));
        self.state.pipeline.finish();
        self.render();

        if let Err(error) = self.refresh().await {
            tracing::warn!("Refresh after upload failed: {}", error);
        }
        Ok(receipt)
    }

    /// Delete a note. `password` is whatever the user typed at the prompt;
    /// a blank answer cancels. Returns whether a delete was issued and
    /// accepted.
    pub async fn delete_note(&mut self, id: NoteId, password: Option<&str>) -> Result<bool> {
        let Some(title) = self.state.store.get(id).map(|note| note.title.clone()) else {
            self.notifier.notify(Notification::error("Note not found."));
            return Err(Error::NotFound(format!("Note {id} not found")));
        };
        let password = password.map(str::trim).filter(|value| !value.is_empty());

        let credential = match self.backend.deletion_capability() {
            DeletionCapability::Unavailable => {
                self.notifier
                    .notify(Notification::error(MSG_DELETE_UNAVAILABLE));
                return Err(Error::Unauthorized(MSG_DELETE_UNAVAILABLE.to_string()));
            }
            DeletionCapability::AdminSecret => {
                let Some(password) = password else {
                    return Ok(false);
                };
                self.check_secret_hint(password)?;
                DeleteCredential::AdminSecret(password.to_string())
            }
            DeletionCapability::Session => {
                if self.admin_secret_hint.is_some() {
                    let Some(password) = password else {
                        return Ok(false);
                    };
                    self.check_secret_hint(password)?;
                }
                DeleteCredential::Session
            }
        };

        match self.backend.delete(id, &credential).await {
            Ok(()) => {
                self.notifier
                    .notify(Notification::success(format!("Note \"{title}\" deleted.")));
                if let Err(error) = self.refresh().await {
                    tracing::warn!("Refresh after delete failed: {}", error);
                }
                Ok(true)
            }
            Err(Error::Unauthorized(reason)) => {
                tracing::warn!("Delete of note {} rejected: {}", id, reason);
                let message = match credential {
                    DeleteCredential::AdminSecret(_) => MSG_INCORRECT_PASSWORD,
                    DeleteCredential::Session => MSG_DELETE_FORBIDDEN,
                };
                self.notifier.notify(Notification::error(message));
                Err(Error::Unauthorized(reason))
            }
            Err(error) => {
                tracing::error!("Delete error: {}", error);
                self.notifier.notify(Notification::error(format!(
                    "Failed to delete note. {error}"
                )));
                Err(error)
            }
        }
    }

    /// Fetch the artifact attached to a note.
    pub async fn download(&self, id: NoteId) -> Result<DownloadedFile> {
        let Some((file_ref, file_name)) = self.state.store.get(id).and_then(|note| {
            note.file_ref
                .clone()
                .map(|file_ref| (file_ref, download_name(note)))
        }) else {
            self.notifier
                .notify(Notification::error(MSG_FILE_NOT_FOUND));
            return Err(Error::NotFound(MSG_FILE_NOT_FOUND.to_string()));
        };

        match self.backend.download(&file_ref).await {
            Ok(bytes) => Ok(DownloadedFile { file_name, bytes }),
            Err(error) => {
                tracing::error!("Download of note {} failed: {}", id, error);
                self.notifier
                    .notify(Notification::error(MSG_FILE_NOT_FOUND));
                Err(error)
            }
        }
    }

    /// Whether cards should offer a delete action to the current actor.
    pub async fn actor_can_delete(&self) -> bool {
        match self.backend.deletion_capability() {
            DeletionCapability::Unavailable => false,
            DeletionCapability::AdminSecret => true,
            DeletionCapability::Session => !self.current_actor_missing().await,
        }
    }

    async fn current_actor_missing(&self) -> bool {
        match self.backend.current_actor().await {
            Ok(actor) => actor.is_none(),
            Err(error) => {
                tracing::warn!("Failed to resolve signed-in user: {}", error);
                true
            }
        }
    }

    fn check_secret_hint(&self, password: &str) -> Result<()> {
        match self.admin_secret_hint.as_deref() {
            Some(expected) if expected != password => {
                self.notifier
                    .notify(Notification::error(MSG_INCORRECT_PASSWORD));
                Err(Error::Unauthorized(MSG_INCORRECT_PASSWORD.to_string()))
            }
            _ => Ok(()),
        }
    }
}

fn download_name(note: &Note) -> String {
    if let Some(name) = note
        .file_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
    {
        return name.to_string();
    }
    let stem: String = note
        .title
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    if stem.is_empty() {
        format!("note-{}", note.id)
    } else {
        stem
    }
}
