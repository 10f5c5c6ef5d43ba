//! Sources of truth for the note collection.
//!
//! Every variant implements [`NoteBackend`]: fetch the whole collection,
//! create a note (storing its file), delete a note given a credential and
//! download a stored artifact.

mod data_url;
mod local;
mod rest;
mod supabase;

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::models::{FileRef, FileRefKind, Note, NoteId, NoteType};
use crate::upload::ValidationPolicy;
use crate::{Error, Result};

pub use data_url::{decode_data_url, encode_data_url};
pub use local::{LocalBackend, INLINE_FILE_LIMIT_BYTES, LOCAL_STORAGE_KEY, MSG_INCORRECT_PASSWORD};
pub use rest::{RestBackend, ADMIN_PASSWORD_HEADER};
pub use supabase::{SupabaseBackend, DEFAULT_STORAGE_BUCKET};

/// A file chosen for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("UploadFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

impl UploadFile {
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let content_type = mime_guess::from_path(&name)
            .first()
            .map(|mime| mime.essence_str().to_string());
        Self {
            name,
            bytes,
            content_type,
        }
    }

    /// Read a file from disk, keeping only its file name.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| Error::Validation(format!("{} is not a file", path.display())))?;
        Ok(Self::new(name, bytes))
    }

    #[must_use]
    pub fn content_type_or_default(&self) -> &str {
        self.content_type
            .as_deref()
            .unwrap_or("application/octet-stream")
    }

    /// Extension after the last dot, or "bin" when the name has none.
    #[must_use]
    pub fn extension(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext,
            _ => "bin",
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A validated submission handed to a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub subject: String,
    pub note_type: NoteType,
    pub description: Option<String>,
    pub author: Option<String>,
    pub file: Option<UploadFile>,
}

/// What a backend reports after a successful create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateReceipt {
    /// The stored record when the source echoes it back
    pub note: Option<Note>,
    /// The file was too large to keep and only metadata was stored
    pub file_dropped: bool,
}

/// Credential supplied with a delete request.
#[derive(Clone, PartialEq, Eq)]
pub enum DeleteCredential {
    AdminSecret(String),
    Session,
}

impl fmt::Debug for DeleteCredential {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdminSecret(_) => formatter.write_str("AdminSecret([REDACTED])"),
            Self::Session => formatter.write_str("Session"),
        }
    }
}

/// How the current actor may delete notes on a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionCapability {
    Unavailable,
    AdminSecret,
    Session,
}

/// The signed-in user, if the backend has a notion of one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Source of truth for the note collection.
#[async_trait]
pub trait NoteBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Rules a submission must satisfy before [`NoteBackend::create`].
    fn validation_policy(&self) -> ValidationPolicy;

    fn deletion_capability(&self) -> DeletionCapability;

    /// Full snapshot of the collection, newest first where supported.
    async fn fetch_all(&self) -> Result<Vec<Note>>;

    async fn create(&self, draft: NoteDraft) -> Result<CreateReceipt>;

    async fn delete(&self, id: NoteId, credential: &DeleteCredential) -> Result<()>;

    /// Resolve a file reference into bytes.
    async fn download(&self, file_ref: &FileRef) -> Result<Vec<u8>> {
        match file_ref.kind() {
            FileRefKind::Inline => decode_data_url(file_ref.as_str()).map(|(_, bytes)| bytes),
            FileRefKind::Remote => Err(Error::Storage(format!(
                "{} backend cannot fetch remote files",
                self.name()
            ))),
        }
    }

    async fn current_actor(&self) -> Result<Option<Actor>> {
        Ok(None)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    msg: Option<String>,
}

/// Extract a readable message from an error response body.
pub(crate) fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload
            .message
            .or(payload.msg)
            .or(payload.error_description)
            .or(payload.error)
        {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = crate::util::compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

/// Fetch remote bytes, resolving server-relative URLs against `base_url`.
pub(crate) async fn fetch_remote_file(
    client: &reqwest::Client,
    base_url: &str,
    file_ref: &FileRef,
) -> Result<Vec<u8>> {
    let raw = file_ref.as_str();
    let url = if crate::util::is_http_url(raw) {
        raw.to_string()
    } else {
        format!("{}/{}", base_url, raw.trim_start_matches('/'))
    };

    let response = client.get(&url).send().await?;
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::NotFound(format!(
            "File download failed: {}",
            parse_api_error(status, &body)
        )));
    }
    Ok(response.bytes().await?.to_vec())
}
