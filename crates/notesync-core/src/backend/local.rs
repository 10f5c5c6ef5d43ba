//! Offline backend: the collection lives in a JSON key/value file.
//!
//! The whole collection is one value under a fixed key and is rewritten
//! wholesale on every mutation. Files are embedded as `data:` URLs.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::backend::data_url::encode_data_url;
use crate::backend::{CreateReceipt, DeleteCredential, DeletionCapability, NoteBackend, NoteDraft};
use crate::models::{FileRef, Note, NoteId};
use crate::upload::ValidationPolicy;
use crate::util::unix_timestamp_millis_now;
use crate::{Error, Result};

/// Key holding the serialized collection.
pub const LOCAL_STORAGE_KEY: &str = "playground_db";

/// Files above this size are stored as metadata-only records.
pub const INLINE_FILE_LIMIT_BYTES: usize = 2_000_000;

pub const MSG_INCORRECT_PASSWORD: &str = "Incorrect password!";

#[derive(Debug)]
pub struct LocalBackend {
    path: PathBuf,
    admin_secret: Option<String>,
    inline_limit: usize,
    write_lock: Mutex<()>,
}

impl LocalBackend {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            admin_secret: None,
            inline_limit: INLINE_FILE_LIMIT_BYTES,
            write_lock: Mutex::new(()),
        }
    }

    /// Enable deletion, gated by `secret`.
    #[must_use]
    pub fn with_admin_secret(mut self, secret: Option<String>) -> Self {
        self.admin_secret = crate::util::normalize_text_option(secret);
        self
    }

    #[must_use]
    pub const fn with_inline_limit(mut self, bytes: usize) -> Self {
        self.inline_limit = bytes;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<Map<String, Value>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(Map::new()),
            Ok(raw) => match serde_json::from_str::<Value>(&raw)? {
                Value::Object(entries) => Ok(entries),
                _ => Err(Error::Storage(format!(
                    "{} does not hold a key/value object",
                    self.path.display()
                ))),
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(error) => Err(error.into()),
        }
    }

    async fn read_notes(&self) -> Result<Vec<Note>> {
        let entries = self.read_entries().await?;
        match entries.get(LOCAL_STORAGE_KEY) {
            None | Some(Value::Null) => Ok(Vec::new()),
            // Browser storage keeps values as strings.
            Some(Value::String(raw)) => Ok(serde_json::from_str(raw)?),
            Some(value) => Ok(serde_json::from_value(value.clone())?),
        }
    }

    async fn write_notes(&self, notes: &[Note]) -> Result<()> {
        let mut entries = self.read_entries().await?;
        entries.insert(LOCAL_STORAGE_KEY.to_string(), serde_json::to_value(notes)?);
        let serialized = serde_json::to_string_pretty(&Value::Object(entries))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, serialized).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }

    /// Millisecond timestamp, bumped past the largest stored id.
    fn next_id(notes: &[Note]) -> Result<NoteId> {
        let now = unix_timestamp_millis_now();
        let Some(max_existing) = notes.iter().map(|note| note.id.value()).max() else {
            return Ok(NoteId::new(now));
        };
        max_existing
            .checked_add(1)
            .map(|next| NoteId::new(now.max(next)))
            .ok_or_else(|| Error::Storage(format!("note id space exhausted after {max_existing}")))
    }
}

#[async_trait]
impl NoteBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            require_file: true,
            ..ValidationPolicy::minimal()
        }
    }

    fn deletion_capability(&self) -> DeletionCapability {
        if self.admin_secret.is_some() {
            DeletionCapability::AdminSecret
        } else {
            DeletionCapability::Unavailable
        }
    }

    async fn fetch_all(&self) -> Result<Vec<Note>> {
        self.read_notes().await
    }

    async fn create(&self, draft: NoteDraft) -> Result<CreateReceipt> {
        let _guard = self.write_lock.lock().await;
        let mut notes = self.read_notes().await?;

        let mut file_dropped = false;
        let (file_ref, file_name) = match &draft.file {
            Some(file) if file.len() > self.inline_limit => {
                tracing::warn!(
                    "{} is {} bytes (limit {}); storing metadata only",
                    file.name,
                    file.len(),
                    self.inline_limit
                );
                file_dropped = true;
                (None, Some(file.name.clone()))
            }
            Some(file) => (
                FileRef::new(encode_data_url(
                    file.content_type_or_default(),
                    &file.bytes,
                )),
                Some(file.name.clone()),
            ),
            None => (None, None),
        };

        let mut note = Note::new(
            Self::next_id(&notes)?,
            draft.title,
            draft.subject,
            draft.note_type,
        )
        .with_file(file_ref, file_name);
        note.author = draft.author;
        note.description = draft.description;

        notes.insert(0, note.clone());
        self.write_notes(&notes).await?;
        tracing::info!("Stored note {} in {}", note.id, self.path.display());

        Ok(CreateReceipt {
            note: Some(note),
            file_dropped,
        })
    }

    async fn delete(&self, id: NoteId, credential: &DeleteCredential) -> Result<()> {
        let Some(expected) = self.admin_secret.as_deref() else {
            return Err(Error::Unauthorized(
                "Deletion is disabled for this gallery.".to_string(),
            ));
        };
        match credential {
            DeleteCredential::AdminSecret(secret) if secret == expected => {}
            _ => return Err(Error::Unauthorized(MSG_INCORRECT_PASSWORD.to_string())),
        }

        let _guard = self.write_lock.lock().await;
        let mut notes = self.read_notes().await?;
        let before = notes.len();
        notes.retain(|note| note.id != id);
        if notes.len() == before {
            return Err(Error::NotFound("Note not found".to_string()));
        }
        self.write_notes(&notes).await?;
        tracing::info!("Deleted note {} from {}", id, self.path.display());
        Ok(())
    }
}
