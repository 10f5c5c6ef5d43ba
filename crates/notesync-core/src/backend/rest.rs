//! Backend for a plain REST server exposing `/api/notes`.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use crate::backend::{
    fetch_remote_file, parse_api_error, CreateReceipt, DeleteCredential, DeletionCapability,
    NoteBackend, NoteDraft,
};
use crate::models::{FileRef, FileRefKind, Note, NoteId};
use crate::upload::{ValidationPolicy, MIN_TITLE_CHARS};
use crate::util::normalize_base_url;
use crate::{Error, Result};

/// Header carrying the admin secret on delete requests.
pub const ADMIN_PASSWORD_HEADER: &str = "X-Admin-Password";

#[derive(Debug, Clone)]
pub struct RestBackend {
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct MutationResponse {
    #[serde(default)]
    success: bool,
    note: Option<Note>,
    error: Option<String>,
}

impl RestBackend {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = normalize_base_url(base_url).map_err(Error::Config)?;
        Ok(Self {
            base_url,
            client: Client::builder().build()?,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn notes_url(&self) -> String {
        format!("{}/api/notes", self.base_url)
    }

    async fn read_mutation(response: Response) -> Result<MutationResponse> {
        let status = response.status();
        let body = response.text().await?;

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(Error::Unauthorized(parse_api_error(status, &body)));
            }
            StatusCode::NOT_FOUND => {
                return Err(Error::NotFound(parse_api_error(status, &body)));
            }
            _ if !status.is_success() => {
                return Err(Error::Api(parse_api_error(status, &body)));
            }
            _ => {}
        }

        let payload: MutationResponse = serde_json::from_str(&body)?;
        if payload.success {
            Ok(payload)
        } else {
            Err(Error::Api(
                payload
                    .error
                    .unwrap_or_else(|| "Server rejected the request".to_string()),
            ))
        }
    }
}

#[async_trait]
impl NoteBackend for RestBackend {
    fn name(&self) -> &'static str {
        "rest"
    }

    fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            min_title_chars: Some(MIN_TITLE_CHARS),
            ..ValidationPolicy::minimal()
        }
    }

    fn deletion_capability(&self) -> DeletionCapability {
        DeletionCapability::AdminSecret
    }

    async fn fetch_all(&self) -> Result<Vec<Note>> {
        let response = self.client.get(self.notes_url()).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(parse_api_error(status, &body)));
        }
        Ok(response.json::<Vec<Note>>().await?)
    }

    async fn create(&self, draft: NoteDraft) -> Result<CreateReceipt> {
        let mut form = Form::new()
            .text("title", draft.title)
            .text("subject", draft.subject)
            .text("type", draft.note_type.as_str())
            .text("description", draft.description.unwrap_or_default());
        if let Some(author) = draft.author {
            form = form.text("author", author);
        }
        if let Some(file) = draft.file {
            let content_type = file.content_type_or_default().to_string();
            let part = Part::bytes(file.bytes)
                .file_name(file.name)
                .mime_str(&content_type)?;
            form = form.part("file", part);
        }

        let response = self
            .client
            .post(self.notes_url())
            .multipart(form)
            .send()
            .await?;
        let payload = Self::read_mutation(response).await?;
        if let Some(note) = &payload.note {
            tracing::info!("Server stored note {}", note.id);
        }

        Ok(CreateReceipt {
            note: payload.note,
            file_dropped: false,
        })
    }

    async fn delete(&self, id: NoteId, credential: &DeleteCredential) -> Result<()> {
        let DeleteCredential::AdminSecret(secret) = credential else {
            return Err(Error::Unauthorized(
                "The REST backend requires the admin password.".to_string(),
            ));
        };

        let response = self
            .client
            .delete(format!("{}/{}", self.notes_url(), id))
            .header(ADMIN_PASSWORD_HEADER, secret)
            .send()
            .await?;
        Self::read_mutation(response).await?;
        tracing::info!("Server deleted note {}", id);
        Ok(())
    }

    async fn download(&self, file_ref: &FileRef) -> Result<Vec<u8>> {
        match file_ref.kind() {
            FileRefKind::Inline => {
                super::decode_data_url(file_ref.as_str()).map(|(_, bytes)| bytes)
            }
            FileRefKind::Remote => fetch_remote_file(&self.client, &self.base_url, file_ref).await,
        }
    }
}
