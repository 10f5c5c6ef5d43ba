//! Hosted backend: PostgREST table, storage bucket and GoTrue sessions.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::auth::{AuthError, AuthSession, SessionPersistence, SupabaseAuthClient};
use crate::backend::{
    fetch_remote_file, parse_api_error, Actor, CreateReceipt, DeleteCredential,
    DeletionCapability, NoteBackend, NoteDraft, UploadFile,
};
use crate::models::{FileRef, FileRefKind, Note, NoteId};
use crate::upload::ValidationPolicy;
use crate::util::{iso_timestamp_now, normalize_base_url};
use crate::{Error, Result};

pub const DEFAULT_STORAGE_BUCKET: &str = "notes-bucket";

const NOTES_TABLE: &str = "notes";
const OBJECT_PREFIX: &str = "notes";

pub struct SupabaseBackend<S: SessionPersistence> {
    base_url: String,
    anon_key: String,
    bucket: String,
    client: Client,
    auth: SupabaseAuthClient<S>,
    session: Mutex<Option<AuthSession>>,
}

#[derive(Debug, Serialize)]
struct InsertRow<'a> {
    title: &'a str,
    subject: &'a str,
    #[serde(rename = "type")]
    note_type: &'a str,
    description: &'a str,
    author: &'a str,
    user_id: &'a str,
    date: String,
    file_url: Option<String>,
    file_name: Option<&'a str>,
}

impl<S: SessionPersistence> SupabaseBackend<S> {
    pub fn new(url: &str, anon_key: impl Into<String>, store: S) -> Result<Self> {
        let base_url = normalize_base_url(url).map_err(Error::Config)?;
        let anon_key = anon_key.into().trim().to_string();
        let auth = SupabaseAuthClient::new(&base_url, anon_key.clone(), store)?;
        Ok(Self {
            base_url,
            anon_key,
            bucket: DEFAULT_STORAGE_BUCKET.to_string(),
            client: Client::builder().build()?,
            auth,
            session: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub const fn auth(&self) -> &SupabaseAuthClient<S> {
        &self.auth
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Public URL for an object stored in the bucket.
    #[must_use]
    pub fn public_object_url(&self, object_path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.bucket,
            object_path.trim_start_matches('/')
        )
    }

    /// Adopt a freshly obtained session without waiting for a restore.
    pub async fn set_session(&self, session: Option<AuthSession>) {
        *self.session.lock().await = session;
    }

    /// Current session, restored from persistence (and refreshed) on demand.
    pub async fn session(&self) -> Result<Option<AuthSession>> {
        let mut cached = self.session.lock().await;
        if let Some(session) = cached.as_ref() {
            if !session.is_expired() {
                return Ok(Some(session.clone()));
            }
        }
        let restored = self.auth.restore_session().await?;
        cached.clone_from(&restored);
        Ok(restored)
    }

    async fn require_session(&self) -> Result<AuthSession> {
        self.session()
            .await?
            .ok_or(Error::Auth(AuthError::NotSignedIn))
    }

    fn rest_url(&self) -> String {
        format!("{}/rest/v1/{NOTES_TABLE}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder, access_token: Option<&str>) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token.unwrap_or(&self.anon_key))
    }

    async fn upload_object(&self, file: &UploadFile, access_token: &str) -> Result<String> {
        let object_path = format!("{OBJECT_PREFIX}/{}.{}", Uuid::new_v4(), file.extension());
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, object_path
        );

        let response = self
            .authorized(self.client.post(url), Some(access_token))
            .header("Content-Type", file.content_type_or_default())
            .header("x-upsert", "false")
            .body(file.bytes.clone())
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Storage(parse_api_error(status, &body)));
        }

        tracing::debug!("Uploaded {} to bucket {}", object_path, self.bucket);
        Ok(object_path)
    }
}

#[async_trait]
impl<S: SessionPersistence> NoteBackend for SupabaseBackend<S> {
    fn name(&self) -> &'static str {
        "supabase"
    }

    fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy::moderated()
    }

    fn deletion_capability(&self) -> DeletionCapability {
        DeletionCapability::Session
    }

    async fn fetch_all(&self) -> Result<Vec<Note>> {
        let session = self.session().await?;
        let request = self
            .client
            .get(self.rest_url())
            .query(&[("select", "*"), ("order", "id.desc")]);
        let response = self
            .authorized(request, session.as_ref().map(|s| s.access_token.as_str()))
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(parse_api_error(status, &body)));
        }
        Ok(response.json::<Vec<Note>>().await?)
    }

    async fn create(&self, draft: NoteDraft) -> Result<CreateReceipt> {
        let session = self.require_session().await?;
        let token = session.access_token.as_str();

        let file_url = match &draft.file {
            Some(file) => {
                let object_path = self.upload_object(file, token).await?;
                Some(self.public_object_url(&object_path))
            }
            None => None,
        };

        let author = draft
            .author
            .as_deref()
            .or(session.user.full_name.as_deref())
            .unwrap_or("Anonymous");
        let row = InsertRow {
            title: &draft.title,
            subject: &draft.subject,
            note_type: draft.note_type.as_str(),
            description: draft.description.as_deref().unwrap_or_default(),
            author,
            user_id: &session.user.id,
            date: iso_timestamp_now(),
            file_url,
            file_name: draft.file.as_ref().map(|file| file.name.as_str()),
        };

        let response = self
            .authorized(self.client.post(self.rest_url()), Some(token))
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(parse_api_error(status, &body)));
        }

        let note = response.json::<Vec<Note>>().await?.into_iter().next();
        if let Some(note) = &note {
            tracing::info!("Inserted note {} for user {}", note.id, session.user.id);
        }
        Ok(CreateReceipt {
            note,
            file_dropped: false,
        })
    }

    /// Authorized by the session bearer token; any admin secret is advisory.
    async fn delete(&self, id: NoteId, _credential: &DeleteCredential) -> Result<()> {
        let session = self.require_session().await?;

        let response = self
            .authorized(
                self.client
                    .delete(self.rest_url())
                    .query(&[("id", format!("eq.{id}"))]),
                Some(&session.access_token),
            )
            .header("Prefer", "return=representation")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Unauthorized(parse_api_error(status, &body)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(parse_api_error(status, &body)));
        }

        // Row-level security hides rows the session may not delete.
        let deleted = response.json::<Vec<Note>>().await?;
        if deleted.is_empty() {
            return Err(Error::NotFound("Note not found".to_string()));
        }
        tracing::info!("Deleted note {}", id);
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

    async fn current_actor(&self) -> Result<Option<Actor>> {
        Ok(self.session().await?.map(|session| Actor {
            id: session.user.id,
            email: session.user.email,
            display_name: session.user.full_name,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemorySessionStore;

    #[test]
    fn public_url_points_at_bucket() {
        let backend = SupabaseBackend::new(
            "https://demo.supabase.co/",
            "anon",
            MemorySessionStore::new(),
        )
        .unwrap()
        .with_bucket("papers");
        assert_eq!(
            backend.public_object_url("notes/abc.pdf"),
            "https://demo.supabase.co/storage/v1/object/public/papers/notes/abc.pdf"
        );
        assert_eq!(backend.rest_url(), "https://demo.supabase.co/rest/v1/notes");
    }

    #[test]
    fn blank_anon_key_is_rejected() {
        assert!(SupabaseBackend::new("https://demo.supabase.co", " ", MemorySessionStore::new())
            .is_err());
    }

    #[tokio::test]
    async fn no_session_means_no_actor() {
        let backend = SupabaseBackend::new(
            "https://demo.supabase.co",
            "anon",
            MemorySessionStore::new(),
        )
        .unwrap();
        assert_eq!(backend.current_actor().await.unwrap(), None);
        assert!(matches!(
            backend.require_session().await,
            Err(Error::Auth(AuthError::NotSignedIn))
        ));
    }
}
