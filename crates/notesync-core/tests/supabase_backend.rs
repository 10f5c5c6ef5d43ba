//! Supabase backend against mocked PostgREST, storage and GoTrue endpoints.

use notesync_core::auth::{AuthError, AuthSession, AuthUser, MemorySessionStore};
use notesync_core::backend::{DeleteCredential, NoteBackend, NoteDraft, SupabaseBackend, UploadFile};
use notesync_core::util::unix_timestamp_now;
use notesync_core::{Error, NoteId, NoteType};
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_string_contains, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn live_session() -> AuthSession {
    AuthSession {
        access_token: "user-token".to_string(),
        refresh_token: "refresh".to_string(),
        expires_at: unix_timestamp_now() + 3600,
        user: AuthUser {
            id: "user-1".to_string(),
            email: Some("sam@example.com".to_string()),
            full_name: Some("Sam Lee".to_string()),
            avatar_url: None,
        },
    }
}

fn signed_in(server: &MockServer) -> SupabaseBackend<MemorySessionStore> {
    SupabaseBackend::new(
        &server.uri(),
        "anon-key",
        MemorySessionStore::with_session(live_session()),
    )
    .unwrap()
}

fn signed_out(server: &MockServer) -> SupabaseBackend<MemorySessionStore> {
    SupabaseBackend::new(&server.uri(), "anon-key", MemorySessionStore::new()).unwrap()
}

#[tokio::test]
async fn fetch_all_orders_by_id_descending() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/notes"))
        .and(query_param("select", "*"))
        .and(query_param("order", "id.desc"))
        .and(header("apikey", "anon-key"))
        .and(header("Authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "id": 12,
                "title": "Kinematics quiz",
                "subject": "physics",
                "type": "test",
                "author": "Sam Lee",
                "description": "Ten questions on projectile motion",
                "user_id": "user-1",
                "date": "2026-03-14T09:30:00Z",
                "file_url": "https://cdn.example.com/quiz.pdf",
                "file_name": "quiz.pdf"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let notes = signed_out(&server).fetch_all().await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].note_type, NoteType::Test);
    assert_eq!(notes[0].user_id.as_deref(), Some("user-1"));
    assert_eq!(notes[0].file_name.as_deref(), Some("quiz.pdf"));
    assert!(notes[0].has_file());
}

#[tokio::test]
async fn create_uploads_object_then_inserts_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/notes-bucket/notes/[0-9a-f-]{36}\.pdf$"))
        .and(header("Authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Key": "notes-bucket/notes/object.pdf"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/notes"))
        .and(header("Prefer", "return=representation"))
        .and(body_string_contains("/storage/v1/object/public/notes-bucket/notes/"))
        .and(body_string_contains("\"author\":\"Sam Lee\""))
        .and(body_string_contains("\"user_id\":\"user-1\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([
            {"id": 13, "title": "Cell Biology", "subject": "biology", "type": "note"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let receipt = signed_in(&server)
        .create(NoteDraft {
            title: "Cell Biology".to_string(),
            subject: "biology".to_string(),
            note_type: NoteType::Note,
            description: Some("Mitosis and meiosis compared".to_string()),
            author: None,
            file: Some(UploadFile::new("cells.pdf", b"%PDF-1.4".to_vec())),
        })
        .await
        .unwrap();
    assert_eq!(receipt.note.unwrap().id, NoteId::new(13));
}

#[tokio::test]
async fn storage_failure_aborts_before_insert() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "message": "Bucket not found"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/notes"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let error = signed_in(&server)
        .create(NoteDraft {
            title: "Cell Biology".to_string(),
            subject: "biology".to_string(),
            note_type: NoteType::Note,
            description: Some("Mitosis and meiosis compared".to_string()),
            author: Some("Priya".to_string()),
            file: Some(UploadFile::new("cells.pdf", vec![1, 2, 3])),
        })
        .await
        .unwrap_err();
    assert_eq!(error.to_string(), "Storage error: Bucket not found (404)");
}

#[tokio::test]
async fn delete_filters_by_id_with_session_token() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/notes"))
        .and(query_param("id", "eq.12"))
        .and(header("Authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 12, "title": "Kinematics quiz", "subject": "physics"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    signed_in(&server)
        .delete(NoteId::new(12), &DeleteCredential::Session)
        .await
        .unwrap();
}

#[tokio::test]
async fn delete_hidden_by_row_security_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/notes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    assert!(matches!(
        signed_in(&server)
            .delete(NoteId::new(12), &DeleteCredential::Session)
            .await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn writes_require_a_session() {
    let server = MockServer::start().await;
    let backend = signed_out(&server);
    let credential = DeleteCredential::Session;
    assert!(matches!(
        backend.delete(NoteId::new(12), &credential).await,
        Err(Error::Auth(_))
    ));
    assert_eq!(backend.current_actor().await.unwrap(), None);
}

#[tokio::test]
async fn password_sign_in_stores_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "fresh-token",
            "refresh_token": "fresh-refresh",
            "expires_in": 3600,
            "user": {
                "id": "user-1",
                "email": "sam@example.com",
                "user_metadata": {"full_name": "Sam Lee"}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = signed_out(&server);
    let session = backend
        .auth()
        .sign_in("sam@example.com", "hunter22")
        .await
        .unwrap();
    assert_eq!(session.user.full_name.as_deref(), Some("Sam Lee"));

    let actor = backend.current_actor().await.unwrap().unwrap();
    assert_eq!(actor.id, "user-1");
    assert_eq!(actor.display_name.as_deref(), Some("Sam Lee"));
}

#[tokio::test]
async fn expired_session_is_refreshed_on_restore() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_string_contains("stale-refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "renewed",
            "refresh_token": "renewed-refresh",
            "expires_at": unix_timestamp_now() + 3600,
            "user": {"id": "user-1", "email": "sam@example.com"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut stale = live_session();
    stale.expires_at = 0;
    stale.refresh_token = "stale-refresh".to_string();
    let backend = SupabaseBackend::new(
        &server.uri(),
        "anon-key",
        MemorySessionStore::with_session(stale),
    )
    .unwrap();

    let session = backend.session().await.unwrap().unwrap();
    assert_eq!(session.access_token, "renewed");
}

#[tokio::test]
async fn get_user_reports_the_token_owner() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("Authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "user-1",
            "email": "sam@example.com",
            "user_metadata": {"full_name": "Sam Lee"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("Authorization", "Bearer revoked"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let backend = signed_out(&server);
    let user = backend.auth().get_user("user-token").await.unwrap();
    assert_eq!(user.id, "user-1");
    assert_eq!(user.full_name.as_deref(), Some("Sam Lee"));
    assert!(matches!(
        backend.auth().get_user("revoked").await,
        Err(AuthError::NotSignedIn)
    ));
}
