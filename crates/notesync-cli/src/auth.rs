//! Supabase session helpers with keychain persistence per profile.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use notesync_core::auth::{AuthResult, SessionPersistence, SupabaseAuthClient};
pub use notesync_core::auth::{AuthError, AuthSession, AuthUser};
use notesync_core::config::{BackendConfig, ClientConfig};

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "notesync-cli";

const GOOGLE_PROVIDER: &str = "google";

#[derive(Clone)]
pub struct SessionStore {
    username: String,
}

impl SessionStore {
    pub fn new(profile_name: &str) -> Self {
        Self {
            username: format!("supabase_session:{profile_name}"),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> AuthResult<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))
    }
}

impl SessionPersistence for SessionStore {
    #[cfg(not(test))]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let entry = self.entry()?;
        match entry.get_password() {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard
            .get(&self.username)
            .map(|raw| serde_json::from_str(raw))
            .transpose()
            .map_err(AuthError::from)
    }

    #[cfg(not(test))]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        self.entry()?
            .set_password(&raw)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        Ok(())
    }

    #[cfg(test)]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard.insert(self.username.clone(), raw);
        Ok(())
    }

    #[cfg(not(test))]
    fn clear_session(&self) -> AuthResult<()> {
        let entry = self.entry()?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn clear_session(&self) -> AuthResult<()> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard.remove(&self.username);
        Ok(())
    }
}

#[derive(Clone)]
pub struct SupabaseAuthService {
    inner: SupabaseAuthClient<SessionStore>,
}

impl SupabaseAuthService {
    /// Auth client for a profile, or `None` when it does not use supabase.
    pub fn for_config(profile_name: &str, config: &ClientConfig) -> AuthResult<Option<Self>> {
        let BackendConfig::Supabase { url, anon_key, .. } = &config.backend else {
            return Ok(None);
        };
        Ok(Some(Self {
            inner: SupabaseAuthClient::new(
                url,
                anon_key.clone(),
                SessionStore::new(profile_name),
            )?,
        }))
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        self.inner.sign_in(email, password).await
    }

    pub async fn sign_in_with_google(&self, id_token: &str) -> AuthResult<AuthSession> {
        self.inner
            .sign_in_with_id_token(GOOGLE_PROVIDER, id_token)
            .await
    }

    pub fn google_authorize_url(&self, redirect_to: Option<&str>) -> String {
        self.inner.authorize_url(GOOGLE_PROVIDER, redirect_to)
    }

    pub async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        self.inner.restore_session().await
    }

    /// Confirm with the server that the session is still honored.
    pub async fn current_user(&self, session: &AuthSession) -> AuthResult<AuthUser> {
        self.inner.get_user(&session.access_token).await
    }

    pub async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        self.inner.sign_out(access_token).await
    }
}

pub fn load_stored_session(profile_name: &str) -> AuthResult<Option<AuthSession>> {
    SessionStore::new(profile_name).load_session()
}

pub fn clear_stored_session(profile_name: &str) -> AuthResult<()> {
    SessionStore::new(profile_name).clear_session()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;

    fn session(token: &str) -> AuthSession {
        AuthSession {
            access_token: token.to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: 1_700_000_000,
            user: AuthUser {
                id: "user".to_string(),
                email: None,
                full_name: None,
                avatar_url: None,
            },
        }
    }

    #[test]
    fn sessions_are_scoped_per_profile() {
        SessionStore::new("auth-test-a")
            .save_session(&session("token-a"))
            .unwrap();
        let stored = load_stored_session("auth-test-a").unwrap().unwrap();
        assert_eq!(stored.access_token, "token-a");
        assert!(load_stored_session("auth-test-b").unwrap().is_none());

        clear_stored_session("auth-test-a").unwrap();
        assert!(load_stored_session("auth-test-a").unwrap().is_none());
    }

    #[test]
    fn auth_service_only_exists_for_supabase_profiles() {
        let local = ClientConfig {
            backend: BackendConfig::Local {
                path: PathBuf::from("store.json"),
            },
            admin_secret: None,
            sync_interval: Duration::from_secs(30),
        };
        assert!(SupabaseAuthService::for_config("p", &local)
            .unwrap()
            .is_none());

        let hosted = ClientConfig {
            backend: BackendConfig::Supabase {
                url: "https://demo.supabase.co".to_string(),
                anon_key: "anon".to_string(),
                bucket: "notes-bucket".to_string(),
            },
            ..local
        };
        let service = SupabaseAuthService::for_config("p", &hosted)
            .unwrap()
            .unwrap();
        assert_eq!(
            service.google_authorize_url(None),
            "https://demo.supabase.co/auth/v1/authorize?provider=google"
        );
    }
}
