//! Client configuration.
//!
//! Values are read through a lookup function keyed by environment variable
//! name, so front ends can layer their own sources (flags, profile files)
//! over the process environment.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::{resolve_optional_supabase_config, SessionPersistence};
use crate::backend::{
    LocalBackend, NoteBackend, RestBackend, SupabaseBackend, DEFAULT_STORAGE_BUCKET,
};
use crate::sync::{DEFAULT_SYNC_INTERVAL, MAX_SYNC_INTERVAL, MIN_SYNC_INTERVAL};
use crate::util::{is_http_url, normalize_text_option};
use crate::{Error, Result};

pub const ENV_BACKEND: &str = "NOTESYNC_BACKEND";
pub const ENV_LOCAL_PATH: &str = "NOTESYNC_LOCAL_PATH";
pub const ENV_API_BASE_URL: &str = "NOTESYNC_API_BASE_URL";
pub const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
pub const ENV_STORAGE_BUCKET: &str = "NOTESYNC_STORAGE_BUCKET";
pub const ENV_ADMIN_SECRET: &str = "NOTESYNC_ADMIN_SECRET";
pub const ENV_SYNC_INTERVAL_SECS: &str = "NOTESYNC_SYNC_INTERVAL_SECS";

/// Store file used by the local backend when no path is configured.
pub const DEFAULT_LOCAL_FILE: &str = "notesync-storage.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Local,
    Rest,
    Supabase,
}

impl BackendKind {
    pub const ALL: [Self; 3] = [Self::Local, Self::Rest, Self::Supabase];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Rest => "rest",
            Self::Supabase => "supabase",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "offline" => Ok(Self::Local),
            "rest" | "api" => Ok(Self::Rest),
            "supabase" => Ok(Self::Supabase),
            other => Err(format!(
                "unknown backend '{other}' (expected local, rest or supabase)"
            )),
        }
    }
}

/// Connection details for one backend.
#[derive(Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Local {
        path: PathBuf,
    },
    Rest {
        base_url: String,
    },
    Supabase {
        url: String,
        anon_key: String,
        bucket: String,
    },
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { path } => formatter.debug_struct("Local").field("path", path).finish(),
            Self::Rest { base_url } => formatter
                .debug_struct("Rest")
                .field("base_url", base_url)
                .finish(),
            Self::Supabase { url, bucket, .. } => formatter
                .debug_struct("Supabase")
                .field("url", url)
                .field("anon_key", &"[REDACTED]")
                .field("bucket", bucket)
                .finish(),
        }
    }
}

impl BackendConfig {
    #[must_use]
    pub const fn kind(&self) -> BackendKind {
        match self {
            Self::Local { .. } => BackendKind::Local,
            Self::Rest { .. } => BackendKind::Rest,
            Self::Supabase { .. } => BackendKind::Supabase,
        }
    }

    /// Instantiate the backend. `store` holds the supabase session.
    pub fn build<S: SessionPersistence>(
        &self,
        admin_secret: Option<String>,
        store: S,
    ) -> Result<Arc<dyn NoteBackend>> {
        let backend: Arc<dyn NoteBackend> = match self {
            Self::Local { path } => {
                Arc::new(LocalBackend::new(path.clone()).with_admin_secret(admin_secret))
            }
            Self::Rest { base_url } => Arc::new(RestBackend::new(base_url)?),
            Self::Supabase {
                url,
                anon_key,
                bucket,
            } => {
                let backend = SupabaseBackend::new(url, anon_key.clone(), store)?;
                Arc::new(backend.with_bucket(bucket.clone()))
            }
        };
        tracing::debug!("Using {} backend", backend.name());
        Ok(backend)
    }
}

/// Fully resolved client settings.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub backend: BackendConfig,
    /// Client-side delete gate; the backend remains the authority
    pub admin_secret: Option<String>,
    pub sync_interval: Duration,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ClientConfig")
            .field("backend", &self.backend)
            .field(
                "admin_secret",
                &self.admin_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("sync_interval", &self.sync_interval)
            .finish()
    }
}

impl ClientConfig {
    /// Resolve from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve from an arbitrary key lookup.
    ///
    /// Without an explicit backend, a complete supabase configuration selects
    /// supabase, then an API base URL selects rest, otherwise local.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| normalize_text_option(lookup(key));

        let supabase = resolve_optional_supabase_config(
            read(ENV_SUPABASE_URL),
            read(ENV_SUPABASE_ANON_KEY),
        )
        .map_err(|_| {
            Error::Config(format!(
                "{ENV_SUPABASE_URL} and {ENV_SUPABASE_ANON_KEY} must be set together"
            ))
        })?;
        let api_base_url = read(ENV_API_BASE_URL);

        let kind = match read(ENV_BACKEND) {
            Some(raw) => raw.parse::<BackendKind>().map_err(Error::Config)?,
            None if supabase.is_some() => BackendKind::Supabase,
            None if api_base_url.is_some() => BackendKind::Rest,
            None => BackendKind::Local,
        };

        let backend = match kind {
            BackendKind::Local => BackendConfig::Local {
                path: read(ENV_LOCAL_PATH)
                    .map_or_else(|| PathBuf::from(DEFAULT_LOCAL_FILE), PathBuf::from),
            },
            BackendKind::Rest => {
                let base_url = api_base_url.ok_or_else(|| {
                    Error::Config(format!("{ENV_API_BASE_URL} is required for the rest backend"))
                })?;
                require_http_url(ENV_API_BASE_URL, &base_url)?;
                BackendConfig::Rest { base_url }
            }
            BackendKind::Supabase => {
                let (url, anon_key) = supabase.ok_or_else(|| {
                    Error::Config(format!(
                        "{ENV_SUPABASE_URL} and {ENV_SUPABASE_ANON_KEY} are required for the supabase backend"
                    ))
                })?;
                require_http_url(ENV_SUPABASE_URL, &url)?;
                BackendConfig::Supabase {
                    url,
                    anon_key,
                    bucket: read(ENV_STORAGE_BUCKET)
                        .unwrap_or_else(|| DEFAULT_STORAGE_BUCKET.to_string()),
                }
            }
        };

        let sync_interval = match read(ENV_SYNC_INTERVAL_SECS) {
            Some(raw) => parse_sync_interval(&raw)?,
            None => DEFAULT_SYNC_INTERVAL,
        };

        Ok(Self {
            backend,
            admin_secret: read(ENV_ADMIN_SECRET),
            sync_interval,
        })
    }
}

/// Parse a whole number of seconds within the supported sync range.
pub fn parse_sync_interval(raw: &str) -> Result<Duration> {
    let seconds: u64 = raw.trim().parse().map_err(|_| {
        Error::Config(format!(
            "{ENV_SYNC_INTERVAL_SECS} must be a whole number of seconds, got '{raw}'"
        ))
    })?;
    let interval = Duration::from_secs(seconds);
    if interval < MIN_SYNC_INTERVAL || interval > MAX_SYNC_INTERVAL {
        return Err(Error::Config(format!(
            "sync interval must be between {} and {} seconds",
            MIN_SYNC_INTERVAL.as_secs(),
            MAX_SYNC_INTERVAL.as_secs()
        )));
    }
    Ok(interval)
}

fn require_http_url(key: &str, value: &str) -> Result<()> {
    if is_http_url(value) {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "{key} must include http:// or https://"
        )))
    }
}
