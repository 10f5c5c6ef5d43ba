//! Persistent CLI profile configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use notesync_core::config::{
    BackendKind, ENV_API_BASE_URL, ENV_BACKEND, ENV_LOCAL_PATH, ENV_STORAGE_BUCKET,
    ENV_SUPABASE_ANON_KEY, ENV_SUPABASE_URL, ENV_SYNC_INTERVAL_SECS,
};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "cli-config.json";
const APP_DIR_NAME: &str = "notesync";
const STORE_FILE_NAME: &str = "storage.json";
pub const ENV_PROFILE: &str = "NOTESYNC_PROFILE";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfilesConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub active_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, CliProfile>,
}

/// Connection settings saved under a profile name. Secrets are never stored
/// here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfile {
    #[serde(default)]
    pub backend: Option<BackendKind>,
    #[serde(default)]
    pub local_path: Option<PathBuf>,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
    #[serde(default)]
    pub storage_bucket: Option<String>,
    #[serde(default)]
    pub sync_interval_secs: Option<u64>,
}

const fn default_config_version() -> u32 {
    1
}

fn app_dir(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

pub fn default_config_path() -> PathBuf {
    app_dir(dirs::config_dir()).join(CONFIG_FILE_NAME)
}

/// Where the local backend keeps its store when nothing else is configured.
pub fn default_store_path() -> PathBuf {
    app_dir(dirs::data_dir()).join(STORE_FILE_NAME)
}

pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    notesync_core::util::normalize_text_option(value)
}

pub fn normalize_profile_name(value: Option<&str>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl CliProfilesConfig {
    pub fn load() -> Result<Self, String> {
        Self::load_from_path(&default_config_path())
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, String> {
        let path = default_config_path();
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    /// Explicit name, then `NOTESYNC_PROFILE`, then the active profile, then
    /// "default".
    pub fn resolve_profile_name(&self, explicit: Option<&str>) -> String {
        self.resolve_profile_name_with(explicit, std::env::var(ENV_PROFILE).ok().as_deref())
    }

    pub fn resolve_profile_name_with(
        &self,
        explicit: Option<&str>,
        from_env: Option<&str>,
    ) -> String {
        normalize_profile_name(explicit)
            .or_else(|| normalize_profile_name(from_env))
            .or_else(|| normalize_profile_name(self.active_profile.as_deref()))
            .unwrap_or_else(|| "default".to_string())
    }

    pub fn profile(&self, name: &str) -> Option<&CliProfile> {
        self.profiles.get(name)
    }

    pub fn profile_mut_or_default(&mut self, name: &str) -> &mut CliProfile {
        self.profiles.entry(name.to_string()).or_default()
    }

    fn normalize(&mut self) {
        self.active_profile = normalize_profile_name(self.active_profile.as_deref());
        for profile in self.profiles.values_mut() {
            profile.normalize();
        }
    }
}

impl CliProfile {
    /// Profile value for a configuration key, as the core config reads it.
    pub fn lookup(&self, key: &str) -> Option<String> {
        match key {
            ENV_BACKEND => self.backend.map(|kind| kind.to_string()),
            ENV_LOCAL_PATH => self
                .local_path
                .as_ref()
                .map(|path| path.display().to_string()),
            ENV_API_BASE_URL => self.api_base_url.clone(),
            ENV_SUPABASE_URL => self.supabase_url.clone(),
            ENV_SUPABASE_ANON_KEY => self.supabase_anon_key.clone(),
            ENV_STORAGE_BUCKET => self.storage_bucket.clone(),
            ENV_SYNC_INTERVAL_SECS => self.sync_interval_secs.map(|secs| secs.to_string()),
            _ => None,
        }
    }

    fn normalize(&mut self) {
        self.api_base_url = normalize_text_option(self.api_base_url.take())
            .map(|url| url.trim_end_matches('/').to_string());
        self.supabase_url = normalize_text_option(self.supabase_url.take())
            .map(|url| url.trim_end_matches('/').to_string());
        self.supabase_anon_key = normalize_text_option(self.supabase_anon_key.take());
        self.storage_bucket = normalize_text_option(self.storage_bucket.take());
        self.local_path = self
            .local_path
            .take()
            .filter(|path| !path.as_os_str().is_empty());
    }
}
