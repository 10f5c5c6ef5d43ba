use std::env;
use std::path::PathBuf;

use notesync_core::config::{
    parse_sync_interval, BackendConfig, BackendKind, ENV_API_BASE_URL, ENV_BACKEND,
    ENV_LOCAL_PATH, ENV_STORAGE_BUCKET, ENV_SUPABASE_ANON_KEY, ENV_SUPABASE_URL,
    ENV_SYNC_INTERVAL_SECS,
};
use notesync_core::util::is_http_url;
use serde::Serialize;

use crate::cli::ConfigCommands;
use crate::commands::common::{resolve_profile, GlobalOptions, ResolvedProfile};
use crate::config_profiles::{normalize_text_option, CliProfile, CliProfilesConfig};
use crate::error::CliError;

/// Values given to `config init` on the command line.
#[derive(Debug, Clone, Default)]
pub struct ProfileInput {
    pub backend: Option<BackendKind>,
    pub api_base_url: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub storage_bucket: Option<String>,
    pub store_path: Option<PathBuf>,
    pub sync_interval_secs: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ConfigSummary {
    pub profile: String,
    pub backend: BackendKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supabase_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_bucket: Option<String>,
    pub admin_secret_set: bool,
    pub sync_interval_secs: u64,
}

pub fn run_config(command: ConfigCommands, options: &GlobalOptions) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            backend,
            api_base_url,
            supabase_url,
            supabase_anon_key,
            storage_bucket,
            store_path,
            sync_interval,
            no_activate,
        } => {
            let input = ProfileInput {
                backend: backend.map(BackendKind::from),
                api_base_url,
                supabase_url,
                supabase_anon_key,
                storage_bucket,
                store_path,
                sync_interval_secs: sync_interval,
            };
            run_config_init(options.profile.as_deref(), input, no_activate)
        }
        ConfigCommands::Show { json } => {
            let resolved = resolve_profile(options)?;
            let summary = summarize(&resolved);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                for line in format_summary_lines(&summary) {
                    println!("{line}");
                }
            }
            Ok(())
        }
    }
}

pub fn run_config_init(
    profile_name: Option<&str>,
    input: ProfileInput,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let existing = config.profile(&profile_name).cloned().unwrap_or_default();

    let merged = merge_profile(&existing, input, |key| env::var(key).ok())?;
    *config.profile_mut_or_default(&profile_name) = merged.clone();
    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let missing = missing_fields(&merged);
    if missing.is_empty() {
        println!("Profile '{profile_name}' is ready.");
    } else {
        println!(
            "Profile '{}' is missing: {}",
            profile_name,
            missing.join(", ")
        );
    }
    Ok(())
}

/// Explicit values win over the environment, which wins over what the
/// profile already holds.
pub fn merge_profile<F>(
    existing: &CliProfile,
    input: ProfileInput,
    env_lookup: F,
) -> Result<CliProfile, CliError>
where
    F: Fn(&str) -> Option<String>,
{
    let from_env = |key: &str| normalize_text_option(env_lookup(key));

    let backend = match input.backend {
        Some(kind) => Some(kind),
        None => from_env(ENV_BACKEND)
            .map(|raw| raw.parse::<BackendKind>().map_err(CliError::Config))
            .transpose()?
            .or(existing.backend),
    };
    let sync_interval_secs = match input.sync_interval_secs {
        Some(secs) => Some(secs),
        None => from_env(ENV_SYNC_INTERVAL_SECS)
            .map(|raw| raw.trim().parse::<u64>())
            .transpose()
            .map_err(|_| {
                CliError::Config(format!("{ENV_SYNC_INTERVAL_SECS} must be a whole number"))
            })?
            .or(existing.sync_interval_secs),
    };
    if let Some(secs) = sync_interval_secs {
        parse_sync_interval(&secs.to_string())?;
    }

    let merged = CliProfile {
        backend,
        local_path: input
            .store_path
            .filter(|path| !path.as_os_str().is_empty())
            .or_else(|| from_env(ENV_LOCAL_PATH).map(PathBuf::from))
            .or_else(|| existing.local_path.clone()),
        api_base_url: normalize_url(input.api_base_url)
            .or_else(|| normalize_url(from_env(ENV_API_BASE_URL)))
            .or_else(|| existing.api_base_url.clone()),
        supabase_url: normalize_url(input.supabase_url)
            .or_else(|| normalize_url(from_env(ENV_SUPABASE_URL)))
            .or_else(|| existing.supabase_url.clone()),
        supabase_anon_key: normalize_text_option(input.supabase_anon_key)
            .or_else(|| from_env(ENV_SUPABASE_ANON_KEY))
            .or_else(|| existing.supabase_anon_key.clone()),
        storage_bucket: normalize_text_option(input.storage_bucket)
            .or_else(|| from_env(ENV_STORAGE_BUCKET))
            .or_else(|| existing.storage_bucket.clone()),
        sync_interval_secs,
    };

    validate_profile_urls(&merged)?;
    Ok(merged)
}

fn normalize_url(value: Option<String>) -> Option<String> {
    normalize_text_option(value).map(|url| url.trim_end_matches('/').to_string())
}

fn validate_profile_urls(profile: &CliProfile) -> Result<(), CliError> {
    if let Some(url) = profile.supabase_url.as_deref() {
        if !is_http_url(url) {
            return Err(CliError::Config(
                "supabase_url must include http:// or https://".to_string(),
            ));
        }
    }
    if let Some(url) = profile.api_base_url.as_deref() {
        if !is_http_url(url) {
            return Err(CliError::Config(
                "api_base_url must include http:// or https://".to_string(),
            ));
        }
    }
    Ok(())
}

/// Fields the selected backend still needs.
pub fn missing_fields(profile: &CliProfile) -> Vec<&'static str> {
    let mut missing = Vec::new();
    match profile.backend {
        Some(BackendKind::Rest) => {
            if profile.api_base_url.is_none() {
                missing.push("api_base_url");
            }
        }
        Some(BackendKind::Supabase) => {
            if profile.supabase_url.is_none() {
                missing.push("supabase_url");
            }
            if profile.supabase_anon_key.is_none() {
                missing.push("supabase_anon_key");
            }
        }
        Some(BackendKind::Local) | None => {}
    }
    missing
}

pub fn summarize(resolved: &ResolvedProfile) -> ConfigSummary {
    let config = &resolved.config;
    let mut summary = ConfigSummary {
        profile: resolved.name.clone(),
        backend: config.backend.kind(),
        local_path: None,
        api_base_url: None,
        supabase_url: None,
        storage_bucket: None,
        admin_secret_set: config.admin_secret.is_some(),
        sync_interval_secs: config.sync_interval.as_secs(),
    };
    match &config.backend {
        BackendConfig::Local { path } => summary.local_path = Some(path.clone()),
        BackendConfig::Rest { base_url } => summary.api_base_url = Some(base_url.clone()),
        BackendConfig::Supabase { url, bucket, .. } => {
            summary.supabase_url = Some(url.clone());
            summary.storage_bucket = Some(bucket.clone());
        }
    }
    summary
}

pub fn format_summary_lines(summary: &ConfigSummary) -> Vec<String> {
    let mut lines = vec![
        format!("profile:        {}", summary.profile),
        format!("backend:        {}", summary.backend),
    ];
    if let Some(path) = &summary.local_path {
        lines.push(format!("local_path:     {}", path.display()));
    }
    if let Some(url) = &summary.api_base_url {
        lines.push(format!("api_base_url:   {url}"));
    }
    if let Some(url) = &summary.supabase_url {
        lines.push(format!("supabase_url:   {url}"));
    }
    if let Some(bucket) = &summary.storage_bucket {
        lines.push(format!("storage_bucket: {bucket}"));
    }
    lines.push(format!(
        "admin_secret:   {}",
        if summary.admin_secret_set { "set" } else { "not set" }
    ));
    lines.push(format!("sync_interval:  {}s", summary.sync_interval_secs));
    lines
}
