use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] notesync_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid note ID '{0}'")]
    InvalidNoteId(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error(
        "Profile '{0}' has no Supabase configuration. Run `notesync config init --supabase-url <URL> --supabase-anon-key <KEY>` or set SUPABASE_URL and SUPABASE_ANON_KEY."
    )]
    SupabaseNotConfigured(String),
}

impl From<notesync_core::auth::AuthError> for CliError {
    fn from(error: notesync_core::auth::AuthError) -> Self {
        Self::Auth(error.to_string())
    }
}
