use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use notesync_core::config::{BackendKind, ClientConfig, ENV_BACKEND, ENV_LOCAL_PATH};
use notesync_core::filter::SubjectFilter;
use notesync_core::notify::{Notification, Notifier, Severity};
use notesync_core::render::{Card, RenderSink, RenderedView};
use notesync_core::util::normalize_text_option;
use notesync_core::{Controller, NoteId, NoteType};

use crate::auth::SessionStore;
use crate::cli::FilterArgs;
use crate::config_profiles::{default_store_path, CliProfilesConfig, ENV_PROFILE};
use crate::error::CliError;

/// Flags accepted by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub profile: Option<String>,
    pub backend: Option<BackendKind>,
    pub local_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ResolvedProfile {
    pub name: String,
    pub config: ClientConfig,
}

pub fn resolve_profile(options: &GlobalOptions) -> Result<ResolvedProfile, CliError> {
    let profiles = CliProfilesConfig::load().map_err(CliError::Config)?;
    resolve_with_lookup(options, &profiles, |key| env::var(key).ok())
}

/// Layer flags over the environment over the saved profile. The local
/// backend falls back to the per-user data directory.
pub fn resolve_with_lookup<F>(
    options: &GlobalOptions,
    profiles: &CliProfilesConfig,
    env_lookup: F,
) -> Result<ResolvedProfile, CliError>
where
    F: Fn(&str) -> Option<String>,
{
    let name = profiles.resolve_profile_name_with(
        options.profile.as_deref(),
        env_lookup(ENV_PROFILE).as_deref(),
    );
    let profile = profiles.profile(&name).cloned().unwrap_or_default();
    let store_path = options
        .local_path
        .clone()
        .unwrap_or_else(default_store_path);

    let config = ClientConfig::from_lookup(|key| {
        let explicit = match key {
            ENV_BACKEND => options.backend.map(|kind| kind.to_string()),
            ENV_LOCAL_PATH => options
                .local_path
                .as_ref()
                .map(|path| path.display().to_string()),
            _ => None,
        };
        explicit
            .or_else(|| normalize_text_option(env_lookup(key)))
            .or_else(|| profile.lookup(key))
            .or_else(|| (key == ENV_LOCAL_PATH).then(|| store_path.display().to_string()))
    })?;

    Ok(ResolvedProfile { name, config })
}

/// Build the backend for a profile and load the first snapshot.
pub async fn open_controller(resolved: &ResolvedProfile) -> Result<Controller, CliError> {
    let mut controller = build_controller(resolved)?;
    controller.refresh().await?;
    Ok(controller)
}

pub fn build_controller(resolved: &ResolvedProfile) -> Result<Controller, CliError> {
    let backend = resolved.config.backend.build(
        resolved.config.admin_secret.clone(),
        SessionStore::new(&resolved.name),
    )?;
    Ok(Controller::new(backend, Arc::new(TerminalNotifier))
        .with_admin_secret_hint(resolved.config.admin_secret.clone()))
}

/// Point the controller at the view, subject and search given on the
/// command line.
pub fn apply_filter(controller: &mut Controller, filter: &FilterArgs) -> RenderedView {
    controller.set_view(NoteType::from(filter.view));
    if let Some(subject) = filter.subject.as_deref() {
        controller.set_subject(subject_filter(subject));
    }
    controller.set_search(filter.search.clone().unwrap_or_default())
}

pub fn subject_filter(raw: &str) -> SubjectFilter {
    raw.parse().unwrap_or_default()
}

pub fn parse_note_id(raw: &str) -> Result<NoteId, CliError> {
    raw.parse::<NoteId>()
        .map_err(|_| CliError::InvalidNoteId(raw.to_string()))
}

/// Successes go to stdout, failures to stderr.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Success => println!("{}", notification.message),
            Severity::Error => eprintln!("{}", notification.message),
        }
    }
}

/// Redraws the gallery on every render.
pub struct TerminalRenderer;

impl RenderSink for TerminalRenderer {
    fn show(&self, view: &RenderedView) {
        let mut stdout = io::stdout().lock();
        // ANSI clear screen and home cursor
        let _ = write!(stdout, "\x1b[2J\x1b[H");
        for line in format_view_lines(view) {
            let _ = writeln!(stdout, "{line}");
        }
        let _ = stdout.flush();
    }
}

pub fn format_view_lines(view: &RenderedView) -> Vec<String> {
    match view {
        RenderedView::Empty { message } => vec![message.clone()],
        RenderedView::Cards { cards } => cards.iter().map(format_card_line).collect(),
    }
}

fn format_card_line(card: &Card) -> String {
    let mut line = format!(
        "{:<15} [{}] {} - {} | {} | {}",
        card.id.to_string(),
        card.badge.label,
        card.title,
        card.description,
        card.author,
        card.date
    );
    if card.download.is_some() {
        line.push_str(" [file]");
    }
    line
}
