use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use notesync_core::config::{
    BackendConfig, BackendKind, ENV_ADMIN_SECRET, ENV_API_BASE_URL, ENV_BACKEND,
    ENV_SUPABASE_ANON_KEY, ENV_SUPABASE_URL, ENV_SYNC_INTERVAL_SECS,
};
use notesync_core::filter::{SubjectFilter, ViewFilter};
use notesync_core::render::{render, RenderCapabilities, RenderedView};
use notesync_core::{Note, NoteId, NoteType};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use crate::cli::{Cli, Commands, CompletionShell, ViewArg};
use crate::commands::common::{
    format_view_lines, open_controller, parse_note_id, resolve_with_lookup, subject_filter,
    GlobalOptions, ResolvedProfile,
};
use crate::commands::completions::{render_completions, run_completions};
use crate::commands::config::{merge_profile, missing_fields, summarize, ProfileInput};
use crate::commands::delete::run_delete;
use crate::commands::download::{default_output_path, run_download};
use crate::commands::subjects::subject_lines;
use crate::commands::upload::{run_upload, UploadArgs};
use crate::config_profiles::{CliProfile, CliProfilesConfig, ENV_PROFILE};
use crate::error::CliError;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let values: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect();
    move |key| values.get(key).cloned()
}

fn profiles_with(name: &str, profile: CliProfile) -> CliProfilesConfig {
    let mut profiles = BTreeMap::new();
    profiles.insert(name.to_string(), profile);
    CliProfilesConfig {
        version: 1,
        active_profile: Some(name.to_string()),
        profiles,
    }
}

fn local_profile(dir: &TempDir, admin_secret: Option<&str>) -> ResolvedProfile {
    let options = GlobalOptions {
        profile: Some("cli-tests".to_string()),
        backend: Some(BackendKind::Local),
        local_path: Some(dir.path().join("storage.json")),
    };
    let env = admin_secret.map_or_else(Vec::new, |secret| vec![(ENV_ADMIN_SECRET, secret)]);
    resolve_with_lookup(&options, &CliProfilesConfig::default(), env_from(&env)).unwrap()
}

#[test]
fn list_accepts_filter_flags() {
    let cli = Cli::try_parse_from([
        "notesync",
        "list",
        "--view",
        "test",
        "--subject",
        "biology",
        "--search",
        "cell",
        "--json",
    ])
    .unwrap();
    let Commands::List { filter, json } = cli.command else {
        panic!("expected list command");
    };
    assert!(json);
    assert_eq!(filter.view, ViewArg::Test);
    assert_eq!(filter.subject.as_deref(), Some("biology"));
    assert_eq!(filter.search.as_deref(), Some("cell"));
}

#[test]
fn global_flags_work_after_the_subcommand() {
    let cli = Cli::try_parse_from([
        "notesync",
        "rm",
        "42",
        "--backend",
        "rest",
        "--profile",
        "class",
    ])
    .unwrap();
    assert_eq!(cli.profile.as_deref(), Some("class"));
    assert_eq!(cli.backend.map(BackendKind::from), Some(BackendKind::Rest));
    let Commands::Delete { id, password } = cli.command else {
        panic!("expected delete command");
    };
    assert_eq!(id, "42");
    assert_eq!(password, None);
}

#[test]
fn upload_defaults_to_note_type() {
    let cli = Cli::try_parse_from([
        "notesync",
        "upload",
        "--title",
        "Cell Biology",
        "--subject",
        "biology",
    ])
    .unwrap();
    let Commands::Upload { note_type, file, .. } = cli.command else {
        panic!("expected upload command");
    };
    assert_eq!(NoteType::from(note_type), NoteType::Note);
    assert_eq!(file, None);
}

#[test]
fn flags_override_environment_and_profile() {
    let profiles = profiles_with(
        "class",
        CliProfile {
            backend: Some(BackendKind::Rest),
            api_base_url: Some("http://profile.example".to_string()),
            sync_interval_secs: Some(60),
            ..CliProfile::default()
        },
    );

    let from_profile =
        resolve_with_lookup(&GlobalOptions::default(), &profiles, env_from(&[])).unwrap();
    assert_eq!(from_profile.name, "class");
    assert_eq!(
        from_profile.config.backend,
        BackendConfig::Rest {
            base_url: "http://profile.example".to_string()
        }
    );
    assert_eq!(from_profile.config.sync_interval, Duration::from_secs(60));

    let from_env = resolve_with_lookup(
        &GlobalOptions::default(),
        &profiles,
        env_from(&[(ENV_API_BASE_URL, "http://env.example")]),
    )
    .unwrap();
    assert_eq!(
        from_env.config.backend,
        BackendConfig::Rest {
            base_url: "http://env.example".to_string()
        }
    );

    let options = GlobalOptions {
        backend: Some(BackendKind::Local),
        local_path: Some(PathBuf::from("/tmp/notes.json")),
        ..GlobalOptions::default()
    };
    let from_flags = resolve_with_lookup(
        &options,
        &profiles,
        env_from(&[(ENV_BACKEND, "rest")]),
    )
    .unwrap();
    assert_eq!(
        from_flags.config.backend,
        BackendConfig::Local {
            path: PathBuf::from("/tmp/notes.json")
        }
    );
}

#[test]
fn profile_name_comes_from_environment_before_active_profile() {
    let profiles = profiles_with("class", CliProfile::default());
    let resolved = resolve_with_lookup(
        &GlobalOptions::default(),
        &profiles,
        env_from(&[(ENV_PROFILE, "lab")]),
    )
    .unwrap();
    assert_eq!(resolved.name, "lab");
}

#[test]
fn local_backend_defaults_to_the_data_directory() {
    let resolved = resolve_with_lookup(
        &GlobalOptions::default(),
        &CliProfilesConfig::default(),
        env_from(&[]),
    )
    .unwrap();
    let BackendConfig::Local { path } = resolved.config.backend else {
        panic!("expected local backend");
    };
    assert!(path.ends_with("notesync/storage.json"));
}

#[test]
fn partial_supabase_settings_are_rejected() {
    let error = resolve_with_lookup(
        &GlobalOptions::default(),
        &CliProfilesConfig::default(),
        env_from(&[(ENV_SUPABASE_URL, "https://demo.supabase.co")]),
    )
    .unwrap_err();
    assert!(matches!(error, CliError::Core(notesync_core::Error::Config(_))));
}

#[test]
fn parse_note_id_rejects_non_numeric_input() {
    assert_eq!(parse_note_id(" 1001 ").unwrap(), NoteId::new(1001));
    assert!(matches!(
        parse_note_id("abc"),
        Err(CliError::InvalidNoteId(raw)) if raw == "abc"
    ));
}

#[test]
fn subject_filter_treats_all_and_blank_as_everything() {
    assert_eq!(subject_filter("all"), SubjectFilter::All);
    assert_eq!(subject_filter(" "), SubjectFilter::All);
    assert_eq!(
        subject_filter("biology"),
        SubjectFilter::Only("biology".to_string())
    );
}

#[test]
fn format_view_lines_show_empty_message() {
    let view = RenderedView::Empty {
        message: "No prototypes found.".to_string(),
    };
    assert_eq!(format_view_lines(&view), vec!["No prototypes found."]);
}

#[test]
fn format_view_lines_include_card_fields() {
    let notes = vec![Note::new(NoteId::new(1001), "Cell Biology", "biology", NoteType::Note)
        .with_author("Lee")
        .with_description("Mitosis and meiosis")
        .with_date("2026-01-15")];
    let view = render(
        &notes,
        &ViewFilter::new(NoteType::Note),
        RenderCapabilities::default(),
    );

    let lines = format_view_lines(&view);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("1001"));
    assert!(lines[0].contains("[biology] Cell Biology - Mitosis and meiosis | Lee"));
    assert!(!lines[0].contains("[file]"));
}

#[test]
fn subject_lines_list_every_tag() {
    let lines = subject_lines();
    assert_eq!(lines.len(), 14);
    assert!(lines.iter().any(|line| line.starts_with("comp_sci")));
}

#[test]
fn merge_profile_prefers_explicit_then_env_then_existing() {
    let existing = CliProfile {
        backend: Some(BackendKind::Local),
        supabase_url: Some("https://old.supabase.co".to_string()),
        supabase_anon_key: Some("old-key".to_string()),
        storage_bucket: Some("old-bucket".to_string()),
        ..CliProfile::default()
    };
    let input = ProfileInput {
        backend: Some(BackendKind::Supabase),
        supabase_url: Some(" https://new.supabase.co/ ".to_string()),
        ..ProfileInput::default()
    };

    let merged = merge_profile(
        &existing,
        input,
        env_from(&[
            (ENV_SUPABASE_URL, "https://env.supabase.co"),
            (ENV_SUPABASE_ANON_KEY, "env-key"),
            (ENV_SYNC_INTERVAL_SECS, "45"),
        ]),
    )
    .unwrap();

    assert_eq!(merged.backend, Some(BackendKind::Supabase));
    assert_eq!(
        merged.supabase_url.as_deref(),
        Some("https://new.supabase.co")
    );
    assert_eq!(merged.supabase_anon_key.as_deref(), Some("env-key"));
    assert_eq!(merged.storage_bucket.as_deref(), Some("old-bucket"));
    assert_eq!(merged.sync_interval_secs, Some(45));
    assert!(missing_fields(&merged).is_empty());
}

#[test]
fn merge_profile_validates_urls_and_interval() {
    let bad_url = ProfileInput {
        api_base_url: Some("localhost:5000".to_string()),
        ..ProfileInput::default()
    };
    assert!(matches!(
        merge_profile(&CliProfile::default(), bad_url, env_from(&[])),
        Err(CliError::Config(_))
    ));

    let bad_interval = ProfileInput {
        sync_interval_secs: Some(2),
        ..ProfileInput::default()
    };
    assert!(merge_profile(&CliProfile::default(), bad_interval, env_from(&[])).is_err());
}

#[test]
fn missing_fields_depend_on_backend() {
    let rest = CliProfile {
        backend: Some(BackendKind::Rest),
        ..CliProfile::default()
    };
    assert_eq!(missing_fields(&rest), vec!["api_base_url"]);

    let supabase = CliProfile {
        backend: Some(BackendKind::Supabase),
        supabase_url: Some("https://demo.supabase.co".to_string()),
        ..CliProfile::default()
    };
    assert_eq!(missing_fields(&supabase), vec!["supabase_anon_key"]);
    assert!(missing_fields(&CliProfile::default()).is_empty());
}

#[test]
fn config_summary_never_includes_secrets() {
    let resolved = resolve_with_lookup(
        &GlobalOptions::default(),
        &CliProfilesConfig::default(),
        env_from(&[
            (ENV_SUPABASE_URL, "https://demo.supabase.co"),
            (ENV_SUPABASE_ANON_KEY, "anon-key-value"),
            (ENV_ADMIN_SECRET, "GOAT_SYNC_2026"),
        ]),
    )
    .unwrap();
    let summary = summarize(&resolved);
    assert_eq!(summary.backend, BackendKind::Supabase);
    assert!(summary.admin_secret_set);

    let rendered = serde_json::to_string(&summary).unwrap();
    assert!(!rendered.contains("anon-key-value"));
    assert!(!rendered.contains("GOAT_SYNC_2026"));
}

#[test]
fn completions_use_the_binary_name() {
    let script = String::from_utf8(render_completions(CompletionShell::Bash)).unwrap();
    assert!(script.contains("notesync"));
}

#[test]
fn completions_can_be_written_to_a_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notesync.fish");
    run_completions(CompletionShell::Fish, Some(&path)).unwrap();
    let script = std::fs::read_to_string(&path).unwrap();
    assert!(script.contains("complete -c notesync"));
}

#[test]
fn default_output_path_strips_directories() {
    assert_eq!(
        default_output_path("../../etc/notes.pdf", "7"),
        PathBuf::from("notes.pdf")
    );
    assert_eq!(default_output_path("", " 7 "), PathBuf::from("note-7"));
}

#[tokio::test(flavor = "current_thread")]
async fn upload_download_and_delete_against_local_store() {
    let dir = TempDir::new().unwrap();
    let resolved = local_profile(&dir, Some("GOAT_SYNC_2026"));

    let attachment = dir.path().join("cells.txt");
    std::fs::write(&attachment, b"mitochondria").unwrap();
    run_upload(
        &resolved,
        UploadArgs {
            title: "Cell Biology".to_string(),
            subject: "biology".to_string(),
            note_type: NoteType::Note,
            description: Some("Mitosis and meiosis".to_string()),
            author: Some("Lee".to_string()),
            file: Some(attachment),
        },
    )
    .await
    .unwrap();

    let controller = open_controller(&resolved).await.unwrap();
    assert_eq!(controller.notes().len(), 1);
    let note = controller.notes()[0].clone();
    assert_eq!(note.title, "Cell Biology");
    assert_eq!(note.file_name.as_deref(), Some("cells.txt"));

    let output = dir.path().join("downloaded.txt");
    run_download(&resolved, &note.id.to_string(), Some(&output))
        .await
        .unwrap();
    assert_eq!(std::fs::read(&output).unwrap(), b"mitochondria");

    let wrong = run_delete(&resolved, &note.id.to_string(), Some("nope")).await;
    assert!(matches!(
        wrong,
        Err(CliError::Core(notesync_core::Error::Unauthorized(_)))
    ));

    run_delete(&resolved, &note.id.to_string(), None)
        .await
        .unwrap();
    let controller = open_controller(&resolved).await.unwrap();
    assert!(controller.notes().is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn upload_without_file_is_rejected_by_local_store() {
    let dir = TempDir::new().unwrap();
    let resolved = local_profile(&dir, None);

    let result = run_upload(
        &resolved,
        UploadArgs {
            title: "Cell Biology".to_string(),
            subject: "biology".to_string(),
            note_type: NoteType::Note,
            description: None,
            author: None,
            file: None,
        },
    )
    .await;

    assert!(matches!(
        result,
        Err(CliError::Core(notesync_core::Error::Validation(message)))
            if message == notesync_core::upload::MSG_MISSING_FIELDS
    ));
}

#[tokio::test(flavor = "current_thread")]
async fn delete_without_secret_is_unavailable_locally() {
    let dir = TempDir::new().unwrap();
    let resolved = local_profile(&dir, None);
    let attachment = dir.path().join("idea.md");
    std::fs::write(&attachment, b"# idea").unwrap();
    run_upload(
        &resolved,
        UploadArgs {
            title: "Solar kettle".to_string(),
            subject: "idea".to_string(),
            note_type: NoteType::Idea,
            description: None,
            author: None,
            file: Some(attachment),
        },
    )
    .await
    .unwrap();

    let controller = open_controller(&resolved).await.unwrap();
    let id = controller.notes()[0].id.to_string();
    assert!(run_delete(&resolved, &id, Some("anything")).await.is_err());
    assert!(run_delete(&resolved, "not-a-number", None).await.is_err());
}
