use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use notesync_core::config::BackendKind;
use notesync_core::NoteType;

#[derive(Parser)]
#[command(name = "notesync")]
#[command(about = "Share notes, tests, prototypes and ideas from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// CLI profile name
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Backend to talk to (overrides profile and environment)
    #[arg(long, global = true, value_enum)]
    pub backend: Option<BackendArg>,

    /// Store file for the local backend
    #[arg(long, global = true, value_name = "PATH")]
    pub local_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the gallery for one view
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        filter: FilterArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Upload a note, test, prototype or idea
    Upload {
        /// Title (at least 5 characters on hosted backends)
        #[arg(long)]
        title: String,
        /// Subject tag, e.g. biology or comp_sci
        #[arg(long)]
        subject: String,
        /// Kind of upload
        #[arg(long = "type", value_enum, default_value_t = ViewArg::Note)]
        note_type: ViewArg,
        /// Short description
        #[arg(long)]
        description: Option<String>,
        /// Author shown on the card
        #[arg(long)]
        author: Option<String>,
        /// File to attach
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
    /// Delete a note
    #[command(alias = "rm")]
    Delete {
        /// Note ID
        id: String,
        /// Admin password (falls back to NOTESYNC_ADMIN_SECRET)
        #[arg(long, value_name = "SECRET")]
        password: Option<String>,
    },
    /// Download the file attached to a note
    Download {
        /// Note ID
        id: String,
        /// Output path (defaults to the stored file name)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Keep the gallery on screen, refreshing periodically until Ctrl-C
    Watch {
        /// Seconds between refreshes (5-300)
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// List recognized subjects
    Subjects,
    /// Sign in to the hosted backend
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Manage CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// View to show
    #[arg(long, value_enum, default_value_t = ViewArg::Note)]
    pub view: ViewArg,
    /// Only show one subject
    #[arg(long)]
    pub subject: Option<String>,
    /// Match title, description, subject or author
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum ViewArg {
    #[default]
    Note,
    Test,
    Prototype,
    Idea,
}

impl From<ViewArg> for NoteType {
    fn from(value: ViewArg) -> Self {
        match value {
            ViewArg::Note => Self::Note,
            ViewArg::Test => Self::Test,
            ViewArg::Prototype => Self::Prototype,
            ViewArg::Idea => Self::Idea,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum BackendArg {
    Local,
    Rest,
    Supabase,
}

impl From<BackendArg> for BackendKind {
    fn from(value: BackendArg) -> Self {
        match value {
            BackendArg::Local => Self::Local,
            BackendArg::Rest => Self::Rest,
            BackendArg::Supabase => Self::Supabase,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Sign in with email and password and store the session in the keychain
    Login {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Exchange a Google ID token for a session
    Google {
        /// ID token issued by Google
        #[arg(long, value_name = "TOKEN")]
        id_token: String,
    },
    /// Print the browser URL that starts a Google sign-in
    GoogleUrl {
        /// Where the provider should send the browser afterwards
        #[arg(long, value_name = "URL")]
        redirect_to: Option<String>,
    },
    /// Show who is signed in
    Status,
    /// Sign out and clear the stored session
    Logout,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update a profile
    Init {
        /// Backend this profile uses
        #[arg(long = "use", value_enum, value_name = "BACKEND")]
        backend: Option<BackendArg>,
        /// REST server base URL
        #[arg(long, value_name = "URL")]
        api_base_url: Option<String>,
        /// Supabase project URL
        #[arg(long, value_name = "URL")]
        supabase_url: Option<String>,
        /// Supabase anon/public key
        #[arg(long, value_name = "KEY")]
        supabase_anon_key: Option<String>,
        /// Storage bucket holding uploaded files
        #[arg(long, value_name = "NAME")]
        storage_bucket: Option<String>,
        /// Store file for the local backend
        #[arg(long = "store", value_name = "PATH")]
        store_path: Option<PathBuf>,
        /// Seconds between refreshes in `watch`
        #[arg(long, value_name = "SECS")]
        sync_interval: Option<u64>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Show the resolved configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
