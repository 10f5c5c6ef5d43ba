//! Note model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::subject::{Subject, SubjectBadge};
use crate::util::iso_timestamp_now;

const ANONYMOUS_AUTHOR: &str = "Anonymous";
const MISSING_DESCRIPTION: &str = "No description provided.";

/// Identifier of a note: a client-generated millisecond timestamp or a
/// server-assigned row id. Sorting by id descending gives newest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NoteId(i64);

impl NoteId {
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl From<i64> for NoteId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// The gallery partition a note belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    /// Baseline type; legacy records without a type land here.
    #[default]
    Note,
    Test,
    Prototype,
    Idea,
}

impl NoteType {
    pub const ALL: [Self; 4] = [Self::Note, Self::Test, Self::Prototype, Self::Idea];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Test => "test",
            Self::Prototype => "prototype",
            Self::Idea => "idea",
        }
    }

    /// Capitalized singular label ("Note", "Test", ...).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Note => "Note",
            Self::Test => "Test",
            Self::Prototype => "Prototype",
            Self::Idea => "Idea",
        }
    }

    /// Lowercase plural used in empty-state messages.
    #[must_use]
    pub const fn plural(self) -> &'static str {
        match self {
            Self::Note => "notes",
            Self::Test => "tests",
            Self::Prototype => "prototypes",
            Self::Idea => "ideas",
        }
    }

    /// Lenient parse: unknown or empty values fall back to [`NoteType::Note`].
    #[must_use]
    pub fn from_lenient(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.parse().ok()).unwrap_or_default()
    }
}

impl fmt::Display for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "note" | "notes" => Ok(Self::Note),
            "test" | "tests" => Ok(Self::Test),
            "prototype" | "prototypes" | "proto" => Ok(Self::Prototype),
            "idea" | "ideas" => Ok(Self::Idea),
            other => Err(format!("unknown note type '{other}'")),
        }
    }
}

impl<'de> Deserialize<'de> for NoteType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Self::from_lenient(raw.as_deref()))
    }
}

/// Whether a file reference carries its payload or points at one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRefKind {
    /// `data:` URL with the encoded payload
    Inline,
    /// Absolute or server-relative URL
    Remote,
}

/// Opaque reference to an uploaded artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileRef(String);

impl FileRef {
    /// Wrap a raw reference; blank values are not references.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw.trim().to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn kind(&self) -> FileRefKind {
        if self.0.starts_with("data:") {
            FileRefKind::Inline
        } else {
            FileRefKind::Remote
        }
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            FileRefKind::Inline => f.write_str("[inline payload]"),
            FileRefKind::Remote => f.write_str(&self.0),
        }
    }
}

/// A user-submitted record pairing metadata with an optional file artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    #[serde(default, deserialize_with = "nullable_string")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub subject: String,
    #[serde(rename = "type", default)]
    pub note_type: NoteType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// ISO-8601 creation timestamp, display only
    #[serde(default, deserialize_with = "nullable_string")]
    pub date: String,
    #[serde(
        default,
        alias = "fileData",
        alias = "fileUrl",
        alias = "file_url",
        deserialize_with = "optional_file_ref",
        skip_serializing_if = "Option::is_none"
    )]
    pub file_ref: Option<FileRef>,
    #[serde(default, alias = "file_name", skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, alias = "user_id", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Note {
    /// Create a note stamped with the current time and no optional fields.
    #[must_use]
    pub fn new(
        id: NoteId,
        title: impl Into<String>,
        subject: impl Into<String>,
        note_type: NoteType,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            subject: subject.into(),
            note_type,
            author: None,
            description: None,
            date: iso_timestamp_now(),
            file_ref: None,
            file_name: None,
            user_id: None,
        }
    }

    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_file(mut self, file_ref: Option<FileRef>, file_name: Option<String>) -> Self {
        self.file_ref = file_ref;
        self.file_name = file_name;
        self
    }

    #[must_use]
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    #[must_use]
    pub const fn has_file(&self) -> bool {
        self.file_ref.is_some()
    }

    /// Author for display; blank or missing authors show as "Anonymous".
    #[must_use]
    pub fn display_author(&self) -> &str {
        self.author
            .as_deref()
            .map(str::trim)
            .filter(|author| !author.is_empty())
            .unwrap_or(ANONYMOUS_AUTHOR)
    }

    #[must_use]
    pub fn display_description(&self) -> &str {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|description| !description.is_empty())
            .unwrap_or(MISSING_DESCRIPTION)
    }

    /// Creation date as `YYYY-MM-DD`, or "Unknown date" when unparseable.
    #[must_use]
    pub fn display_date(&self) -> String {
        let raw = self.date.trim();
        if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(raw) {
            return parsed.format("%Y-%m-%d").to_string();
        }
        if let Ok(parsed) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return parsed.format("%Y-%m-%d").to_string();
        }
        if let Ok(parsed) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return parsed.format("%Y-%m-%d").to_string();
        }
        "Unknown date".to_string()
    }

    #[must_use]
    pub fn badge(&self) -> SubjectBadge {
        Subject::badge_for(&self.subject)
    }
}

fn nullable_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn optional_file_ref<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<FileRef>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.and_then(FileRef::new))
}
