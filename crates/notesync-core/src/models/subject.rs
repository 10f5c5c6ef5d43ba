//! Subject tags and their display badges

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

const DEFAULT_ICON: &str = "document-text";
const DEFAULT_COLOR: &str = "default";

/// Recognized subject categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    Mathematics,
    Biology,
    Chemistry,
    Physics,
    EnglishLanguage,
    EnglishLiterature,
    Geography,
    History,
    Economics,
    ComputerScience,
    Business,
    GeneralPaper,
    Idea,
    Prototype,
}

/// Icon, color class and label shown on a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectBadge {
    pub icon: String,
    pub color_class: String,
    pub label: String,
}

impl Subject {
    pub const ALL: [Self; 14] = [
        Self::Mathematics,
        Self::Biology,
        Self::Chemistry,
        Self::Physics,
        Self::EnglishLanguage,
        Self::EnglishLiterature,
        Self::Geography,
        Self::History,
        Self::Economics,
        Self::ComputerScience,
        Self::Business,
        Self::GeneralPaper,
        Self::Idea,
        Self::Prototype,
    ];

    /// Wire tag stored in the `subject` field.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Mathematics => "mathematics",
            Self::Biology => "biology",
            Self::Chemistry => "chemistry",
            Self::Physics => "physics",
            Self::EnglishLanguage => "english_lang",
            Self::EnglishLiterature => "english_lit",
            Self::Geography => "geography",
            Self::History => "history",
            Self::Economics => "economics",
            Self::ComputerScience => "comp_sci",
            Self::Business => "business",
            Self::GeneralPaper => "gp",
            Self::Idea => "idea",
            Self::Prototype => "proto",
        }
    }

    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Mathematics => "calculator",
            Self::Biology => "leaf",
            Self::Chemistry => "flask",
            Self::Physics => "magnet",
            Self::EnglishLanguage => "language",
            Self::EnglishLiterature => "book",
            Self::Geography => "earth",
            Self::History => "time",
            Self::Economics => "stats-chart",
            Self::ComputerScience => "code-working",
            Self::Business => "briefcase",
            Self::GeneralPaper => "globe",
            Self::Idea => "bulb",
            Self::Prototype => "construct",
        }
    }

    #[must_use]
    pub const fn color_class(self) -> &'static str {
        match self {
            Self::Idea => "cat1",
            Self::Prototype => "cat2",
            other => other.tag(),
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Mathematics => "mathematics",
            Self::Biology => "biology",
            Self::Chemistry => "chemistry",
            Self::Physics => "physics",
            Self::EnglishLanguage => "english lang",
            Self::EnglishLiterature => "english lit",
            Self::Geography => "geography",
            Self::History => "history",
            Self::Economics => "economics",
            Self::ComputerScience => "comp sci",
            Self::Business => "business",
            Self::GeneralPaper => "gp",
            Self::Idea => "Idea",
            Self::Prototype => "Prototype",
        }
    }

    #[must_use]
    pub fn badge(self) -> SubjectBadge {
        SubjectBadge {
            icon: self.icon().to_string(),
            color_class: self.color_class().to_string(),
            label: self.label().to_string(),
        }
    }

    /// Badge for a raw subject tag, falling back to the default badge.
    #[must_use]
    pub fn badge_for(raw: &str) -> SubjectBadge {
        raw.parse::<Self>().map_or_else(
            |_| SubjectBadge {
                icon: DEFAULT_ICON.to_string(),
                color_class: DEFAULT_COLOR.to_string(),
                label: raw.trim().replacen('_', " ", 1),
            },
            Self::badge,
        )
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Subject {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|subject| subject.tag() == normalized)
            .ok_or_else(|| format!("unknown subject '{}'", s.trim()))
    }
}
