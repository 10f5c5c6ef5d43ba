//! View filter: derives the visible subset of the note store.
//!
//! Three selectors combine conjunctively: the view (note type), the subject
//! filter and a free-text search term. The filter never reorders notes.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::models::{Note, NoteType};

/// Subject selector: everything, or one subject tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectFilter {
    #[default]
    All,
    Only(String),
}

impl SubjectFilter {
    #[must_use]
    pub fn matches(&self, note: &Note) -> bool {
        match self {
            Self::All => true,
            Self::Only(subject) => note.subject == *subject,
        }
    }
}

impl fmt::Display for SubjectFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(subject) => f.write_str(subject),
        }
    }
}

impl FromStr for SubjectFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            Ok(Self::Only(trimmed.to_string()))
        }
    }
}

/// Selector state for the gallery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewFilter {
    view_type: NoteType,
    subject_filter: SubjectFilter,
    search_term: String,
}

impl ViewFilter {
    #[must_use]
    pub fn new(view_type: NoteType) -> Self {
        Self {
            view_type,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn view_type(&self) -> NoteType {
        self.view_type
    }

    #[must_use]
    pub const fn subject_filter(&self) -> &SubjectFilter {
        &self.subject_filter
    }

    #[must_use]
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Switch the view. Subject filter and search term do not survive a
    /// view switch.
    pub fn set_view(&mut self, view_type: NoteType) {
        self.view_type = view_type;
        self.subject_filter = SubjectFilter::All;
        self.search_term.clear();
    }

    pub fn set_subject(&mut self, subject_filter: SubjectFilter) {
        self.subject_filter = subject_filter;
    }

    pub fn set_search(&mut self, search_term: impl Into<String>) {
        self.search_term = search_term.into();
    }

    /// Whether a single note passes all three selectors.
    #[must_use]
    pub fn matches(&self, note: &Note) -> bool {
        note.note_type == self.view_type
            && self.subject_filter.matches(note)
            && matches_search(note, &normalize_query(&self.search_term))
    }

    /// The ordered subsequence of `notes` visible under this filter.
    #[must_use]
    pub fn apply<'a>(&self, notes: &'a [Note]) -> Vec<&'a Note> {
        let query = normalize_query(&self.search_term);
        notes
            .iter()
            .filter(|note| note.note_type == self.view_type)
            .filter(|note| self.subject_filter.matches(note))
            .filter(|note| matches_search(note, &query))
            .collect()
    }
}

/// Blank queries match everything; other queries keep their whitespace.
fn normalize_query(raw: &str) -> String {
    if raw.trim().is_empty() {
        String::new()
    } else {
        raw.to_lowercase()
    }
}

fn matches_search(note: &Note, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let contains = |value: &str| value.to_lowercase().contains(query);
    contains(note.title.as_str())
        || note.description.as_deref().is_some_and(contains)
        || contains(note.subject.as_str())
        || note.author.as_deref().is_some_and(contains)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::NoteId;

    fn sample_notes() -> Vec<Note> {
        vec![
            Note::new(NoteId::new(5), "Cell Biology", "biology", NoteType::Note)
                .with_author("Priya Patel"),
            Note::new(
                NoteId::new(4),
                "Newtonian Mechanics",
                "physics",
                NoteType::Note,
            )
            .with_description("Quick reference for momentum"),
            Note::new(NoteId::new(3), "Mock paper 1", "physics", NoteType::Test),
            Note::new(NoteId::new(2), "Electrolysis", "chemistry", NoteType::Note)
                .with_description("Cell diagrams and half-equations"),
            Note::new(NoteId::new(1), "Solar kiosk", "proto", NoteType::Prototype),
        ]
    }

    fn ids(notes: &[&Note]) -> Vec<i64> {
        notes.iter().map(|note| note.id.value()).collect()
    }

    #[test]
    fn default_filter_shows_note_view_in_store_order() {
        let notes = sample_notes();
        let filter = ViewFilter::default();
        assert_eq!(ids(&filter.apply(&notes)), vec![5, 4, 2]);
    }

    #[test]
    fn subject_filter_narrows_within_view() {
        let notes = sample_notes();
        let mut filter = ViewFilter::default();
        filter.set_subject("physics".parse().unwrap());
        assert_eq!(ids(&filter.apply(&notes)), vec![4]);
    }

    #[test]
    fn search_matches_any_text_field_case_insensitively() {
        let notes = sample_notes();
        let mut filter = ViewFilter::default();

        filter.set_search("CELL");
        assert_eq!(ids(&filter.apply(&notes)), vec![5, 2]);

        filter.set_search("priya");
        assert_eq!(ids(&filter.apply(&notes)), vec![5]);

        filter.set_search("chem");
        assert_eq!(ids(&filter.apply(&notes)), vec![2]);

        filter.set_search("   ");
        assert_eq!(ids(&filter.apply(&notes)), vec![5, 4, 2]);
    }

    #[test]
    fn search_keeps_surrounding_whitespace() {
        let notes = sample_notes();
        let mut filter = ViewFilter::default();

        filter.set_search("gy ");
        assert!(filter.apply(&notes).is_empty());

        filter.set_search("cell ");
        assert_eq!(ids(&filter.apply(&notes)), vec![5, 2]);
    }

    #[test]
    fn selectors_combine_conjunctively() {
        let notes = sample_notes();
        let mut filter = ViewFilter::default();
        filter.set_subject("biology".parse().unwrap());
        filter.set_search("electrolysis");
        assert!(filter.apply(&notes).is_empty());
    }

    #[test]
    fn switching_view_resets_subject_and_search() {
        let notes = sample_notes();
        let mut filter = ViewFilter::default();
        filter.set_subject("physics".parse().unwrap());
        filter.set_search("mock");

        filter.set_view(NoteType::Test);
        assert_eq!(filter.subject_filter(), &SubjectFilter::All);
        assert_eq!(filter.search_term(), "");
        assert_eq!(ids(&filter.apply(&notes)), vec![3]);
    }

    #[test]
    fn apply_agrees_with_matches_for_every_combination() {
        let notes = sample_notes();
        let subjects = ["all", "biology", "physics", "chemistry", "proto", "history"];
        let terms = ["", "cell", "MOCK", "patel", "kiosk", "zzz"];

        for view in NoteType::ALL {
            for subject in subjects {
                for term in terms {
                    let mut filter = ViewFilter::new(view);
                    filter.set_subject(subject.parse().unwrap());
                    filter.set_search(term);

                    let visible = filter.apply(&notes);
                    let expected = notes
                        .iter()
                        .filter(|note| filter.matches(note))
                        .collect::<Vec<_>>();
                    assert_eq!(visible, expected);
                }
            }
        }
    }

    #[test]
    fn subject_filter_parses_all_case_insensitively() {
        assert_eq!("ALL".parse::<SubjectFilter>().unwrap(), SubjectFilter::All);
        assert_eq!("".parse::<SubjectFilter>().unwrap(), SubjectFilter::All);
        assert_eq!(
            "gp".parse::<SubjectFilter>().unwrap(),
            SubjectFilter::Only("gp".to_string())
        );
    }
}
