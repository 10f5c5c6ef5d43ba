//! Turns the filtered note list into a display-ready view.

use serde::Serialize;

use crate::filter::ViewFilter;
use crate::models::{Note, NoteId, NoteType, SubjectBadge};

/// What the current actor may do on a card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenderCapabilities {
    pub can_delete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadAction {
    pub label: String,
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteAction {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub id: NoteId,
    pub badge: SubjectBadge,
    pub title: String,
    pub description: String,
    pub author: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download: Option<DownloadAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<DeleteAction>,
}

impl Card {
    #[must_use]
    pub fn from_note(note: &Note, capabilities: RenderCapabilities) -> Self {
        let download = note.file_ref.as_ref().map(|_| DownloadAction {
            label: format!("Download {}", note.note_type.label()),
            file_name: note.file_name.clone(),
        });
        let delete = capabilities.can_delete.then(|| DeleteAction {
            title: note.title.clone(),
        });

        Self {
            id: note.id,
            badge: note.badge(),
            title: note.title.clone(),
            description: note.display_description().to_string(),
            author: note.display_author().to_string(),
            date: note.display_date(),
            download,
            delete,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RenderedView {
    Empty { message: String },
    Cards { cards: Vec<Card> },
}

impl RenderedView {
    #[must_use]
    pub fn cards(&self) -> &[Card] {
        match self {
            Self::Empty { .. } => &[],
            Self::Cards { cards } => cards,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty { .. })
    }
}

/// Message shown when a view has nothing to display.
#[must_use]
pub fn empty_message(view_type: NoteType) -> String {
    format!("No {} found.", view_type.plural())
}

#[must_use]
pub fn render(
    notes: &[Note],
    filter: &ViewFilter,
    capabilities: RenderCapabilities,
) -> RenderedView {
    let visible = filter.apply(notes);
    if visible.is_empty() {
        return RenderedView::Empty {
            message: empty_message(filter.view_type()),
        };
    }

    RenderedView::Cards {
        cards: visible
            .into_iter()
            .map(|note| Card::from_note(note, capabilities))
            .collect(),
    }
}

/// Receives every freshly rendered view.
pub trait RenderSink: Send + Sync {
    fn show(&self, view: &RenderedView);
}
