//! In-memory cache of the backend's note collection.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::backend::NoteBackend;
use crate::models::{Note, NoteId};
use crate::{Error, Result};

/// Ordered snapshot of the authoritative collection.
#[derive(Debug, Clone, Default)]
pub struct NoteStore {
    notes: Vec<Note>,
    last_refreshed_at: Option<DateTime<Utc>>,
}

impl NoteStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    #[must_use]
    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: NoteId) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    #[must_use]
    pub const fn last_refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed_at
    }

    /// Replace the cache with a fresh snapshot. On error the cache is left
    /// exactly as it was.
    pub async fn refresh(&mut self, backend: &dyn NoteBackend) -> Result<usize> {
        let snapshot = backend.fetch_all().await?;
        self.replace(snapshot);
        Ok(self.notes.len())
    }

    /// Swap in `snapshot`, keeping the first record for any repeated id.
    pub fn replace(&mut self, snapshot: Vec<Note>) {
        let mut seen = HashSet::with_capacity(snapshot.len());
        let total = snapshot.len();
        let notes: Vec<Note> = snapshot
            .into_iter()
            .filter(|note| seen.insert(note.id))
            .collect();
        if notes.len() != total {
            tracing::warn!(
                "Dropped {} duplicate note id(s) from snapshot",
                total - notes.len()
            );
        }
        self.notes = notes;
        self.last_refreshed_at = Some(Utc::now());
    }

    /// Prepend a newly created note.
    pub fn insert(&mut self, note: Note) -> Result<()> {
        if self.contains(note.id) {
            return Err(Error::Validation(format!(
                "Note {} is already in the store",
                note.id
            )));
        }
        self.notes.insert(0, note);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::backend::{CreateReceipt, DeleteCredential, DeletionCapability, NoteDraft};
    use crate::models::NoteType;
    use crate::upload::ValidationPolicy;

    struct FailingBackend;

    #[async_trait]
    impl NoteBackend for FailingBackend {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn validation_policy(&self) -> ValidationPolicy {
            ValidationPolicy::minimal()
        }

        fn deletion_capability(&self) -> DeletionCapability {
            DeletionCapability::Unavailable
        }

        async fn fetch_all(&self) -> Result<Vec<Note>> {
            Err(Error::Api("offline".to_string()))
        }

        async fn create(&self, _draft: NoteDraft) -> Result<CreateReceipt> {
            Err(Error::Api("offline".to_string()))
        }

        async fn delete(&self, _id: NoteId, _credential: &DeleteCredential) -> Result<()> {
            Err(Error::Api("offline".to_string()))
        }
    }

    fn note(id: i64, title: &str) -> Note {
        Note::new(NoteId::new(id), title, "biology", NoteType::Note)
    }

    #[test]
    fn insert_prepends_and_rejects_duplicates() {
        let mut store = NoteStore::new();
        store.insert(note(1, "Older")).unwrap();
        store.insert(note(2, "Newer")).unwrap();
        assert_eq!(store.notes()[0].title, "Newer");
        assert!(store.insert(note(1, "Again")).is_err());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn replace_keeps_first_of_duplicate_ids() {
        let mut store = NoteStore::new();
        store.replace(vec![note(3, "First"), note(3, "Second"), note(4, "Other")]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(NoteId::new(3)).unwrap().title, "First");
        assert!(store.last_refreshed_at().is_some());
    }

    #[tokio::test]
    async fn failed_refresh_leaves_store_untouched() {
        let mut store = NoteStore::new();
        store.replace(vec![note(7, "Cached")]);
        let stamp = store.last_refreshed_at();

        assert!(store.refresh(&FailingBackend).await.is_err());
        assert_eq!(store.len(), 1);
        assert_eq!(store.notes()[0].title, "Cached");
        assert_eq!(store.last_refreshed_at(), stamp);
    }
}
