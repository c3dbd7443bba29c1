//! Document registry owned by the crawl's result loop
//!
//! The registry is never shared: only the result loop reads or writes it, so
//! it needs no locking. Completed records are moved out for emission and
//! replaced by a marker, which keeps their id known for deduplication.

use crate::crawler::types::{DocumentId, DocumentRecord};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

enum Slot {
    Open(DocumentRecord),
    Completed,
}

/// Map from document id to the record being accumulated for it
#[derive(Default)]
pub(crate) struct DocumentRegistry {
    docs: HashMap<DocumentId, Slot>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the open record for `id`, inserting a default one if the id is
    /// unknown
    ///
    /// Returns `None` for a document that already completed: its record has
    /// been emitted and must not change.
    pub fn get_or_create(&mut self, id: &DocumentId) -> Option<&mut DocumentRecord> {
        let slot = self
            .docs
            .entry(id.clone())
            .or_insert_with(|| Slot::Open(DocumentRecord::new(id.clone())));

        match slot {
            Slot::Open(record) => Some(record),
            Slot::Completed => None,
        }
    }

    /// Registers a newly discovered document
    ///
    /// Returns true if the id was unknown and a default record was created;
    /// false if the id was already discovered (open or completed).
    pub fn discover(&mut self, id: &DocumentId) -> bool {
        match self.docs.entry(id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::Open(DocumentRecord::new(id.clone())));
                true
            }
        }
    }

    /// Marks the document completed and moves its record out for emission
    ///
    /// Returns `None` if the document already completed.
    pub fn complete(&mut self, id: &DocumentId, failure: Option<String>) -> Option<DocumentRecord> {
        let slot = self
            .docs
            .entry(id.clone())
            .or_insert_with(|| Slot::Open(DocumentRecord::new(id.clone())));

        match std::mem::replace(slot, Slot::Completed) {
            Slot::Open(mut record) => {
                record.completed = true;
                record.failure = failure;
                Some(record)
            }
            Slot::Completed => None,
        }
    }

    /// Returns true if `id` has completed
    pub fn is_completed(&self, id: &DocumentId) -> bool {
        matches!(self.docs.get(id), Some(Slot::Completed))
    }

    /// Number of discovered documents, open and completed
    pub fn len(&self) -> usize {
        self.docs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::types::DEFAULT_TITLE;

    #[test]
    fn test_discover_only_once() {
        let mut registry = DocumentRegistry::new();
        let id = DocumentId::new("a");

        assert!(registry.discover(&id));
        assert!(!registry.discover(&id));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_or_create_inserts_default() {
        let mut registry = DocumentRegistry::new();
        let id = DocumentId::new("a");

        let record = registry.get_or_create(&id).unwrap();
        assert_eq!(record.title, DEFAULT_TITLE);
        record.title = "Set".to_string();

        assert_eq!(registry.get_or_create(&id).unwrap().title, "Set");
        assert!(!registry.discover(&id));
        assert!(!registry.is_completed(&id));
    }

    #[test]
    fn test_complete_moves_record_out_once() {
        let mut registry = DocumentRegistry::new();
        let id = DocumentId::new("a");
        registry.discover(&id);
        registry
            .get_or_create(&id)
            .unwrap()
            .links
            .push(DocumentId::new("b"));

        let record = registry.complete(&id, None).unwrap();
        assert!(record.completed);
        assert_eq!(record.links, vec![DocumentId::new("b")]);

        assert!(registry.complete(&id, None).is_none());
        assert!(registry.get_or_create(&id).is_none());
        assert!(registry.is_completed(&id));
        // Completed ids still block rediscovery
        assert!(!registry.discover(&id));
    }

    #[test]
    fn test_complete_with_failure() {
        let mut registry = DocumentRegistry::new();
        let id = DocumentId::new("a");
        registry.discover(&id);

        let record = registry
            .complete(&id, Some("connection refused".to_string()))
            .unwrap();
        assert!(record.is_failed());
        assert_eq!(record.title, DEFAULT_TITLE);
        assert!(record.links.is_empty());
    }
}
