//! In-memory ordered collection of recording summaries.

use super::model::Recording;

/// The client-side view of the user's recordings.
///
/// The store is refreshed wholesale from the list endpoint and keeps the
/// server's ordering. Entries are removed only after the server has
/// confirmed a delete; there is no optimistic removal.
#[derive(Debug, Default)]
pub struct RecordingStore {
    entries: Vec<Recording>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole collection with a fresh server listing.
    pub fn replace_all(&mut self, recordings: Vec<Recording>) {
        self.entries = recordings;
    }

    /// Removes the entry with the given id, preserving the relative order of
    /// the remainder. Returns the removed recording, or None when no entry
    /// matches (the collection is then unchanged).
    pub fn remove(&mut self, id: i64) -> Option<Recording> {
        let position = self.entries.iter().position(|r| r.id == id)?;
        Some(self.entries.remove(position))
    }

    /// Looks up a recording by 1-based display index (1 = most recent).
    pub fn by_index(&self, index: usize) -> Option<&Recording> {
        index.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recording> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(id: i64) -> Recording {
        serde_json::from_str(&format!(
            r#"{{"id": {id}, "filename": "recording_{id}.wav"}}"#
        ))
        .unwrap()
    }

    #[test]
    fn remove_deletes_exactly_one_entry_preserving_order() {
        let mut store = RecordingStore::new();
        store.replace_all(vec![recording(3), recording(2), recording(1)]);

        let removed = store.remove(2).unwrap();
        assert_eq!(removed.id, 2);

        let remaining: Vec<i64> = store.iter().map(|r| r.id).collect();
        assert_eq!(remaining, vec![3, 1]);
    }

    #[test]
    fn remove_with_unknown_id_leaves_store_unchanged() {
        let mut store = RecordingStore::new();
        store.replace_all(vec![recording(3), recording(2)]);

        assert!(store.remove(99).is_none());
        let ids: Vec<i64> = store.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn by_index_is_one_based() {
        let mut store = RecordingStore::new();
        store.replace_all(vec![recording(5), recording(4)]);

        assert_eq!(store.by_index(1).unwrap().id, 5);
        assert_eq!(store.by_index(2).unwrap().id, 4);
        assert!(store.by_index(0).is_none());
        assert!(store.by_index(3).is_none());
    }
}
