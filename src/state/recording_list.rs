use crate::models::Recording;
use std::path::Path;

/// In-memory recordings in insertion order (newest last)
#[derive(Debug, Clone, Default)]
pub struct RecordingList {
    items: Vec<Recording>,
}

impl RecordingList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finished recording
    pub fn add_item(&mut self, recording: Recording) {
        self.items.push(recording);
    }

    /// Remove the entry for a recording's file; no-op if it is not in the list
    pub fn remove_item(&mut self, recording: &Recording) -> bool {
        match self
            .items
            .iter()
            .position(|r| r.file_path == recording.file_path)
        {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    /// Get a recording by file path
    pub fn get(&self, path: &Path) -> Option<&Recording> {
        self.items.iter().find(|r| r.file_path == path)
    }

    /// Get a mutable recording by file path
    pub fn get_mut(&mut self, path: &Path) -> Option<&mut Recording> {
        self.items.iter_mut().find(|r| r.file_path == path)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Recording> {
        self.items.iter()
    }

    /// Display order: most recent first
    pub fn newest_first(&self) -> impl Iterator<Item = &Recording> {
        self.items.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<Vec<Recording>> for RecordingList {
    fn from(items: Vec<Recording>) -> Self {
        Self { items }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn recording(millis: i64) -> Recording {
        Recording::new(PathBuf::from(format!("/r/{}", millis)), millis)
    }

    #[test]
    fn test_add_appends_and_display_reverses() {
        let mut list = RecordingList::new();
        list.add_item(recording(1));
        list.add_item(recording(2));
        list.add_item(recording(3));

        let stored: Vec<i64> = list.iter().map(|r| r.created_at_millis).collect();
        let shown: Vec<i64> = list.newest_first().map(|r| r.created_at_millis).collect();
        assert_eq!(stored, vec![1, 2, 3]);
        assert_eq!(shown, vec![3, 2, 1]);
    }

    #[test]
    fn test_remove_item() {
        let mut list = RecordingList::from(vec![recording(1), recording(2)]);
        assert!(list.remove_item(&recording(1)));
        assert!(!list.remove_item(&recording(1)));
        assert!(!list.remove_item(&recording(9)));
        assert_eq!(list.len(), 1);
        assert!(list.get(Path::new("/r/2")).is_some());
    }

    #[test]
    fn test_remove_item_matches_by_file() {
        let mut list = RecordingList::from(vec![recording(1)]);
        let stale = recording(1);
        list.get_mut(Path::new("/r/1")).unwrap().name = "Renamed".to_string();

        assert!(list.remove_item(&stale));
        assert!(list.is_empty());
    }

    #[test]
    fn test_get_mut_renames_in_place() {
        let mut list = RecordingList::from(vec![recording(5)]);
        list.get_mut(Path::new("/r/5")).unwrap().name = "Standup".to_string();
        assert_eq!(list.get(Path::new("/r/5")).unwrap().name, "Standup");
    }
}
