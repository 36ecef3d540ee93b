use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::{Note, NoteCode, Phn};
use crate::store::{NoteFile, RecordStore, StoreError};

/// Notes belonging to one patient.
///
/// Codes come from a counter that only ever moves forward, so a deleted
/// code is never handed out again, including after a reload.
pub struct PatientRecord {
    phn: Phn,
    notes: BTreeMap<NoteCode, Note>,
    counter: NoteCode,
    store: Option<Arc<dyn RecordStore>>,
}

impl PatientRecord {
    /// Empty record that is never persisted.
    pub fn in_memory(phn: Phn) -> Self {
        Self {
            phn,
            notes: BTreeMap::new(),
            counter: 0,
            store: None,
        }
    }

    /// Open the record for `phn`, loading whatever `store` holds for it.
    pub fn open(phn: Phn, store: Option<Arc<dyn RecordStore>>) -> Result<Self, StoreError> {
        let Some(store) = store else {
            return Ok(Self::in_memory(phn));
        };
        let file = store.load_notes(phn)?;
        let counter = file.seed();
        let notes = file.notes.into_iter().map(|n| (n.code, n)).collect();
        Ok(Self {
            phn,
            notes,
            counter,
            store: Some(store),
        })
    }

    pub fn phn(&self) -> Phn {
        self.phn
    }

    /// Last code handed out (0 before the first note).
    pub fn counter(&self) -> NoteCode {
        self.counter
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Add a note under the next code.
    ///
    /// A failed save leaves the record as it was before the call.
    pub fn create_note(&mut self, text: impl Into<String>) -> Result<&Note, StoreError> {
        let code = self
            .counter
            .checked_add(1)
            .ok_or(StoreError::CounterExhausted { phn: self.phn })?;
        let previous = self.counter;
        self.counter = code;
        self.notes.insert(code, Note::new(code, text));
        if let Err(e) = self.persist() {
            self.notes.remove(&code);
            self.counter = previous;
            return Err(e);
        }
        tracing::info!(phn = self.phn, code, "Note created");
        Ok(&self.notes[&code])
    }

    pub fn search_note(&self, code: NoteCode) -> Option<&Note> {
        self.notes.get(&code)
    }

    /// Notes whose text contains `text`, ascending by code.
    pub fn retrieve_notes(&self, text: &str) -> Vec<&Note> {
        self.notes.values().filter(|n| n.text.contains(text)).collect()
    }

    /// Replace a note's text. `Ok(None)` when the code is unknown.
    pub fn update_note(
        &mut self,
        code: NoteCode,
        text: impl Into<String>,
    ) -> Result<Option<&Note>, StoreError> {
        let Some(note) = self.notes.get_mut(&code) else {
            return Ok(None);
        };
        note.update(text);
        self.persist()?;
        tracing::info!(phn = self.phn, code, "Note updated");
        Ok(self.notes.get(&code))
    }

    /// Remove a note. `Ok(false)` when the code is unknown.
    pub fn delete_note(&mut self, code: NoteCode) -> Result<bool, StoreError> {
        if self.notes.remove(&code).is_none() {
            return Ok(false);
        }
        self.persist()?;
        tracing::info!(phn = self.phn, code, "Note deleted");
        Ok(true)
    }

    /// All notes, most recent code first.
    pub fn list_notes(&self) -> Vec<&Note> {
        self.notes.values().rev().collect()
    }

    /// Drop every note and the record's file. Returns how many notes went.
    pub(crate) fn delete_all_notes(&mut self) -> Result<usize, StoreError> {
        let removed = self.notes.len();
        self.notes.clear();
        if let Some(store) = &self.store {
            store.remove_notes(self.phn)?;
        }
        Ok(removed)
    }

    /// Move the record to a new PHN, carrying notes and counter along.
    pub(crate) fn rekey(&mut self, new_phn: Phn) -> Result<(), StoreError> {
        let old_phn = self.phn;
        self.phn = new_phn;
        if let Some(store) = &self.store {
            self.persist()?;
            store.remove_notes(old_phn)?;
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), StoreError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let file = NoteFile {
            counter: self.counter,
            notes: self.notes.values().cloned().collect(),
        };
        store.save_notes(self.phn, &file)
    }
}

impl std::fmt::Debug for PatientRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatientRecord")
            .field("phn", &self.phn)
            .field("notes", &self.notes.len())
            .field("counter", &self.counter)
            .field("autosave", &self.store.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::FlakyStore;
    use crate::store::JsonFileStore;

    fn codes(notes: &[&Note]) -> Vec<NoteCode> {
        notes.iter().map(|n| n.code).collect()
    }

    fn file_store() -> (tempfile::TempDir, Arc<dyn RecordStore>) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        (dir, Arc::new(store))
    }

    #[test]
    fn codes_start_at_one_and_increase() {
        let mut record = PatientRecord::in_memory(100);
        assert_eq!(record.create_note("fever").unwrap().code, 1);
        assert_eq!(record.create_note("cough").unwrap().code, 2);
        assert_eq!(record.counter(), 2);
    }

    #[test]
    fn deleted_codes_are_never_reused() {
        let mut record = PatientRecord::in_memory(100);
        for i in 1..=5 {
            record.create_note(format!("note {i}")).unwrap();
        }
        assert!(record.delete_note(3).unwrap());
        assert_eq!(record.create_note("late entry").unwrap().code, 6);
    }

    #[test]
    fn search_returns_none_for_unknown_code() {
        let mut record = PatientRecord::in_memory(100);
        record.create_note("fever").unwrap();
        assert_eq!(record.search_note(1).unwrap().text, "fever");
        assert!(record.search_note(2).is_none());
    }

    #[test]
    fn retrieve_matches_substring_in_ascending_order() {
        let mut record = PatientRecord::in_memory(100);
        record.create_note("Patient reports fever").unwrap();
        record.create_note("cough, no fever").unwrap();
        record.create_note("rash on left arm").unwrap();

        let found = record.retrieve_notes("fever");
        assert_eq!(codes(&found), vec![1, 2]);
        assert!(record.retrieve_notes("migraine").is_empty());
    }

    #[test]
    fn update_changes_text_and_keeps_code() {
        let mut record = PatientRecord::in_memory(100);
        record.create_note("fever").unwrap();
        let updated = record.update_note(1, "high fever").unwrap().unwrap();
        assert_eq!(updated.code, 1);
        assert_eq!(updated.text, "high fever");
        assert_eq!(record.counter(), 1);
    }

    #[test]
    fn update_and_delete_report_unknown_code() {
        let mut record = PatientRecord::in_memory(100);
        assert!(record.update_note(9, "nothing").unwrap().is_none());
        assert!(!record.delete_note(9).unwrap());
    }

    #[test]
    fn list_is_most_recent_first() {
        let mut record = PatientRecord::in_memory(100);
        record.create_note("fever").unwrap();
        record.create_note("cough").unwrap();
        record.delete_note(1).unwrap();
        record.create_note("rash").unwrap();
        assert_eq!(codes(&record.list_notes()), vec![3, 2]);
    }

    #[test]
    fn in_memory_record_writes_nothing() {
        let store = Arc::new(FlakyStore::default());
        let persisted = PatientRecord::open(100, Some(store.clone())).unwrap();
        assert!(persisted.is_empty());

        let mut record = PatientRecord::open(100, None).unwrap();
        record.create_note("fever").unwrap();
        record.update_note(1, "high fever").unwrap();
        record.create_note("cough").unwrap();
        record.delete_note(2).unwrap();
        record.rekey(200).unwrap();
        record.delete_all_notes().unwrap();

        assert_eq!(store.writes(), 0);
        assert!(store.stored_notes(100).is_none());
        assert!(store.stored_notes(200).is_none());
    }

    #[test]
    fn exhausted_counter_refuses_new_notes() {
        let store = Arc::new(FlakyStore::default());
        store
            .save_notes(
                1,
                &NoteFile {
                    counter: NoteCode::MAX,
                    notes: vec![],
                },
            )
            .unwrap();
        let writes = store.writes();

        let mut record = PatientRecord::open(1, Some(store.clone())).unwrap();
        let err = record.create_note("one too many").unwrap_err();
        assert!(matches!(err, StoreError::CounterExhausted { phn: 1 }));
        assert_eq!(record.counter(), NoteCode::MAX);
        assert!(record.is_empty());
        assert_eq!(store.writes(), writes);
    }

    #[test]
    fn failed_save_rolls_back_created_note() {
        let store = Arc::new(FlakyStore::default());
        let mut record = PatientRecord::open(100, Some(store.clone())).unwrap();
        record.create_note("fever").unwrap();

        store.set_failing(true);
        assert!(matches!(
            record.create_note("cough"),
            Err(StoreError::Io(_))
        ));
        assert_eq!(record.len(), 1);
        assert_eq!(record.counter(), 1);
        assert!(record.search_note(2).is_none());

        store.set_failing(false);
        assert_eq!(record.create_note("cough").unwrap().code, 2);
        let saved = store.stored_notes(100).unwrap();
        assert_eq!(saved.counter, 2);
        assert_eq!(saved.notes.len(), 2);
    }

    #[test]
    fn reopened_record_keeps_notes_and_counter() {
        let (_dir, store) = file_store();
        {
            let mut record = PatientRecord::open(100, Some(store.clone())).unwrap();
            record.create_note("fever").unwrap();
            record.create_note("cough").unwrap();
            record.create_note("rash").unwrap();
            record.delete_note(3).unwrap();
            record.update_note(1, "fever, resolved").unwrap();
        }

        let mut record = PatientRecord::open(100, Some(store)).unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(record.search_note(1).unwrap().text, "fever, resolved");
        assert_eq!(record.create_note("follow-up").unwrap().code, 4);
    }

    #[test]
    fn delete_all_notes_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let json = JsonFileStore::open(dir.path()).unwrap();
        let path = json.notes_path(100);
        let store: Arc<dyn RecordStore> = Arc::new(json);

        let mut record = PatientRecord::open(100, Some(store)).unwrap();
        record.create_note("fever").unwrap();
        record.create_note("cough").unwrap();
        assert!(path.exists());

        assert_eq!(record.delete_all_notes().unwrap(), 2);
        assert!(record.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn rekey_moves_file_to_new_phn() {
        let dir = tempfile::tempdir().unwrap();
        let json = JsonFileStore::open(dir.path()).unwrap();
        let old_path = json.notes_path(100);
        let new_path = json.notes_path(200);
        let store: Arc<dyn RecordStore> = Arc::new(json);

        let mut record = PatientRecord::open(100, Some(store.clone())).unwrap();
        record.create_note("fever").unwrap();
        record.rekey(200).unwrap();

        assert_eq!(record.phn(), 200);
        assert!(!old_path.exists());
        assert!(new_path.exists());
        let reopened = PatientRecord::open(200, Some(store)).unwrap();
        assert_eq!(reopened.search_note(1).unwrap().text, "fever");
    }
}
