//! File persistence behind autosave.
//!
//! The DAOs only see the [`RecordStore`] trait. `JsonFileStore` is the
//! on-disk implementation: one `patients.json` holding the ordered patient
//! list and one `<phn>.json` per patient holding its notes and code counter.
//! Every save rewrites the whole file.

mod json;

pub use json::*;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Note, NoteCode, Patient, Phn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupted store file {path}: {reason}")]
    Corrupted { path: PathBuf, reason: String },

    #[error("Malformed user entry at line {line}")]
    MalformedUsers { line: usize },

    #[error("No note codes left for PHN {phn}")]
    CounterExhausted { phn: Phn },
}

/// Persisted form of one patient record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteFile {
    /// Highest code ever handed out. Absent in files written before the
    /// counter was stored, hence the default.
    #[serde(default)]
    pub counter: NoteCode,
    pub notes: Vec<Note>,
}

impl NoteFile {
    /// Counter value to resume from: never below the stored counter, the
    /// note count, or the highest code present.
    pub fn seed(&self) -> NoteCode {
        let max_code = self.notes.iter().map(|n| n.code).max().unwrap_or(0);
        let count = NoteCode::try_from(self.notes.len()).unwrap_or(NoteCode::MAX);
        self.counter.max(count).max(max_code)
    }
}

/// Durable storage used when autosave is enabled.
pub trait RecordStore: Send + Sync {
    /// Load every patient in stored order. A missing store yields an empty list.
    fn load_patients(&self) -> Result<Vec<Patient>, StoreError>;

    /// Replace the stored patient list.
    fn save_patients(&self, patients: &[&Patient]) -> Result<(), StoreError>;

    /// Load one patient's notes. A missing file yields an empty record.
    fn load_notes(&self, phn: Phn) -> Result<NoteFile, StoreError>;

    /// Replace one patient's notes.
    fn save_notes(&self, phn: Phn, file: &NoteFile) -> Result<(), StoreError>;

    /// Drop one patient's note file. Removing a missing file is not an error.
    fn remove_notes(&self, phn: Phn) -> Result<(), StoreError>;
}
