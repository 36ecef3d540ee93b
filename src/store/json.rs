use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{NoteFile, RecordStore, StoreError};
use crate::models::{Patient, Phn};

const PATIENTS_FILE: &str = "patients.json";

/// JSON files under a single records directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn patients_path(&self) -> PathBuf {
        self.root.join(PATIENTS_FILE)
    }

    pub fn notes_path(&self, phn: Phn) -> PathBuf {
        self.root.join(format!("{phn}.json"))
    }
}

impl RecordStore for JsonFileStore {
    fn load_patients(&self) -> Result<Vec<Patient>, StoreError> {
        let path = self.patients_path();
        match read_json::<Vec<Patient>>(&path)? {
            Some(patients) => Ok(patients),
            None => {
                // First start: leave an empty directory file behind.
                write_json(&path, &Vec::<Patient>::new())?;
                Ok(Vec::new())
            }
        }
    }

    fn save_patients(&self, patients: &[&Patient]) -> Result<(), StoreError> {
        write_json(&self.patients_path(), &patients)?;
        tracing::debug!(count = patients.len(), "Patient directory saved");
        Ok(())
    }

    fn load_notes(&self, phn: Phn) -> Result<NoteFile, StoreError> {
        Ok(read_json(&self.notes_path(phn))?.unwrap_or_default())
    }

    fn save_notes(&self, phn: Phn, file: &NoteFile) -> Result<(), StoreError> {
        write_json(&self.notes_path(phn), file)?;
        tracing::debug!(phn, count = file.notes.len(), "Patient record saved");
        Ok(())
    }

    fn remove_notes(&self, phn: Phn) -> Result<(), StoreError> {
        match std::fs::remove_file(self.notes_path(phn)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| StoreError::Corrupted {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}
