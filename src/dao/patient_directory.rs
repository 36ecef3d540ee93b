use std::collections::HashMap;
use std::sync::Arc;

use super::{DaoError, PatientRecord};
use crate::models::{Patient, Phn};
use crate::store::{RecordStore, StoreError};

struct PatientEntry {
    patient: Patient,
    record: PatientRecord,
}

/// Every patient, keyed by PHN and listed in insertion order.
pub struct PatientDirectory {
    entries: HashMap<Phn, PatientEntry>,
    /// Insertion order of the keys in `entries`.
    order: Vec<Phn>,
    store: Option<Arc<dyn RecordStore>>,
}

impl PatientDirectory {
    /// Empty directory that is never persisted.
    pub fn in_memory() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
            store: None,
        }
    }

    /// Load every stored patient, and each patient's record, from `store`.
    pub fn load(store: Arc<dyn RecordStore>) -> Result<Self, StoreError> {
        let mut directory = Self {
            entries: HashMap::new(),
            order: Vec::new(),
            store: Some(store.clone()),
        };
        for patient in store.load_patients()? {
            let phn = patient.phn;
            if directory.entries.contains_key(&phn) {
                tracing::warn!(phn, "Duplicate PHN in stored directory, keeping the first");
                continue;
            }
            let record = PatientRecord::open(phn, Some(store.clone()))?;
            directory.entries.insert(phn, PatientEntry { patient, record });
            directory.order.push(phn);
        }
        tracing::info!(count = directory.len(), "Patient directory loaded");
        Ok(directory)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, phn: Phn) -> bool {
        self.entries.contains_key(&phn)
    }

    pub fn search(&self, phn: Phn) -> Option<&Patient> {
        self.entries.get(&phn).map(|e| &e.patient)
    }

    pub fn record(&self, phn: Phn) -> Option<&PatientRecord> {
        self.entries.get(&phn).map(|e| &e.record)
    }

    pub fn record_mut(&mut self, phn: Phn) -> Option<&mut PatientRecord> {
        self.entries.get_mut(&phn).map(|e| &mut e.record)
    }

    /// Register a new patient with an empty record.
    ///
    /// A failed save leaves the directory as it was before the call.
    pub fn create(&mut self, patient: Patient) -> Result<&Patient, DaoError> {
        let phn = patient.phn;
        if self.contains(phn) {
            return Err(DaoError::PhnAlreadyRegistered(phn));
        }
        let record = PatientRecord::open(phn, self.store.clone())?;
        self.entries.insert(phn, PatientEntry { patient, record });
        self.order.push(phn);
        if let Err(e) = self.persist() {
            self.entries.remove(&phn);
            self.order.pop();
            return Err(e.into());
        }
        tracing::info!(phn, "Patient created");
        self.search(phn).ok_or(DaoError::PhnNotFound(phn))
    }

    /// Patients whose name contains `name`, in insertion order.
    pub fn retrieve_by_name(&self, name: &str) -> Vec<&Patient> {
        self.iter().filter(|p| p.name.contains(name)).collect()
    }

    /// Replace the patient stored under `key` with `patient`.
    ///
    /// A changed PHN moves the entry, record included, to the new key and to
    /// the end of the listing order. The new PHN must not belong to anyone else.
    /// A store failure is reported but the in-memory change is kept.
    pub fn update(&mut self, key: Phn, patient: Patient) -> Result<&Patient, DaoError> {
        let new_phn = patient.phn;
        if new_phn == key {
            let entry = self
                .entries
                .get_mut(&key)
                .ok_or(DaoError::PhnNotFound(key))?;
            entry.patient.update_from(&patient);
        } else {
            if self.contains(new_phn) {
                return Err(DaoError::PhnTaken(new_phn));
            }
            let mut entry = self.entries.remove(&key).ok_or(DaoError::PhnNotFound(key))?;
            self.order.retain(|phn| *phn != key);
            entry.patient.update_from(&patient);
            let rekeyed = entry.record.rekey(new_phn);
            self.entries.insert(new_phn, entry);
            self.order.push(new_phn);
            rekeyed?;
        }
        self.persist()?;
        tracing::info!(old_phn = key, phn = new_phn, "Patient updated");
        self.search(new_phn).ok_or(DaoError::PhnNotFound(new_phn))
    }

    /// Remove a patient after deleting every note in their record.
    ///
    /// The two steps are not atomic: a store failure after the notes are gone
    /// leaves the patient registered with an empty record.
    pub fn delete(&mut self, phn: Phn) -> Result<Patient, DaoError> {
        let entry = self.entries.get_mut(&phn).ok_or(DaoError::PhnNotFound(phn))?;
        let removed_notes = entry.record.delete_all_notes()?;

        let entry = self.entries.remove(&phn).ok_or(DaoError::PhnNotFound(phn))?;
        self.order.retain(|key| *key != phn);
        self.persist()?;
        tracing::info!(phn, removed_notes, "Patient deleted");
        Ok(entry.patient)
    }

    /// All patients in insertion order.
    pub fn list(&self) -> Vec<&Patient> {
        self.iter().collect()
    }

    fn iter(&self) -> impl Iterator<Item = &Patient> + '_ {
        self.order
            .iter()
            .filter_map(|phn| self.entries.get(phn))
            .map(|e| &e.patient)
    }

    fn persist(&self) -> Result<(), StoreError> {
        match &self.store {
            Some(store) => store.save_patients(&self.list()),
            None => Ok(()),
        }
    }
}

impl Default for PatientDirectory {
    fn default() -> Self {
        Self::in_memory()
    }
}
