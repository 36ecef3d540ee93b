//! Session gate in front of the patient directory.
//!
//! `Controller` is the single entry point for front-ends. Every operation
//! apart from `login`/`logout` needs an active session, note operations also
//! need a current patient, and the current patient cannot be updated or
//! deleted until it is unset.

use std::sync::Arc;

use crate::config::ClinicConfig;
use crate::dao::{DaoError, PatientDirectory, PatientRecord};
use crate::models::{Note, NoteCode, Patient, Phn};
use crate::session::Session;
use crate::store::{JsonFileStore, RecordStore, StoreError};
use crate::users::UserDirectory;

// ═══════════════════════════════════════════════════════════
// Controller
// ═══════════════════════════════════════════════════════════

pub struct Controller {
    autosave: bool,
    users: UserDirectory,
    /// `None` while logged out.
    session: Option<Session>,
    patients: PatientDirectory,
}

impl Controller {
    /// Build a controller for `config`.
    ///
    /// With autosave on, users come from `users.txt` and patients and notes
    /// are loaded from the records directory. Otherwise everything lives in
    /// memory and the built-in users apply.
    pub fn new(config: &ClinicConfig) -> Result<Self, ClinicError> {
        if !config.autosave {
            return Ok(Self::in_memory());
        }
        let users = UserDirectory::load(&config.users_file())?;
        let store = JsonFileStore::open(config.records_dir())?;
        tracing::info!(data_dir = %config.data_dir.display(), "Opening clinic records");
        Self::with_store(users, Arc::new(store))
    }

    /// Memory-only controller with the built-in users.
    pub fn in_memory() -> Self {
        Self {
            autosave: false,
            users: UserDirectory::builtin(),
            session: None,
            patients: PatientDirectory::in_memory(),
        }
    }

    /// Autosaving controller over an arbitrary store.
    pub fn with_store(
        users: UserDirectory,
        store: Arc<dyn RecordStore>,
    ) -> Result<Self, ClinicError> {
        Ok(Self {
            autosave: true,
            users,
            session: None,
            patients: PatientDirectory::load(store)?,
        })
    }

    pub fn autosave(&self) -> bool {
        self.autosave
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn current_user(&self) -> Option<&str> {
        self.session.as_ref().map(Session::username)
    }

    // ── Session ─────────────────────────────────────────────

    pub fn login(&mut self, username: &str, password: &str) -> Result<(), ClinicError> {
        if self.session.is_some() {
            return Err(ClinicError::DuplicateSession);
        }
        if !self.users.verify(username, password) {
            tracing::warn!(username, "Rejected login");
            return Err(ClinicError::InvalidCredentials);
        }
        self.session = Some(Session::new(username));
        tracing::info!(username, "Logged in");
        Ok(())
    }

    /// End the session. The current patient goes with it.
    pub fn logout(&mut self) -> Result<(), ClinicError> {
        match self.session.take() {
            Some(_) => Ok(()),
            None => Err(ClinicError::InvalidSession),
        }
    }

    fn session(&self) -> Result<&Session, ClinicError> {
        self.session.as_ref().ok_or(ClinicError::AccessDenied)
    }

    fn session_mut(&mut self) -> Result<&mut Session, ClinicError> {
        self.session.as_mut().ok_or(ClinicError::AccessDenied)
    }

    // ── Patients ────────────────────────────────────────────

    pub fn search_patient(&self, phn: Phn) -> Result<Option<&Patient>, ClinicError> {
        self.session()?;
        Ok(self.patients.search(phn))
    }

    pub fn create_patient(&mut self, patient: Patient) -> Result<&Patient, ClinicError> {
        self.session()?;
        Ok(self.patients.create(patient)?)
    }

    /// Patients whose name contains `name`, in insertion order.
    pub fn retrieve_patients(&self, name: &str) -> Result<Vec<&Patient>, ClinicError> {
        self.session()?;
        Ok(self.patients.retrieve_by_name(name))
    }

    /// Replace the patient registered under `key`, possibly with a new PHN.
    pub fn update_patient(&mut self, key: Phn, patient: Patient) -> Result<&Patient, ClinicError> {
        self.check_unlocked(key, "Cannot update current patient")?;
        Ok(self.patients.update(key, patient)?)
    }

    /// Remove a patient together with all of their notes.
    pub fn delete_patient(&mut self, phn: Phn) -> Result<Patient, ClinicError> {
        self.check_unlocked(phn, "Cannot delete current patient")?;
        Ok(self.patients.delete(phn)?)
    }

    pub fn list_patients(&self) -> Result<Vec<&Patient>, ClinicError> {
        self.session()?;
        Ok(self.patients.list())
    }

    /// `phn` must exist and must not be the current patient.
    fn check_unlocked(&self, phn: Phn, locked_reason: &str) -> Result<(), ClinicError> {
        let session = self.session()?;
        if !self.patients.contains(phn) {
            return Err(ClinicError::InvalidOperation("Invalid PHN".into()));
        }
        if session.is_current(phn) {
            tracing::warn!(phn, "Rejected change to current patient");
            return Err(ClinicError::InvalidOperation(locked_reason.into()));
        }
        Ok(())
    }

    // ── Current patient ─────────────────────────────────────

    pub fn set_current_patient(&mut self, phn: Phn) -> Result<&Patient, ClinicError> {
        self.session()?;
        if !self.patients.contains(phn) {
            return Err(ClinicError::InvalidOperation("Invalid PHN".into()));
        }
        self.session_mut()?.set_current_patient(phn);
        tracing::debug!(phn, "Current patient set");
        self.patients
            .search(phn)
            .ok_or_else(|| ClinicError::InvalidOperation("Invalid PHN".into()))
    }

    pub fn get_current_patient(&self) -> Result<Option<&Patient>, ClinicError> {
        Ok(self
            .session()?
            .current_patient()
            .and_then(|phn| self.patients.search(phn)))
    }

    pub fn unset_current_patient(&mut self) -> Result<(), ClinicError> {
        self.session_mut()?.unset_current_patient();
        Ok(())
    }

    // ── Notes (current patient) ─────────────────────────────

    fn current_record(&self) -> Result<&PatientRecord, ClinicError> {
        let phn = self
            .session()?
            .current_patient()
            .ok_or(ClinicError::NoCurrentPatient)?;
        self.patients.record(phn).ok_or(ClinicError::NoCurrentPatient)
    }

    fn current_record_mut(&mut self) -> Result<&mut PatientRecord, ClinicError> {
        let phn = self
            .session()?
            .current_patient()
            .ok_or(ClinicError::NoCurrentPatient)?;
        self.patients
            .record_mut(phn)
            .ok_or(ClinicError::NoCurrentPatient)
    }

    pub fn create_note(&mut self, text: &str) -> Result<&Note, ClinicError> {
        Ok(self.current_record_mut()?.create_note(text)?)
    }

    pub fn search_note(&self, code: NoteCode) -> Result<Option<&Note>, ClinicError> {
        Ok(self.current_record()?.search_note(code))
    }

    /// Notes containing `text`, ascending by code.
    pub fn retrieve_notes(&self, text: &str) -> Result<Vec<&Note>, ClinicError> {
        Ok(self.current_record()?.retrieve_notes(text))
    }

    /// `Ok(None)` when the code does not exist.
    pub fn update_note(&mut self, code: NoteCode, text: &str) -> Result<Option<&Note>, ClinicError> {
        Ok(self.current_record_mut()?.update_note(code, text)?)
    }

    /// `Ok(false)` when the code does not exist.
    pub fn delete_note(&mut self, code: NoteCode) -> Result<bool, ClinicError> {
        Ok(self.current_record_mut()?.delete_note(code)?)
    }

    /// Notes of the current patient, most recent first.
    pub fn list_notes(&self) -> Result<Vec<&Note>, ClinicError> {
        Ok(self.current_record()?.list_notes())
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::in_memory()
    }
}

// ═══════════════════════════════════════════════════════════
// Error types
// ═══════════════════════════════════════════════════════════

/// Errors surfaced to front-ends.
#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("Not logged in")]
    AccessDenied,
    #[error("Already logged in")]
    DuplicateSession,
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Already logged out")]
    InvalidSession,
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Current patient not set")]
    NoCurrentPatient,
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<DaoError> for ClinicError {
    fn from(e: DaoError) -> Self {
        match e {
            DaoError::Store(e) => ClinicError::Store(e),
            other => ClinicError::InvalidOperation(other.to_string()),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
