//! In-memory data access for patients and their notes.
//!
//! `PatientDirectory` owns every patient in insertion order together with
//! the patient's `PatientRecord`. When a [`RecordStore`] is attached, each
//! mutation is followed by a full rewrite of the affected file.
//!
//! [`RecordStore`]: crate::store::RecordStore

mod patient_directory;
mod patient_record;

pub use patient_directory::*;
pub use patient_record::*;

use thiserror::Error;

use crate::models::Phn;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum DaoError {
    #[error("PHN already registered: {0}")]
    PhnAlreadyRegistered(Phn),

    #[error("No patient with PHN {0}")]
    PhnNotFound(Phn),

    #[error("Cannot have same PHN as existing patient: {0}")]
    PhnTaken(Phn),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
