use std::fmt;

use serde::{Deserialize, Serialize};

/// Personal Health Number, the patient key.
pub type Phn = u64;

/// Demographic data for one patient.
///
/// Equality is structural over every field. The patient's notes live in a
/// separate [`crate::dao::PatientRecord`] and never take part in comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub phn: Phn,
    pub name: String,
    pub birth_date: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

impl Patient {
    pub fn new(
        phn: Phn,
        name: impl Into<String>,
        birth_date: impl Into<String>,
        phone: impl Into<String>,
        email: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            phn,
            name: name.into(),
            birth_date: birth_date.into(),
            phone: phone.into(),
            email: email.into(),
            address: address.into(),
        }
    }

    /// Overwrite every field, PHN included, with the values of `other`.
    pub fn update_from(&mut self, other: &Patient) {
        self.phn = other.phn;
        self.name.clone_from(&other.name);
        self.birth_date.clone_from(&other.birth_date);
        self.phone.clone_from(&other.phone);
        self.email.clone_from(&other.email);
        self.address.clone_from(&other.address);
    }
}

impl fmt::Display for Patient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Patient(PHN: {}, Name: {}, Birth Date: {}, Phone: {}, Email: {}, Address: {})",
            self.phn, self.name, self.birth_date, self.phone, self.email, self.address
        )
    }
}
