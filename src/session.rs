use crate::models::Phn;

/// The logged-in user and, optionally, the patient selected for note work.
///
/// Exists only between login and logout; dropping it ends the session.
#[derive(Debug)]
pub struct Session {
    username: String,
    current_patient: Option<Phn>,
}

impl Session {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            current_patient: None,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn current_patient(&self) -> Option<Phn> {
        self.current_patient
    }

    pub fn set_current_patient(&mut self, phn: Phn) {
        self.current_patient = Some(phn);
    }

    pub fn unset_current_patient(&mut self) {
        self.current_patient = None;
    }

    /// True when `phn` is the selected patient.
    pub fn is_current(&self, phn: Phn) -> bool {
        self.current_patient == Some(phn)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        tracing::info!(username = %self.username, "Session closed");
    }
}
