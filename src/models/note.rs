use std::fmt;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Note code, unique and increasing within one patient record.
pub type NoteCode = u32;

const TIMESTAMP_FORMAT: &str = "%H:%M, %d, %B, %Y";

/// A free-text clinical note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub code: NoteCode,
    pub text: String,
    /// Local time of creation or of the last update.
    pub timestamp: NaiveDateTime,
}

impl Note {
    pub fn new(code: NoteCode, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
            timestamp: Local::now().naive_local(),
        }
    }

    /// Replace the text and refresh the timestamp.
    pub fn update(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.timestamp = Local::now().naive_local();
    }

    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

// Timestamp is metadata, not identity.
impl PartialEq for Note {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.text == other.text
    }
}

impl Eq for Note {}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Note #{}, '{}', Timestamp: {}",
            self.code,
            self.text,
            self.formatted_timestamp()
        )
    }
}
