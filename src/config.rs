use std::path::{Path, PathBuf};

/// Application-level constants
pub const APP_NAME: &str = "Clinic";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable toggling autosave ("1", "true", "yes", "on").
pub const AUTOSAVE_ENV: &str = "CLINIC_AUTOSAVE";
/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "CLINIC_DATA_DIR";

/// Get the application data directory
/// ~/ClinicRecords/ when a home directory exists, the working directory otherwise.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ClinicRecords")
}

/// Directory holding the patient directory file and one note file per patient.
pub fn records_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("records")
}

/// Static user list (`username,sha256hex` per line).
pub fn users_file(data_dir: &Path) -> PathBuf {
    data_dir.join("users.txt")
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "clinic_lib=info,warn"
}

/// Runtime configuration for a [`crate::controller::Controller`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClinicConfig {
    /// Mirror every mutation to files under `data_dir`.
    pub autosave: bool,
    pub data_dir: PathBuf,
}

impl ClinicConfig {
    /// Memory-only configuration with the built-in user list.
    pub fn in_memory() -> Self {
        Self {
            autosave: false,
            data_dir: app_data_dir(),
        }
    }

    /// Autosaving configuration rooted at `data_dir`.
    pub fn persistent(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            autosave: true,
            data_dir: data_dir.into(),
        }
    }

    pub fn from_env() -> Self {
        let autosave = std::env::var(AUTOSAVE_ENV)
            .ok()
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        let data_dir = std::env::var(DATA_DIR_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(app_data_dir);
        Self { autosave, data_dir }
    }

    pub fn records_dir(&self) -> PathBuf {
        records_dir(&self.data_dir)
    }

    pub fn users_file(&self) -> PathBuf {
        users_file(&self.data_dir)
    }
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_ends_with_app_folder() {
        let dir = app_data_dir();
        assert!(dir.ends_with("ClinicRecords"));
    }

    #[test]
    fn records_and_users_live_under_data_dir() {
        let config = ClinicConfig::persistent("/tmp/clinic");
        assert_eq!(config.records_dir(), PathBuf::from("/tmp/clinic/records"));
        assert_eq!(config.users_file(), PathBuf::from("/tmp/clinic/users.txt"));
        assert!(config.autosave);
    }

    #[test]
    fn in_memory_is_default_and_not_autosaving() {
        let config = ClinicConfig::default();
        assert!(!config.autosave);
        assert_eq!(config, ClinicConfig::in_memory());
    }

    #[test]
    fn flag_parsing_accepts_common_truthy_values() {
        for v in ["1", "true", "TRUE", " yes ", "on"] {
            assert!(parse_flag(v), "{v} should be truthy");
        }
        for v in ["0", "false", "", "nope"] {
            assert!(!parse_flag(v), "{v} should be falsy");
        }
    }

    #[test]
    fn app_name_is_clinic() {
        assert_eq!(APP_NAME, "Clinic");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
