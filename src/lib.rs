pub mod config;
pub mod controller;
pub mod dao;
pub mod models;
pub mod session;
pub mod store;
pub mod users;

pub use config::ClinicConfig;
pub use controller::{ClinicError, Controller};
pub use models::{Note, NoteCode, Patient, Phn};

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber for a front-end process.
///
/// Honors `RUST_LOG`, falling back to [`config::default_log_filter`].
/// Calling it again once a subscriber is installed has no effect.
pub fn init_logging() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}
