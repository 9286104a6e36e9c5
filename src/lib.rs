pub mod cli;
pub mod dashboard;
pub mod display;
pub mod error;
pub mod estimator;
pub mod headcount;
pub mod ledger;
pub mod manager;
pub mod models;
pub mod roster;
pub mod schema;
pub mod session;
pub mod settings;

pub use crate::error::{AttendanceError, Result};
use crate::manager::AttendanceManager;
use crate::settings::Settings;

/// Creates an [`AttendanceManager`] from the settings in `config.toml` and the environment.
pub fn create_default_manager() -> Result<(AttendanceManager, Settings)> {
    let settings = Settings::load()?;

    let manager = AttendanceManager::connect(&settings.database.url)?
        .with_course_prefix(settings.session.course_prefix.clone());

    Ok((manager, settings))
}

/// Initializes logging for the binaries, at `info` unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
