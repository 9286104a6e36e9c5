//! Runtime configuration, read from an optional `config.toml` and `ROLLCALL_*` environment
//! variables.
//!
//! ```toml
//! [database]
//! url = "attendance.db"
//!
//! [estimator]
//! url = "http://localhost:5001/process_video"
//! timeout_secs = 60
//!
//! [session]
//! course_prefix = "Class Session"
//! ```

use crate::error::Result;
use crate::estimator::DEFAULT_ESTIMATOR_URL;
use crate::manager::DEFAULT_COURSE_PREFIX;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub estimator: EstimatorSettings,
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EstimatorSettings {
    pub url: String,
    pub timeout_secs: u64,
}

impl EstimatorSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    pub course_prefix: String,
}

impl Settings {
    /// Loads settings from `config.toml` in the working directory, if present.
    ///
    /// Variables from a `.env` file are loaded first. `DATABASE_URL` takes precedence over the
    /// configured database URL.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::load_from("config")
    }

    /// Loads settings from the given configuration file (extension optional), layered over the
    /// defaults and under the environment.
    pub fn load_from(path: &str) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("database.url", "attendance.db")?
            .set_default("estimator.url", DEFAULT_ESTIMATOR_URL)?
            .set_default("estimator.timeout_secs", 60_i64)?
            .set_default("session.course_prefix", DEFAULT_COURSE_PREFIX)?
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("ROLLCALL").separator("__"));

        if let Ok(url) = env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", url)?;
        }

        Ok(builder.build()?.try_deserialize()?)
    }
}
