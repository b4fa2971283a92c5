use anyhow::Result;
use config::Config;
use serde::Deserialize;

use crate::constants::{
    DEFAULT_MAX_EMPTY_STEPS, DEFAULT_MAX_INSTANCES, LOGGING_LEVEL_KEY,
    RECURRENCE_MAX_EMPTY_STEPS_KEY, RECURRENCE_MAX_INSTANCES_KEY, RECURRENCE_MODE_KEY,
};
use crate::types::ComplianceMode;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub logging: LoggingConfig,
    pub recurrence: RecurrenceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecurrenceConfig {
    /// Compliance mode applied when a rule is parsed without an explicit one.
    pub mode: ComplianceMode,
    /// Consecutive empty steps a cursor tolerates before ending the sequence.
    pub max_empty_steps: u32,
    /// Hard stop for unbounded rules expanded from the command line.
    pub max_instances: u32,
}

impl Settings {
    /// ## Summary
    /// Loads configuration from environment variables and an optional
    /// `config.toml` into a `Settings`, falling back to built-in defaults.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// ## Summary
    /// Same as [`Settings::load`] but reads the given TOML file instead of
    /// `config.toml`. The file is optional in both cases.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load_from(path: Option<&str>) -> Result<Self> {
        Ok(Config::builder()
            .set_default(LOGGING_LEVEL_KEY, "info")?
            .set_default(RECURRENCE_MODE_KEY, ComplianceMode::default().as_str())?
            .set_default(RECURRENCE_MAX_EMPTY_STEPS_KEY, DEFAULT_MAX_EMPTY_STEPS)?
            .set_default(RECURRENCE_MAX_INSTANCES_KEY, DEFAULT_MAX_INSTANCES)?
            // TOML file
            .add_source(config::File::with_name(path.unwrap_or("config.toml")).required(false))
            // Env
            .add_source(
                config::Environment::with_prefix("CADENCE")
                    .convert_case(config::Case::Snake)
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config(path: Option<&str>) -> Result<Settings> {
    dotenvy::dotenv().ok();

    let settings = Settings::load_from(path)?;
    tracing::debug!(
        mode = %settings.recurrence.mode,
        max_empty_steps = settings.recurrence.max_empty_steps,
        "Recurrence settings resolved"
    );
    Ok(settings)
}
