// config lets you read a separate settings file
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;

/// Where and how a store is opened. Read from an optional settings file and
/// overridden by `EAVPOT_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Path of the SQLite file; in memory when absent.
    #[serde(default)]
    pub database: Option<String>,
    /// Prepended to every pot's table names.
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Pots created eagerly at startup.
    #[serde(default)]
    pub pots: Vec<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: None,
            prefix: String::new(),
            log_level: default_log_level(),
            pots: Vec::new(),
        }
    }
}

impl Settings {
    /// Loads `name` (extension optional), which may be missing.
    /// `EAVPOT_POTS` takes a comma separated list.
    pub fn load(name: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(name).required(false))
            .add_source(
                Environment::with_prefix("EAVPOT")
                    .list_separator(",")
                    .with_list_parse_key("pots"),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
