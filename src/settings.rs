//! Code for loading program settings.
use crate::get_config_dir;
use crate::input::read_toml;
use crate::log::DEFAULT_LOG_LEVEL;
use anyhow::Result;
use documented::DocumentedFields;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SETTINGS_FILE_NAME: &str = "settings.toml";

const DEFAULT_SETTINGS_FILE_HEADER: &str =
    "# This file contains the program settings for surgecast
";

/// Default log level for program
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Default upper bound on a narrative generator call, in milliseconds
fn default_narrative_timeout_ms() -> u64 {
    2000
}

/// Get the path to where the settings file will be read from
pub fn get_settings_file_path() -> PathBuf {
    let mut path = get_config_dir();
    path.push(SETTINGS_FILE_NAME);

    path
}

/// Program settings from config file
#[derive(Debug, DocumentedFields, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// The default program log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Upper bound on a narrative generator call, in milliseconds
    #[serde(default = "default_narrative_timeout_ms")]
    pub narrative_timeout_ms: u64,
    /// Whether to overwrite output files by default
    #[serde(default)]
    pub overwrite: bool,
}

impl Default for Settings {
    fn default() -> Self {
        toml::from_str("").expect("Cannot create settings from empty TOML file")
    }
}

impl Settings {
    /// Read the settings file from the user's config directory.
    ///
    /// If the file is not present, default values for settings will be used.
    pub fn load() -> Result<Settings> {
        Self::load_from_path(&get_settings_file_path())
    }

    /// Read from the specified path
    fn load_from_path(file_path: &Path) -> Result<Settings> {
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        read_toml(file_path)
    }

    /// The configured narrative timeout as a [`Duration`]
    pub fn narrative_timeout(&self) -> Duration {
        Duration::from_millis(self.narrative_timeout_ms)
    }

    /// The contents of the default settings file
    pub fn default_file_contents() -> String {
        let settings_raw =
            toml::to_string(&Settings::default()).expect("Could not convert settings to TOML");

        // Iterate through the generated TOML, commenting out lines and adding docs
        let mut out = DEFAULT_SETTINGS_FILE_HEADER.to_string();
        for line in settings_raw.split('\n') {
            if let Some(last) = line.find('=') {
                let field = line[..last].trim();

                // Use doc comment to document parameter. All fields should have doc comments.
                let docs = Settings::get_field_docs(field).expect("Missing doc comment for field");
                for line in docs.split('\n') {
                    write!(&mut out, "\n# # {}\n", line.trim()).unwrap();
                }

                writeln!(&mut out, "# {}", line.trim()).unwrap();
            }
        }

        out
    }
}
