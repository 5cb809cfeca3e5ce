//! Configuration for the Roster server and CLI.
//!
//! Settings live in `roster.json`. A missing file means defaults; a present
//! file is parsed, then validated before use.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::assigner::SectionStrategy;
use crate::catalog::{Catalog, CatalogEntry};
use crate::error::{Result, RosterError};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "roster.json";

const fn default_latency_ms() -> u64 {
    500
}

fn default_server_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

const fn default_true() -> bool {
    true
}

/// Top-level Roster configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Simulated store latency per operation, in milliseconds.
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,

    /// Whether the server starts with the demo students.
    #[serde(default = "default_true")]
    pub seed_demo_data: bool,

    /// How new registrations are assigned a section.
    #[serde(default)]
    pub section_strategy: SectionStrategy,

    /// Base URL the CLI uses to reach a running server.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Client request timeout in seconds. `None` waits indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Replaces the built-in course catalog when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<Vec<CatalogEntry>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
            seed_demo_data: true,
            section_strategy: SectionStrategy::default(),
            server_url: default_server_url(),
            request_timeout_secs: None,
            catalog: None,
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `roster.json` exists but is invalid.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            RosterError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads `roster.json` from `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is invalid.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `RosterError::Io` if the file exists but cannot be read,
    /// `RosterError::ConfigParse` if it is not valid JSON, and
    /// `RosterError::ConfigValidation` if a value is out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => return Err(e.into()),
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| RosterError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates configuration values.
    ///
    /// # Errors
    ///
    /// Returns `RosterError::ConfigValidation` describing the first problem.
    pub fn validate(&self) -> Result<()> {
        if self.server_url.trim().is_empty() {
            return Err(RosterError::config_validation(
                "serverUrl must not be empty",
                "Set serverUrl to the address of a running server, e.g. http://127.0.0.1:3000",
            ));
        }

        if self.request_timeout_secs == Some(0) {
            return Err(RosterError::config_validation(
                "requestTimeoutSecs must be greater than 0",
                "Remove requestTimeoutSecs to wait indefinitely, or set it to at least 1",
            ));
        }

        if let Some(entries) = &self.catalog {
            validate_catalog(entries)?;
        }

        Ok(())
    }

    /// The course catalog in effect.
    #[must_use]
    pub fn catalog(&self) -> Catalog {
        self.catalog
            .as_ref()
            .map_or_else(Catalog::builtin, |entries| {
                Catalog::from_entries(entries.iter().cloned())
            })
    }

    /// Simulated store latency.
    #[must_use]
    pub const fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    /// Client request timeout, if one is configured.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

fn validate_catalog(entries: &[CatalogEntry]) -> Result<()> {
    if entries.is_empty() {
        return Err(RosterError::config_validation(
            "catalog must list at least one course",
            "Add a course to catalog, or remove catalog to use the built-in courses",
        ));
    }

    let mut seen = HashSet::new();
    for entry in entries {
        if entry.id.trim().is_empty() || entry.name.trim().is_empty() {
            return Err(RosterError::config_validation(
                "catalog entries need a non-empty id and name",
                "Give every course in catalog an id and a display name",
            ));
        }
        if !seen.insert(entry.id.as_str()) {
            return Err(RosterError::config_validation(
                format!("duplicate course id '{}' in catalog", entry.id),
                "Course ids in catalog must be unique",
            ));
        }
    }

    Ok(())
}
