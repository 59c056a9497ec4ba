// ⚙️ Settings
// Explicit configuration handed to the store. Nothing here is global.
//
// Sources, later wins: built-in defaults → optional TOML file → environment.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CalculationError, CalculationResult};

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const JOURNAL_MODE_ENV: &str = "CALC_JOURNAL_MODE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// `sqlite://<path>`, `sqlite::memory:`, `:memory:`, or a bare file path
    pub database_url: String,

    /// SQLite journal mode (WAL for crash recovery)
    pub journal_mode: String,

    /// Enforce the calculations → users foreign key
    pub foreign_keys: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: "sqlite://calculations.db".to_string(),
            journal_mode: "WAL".to_string(),
            foreign_keys: true,
        }
    }
}

/// Where the store lives, resolved from `database_url`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

impl Settings {
    /// Load settings from a TOML file (no env overrides applied)
    pub fn load(path: &Path) -> CalculationResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CalculationError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;

        Self::from_toml_str(&content)
            .map_err(|e| CalculationError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> CalculationResult<Self> {
        toml::from_str(content).map_err(|e| CalculationError::Config(e.to_string()))
    }

    /// Defaults (or the given file) with environment overrides applied
    pub fn load_or_default(path: Option<&Path>) -> CalculationResult<Self> {
        let settings = match path {
            Some(path) => Self::load(path)?,
            None => Settings::default(),
        };

        Ok(settings.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Apply overrides from a key lookup (the process environment in production)
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(DATABASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.database_url = url;
        }

        if let Some(mode) = lookup(JOURNAL_MODE_ENV).filter(|v| !v.trim().is_empty()) {
            self.journal_mode = mode.to_uppercase();
        }

        self
    }

    /// Resolve `database_url` to a location. Only SQLite URLs are supported.
    pub fn database_location(&self) -> CalculationResult<DatabaseLocation> {
        let url = self.database_url.trim();

        if url == ":memory:" || url == "sqlite::memory:" || url == "sqlite://:memory:" {
            return Ok(DatabaseLocation::Memory);
        }

        if let Some(path) = url.strip_prefix("sqlite://") {
            if path.is_empty() {
                return Err(CalculationError::Config("database_url has an empty path".to_string()));
            }
            return Ok(DatabaseLocation::File(PathBuf::from(path)));
        }

        if url.contains("://") {
            return Err(CalculationError::Config(format!(
                "unsupported database_url scheme: {}",
                url
            )));
        }

        if url.is_empty() {
            return Err(CalculationError::Config("database_url is empty".to_string()));
        }

        Ok(DatabaseLocation::File(PathBuf::from(url)))
    }
}
