// Runner settings: per-language compiler/version configuration
use crate::error::{EngineError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use solvekit_common::config::RUNNER_SETTINGS_FILE;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A version-like setting written either as a number or a string
/// (`"javaVersion": 17` and `"javaVersion": "17"` are equivalent)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VersionValue {
    Number(u64),
    Text(String),
}

impl VersionValue {
    pub fn is_blank(&self) -> bool {
        matches!(self, VersionValue::Text(text) if text.trim().is_empty())
    }
}

impl fmt::Display for VersionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionValue::Number(n) => write!(f, "{}", n),
            VersionValue::Text(text) => f.write_str(text.trim()),
        }
    }
}

/// Keyed configuration blob, one entry per language id
#[derive(Debug, Clone, Default)]
pub struct RunnerSettings {
    entries: BTreeMap<String, Value>,
    source: Option<PathBuf>,
}

impl RunnerSettings {
    /// Load runner settings from an explicit file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut settings = Self::from_json_str(&content).map_err(|source| EngineError::SettingsParse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.source = Some(path.to_path_buf());
        debug!(path = %path.display(), languages = ?settings.languages(), "Loaded runner settings");
        Ok(settings)
    }

    /// Find `runner-settings.json` in `start` or the nearest ancestor
    pub fn discover(start: &Path) -> Result<Self> {
        let path = start
            .ancestors()
            .map(|dir| dir.join(RUNNER_SETTINGS_FILE))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| EngineError::SettingsNotFound(RUNNER_SETTINGS_FILE.to_string()))?;
        Self::load(&path)
    }

    pub fn from_json_str(content: &str) -> std::result::Result<Self, serde_json::Error> {
        let entries: BTreeMap<String, Value> = serde_json::from_str(content)?;
        Ok(Self {
            entries,
            source: None,
        })
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn entry(&self, language: &str) -> Option<&Value> {
        self.entries.get(language)
    }

    pub fn languages(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Deserialize the entry of `language` into its typed settings.
    ///
    /// A missing entry is read as `{}` so languages without required fields
    /// work with no configuration at all.
    pub fn typed<T: DeserializeOwned>(&self, language: &str) -> Result<T> {
        let value = match self.entries.get(language) {
            Some(value @ Value::Object(_)) => value.clone(),
            Some(other) => {
                return Err(EngineError::invalid_config(
                    language,
                    format!("expected an object, found {}", other),
                ))
            }
            None => Value::Object(Map::new()),
        };
        serde_json::from_value(value).map_err(|e| EngineError::invalid_config(language, e.to_string()))
    }
}
