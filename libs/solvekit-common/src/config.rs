// Application configuration, resolved from the environment
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_EDITOR: &str = "vi";
pub const RUNNER_SETTINGS_FILE: &str = "runner-settings.json";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Root of fixture storage (`tests/`, `answers/`, `meta/`)
    pub cache_dir: PathBuf,
    /// Per-test-case timeout, `0` disables it
    pub timeout_ms: u64,
    pub default_language: Option<String>,
    pub editor: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let cache_dir = non_empty("SOLVEKIT_CACHE_DIR")
            .map(PathBuf::from)
            .or_else(|| non_empty("XDG_CACHE_HOME").map(|dir| PathBuf::from(dir).join("solvekit")))
            .or_else(|| non_empty("HOME").map(|home| PathBuf::from(home).join(".cache").join("solvekit")))
            .unwrap_or_else(|| std::env::temp_dir().join("solvekit"));

        let timeout_ms = non_empty("SOLVEKIT_TIMEOUT_MS")
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        let editor = non_empty("VISUAL")
            .or_else(|| non_empty("EDITOR"))
            .unwrap_or_else(|| DEFAULT_EDITOR.to_string());

        Self {
            cache_dir,
            timeout_ms,
            default_language: non_empty("SOLVEKIT_LANG"),
            editor,
        }
    }

    /// `None` when the timeout is disabled
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    pub fn tests_dir(&self) -> PathBuf {
        self.cache_dir.join("tests")
    }

    pub fn answers_dir(&self) -> PathBuf {
        self.cache_dir.join("answers")
    }

    pub fn meta_dir(&self) -> PathBuf {
        self.cache_dir.join("meta")
    }
}
