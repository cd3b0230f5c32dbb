use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Coarse classification used by callers to decide on recovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Consistency,
    TestsNotFound,
    Compile,
    Storage,
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("'{0}' is not supported. Supported languages: c, cpp, rust, go, java, kotlin, swift, python, ruby, javascript")]
    UnsupportedLanguage(String),

    #[error("runner settings for '{language}' are not valid: {reason}")]
    RunnerConfigInvalid { language: String, reason: String },

    #[error("'{0}' not found in the current directory or any parent directory")]
    SettingsNotFound(String),

    #[error("failed to parse runner settings {path}: {source}")]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("command '{0}' is not available on PATH")]
    CommandNotAvailable(String),

    #[error("no test case found for '{0}'")]
    TestsNotFound(String),

    #[error("test file indices do not match answer file indices for '{scope}' (tests: {tests:?}, answers: {answers:?}). Clear the tests and fetch them again")]
    Consistency {
        scope: String,
        tests: Vec<u32>,
        answers: Vec<u32>,
    },

    #[error("a test already exists at index {0}")]
    TestAlreadyExists(u32),

    #[error("test {0} not found")]
    TestNotFound(u32),

    /// Diagnostics are printed by the run report, not by `Display`
    #[error("compile failed")]
    CompileFailure { diagnostics: String },

    #[error("metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EngineError::UnsupportedLanguage(_)
            | EngineError::RunnerConfigInvalid { .. }
            | EngineError::SettingsNotFound(_)
            | EngineError::SettingsParse { .. }
            | EngineError::CommandNotAvailable(_) => ErrorCategory::Configuration,
            EngineError::Consistency { .. } => ErrorCategory::Consistency,
            EngineError::TestsNotFound(_) => ErrorCategory::TestsNotFound,
            EngineError::CompileFailure { .. } => ErrorCategory::Compile,
            EngineError::TestAlreadyExists(_)
            | EngineError::TestNotFound(_)
            | EngineError::Metadata(_)
            | EngineError::Io(_) => ErrorCategory::Storage,
        }
    }

    pub fn invalid_config(language: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::RunnerConfigInvalid {
            language: language.into(),
            reason: reason.into(),
        }
    }
}
