//! Language runners: compile (when needed) and execute a solution.
//!
//! Each supported language has one adapter module. Adapters differ only in
//! which binaries and flags they invoke, whether `compile` does anything, and
//! stdin-delivery quirks. Selection goes through [`RunnerRegistry`].

pub mod c;
pub mod cpp;
pub mod go;
pub mod java;
pub mod javascript;
pub mod kotlin;
pub mod python;
pub mod ruby;
pub mod rust;
pub mod swift;

use crate::error::{EngineError, Result};
use crate::process::{self, ExecutionOutput};
use crate::resources::ResourceGuard;
use crate::settings::RunnerSettings;
use async_trait::async_trait;
use solvekit_common::types::Language;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

#[async_trait]
pub trait LanguageRunner: Send + Sync {
    fn language(&self) -> Language;

    /// Settings shown in the runtime information box
    fn runtime_info(&self) -> Vec<(String, String)>;

    fn requires_compilation(&self) -> bool {
        self.language().is_compiled()
    }

    /// Build a runnable artifact from `source`.
    ///
    /// Every temporary path created here is registered with `resources`
    /// before the compiler runs. Interpreted runners only check that their
    /// interpreter exists and hand the source back.
    async fn compile(&self, source: &Path, resources: &mut ResourceGuard) -> Result<PathBuf> {
        let _ = resources;
        Ok(source.to_path_buf())
    }

    /// Run `target` (artifact or source) once with `stdin`
    async fn execute(
        &self,
        stdin: &str,
        target: &Path,
        limit: Option<Duration>,
        resources: &mut ResourceGuard,
    ) -> Result<ExecutionOutput>;
}

pub type RunnerFactory = fn(&RunnerSettings) -> Result<Box<dyn LanguageRunner>>;

/// Lookup table from language to adapter constructor
pub struct RunnerRegistry {
    factories: HashMap<Language, RunnerFactory>,
}

impl RunnerRegistry {
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Language::C, c::factory);
        registry.register(Language::Cpp, cpp::factory);
        registry.register(Language::Rust, rust::factory);
        registry.register(Language::Go, go::factory);
        registry.register(Language::Java, java::factory);
        registry.register(Language::Kotlin, kotlin::factory);
        registry.register(Language::Swift, swift::factory);
        registry.register(Language::Python, python::factory);
        registry.register(Language::Ruby, ruby::factory);
        registry.register(Language::Javascript, javascript::factory);
        registry
    }

    pub fn register(&mut self, language: Language, factory: RunnerFactory) {
        self.factories.insert(language, factory);
    }

    /// Construct and validate the runner for `language`
    pub fn create(&self, language: Language, settings: &RunnerSettings) -> Result<Box<dyn LanguageRunner>> {
        let factory = self
            .factories
            .get(&language)
            .ok_or_else(|| EngineError::UnsupportedLanguage(language.id().to_string()))?;
        factory(settings)
    }

    pub fn create_by_id(&self, id: &str, settings: &RunnerSettings) -> Result<Box<dyn LanguageRunner>> {
        let language = Language::from_id(id).ok_or_else(|| EngineError::UnsupportedLanguage(id.to_string()))?;
        self.create(language, settings)
    }

    pub fn languages(&self) -> Vec<Language> {
        let mut languages: Vec<Language> = self.factories.keys().copied().collect();
        languages.sort_by_key(|lang| lang.id());
        languages
    }
}

impl Default for RunnerRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Reserve a uniquely-named artifact path in the temp dir and track it
pub(crate) fn artifact_path(resources: &mut ResourceGuard) -> PathBuf {
    let name = format!("solvekit-{}{}", uuid::Uuid::new_v4(), std::env::consts::EXE_SUFFIX);
    let path = std::env::temp_dir().join(name);
    resources.track(&path);
    path
}

/// Create a uniquely-named scratch directory and track it
pub(crate) async fn artifact_dir(resources: &mut ResourceGuard) -> Result<PathBuf> {
    let path = std::env::temp_dir().join(format!("solvekit-{}", uuid::Uuid::new_v4()));
    resources.track(&path);
    tokio::fs::create_dir_all(&path).await?;
    Ok(path)
}

/// Execute a native artifact directly
pub(crate) async fn execute_native(target: &Path, stdin: &str, limit: Option<Duration>) -> Result<ExecutionOutput> {
    process::run_with_input(Command::new(target), stdin, limit).await
}

pub(crate) fn require_non_blank(language: Language, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EngineError::invalid_config(language.id(), format!("'{}' must not be empty", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_settings() -> RunnerSettings {
        RunnerSettings::from_json_str(
            r#"{
                "c": {"compiler": "gcc", "std": "c11"},
                "cpp": {"compiler": "g++", "std": "gnu++17"},
                "rust": {"rustEdition": 2021},
                "java": {"javaVersion": 17},
                "javascript": {"nodeVersion": "20"}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_registry_builds_every_language() {
        let registry = RunnerRegistry::builtin();
        let settings = full_settings();
        assert_eq!(registry.languages().len(), Language::ALL.len());
        for language in Language::ALL {
            let runner = registry.create(language, &settings).unwrap();
            assert_eq!(runner.language(), language);
            assert_eq!(runner.requires_compilation(), language.is_compiled());
            assert_eq!(runner.runtime_info()[0].1, language.id());
        }
    }

    #[test]
    fn test_unsupported_language_id() {
        let registry = RunnerRegistry::builtin();
        let err = registry.create_by_id("d", &full_settings()).err().unwrap();
        assert!(matches!(err, EngineError::UnsupportedLanguage(ref id) if id == "d"));
    }

    #[test]
    fn test_language_missing_from_registry() {
        let registry = RunnerRegistry::empty();
        assert!(matches!(
            registry.create(Language::Python, &full_settings()),
            Err(EngineError::UnsupportedLanguage(_))
        ));
    }

    #[test]
    fn test_required_settings_validated_at_construction() {
        let registry = RunnerRegistry::builtin();
        let empty = RunnerSettings::default();
        for language in [Language::C, Language::Cpp, Language::Rust, Language::Java, Language::Javascript] {
            let err = registry.create(language, &empty).err().unwrap();
            assert!(
                matches!(err, EngineError::RunnerConfigInvalid { .. }),
                "{} should require settings",
                language
            );
        }
        for language in [Language::Go, Language::Kotlin, Language::Swift, Language::Python, Language::Ruby] {
            assert!(registry.create(language, &empty).is_ok(), "{} needs no settings", language);
        }
    }

    #[test]
    fn test_blank_compiler_rejected() {
        let settings = RunnerSettings::from_json_str(r#"{"cpp": {"compiler": " ", "std": "c++17"}}"#).unwrap();
        assert!(matches!(
            RunnerRegistry::builtin().create(Language::Cpp, &settings),
            Err(EngineError::RunnerConfigInvalid { .. })
        ));
    }

    #[test]
    fn test_artifact_path_is_unique_and_tracked() {
        let mut resources = ResourceGuard::new();
        let a = artifact_path(&mut resources);
        let b = artifact_path(&mut resources);
        assert_ne!(a, b);
        assert_eq!(resources.tracked(), &[a, b]);
    }
}
