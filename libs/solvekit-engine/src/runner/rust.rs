use super::{artifact_path, execute_native, LanguageRunner};
use crate::error::{EngineError, Result};
use crate::process::{self, ExecutionOutput};
use crate::resources::ResourceGuard;
use crate::settings::{RunnerSettings, VersionValue};
use async_trait::async_trait;
use serde::Deserialize;
use solvekit_common::types::Language;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::info;

const RUSTC: &str = "rustc";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RustSettings {
    pub rust_edition: VersionValue,
}

pub struct RustRunner {
    settings: RustSettings,
}

impl RustRunner {
    pub fn new(settings: &RunnerSettings) -> Result<Self> {
        let settings: RustSettings = settings.typed(Language::Rust.id())?;
        if settings.rust_edition.is_blank() {
            return Err(EngineError::invalid_config("rust", "'rustEdition' must not be empty"));
        }
        Ok(Self { settings })
    }

    fn compile_command(&self, source: &Path, artifact: &Path) -> Command {
        let mut command = Command::new(RUSTC);
        command
            .arg(format!("--edition={}", self.settings.rust_edition))
            .arg("-o")
            .arg(artifact)
            .arg(source);
        command
    }
}

pub fn factory(settings: &RunnerSettings) -> Result<Box<dyn LanguageRunner>> {
    Ok(Box::new(RustRunner::new(settings)?))
}

#[async_trait]
impl LanguageRunner for RustRunner {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn runtime_info(&self) -> Vec<(String, String)> {
        vec![
            ("Programming language".to_string(), "rust".to_string()),
            ("Compiler".to_string(), RUSTC.to_string()),
            ("Rust edition".to_string(), self.settings.rust_edition.to_string()),
        ]
    }

    async fn compile(&self, source: &Path, resources: &mut ResourceGuard) -> Result<PathBuf> {
        process::ensure_command(RUSTC)?;
        let artifact = artifact_path(resources);
        let elapsed = process::run_compiler(self.compile_command(source, &artifact)).await?;
        info!(compilation_ms = elapsed.as_millis() as u64, "Compiled rust solution");
        Ok(artifact)
    }

    async fn execute(
        &self,
        stdin: &str,
        target: &Path,
        limit: Option<Duration>,
        _resources: &mut ResourceGuard,
    ) -> Result<ExecutionOutput> {
        execute_native(target, stdin, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edition_flag() {
        let settings = RunnerSettings::from_json_str(r#"{"rust": {"rustEdition": "2018"}}"#).unwrap();
        let runner = RustRunner::new(&settings).unwrap();
        let command = runner.compile_command(Path::new("a.rs"), Path::new("/tmp/a"));
        let args: Vec<_> = command.as_std().get_args().collect();
        assert_eq!(args, ["--edition=2018", "-o", "/tmp/a", "a.rs"]);
    }

    #[test]
    fn test_blank_edition_rejected() {
        let settings = RunnerSettings::from_json_str(r#"{"rust": {"rustEdition": ""}}"#).unwrap();
        assert!(RustRunner::new(&settings).is_err());
    }
}
