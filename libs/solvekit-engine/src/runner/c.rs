//! C adapter, also used for C++ (same compiler driver conventions)

use super::{artifact_path, execute_native, require_non_blank, LanguageRunner};
use crate::error::Result;
use crate::process::{self, ExecutionOutput};
use crate::resources::ResourceGuard;
use crate::settings::RunnerSettings;
use async_trait::async_trait;
use serde::Deserialize;
use solvekit_common::types::Language;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct CompilerSettings {
    pub compiler: String,
    pub std: String,
}

pub struct CFamilyRunner {
    language: Language,
    settings: CompilerSettings,
}

impl CFamilyRunner {
    pub fn new(language: Language, settings: &RunnerSettings) -> Result<Self> {
        let settings: CompilerSettings = settings.typed(language.id())?;
        require_non_blank(language, "compiler", &settings.compiler)?;
        require_non_blank(language, "std", &settings.std)?;
        Ok(Self { language, settings })
    }

    fn compile_command(&self, source: &Path, artifact: &Path) -> Command {
        let mut command = Command::new(&self.settings.compiler);
        command
            .arg(format!("-std={}", self.settings.std))
            .arg("-O2")
            .arg("-o")
            .arg(artifact)
            .arg(source);
        command
    }
}

pub fn factory(settings: &RunnerSettings) -> Result<Box<dyn LanguageRunner>> {
    Ok(Box::new(CFamilyRunner::new(Language::C, settings)?))
}

#[async_trait]
impl LanguageRunner for CFamilyRunner {
    fn language(&self) -> Language {
        self.language
    }

    fn runtime_info(&self) -> Vec<(String, String)> {
        vec![
            ("Programming language".to_string(), self.language.id().to_string()),
            ("Compiler".to_string(), self.settings.compiler.clone()),
            ("Std".to_string(), self.settings.std.clone()),
        ]
    }

    async fn compile(&self, source: &Path, resources: &mut ResourceGuard) -> Result<PathBuf> {
        process::ensure_command(&self.settings.compiler)?;
        let artifact = artifact_path(resources);
        let elapsed = process::run_compiler(self.compile_command(source, &artifact)).await?;
        info!(
            language = %self.language,
            compiler = %self.settings.compiler,
            compilation_ms = elapsed.as_millis() as u64,
            "Compiled"
        );
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
