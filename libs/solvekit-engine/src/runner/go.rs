use super::{artifact_path, execute_native, LanguageRunner};
use crate::error::Result;
use crate::process::{self, ExecutionOutput};
use crate::resources::ResourceGuard;
use crate::settings::RunnerSettings;
use async_trait::async_trait;
use solvekit_common::types::Language;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

const GO: &str = "go";

pub struct GoRunner;

pub fn factory(_settings: &RunnerSettings) -> Result<Box<dyn LanguageRunner>> {
    Ok(Box::new(GoRunner))
}

#[async_trait]
impl LanguageRunner for GoRunner {
    fn language(&self) -> Language {
        Language::Go
    }

    fn runtime_info(&self) -> Vec<(String, String)> {
        vec![
            ("Programming language".to_string(), "go".to_string()),
            ("Compiler".to_string(), GO.to_string()),
        ]
    }

    async fn compile(&self, source: &Path, resources: &mut ResourceGuard) -> Result<PathBuf> {
        process::ensure_command(GO)?;
        let artifact = artifact_path(resources);
        let mut command = Command::new(GO);
        command.arg("build").arg("-o").arg(&artifact).arg(source);
        process::run_compiler(command).await?;
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
