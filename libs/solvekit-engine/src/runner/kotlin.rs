use super::{artifact_dir, LanguageRunner};
use crate::error::Result;
use crate::process::{self, ExecutionOutput};
use crate::resources::ResourceGuard;
use crate::settings::RunnerSettings;
use async_trait::async_trait;
use solvekit_common::types::Language;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

const KOTLINC: &str = "kotlinc";
const JAVA: &str = "java";

pub struct KotlinRunner;

pub fn factory(_settings: &RunnerSettings) -> Result<Box<dyn LanguageRunner>> {
    Ok(Box::new(KotlinRunner))
}

#[async_trait]
impl LanguageRunner for KotlinRunner {
    fn language(&self) -> Language {
        Language::Kotlin
    }

    fn runtime_info(&self) -> Vec<(String, String)> {
        vec![
            ("Programming language".to_string(), "kotlin".to_string()),
            ("Compiler".to_string(), KOTLINC.to_string()),
        ]
    }

    async fn compile(&self, source: &Path, resources: &mut ResourceGuard) -> Result<PathBuf> {
        process::ensure_command(KOTLINC)?;
        process::ensure_command(JAVA)?;
        let dir = artifact_dir(resources).await?;
        let main_source = dir.join("Main.kt");
        let jar = dir.join("Main.jar");
        tokio::fs::copy(source, &main_source).await?;

        let mut command = Command::new(KOTLINC);
        command
            .arg(&main_source)
            .arg("-include-runtime")
            .arg("-d")
            .arg(&jar);
        process::run_compiler(command).await?;
        Ok(jar)
    }

    async fn execute(
        &self,
        stdin: &str,
        target: &Path,
        limit: Option<Duration>,
        _resources: &mut ResourceGuard,
    ) -> Result<ExecutionOutput> {
        let mut command = Command::new(JAVA);
        command.arg("-jar").arg(target);
        process::run_with_input(command, stdin, limit).await
    }
}
