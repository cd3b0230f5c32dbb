//! Java adapter.
//!
//! The solution is copied to `Main.java` inside a scratch directory because
//! javac requires the public class name to match the file name.

use super::{artifact_dir, LanguageRunner};
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

const JAVAC: &str = "javac";
const JAVA: &str = "java";
const MAIN_CLASS: &str = "Main";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaSettings {
    pub java_version: VersionValue,
}

pub struct JavaRunner {
    settings: JavaSettings,
}

impl JavaRunner {
    pub fn new(settings: &RunnerSettings) -> Result<Self> {
        let settings: JavaSettings = settings.typed(Language::Java.id())?;
        if settings.java_version.is_blank() {
            return Err(EngineError::invalid_config("java", "'javaVersion' must not be empty"));
        }
        Ok(Self { settings })
    }

    fn compile_command(&self, main_source: &Path, out_dir: &Path) -> Command {
        let mut command = Command::new(JAVAC);
        command
            .arg("--release")
            .arg(self.settings.java_version.to_string())
            .arg("-encoding")
            .arg("UTF-8")
            .arg("-d")
            .arg(out_dir)
            .arg(main_source);
        command
    }
}

/// `java -classpath <dir> Main` for a compiled `Main.class`
pub(crate) fn run_command(class_file: &Path) -> Command {
    let classpath = class_file.parent().unwrap_or_else(|| Path::new("."));
    let mut command = Command::new(JAVA);
    command
        .arg("-Dfile.encoding=UTF-8")
        .arg("-XX:+UseSerialGC")
        .arg("-classpath")
        .arg(classpath)
        .arg(MAIN_CLASS);
    command
}

pub fn factory(settings: &RunnerSettings) -> Result<Box<dyn LanguageRunner>> {
    Ok(Box::new(JavaRunner::new(settings)?))
}

#[async_trait]
impl LanguageRunner for JavaRunner {
    fn language(&self) -> Language {
        Language::Java
    }

    fn runtime_info(&self) -> Vec<(String, String)> {
        vec![
            ("Programming language".to_string(), "java".to_string()),
            ("Java version".to_string(), self.settings.java_version.to_string()),
        ]
    }

    async fn compile(&self, source: &Path, resources: &mut ResourceGuard) -> Result<PathBuf> {
        process::ensure_command(JAVAC)?;
        process::ensure_command(JAVA)?;
        let dir = artifact_dir(resources).await?;
        let main_source = dir.join(format!("{}.java", MAIN_CLASS));
        tokio::fs::copy(source, &main_source).await?;

        let elapsed = process::run_compiler(self.compile_command(&main_source, &dir)).await?;
        info!(
            java_version = %self.settings.java_version,
            compilation_ms = elapsed.as_millis() as u64,
            "Compiled java solution"
        );
        Ok(dir.join(format!("{}.class", MAIN_CLASS)))
    }

    async fn execute(
        &self,
        stdin: &str,
        target: &Path,
        limit: Option<Duration>,
        _resources: &mut ResourceGuard,
    ) -> Result<ExecutionOutput> {
        process::run_with_input(run_command(target), stdin, limit).await
    }
}
