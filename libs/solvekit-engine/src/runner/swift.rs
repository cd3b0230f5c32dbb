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

const SWIFTC: &str = "swiftc";

pub struct SwiftRunner;

pub fn factory(_settings: &RunnerSettings) -> Result<Box<dyn LanguageRunner>> {
    Ok(Box::new(SwiftRunner))
}

#[async_trait]
impl LanguageRunner for SwiftRunner {
    fn language(&self) -> Language {
        Language::Swift
    }

    fn runtime_info(&self) -> Vec<(String, String)> {
        vec![
            ("Programming language".to_string(), "swift".to_string()),
            ("Compiler".to_string(), SWIFTC.to_string()),
        ]
    }

    async fn compile(&self, source: &Path, resources: &mut ResourceGuard) -> Result<PathBuf> {
        process::ensure_command(SWIFTC)?;
        let artifact = artifact_path(resources);
        let mut command = Command::new(SWIFTC);
        command.arg(source).arg("-o").arg(&artifact);
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
