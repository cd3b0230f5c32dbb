//! Python adapter, also used for Ruby (source passed straight to the interpreter)

use super::LanguageRunner;
use crate::error::Result;
use crate::process::{self, ExecutionOutput};
use crate::resources::ResourceGuard;
use crate::settings::RunnerSettings;
use async_trait::async_trait;
use solvekit_common::types::Language;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

const PYTHON: &str = "python3";

pub struct InterpreterRunner {
    language: Language,
    program: &'static str,
}

impl InterpreterRunner {
    pub fn new(language: Language, program: &'static str) -> Self {
        Self { language, program }
    }
}

pub fn factory(_settings: &RunnerSettings) -> Result<Box<dyn LanguageRunner>> {
    Ok(Box::new(InterpreterRunner::new(Language::Python, PYTHON)))
}

#[async_trait]
impl LanguageRunner for InterpreterRunner {
    fn language(&self) -> Language {
        self.language
    }

    fn runtime_info(&self) -> Vec<(String, String)> {
        vec![
            ("Programming language".to_string(), self.language.id().to_string()),
            ("Interpreter".to_string(), self.program.to_string()),
        ]
    }

    async fn compile(&self, source: &Path, _resources: &mut ResourceGuard) -> Result<PathBuf> {
        process::ensure_command(self.program)?;
        Ok(source.to_path_buf())
    }

    async fn execute(
        &self,
        stdin: &str,
        target: &Path,
        limit: Option<Duration>,
        _resources: &mut ResourceGuard,
    ) -> Result<ExecutionOutput> {
        let mut command = Command::new(self.program);
        command.arg(target);
        process::run_with_input(command, stdin, limit).await
    }
}
