//! Node.js adapter.
//!
//! `nodeVersion` is checked against the `node` found on PATH before the
//! first case runs. Only the configured components are compared, so `20`
//! accepts any 20.x release. Non-numeric aliases such as `lts` are not
//! checked.
//!
//! On Windows there is no `/dev/stdin`, so solutions reading it through
//! `fs.readFileSync('/dev/stdin', ...)` get the input inlined as a string
//! literal in a temporary copy of the source.

use super::{require_non_blank, LanguageRunner};
use crate::error::{EngineError, Result};
use crate::process::{self, ExecutionOutput};
use crate::resources::ResourceGuard;
use crate::settings::{RunnerSettings, VersionValue};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::{NoExpand, Regex};
use serde::Deserialize;
use solvekit_common::types::Language;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

const NODE: &str = "node";

lazy_static! {
    // Receiver included: `fs.readFileSync(..)`, `require('fs').readFileSync(..)` or bare
    static ref STDIN_READ: Regex = Regex::new(
        r#"(?:(?:require\(\s*['"](?:node:)?fs['"]\s*\)|[A-Za-z_$][\w$]*)\s*\.\s*)?readFileSync\(\s*['"`]/dev/stdin['"`]\s*(?:,[^)]*)?\)"#
    )
    .expect("valid stdin pattern");
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavascriptSettings {
    pub node_version: VersionValue,
}

pub struct JavascriptRunner {
    settings: JavascriptSettings,
}

impl JavascriptRunner {
    pub fn new(settings: &RunnerSettings) -> Result<Self> {
        let settings: JavascriptSettings = settings.typed(Language::Javascript.id())?;
        require_non_blank(Language::Javascript, "nodeVersion", &settings.node_version.to_string())?;
        Ok(Self { settings })
    }
}

/// Replace every `readFileSync('/dev/stdin'...)` call (receiver included) with `stdin` as a JSON
/// string literal. `None` when the source never reads `/dev/stdin`.
pub fn inline_stdin_literal(source: &str, stdin: &str) -> Option<String> {
    if !STDIN_READ.is_match(source) {
        return None;
    }
    let literal = serde_json::to_string(stdin).ok()?;
    Some(STDIN_READ.replace_all(source, NoExpand(&literal)).into_owned())
}

async fn prepare_windows_source(target: &Path, stdin: &str, resources: &mut ResourceGuard) -> Result<PathBuf> {
    let source = tokio::fs::read_to_string(target).await?;
    match inline_stdin_literal(&source, stdin) {
        Some(rewritten) => {
            let path = std::env::temp_dir().join(format!("solvekit-{}.js", uuid::Uuid::new_v4()));
            resources.track(&path);
            tokio::fs::write(&path, rewritten).await?;
            debug!(path = %path.display(), "Inlined stdin into javascript source");
            Ok(path)
        }
        None => Ok(target.to_path_buf()),
    }
}

/// Whether `reported` (as printed by `node --version`) satisfies `configured`
pub fn node_version_matches(configured: &str, reported: &str) -> bool {
    let wanted: Vec<&str> = configured.trim().trim_start_matches('v').split('.').collect();
    if wanted.iter().any(|part| part.parse::<u64>().is_err()) {
        return true;
    }
    let actual: Vec<&str> = reported.trim().trim_start_matches('v').split('.').collect();
    wanted.len() <= actual.len()
        && wanted
            .iter()
            .zip(&actual)
            .all(|(want, have)| want.parse::<u64>().ok() == have.parse::<u64>().ok())
}

async fn installed_node_version() -> Result<String> {
    let output = Command::new(NODE).arg("--version").output().await?;
    if !output.status.success() {
        return Err(EngineError::CommandNotAvailable(NODE.to_string()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

pub fn factory(settings: &RunnerSettings) -> Result<Box<dyn LanguageRunner>> {
    Ok(Box::new(JavascriptRunner::new(settings)?))
}

#[async_trait]
impl LanguageRunner for JavascriptRunner {
    fn language(&self) -> Language {
        Language::Javascript
    }

    fn runtime_info(&self) -> Vec<(String, String)> {
        vec![
            ("Programming language".to_string(), "javascript".to_string()),
            ("Node version".to_string(), self.settings.node_version.to_string()),
        ]
    }

    async fn compile(&self, source: &Path, _resources: &mut ResourceGuard) -> Result<PathBuf> {
        process::ensure_command(NODE)?;
        let configured = self.settings.node_version.to_string();
        let installed = installed_node_version().await?;
        if !node_version_matches(&configured, &installed) {
            return Err(EngineError::invalid_config(
                Language::Javascript.id(),
                format!("nodeVersion is {} but node on PATH is {}", configured, installed),
            ));
        }
        debug!(node = %installed, "Node version checked");
        Ok(source.to_path_buf())
    }

    async fn execute(
        &self,
        stdin: &str,
        target: &Path,
        limit: Option<Duration>,
        resources: &mut ResourceGuard,
    ) -> Result<ExecutionOutput> {
        let script = if cfg!(windows) {
            prepare_windows_source(target, stdin, resources).await?
        } else {
            target.to_path_buf()
        };
        let mut command = Command::new(NODE);
        command.arg(&script);
        process::run_with_input(command, stdin, limit).await
    }
}
