/// Test Case Store - fixture persistence for one problem path-scope
///
/// **Layout:**
/// - `<cache>/tests/<scope>/test_N` holds the stdin of Test Case N
/// - `<cache>/answers/<scope>/answer_N` holds its expected stdout
/// - `<cache>/meta/<scope>.json` holds the problem metadata, if known
///
/// **Invariant:** the index sets of both trees are identical. Any drift
/// (e.g. a fetch killed halfway) surfaces as a consistency error and the
/// whole scope has to be cleared.
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use solvekit_common::config::AppConfig;
use solvekit_common::types::{Problem, ProblemMeta, TestCase};
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

const TEST_PREFIX: &str = "test_";
const ANSWER_PREFIX: &str = "answer_";

/// Opens a fixture file for interactive editing and waits for it to close
#[async_trait]
pub trait FixtureEditor: Send + Sync {
    async fn edit(&self, path: &Path) -> Result<()>;
}

/// Runs an external editor command such as `vi` or `code --wait`
pub struct CommandEditor {
    program: String,
}

impl CommandEditor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl FixtureEditor for CommandEditor {
    async fn edit(&self, path: &Path) -> Result<()> {
        let mut parts = self.program.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "editor command is empty"))?;
        let status = Command::new(program).args(parts).arg(path).status().await?;
        if !status.success() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("editor '{}' exited with {}", self.program, status),
            )
            .into());
        }
        Ok(())
    }
}

pub struct TestCaseStore {
    tests_dir: PathBuf,
    answers_dir: PathBuf,
    meta_file: PathBuf,
    scope: String,
}

impl TestCaseStore {
    pub fn new(config: &AppConfig, scope: impl Into<String>) -> Self {
        let scope = scope.into();
        Self {
            tests_dir: config.tests_dir().join(&scope),
            answers_dir: config.answers_dir().join(&scope),
            meta_file: config.meta_dir().join(format!("{}.json", scope)),
            scope,
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn test_path(&self, index: u32) -> PathBuf {
        self.tests_dir.join(format!("{}{}", TEST_PREFIX, index))
    }

    pub fn answer_path(&self, index: u32) -> PathBuf {
        self.answers_dir.join(format!("{}{}", ANSWER_PREFIX, index))
    }

    /// Sorted indices present in both trees
    pub async fn indices(&self) -> Result<Vec<u32>> {
        let tests = scan_indices(&self.tests_dir, TEST_PREFIX).await?;
        let answers = scan_indices(&self.answers_dir, ANSWER_PREFIX).await?;
        if tests != answers {
            warn!(scope = %self.scope, ?tests, ?answers, "Fixture indices out of sync");
            return Err(EngineError::Consistency {
                scope: self.scope.clone(),
                tests,
                answers,
            });
        }
        Ok(tests)
    }

    /// Every stored Test Case in ascending index order
    #[instrument(skip(self), fields(scope = %self.scope))]
    pub async fn read_all(&self) -> Result<Vec<TestCase>> {
        let indices = self.indices().await?;
        let mut cases = Vec::with_capacity(indices.len());
        for index in indices {
            cases.push(self.read_pair(index).await?);
        }
        debug!(count = cases.len(), "Loaded test cases");
        Ok(cases)
    }

    pub async fn read(&self, index: u32) -> Result<TestCase> {
        let test = tokio::fs::try_exists(self.test_path(index)).await?;
        let answer = tokio::fs::try_exists(self.answer_path(index)).await?;
        match (test, answer) {
            (true, true) => self.read_pair(index).await,
            (false, false) => Err(EngineError::TestNotFound(index)),
            _ => {
                warn!(scope = %self.scope, index, test, answer, "Half-written fixture pair");
                Err(EngineError::Consistency {
                    scope: self.scope.clone(),
                    tests: scan_indices(&self.tests_dir, TEST_PREFIX).await?,
                    answers: scan_indices(&self.answers_dir, ANSWER_PREFIX).await?,
                })
            }
        }
    }

    async fn read_pair(&self, index: u32) -> Result<TestCase> {
        let stdin = tokio::fs::read_to_string(self.test_path(index)).await?;
        let expected_stdout = tokio::fs::read_to_string(self.answer_path(index)).await?;
        Ok(TestCase::new(index, stdin, expected_stdout))
    }

    async fn exists(&self, index: u32) -> Result<bool> {
        let test = tokio::fs::try_exists(self.test_path(index)).await?;
        let answer = tokio::fs::try_exists(self.answer_path(index)).await?;
        Ok(test || answer)
    }

    /// Persist a new Test Case; an occupied index is never overwritten
    pub async fn write(&self, case: &TestCase) -> Result<()> {
        if self.exists(case.index).await? {
            return Err(EngineError::TestAlreadyExists(case.index));
        }
        tokio::fs::create_dir_all(&self.tests_dir).await?;
        tokio::fs::create_dir_all(&self.answers_dir).await?;

        let test_path = self.test_path(case.index);
        tokio::fs::write(&test_path, &case.stdin).await?;
        if let Err(e) = tokio::fs::write(self.answer_path(case.index), &case.expected_stdout).await {
            let _ = tokio::fs::remove_file(&test_path).await;
            return Err(e.into());
        }
        debug!(scope = %self.scope, index = case.index, "Stored test case");
        Ok(())
    }

    /// One past the highest index in use, so deleted slots are never reused
    pub async fn next_index(&self) -> Result<u32> {
        Ok(self.indices().await?.last().map_or(1, |max| max + 1))
    }

    /// Append a set of cases at fresh indices, returning the indices used
    pub async fn append(&self, samples: &[(String, String)]) -> Result<Vec<u32>> {
        let mut index = self.next_index().await?;
        let mut written = Vec::with_capacity(samples.len());
        for (stdin, expected) in samples {
            self.write(&TestCase::new(index, stdin.as_str(), expected.as_str()))
                .await?;
            written.push(index);
            index += 1;
        }
        info!(scope = %self.scope, count = written.len(), "Saved test cases");
        Ok(written)
    }

    /// Create an empty pair at the next index and let the user fill the
    /// input, then the expected output. The pair is removed again if the
    /// editor fails.
    pub async fn add_manual(&self, editor: &dyn FixtureEditor) -> Result<TestCase> {
        let index = self.next_index().await?;
        self.write(&TestCase::new(index, "", "")).await?;
        if let Err(e) = self.edit_pair(index, editor).await {
            self.remove_pair(index).await?;
            return Err(e);
        }
        info!(scope = %self.scope, index, "Added manual test case");
        self.read_pair(index).await
    }

    /// Re-open an existing pair in the editor
    pub async fn edit(&self, index: u32, editor: &dyn FixtureEditor) -> Result<TestCase> {
        if !self.exists(index).await? {
            return Err(EngineError::TestNotFound(index));
        }
        self.edit_pair(index, editor).await?;
        self.read_pair(index).await
    }

    async fn edit_pair(&self, index: u32, editor: &dyn FixtureEditor) -> Result<()> {
        editor.edit(&self.test_path(index)).await?;
        editor.edit(&self.answer_path(index)).await
    }

    /// Remove exactly the pair at `index`
    pub async fn clear(&self, index: u32) -> Result<()> {
        if !self.exists(index).await? {
            return Err(EngineError::TestNotFound(index));
        }
        self.remove_pair(index).await?;
        info!(scope = %self.scope, index, "Removed test case");
        Ok(())
    }

    async fn remove_pair(&self, index: u32) -> Result<()> {
        remove_if_exists(&self.test_path(index)).await?;
        remove_if_exists(&self.answer_path(index)).await
    }

    /// Drop every fixture and the metadata of this scope. Idempotent.
    pub async fn clear_all(&self) -> Result<()> {
        remove_if_exists(&self.tests_dir).await?;
        remove_if_exists(&self.answers_dir).await?;
        remove_if_exists(&self.meta_file).await?;
        info!(scope = %self.scope, "Cleared all test cases");
        Ok(())
    }

    pub async fn save_meta(&self, meta: &ProblemMeta) -> Result<()> {
        if let Some(parent) = self.meta_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.meta_file, serde_json::to_vec_pretty(meta)?).await?;
        Ok(())
    }

    pub async fn load_meta(&self) -> Result<Option<ProblemMeta>> {
        match tokio::fs::read(&self.meta_file).await {
            Ok(content) => Ok(Some(serde_json::from_slice(&content)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Fill `problem` with the stored cases and metadata of this scope
    pub async fn load_problem(&self, problem: &mut Problem) -> Result<()> {
        problem.tests = self.read_all().await?;
        problem.meta = self.load_meta().await?;
        Ok(())
    }
}

/// Remove the fixtures of every problem
pub async fn clear_cache(config: &AppConfig) -> Result<()> {
    for dir in [config.tests_dir(), config.answers_dir(), config.meta_dir()] {
        remove_if_exists(&dir).await?;
    }
    info!(cache_dir = %config.cache_dir.display(), "Cache cleared");
    Ok(())
}

async fn scan_indices(dir: &Path, prefix: &str) -> Result<Vec<u32>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut found = BTreeSet::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let index = name
            .to_str()
            .and_then(|name| name.strip_prefix(prefix))
            .and_then(|suffix| suffix.parse::<u32>().ok());
        if let Some(index) = index {
            found.insert(index);
        }
    }
    Ok(found.into_iter().collect())
}

async fn remove_if_exists(path: &Path) -> Result<()> {
    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await?;
    } else {
        tokio::fs::remove_file(path).await?;
    }
    Ok(())
}
