// Problem providers: where sample tests and metadata come from
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use solvekit_common::types::{Problem, ProblemMeta};
use std::cmp::Ordering;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const META_FILE: &str = "problem.json";

/// Samples and metadata as delivered by a provider
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedProblem {
    pub meta: Option<ProblemMeta>,
    /// `(stdin, expected stdout)` in provider order
    pub samples: Vec<(String, String)>,
}

#[async_trait]
pub trait ProblemProvider: Send + Sync {
    async fn fetch_problem(&self, problem: &Problem) -> Result<FetchedProblem>;
}

/// Reads `<name>.in` / `<name>.out` pairs and an optional `problem.json`
/// from a local directory.
pub struct DirectoryProvider {
    root: PathBuf,
}

impl DirectoryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn sample_stems(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut stems = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("in") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                stems.push(stem.to_string());
            }
        }
        stems.sort_by(|a, b| natural_cmp(a, b));
        Ok(stems)
    }

    async fn read_meta(&self) -> Result<Option<ProblemMeta>> {
        match tokio::fs::read(self.root.join(META_FILE)).await {
            Ok(content) => Ok(Some(serde_json::from_slice(&content)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ProblemProvider for DirectoryProvider {
    async fn fetch_problem(&self, problem: &Problem) -> Result<FetchedProblem> {
        let mut samples = Vec::new();
        for stem in self.sample_stems().await? {
            let input = self.root.join(format!("{}.in", stem));
            let answer = self.root.join(format!("{}.out", stem));
            let expected = read_answer(&answer).await?;
            samples.push((tokio::fs::read_to_string(&input).await?, expected));
        }
        if samples.is_empty() {
            return Err(EngineError::TestsNotFound(problem.id.clone()));
        }
        info!(problem = %problem.id, dir = %self.root.display(), count = samples.len(), "Fetched samples");

        Ok(FetchedProblem {
            meta: self.read_meta().await?,
            samples,
        })
    }
}

async fn read_answer(path: &Path) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Sample answer missing");
            Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("sample answer {} is missing", path.display()),
            )
            .into())
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Chunk<'a> {
    Number(u64),
    Text(&'a str),
}

fn chunks(name: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let bytes = name.as_bytes();
    while start < bytes.len() {
        let digit = bytes[start].is_ascii_digit();
        let end = bytes[start..]
            .iter()
            .position(|b| b.is_ascii_digit() != digit)
            .map_or(bytes.len(), |offset| start + offset);
        let part = &name[start..end];
        out.push(match part.parse() {
            Ok(number) if digit => Chunk::Number(number),
            _ => Chunk::Text(part),
        });
        start = end;
    }
    out
}

/// `sample2` sorts before `sample10`
fn natural_cmp(a: &str, b: &str) -> Ordering {
    chunks(a).cmp(&chunks(b)).then_with(|| a.cmp(b))
}
