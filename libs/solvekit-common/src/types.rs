use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};

/// Supported solution languages.
///
/// The identifier returned by [`Language::id`] is the key used both in
/// `runner-settings.json` and in the runner registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    Cpp,
    Rust,
    Go,
    Java,
    Kotlin,
    Swift,
    Python,
    Ruby,
    Javascript,
}

impl Language {
    pub const ALL: [Language; 10] = [
        Language::C,
        Language::Cpp,
        Language::Rust,
        Language::Go,
        Language::Java,
        Language::Kotlin,
        Language::Swift,
        Language::Python,
        Language::Ruby,
        Language::Javascript,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Java => "java",
            Language::Kotlin => "kotlin",
            Language::Swift => "swift",
            Language::Python => "python",
            Language::Ruby => "ruby",
            Language::Javascript => "javascript",
        }
    }

    /// Parse a language identifier (case-insensitive)
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim().to_lowercase();
        Self::ALL.iter().copied().find(|lang| lang.id() == id)
    }

    /// File extensions recognised for this language, primary one first
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::C => &["c"],
            Language::Cpp => &["cpp", "cc", "cxx", "c++"],
            Language::Rust => &["rs"],
            Language::Go => &["go"],
            Language::Java => &["java"],
            Language::Kotlin => &["kt"],
            Language::Swift => &["swift"],
            Language::Python => &["py"],
            Language::Ruby => &["rb"],
            Language::Javascript => &["js"],
        }
    }

    /// Infer the language from a source file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|lang| lang.extensions().contains(&ext.as_str()))
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Whether a runnable artifact must be built before execution
    pub fn is_compiled(&self) -> bool {
        !matches!(self, Language::Python | Language::Ruby | Language::Javascript)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Optional descriptive data about a problem, supplied by a problem provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemMeta {
    pub title: Option<String>,
    pub statement: Option<String>,
    pub url: Option<String>,
    pub tags: Vec<String>,
    pub difficulty: Option<String>,
}

/// One stdin / expected-stdout pair.
///
/// Immutable once written: edits happen on the fixture files, never through
/// this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub index: u32,
    pub stdin: String,
    pub expected_stdout: String,
}

impl TestCase {
    pub fn new(index: u32, stdin: impl Into<String>, expected_stdout: impl Into<String>) -> Self {
        Self {
            index,
            stdin: stdin.into(),
            expected_stdout: expected_stdout.into(),
        }
    }
}

/// Verdict for a single executed test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestStatus {
    Passed,
    Failed,
    Timeout,
    RuntimeError,
}

impl TestStatus {
    pub fn is_passed(&self) -> bool {
        matches!(self, TestStatus::Passed)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TestStatus::Passed => "Passed",
            TestStatus::Failed => "Failed",
            TestStatus::Timeout => "Timeout",
            TestStatus::RuntimeError => "Runtime Error",
        };
        f.write_str(label)
    }
}

/// A problem being worked on from one particular source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    /// Provider-assigned identifier
    pub id: String,
    /// Disambiguates the same problem solved in several directories
    pub path_scope: String,
    pub meta: Option<ProblemMeta>,
    pub tests: Vec<TestCase>,
}

impl Problem {
    pub fn new(id: impl Into<String>, path_scope: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path_scope: path_scope.into(),
            meta: None,
            tests: Vec::new(),
        }
    }

    /// Build a problem from its source file, scoped relative to `root`.
    ///
    /// The id is the file stem: `dp/1000.cpp` is problem `1000` with
    /// path-scope `dp__1000`.
    pub fn from_source(root: &Path, source: &Path) -> Option<Self> {
        let id = source.file_stem()?.to_str()?.to_string();
        Some(Self::new(id, path_scope(root, source)))
    }
}

/// Derive the path-scope of a source file relative to `root`
pub fn path_scope(root: &Path, source: &Path) -> String {
    let relative = source.strip_prefix(root).unwrap_or(source);
    relative
        .with_extension("")
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("__")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_language_ids_round_trip() {
        for lang in Language::ALL {
            assert_eq!(Language::from_id(lang.id()), Some(lang));
        }
        assert_eq!(Language::from_id("CPP"), Some(Language::Cpp));
        assert_eq!(Language::from_id("brainfuck"), None);
    }

    #[test]
    fn test_language_from_extension() {
        assert_eq!(Language::from_extension("cc"), Some(Language::Cpp));
        assert_eq!(Language::from_extension(".rs"), Some(Language::Rust));
        assert_eq!(Language::from_extension("KT"), Some(Language::Kotlin));
        assert_eq!(Language::from_extension("txt"), None);
        assert_eq!(
            Language::from_path(Path::new("solutions/1000.py")),
            Some(Language::Python)
        );
    }

    #[test]
    fn test_compiled_languages() {
        assert!(Language::Cpp.is_compiled());
        assert!(Language::Java.is_compiled());
        assert!(!Language::Python.is_compiled());
        assert!(!Language::Javascript.is_compiled());
    }

    #[test]
    fn test_path_scope_distinguishes_directories() {
        let root = PathBuf::from("/work");
        let a = path_scope(&root, Path::new("/work/dp/1000.cpp"));
        let b = path_scope(&root, Path::new("/work/greedy/1000.cpp"));
        assert_eq!(a, "dp__1000");
        assert_eq!(b, "greedy__1000");
        assert_ne!(a, b);
    }

    #[test]
    fn test_problem_from_source() {
        let problem = Problem::from_source(Path::new("/work"), Path::new("/work/1000.rs"))
            .expect("valid source path");
        assert_eq!(problem.id, "1000");
        assert_eq!(problem.path_scope, "1000");
        assert!(problem.tests.is_empty());
    }

    #[test]
    fn test_meta_deserializes_partial_json() {
        let meta: ProblemMeta = serde_json::from_str(r#"{"title": "A+B"}"#).unwrap();
        assert_eq!(meta.title.as_deref(), Some("A+B"));
        assert!(meta.tags.is_empty());
    }
}
