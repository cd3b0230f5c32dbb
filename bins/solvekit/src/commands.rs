// CLI command handlers wiring configuration, store and engine together
use anyhow::{bail, Context, Result};
use colored::Colorize;
use solvekit_common::config::{AppConfig, RUNNER_SETTINGS_FILE};
use solvekit_common::types::{Language, Problem};
use solvekit_engine::orchestrator::{RunOptions, RunOrchestrator, RunReport};
use solvekit_engine::provider::{DirectoryProvider, ProblemProvider};
use solvekit_engine::report::Reporter;
use solvekit_engine::runner::{LanguageRunner, RunnerRegistry};
use solvekit_engine::settings::RunnerSettings;
use solvekit_engine::store::{self, CommandEditor, TestCaseStore};
use solvekit_engine::{EngineError, ErrorCategory};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub struct TestArgs {
    pub source: PathBuf,
    pub index: Option<u32>,
    pub samples: Option<PathBuf>,
    pub settings: Option<PathBuf>,
    pub timeout_ms: Option<u64>,
    pub lang: Option<String>,
}

/// Problem of a source file, scoped relative to the current directory
fn resolve_problem(source: &Path) -> Result<Problem> {
    let root = std::env::current_dir().context("Failed to read the current directory")?;
    let absolute = root.join(source);
    Problem::from_source(&root, &absolute)
        .with_context(|| format!("Cannot derive a problem id from {}", source.display()))
}

/// Explicit id first, then the file extension, then the configured default
fn resolve_language(source: &Path, explicit: Option<&str>, default: Option<&str>) -> Result<Language> {
    if let Some(id) = explicit {
        return Language::from_id(id).ok_or_else(|| EngineError::UnsupportedLanguage(id.to_string()).into());
    }
    if let Some(language) = Language::from_path(source) {
        return Ok(language);
    }
    if let Some(id) = default {
        return Language::from_id(id).ok_or_else(|| EngineError::UnsupportedLanguage(id.to_string()).into());
    }
    let extension = source
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default();
    Err(EngineError::UnsupportedLanguage(extension).into())
}

/// `--timeout-ms` wins over the environment; `0` disables the limit
fn resolve_timeout(flag: Option<u64>, config: &AppConfig) -> Option<Duration> {
    match flag {
        Some(0) => None,
        Some(ms) => Some(Duration::from_millis(ms)),
        None => config.timeout(),
    }
}

/// Size of the controlling terminal, falling back to `COLUMNS`
fn terminal_width() -> Option<usize> {
    match crossterm::terminal::size() {
        Ok((columns, _)) if columns > 0 => Some(usize::from(columns)),
        _ => columns_width(std::env::var("COLUMNS").ok()),
    }
}

fn columns_width(columns: Option<String>) -> Option<usize> {
    columns
        .and_then(|value| value.trim().parse().ok())
        .filter(|width: &usize| *width > 0)
}

fn load_settings(explicit: Option<&Path>) -> Result<RunnerSettings> {
    if let Some(path) = explicit {
        return Ok(RunnerSettings::load(path)?);
    }
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    match RunnerSettings::discover(&cwd) {
        Ok(settings) => Ok(settings),
        Err(EngineError::SettingsNotFound(_)) => {
            debug!("No {} found, using empty runner settings", RUNNER_SETTINGS_FILE);
            Ok(RunnerSettings::default())
        }
        Err(e) => Err(e.into()),
    }
}

fn create_runner(language: Language, settings: &RunnerSettings) -> Result<Box<dyn LanguageRunner>> {
    let runner = RunnerRegistry::builtin().create(language, settings);
    match runner {
        Err(e @ EngineError::RunnerConfigInvalid { .. }) if settings.source().is_none() => Err(anyhow::Error::new(e)
            .context(format!(
                "no {} found in the current directory or any parent",
                RUNNER_SETTINGS_FILE
            ))),
        other => Ok(other?),
    }
}

fn is_tests_not_found(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<EngineError>()
        .is_some_and(|e| e.category() == ErrorCategory::TestsNotFound)
}

async fn run_once(
    runner: &dyn LanguageRunner,
    store: &TestCaseStore,
    source: &Path,
    options: &RunOptions,
) -> Result<RunReport> {
    let reporter = Reporter::new(io::stdout(), terminal_width());
    let mut orchestrator = RunOrchestrator::new(runner, reporter);
    Ok(orchestrator.run(store, source, options).await?)
}

pub async fn run_tests(config: &AppConfig, args: TestArgs) -> Result<()> {
    if !args.source.is_file() {
        bail!("Source file not found: {}", args.source.display());
    }
    let problem = resolve_problem(&args.source)?;
    let language = resolve_language(
        &args.source,
        args.lang.as_deref(),
        config.default_language.as_deref(),
    )?;
    let settings = load_settings(args.settings.as_deref())?;
    let runner = create_runner(language, &settings)?;
    let store = TestCaseStore::new(config, problem.path_scope.as_str());
    let options = RunOptions {
        timeout: resolve_timeout(args.timeout_ms, config),
        selected: args.index,
    };
    info!(problem = %problem.id, scope = %problem.path_scope, %language, "Running tests");

    let report = match run_once(runner.as_ref(), &store, &args.source, &options).await {
        Err(e) if is_tests_not_found(&e) => {
            let Some(samples) = args.samples else {
                return Err(e.context("add tests with `solvekit fetch --samples <dir>` or `solvekit add-test`"));
            };
            println!("{}", format!("No test cases stored, fetching samples from {}", samples.display()).dimmed());
            fetch_into(&problem, &store, &DirectoryProvider::new(samples)).await?;
            run_once(runner.as_ref(), &store, &args.source, &options).await?
        }
        other => other?,
    };
    debug!(executed = report.cases.len(), all_passed = report.all_passed(), "Test command finished");
    Ok(())
}

/// Fetch samples and metadata through `provider` and store them
async fn fetch_into(problem: &Problem, store: &TestCaseStore, provider: &dyn ProblemProvider) -> Result<Vec<u32>> {
    let fetched = provider.fetch_problem(problem).await?;
    if let Some(meta) = &fetched.meta {
        store.save_meta(meta).await?;
    }
    Ok(store.append(&fetched.samples).await?)
}

pub async fn fetch(config: &AppConfig, source: &Path, samples: &Path, force: bool) -> Result<()> {
    let problem = resolve_problem(source)?;
    let store = TestCaseStore::new(config, problem.path_scope.as_str());
    if force {
        store.clear_all().await?;
    } else if !store.indices().await?.is_empty() {
        bail!("Test cases already exist for {}; pass --force to replace them", problem.id);
    }
    let written = fetch_into(&problem, &store, &DirectoryProvider::new(samples)).await?;
    println!("{} Saved {} test case(s) for {}", "✔".green(), written.len(), problem.id);
    Ok(())
}

pub async fn add_test(config: &AppConfig, source: &Path) -> Result<()> {
    let problem = resolve_problem(source)?;
    let store = TestCaseStore::new(config, problem.path_scope.as_str());
    let case = store.add_manual(&CommandEditor::new(config.editor.as_str())).await?;
    println!("{} Test {} added", "✔".green(), case.index);
    Ok(())
}

pub async fn edit_test(config: &AppConfig, source: &Path, index: u32) -> Result<()> {
    let problem = resolve_problem(source)?;
    let store = TestCaseStore::new(config, problem.path_scope.as_str());
    store.edit(index, &CommandEditor::new(config.editor.as_str())).await?;
    println!("{} Test {} updated", "✔".green(), index);
    Ok(())
}

pub async fn view_tests(config: &AppConfig, source: &Path) -> Result<()> {
    let mut problem = resolve_problem(source)?;
    let store = TestCaseStore::new(config, problem.path_scope.as_str());
    store.load_problem(&mut problem).await?;
    if problem.tests.is_empty() {
        println!("No test cases stored for {}", problem.id);
        return Ok(());
    }
    if let Some(title) = problem.meta.as_ref().and_then(|meta| meta.title.as_deref()) {
        println!("{}", format!("{} ({})", title, problem.id).bold());
    }
    let mut reporter = Reporter::new(io::stdout(), terminal_width());
    reporter.test_listing(&problem.tests)?;
    Ok(())
}

pub async fn clear_test(config: &AppConfig, source: &Path, index: u32) -> Result<()> {
    let problem = resolve_problem(source)?;
    let store = TestCaseStore::new(config, problem.path_scope.as_str());
    store.clear(index).await?;
    println!("{} Test {} removed", "✔".green(), index);
    Ok(())
}

pub async fn clear_tests(config: &AppConfig, source: &Path) -> Result<()> {
    let problem = resolve_problem(source)?;
    TestCaseStore::new(config, problem.path_scope.as_str()).clear_all().await?;
    println!("{} All tests of {} removed", "✔".green(), problem.id);
    Ok(())
}

pub async fn clear_cache(config: &AppConfig) -> Result<()> {
    store::clear_cache(config).await?;
    println!("{} Cache cleared", "✔".green());
    Ok(())
}

pub fn show_config(config: &AppConfig) -> Result<()> {
    let timeout = match config.timeout() {
        Some(limit) => format!("{} ms", limit.as_millis()),
        None => "disabled".to_string(),
    };
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let settings = match RunnerSettings::discover(&cwd) {
        Ok(settings) => settings
            .source()
            .map(|path| path.display().to_string())
            .unwrap_or_default(),
        Err(EngineError::SettingsNotFound(_)) => "not found".to_string(),
        Err(e) => format!("invalid ({})", e),
    };
    let languages: Vec<&str> = RunnerRegistry::builtin()
        .languages()
        .into_iter()
        .map(|language| language.id())
        .collect();

    println!("Cache directory:   {}", config.cache_dir.display());
    println!("Timeout:           {}", timeout);
    println!("Default language:  {}", config.default_language.as_deref().unwrap_or("-"));
    println!("Editor:            {}", config.editor);
    println!("Runner settings:   {}", settings);
    println!("Languages:         {}", languages.join(", "));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use solvekit_engine::provider::FetchedProblem;

    fn config(root: &Path) -> AppConfig {
        let cache = root.to_string_lossy().into_owned();
        AppConfig::from_lookup(move |key| (key == "SOLVEKIT_CACHE_DIR").then(|| cache.clone()))
    }

    #[test]
    fn test_language_resolution_order() {
        let cpp = Path::new("a.cpp");
        let odd = Path::new("a.txt");
        assert_eq!(resolve_language(cpp, None, None).unwrap(), Language::Cpp);
        assert_eq!(resolve_language(cpp, Some("c"), None).unwrap(), Language::C);
        assert_eq!(resolve_language(odd, None, Some("python")).unwrap(), Language::Python);
        assert_eq!(resolve_language(cpp, None, Some("python")).unwrap(), Language::Cpp);

        let err = resolve_language(odd, None, None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::UnsupportedLanguage(ext)) if ext == "txt"
        ));
    }

    #[test]
    fn test_timeout_resolution() {
        let root = tempfile::tempdir().unwrap();
        let config = config(root.path());
        assert_eq!(resolve_timeout(None, &config), Some(Duration::from_millis(5000)));
        assert_eq!(resolve_timeout(Some(0), &config), None);
        assert_eq!(resolve_timeout(Some(250), &config), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_terminal_width_from_columns() {
        assert_eq!(columns_width(Some("120".to_string())), Some(120));
        assert_eq!(columns_width(Some("0".to_string())), None);
        assert_eq!(columns_width(Some("wide".to_string())), None);
        assert_eq!(columns_width(None), None);
    }

    #[test]
    fn test_tests_not_found_is_detected_through_anyhow() {
        let err: anyhow::Error = EngineError::TestsNotFound("p".to_string()).into();
        assert!(is_tests_not_found(&err));
        let err: anyhow::Error = EngineError::TestNotFound(1).into();
        assert!(!is_tests_not_found(&err));
    }

    struct StaticProvider;

    #[async_trait::async_trait]
    impl ProblemProvider for StaticProvider {
        async fn fetch_problem(&self, _problem: &Problem) -> solvekit_engine::Result<FetchedProblem> {
            Ok(FetchedProblem {
                meta: Some(solvekit_common::types::ProblemMeta {
                    title: Some("Sum".to_string()),
                    ..Default::default()
                }),
                samples: vec![("1 2\n".to_string(), "3\n".to_string())],
            })
        }
    }

    #[tokio::test]
    async fn test_fetch_into_stores_samples_and_meta() {
        let root = tempfile::tempdir().unwrap();
        let store = TestCaseStore::new(&config(root.path()), "sum");
        let problem = Problem::new("sum", "sum");

        let written = fetch_into(&problem, &store, &StaticProvider).await.unwrap();
        assert_eq!(written, vec![1]);
        assert_eq!(store.read_all().await.unwrap()[0].expected_stdout, "3\n");
        assert_eq!(
            store.load_meta().await.unwrap().and_then(|meta| meta.title),
            Some("Sum".to_string())
        );
    }
}
