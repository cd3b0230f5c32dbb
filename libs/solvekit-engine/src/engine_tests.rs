/// End-to-end tests of the run orchestrator
///
/// These drive a complete run through a shell-script runner:
/// 1. Compile once, then judge every case in index order
/// 2. Timeouts and runtime errors stay per-case
/// 3. Compile failures short-circuit to the report
/// 4. Temporary artifacts are gone once the run returns

#[cfg(all(test, unix))]
mod run_tests {
    use crate::error::{EngineError, ErrorCategory, Result};
    use crate::orchestrator::{RunOptions, RunOrchestrator, RunPhase};
    use crate::process::{self, ExecutionOutput};
    use crate::report::Reporter;
    use crate::resources::ResourceGuard;
    use crate::runner::{artifact_path, LanguageRunner, RunnerRegistry};
    use crate::settings::RunnerSettings;
    use crate::store::TestCaseStore;
    use async_trait::async_trait;
    use solvekit_common::config::AppConfig;
    use solvekit_common::types::{Language, TestCase, TestStatus};
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::process::Command;

    /// "Compiles" a shell script by syntax-checking a copy of it
    #[derive(Default)]
    struct ShellRunner {
        artifacts: Mutex<Vec<PathBuf>>,
    }

    impl ShellRunner {
        fn artifacts(&self) -> Vec<PathBuf> {
            self.artifacts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LanguageRunner for ShellRunner {
        fn language(&self) -> Language {
            Language::C
        }

        fn runtime_info(&self) -> Vec<(String, String)> {
            vec![("Programming language".to_string(), "sh".to_string())]
        }

        fn requires_compilation(&self) -> bool {
            true
        }

        async fn compile(&self, source: &Path, resources: &mut ResourceGuard) -> Result<PathBuf> {
            let artifact = artifact_path(resources);
            self.artifacts.lock().unwrap().push(artifact.clone());
            tokio::fs::copy(source, &artifact).await?;
            let mut check = Command::new("sh");
            check.arg("-n").arg(&artifact);
            process::run_compiler(check).await?;
            Ok(artifact)
        }

        async fn execute(
            &self,
            stdin: &str,
            target: &Path,
            limit: Option<Duration>,
            _resources: &mut ResourceGuard,
        ) -> Result<ExecutionOutput> {
            let mut command = Command::new("sh");
            command.arg(target);
            process::run_with_input(command, stdin, limit).await
        }
    }

    struct Fixture {
        dir: TempDir,
        store: TestCaseStore,
    }

    async fn fixture(cases: &[(u32, &str, &str)]) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache").to_string_lossy().into_owned();
        let config = AppConfig::from_lookup(move |key| (key == "SOLVEKIT_CACHE_DIR").then(|| cache.clone()));
        let store = TestCaseStore::new(&config, "solution");
        for (index, stdin, expected) in cases {
            store.write(&TestCase::new(*index, *stdin, *expected)).await.unwrap();
        }
        Fixture { dir, store }
    }

    fn write_source(fixture: &Fixture, name: &str, body: &str) -> PathBuf {
        let path = fixture.dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    fn reporter() -> Reporter<Vec<u8>> {
        colored::control::set_override(false);
        Reporter::new(Vec::new(), Some(100))
    }

    fn printed(orchestrator: RunOrchestrator<'_, Vec<u8>>) -> String {
        String::from_utf8(orchestrator.into_reporter().into_inner()).unwrap()
    }

    const DOUBLER: &str = "read n\necho $((n * 2))\n";

    #[tokio::test]
    async fn test_all_cases_pass() {
        let fixture = fixture(&[(1, "2\n", "4\n"), (2, "5\n", "10\n")]).await;
        let source = write_source(&fixture, "double.sh", DOUBLER);
        let runner = ShellRunner::default();

        let mut orchestrator = RunOrchestrator::new(&runner, reporter());
        let options = RunOptions {
            timeout: Some(Duration::from_secs(5)),
            selected: None,
        };
        let report = orchestrator.run(&fixture.store, &source, &options).await.unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.cases.len(), 2);
        assert!(report.all_passed());
        assert_eq!(
            orchestrator.phase_history(),
            &[
                RunPhase::Idle,
                RunPhase::TestsLoaded,
                RunPhase::Compiled,
                RunPhase::Running,
                RunPhase::Reported,
                RunPhase::Cleaned
            ]
        );

        let artifacts = runner.artifacts();
        assert_eq!(artifacts.len(), 1, "compiled exactly once");
        assert!(!artifacts[0].exists());

        let text = printed(orchestrator);
        assert!(text.contains("Programming language: sh"));
        assert!(text.contains("[1/2] Test Case 1 Passed!"));
        assert!(text.contains("[2/2] Test Case 2 Passed!"));
        assert!(text.contains("All Tests Passed!"));
    }

    #[tokio::test]
    async fn test_failures_stay_per_case() {
        let fixture = fixture(&[(1, "1\n", "1"), (2, "2\n", "2"), (3, "3\n", "3"), (4, "4\n", "4")]).await;
        let script = "read n\ncase $n in\n  1) echo 1 ;;\n  2) echo wrong ;;\n  3) exec sleep 5 ;;\n  4) echo partial; exit 3 ;;\nesac\n";
        let source = write_source(&fixture, "mixed.sh", script);
        let runner = ShellRunner::default();

        let mut orchestrator = RunOrchestrator::new(&runner, reporter());
        let options = RunOptions {
            timeout: Some(Duration::from_millis(300)),
            selected: None,
        };
        let report = orchestrator.run(&fixture.store, &source, &options).await.unwrap();

        let statuses: Vec<TestStatus> = report.cases.iter().map(|case| case.status()).collect();
        assert_eq!(
            statuses,
            vec![
                TestStatus::Passed,
                TestStatus::Failed,
                TestStatus::Timeout,
                TestStatus::RuntimeError
            ]
        );
        assert!(!report.all_passed());
        assert_eq!(report.cases[3].output.stdout, "partial\n");
        let artifacts = runner.artifacts();
        assert_eq!(artifacts.len(), 1);
        assert!(!artifacts[0].exists());

        let text = printed(orchestrator);
        assert!(text.contains("Test Case 3 Timeout!"));
        assert!(text.contains("Test Case 4 Runtime Error Occurred!"));
        assert!(text.contains("Some Tests Failed!"));
    }

    #[tokio::test]
    async fn test_cases_run_in_index_order() {
        let fixture = fixture(&[(10, "10\n", "20"), (2, "2\n", "4"), (7, "7\n", "14")]).await;
        let source = write_source(&fixture, "double.sh", DOUBLER);
        let runner = ShellRunner::default();

        let mut orchestrator = RunOrchestrator::new(&runner, reporter());
        let report = orchestrator
            .run(&fixture.store, &source, &RunOptions::default())
            .await
            .unwrap();
        let order: Vec<(u32, usize)> = report.cases.iter().map(|case| (case.index, case.position)).collect();
        assert_eq!(order, vec![(2, 1), (7, 2), (10, 3)]);
    }

    #[tokio::test]
    async fn test_single_selected_case() {
        let fixture = fixture(&[(1, "1\n", "2"), (2, "2\n", "4"), (3, "3\n", "6")]).await;
        let source = write_source(&fixture, "double.sh", DOUBLER);
        let runner = ShellRunner::default();

        let mut orchestrator = RunOrchestrator::new(&runner, reporter());
        let options = RunOptions {
            timeout: Some(Duration::from_secs(5)),
            selected: Some(2),
        };
        let report = orchestrator.run(&fixture.store, &source, &options).await.unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.cases.len(), 1);
        assert_eq!(report.cases[0].index, 2);
        assert_eq!(report.cases[0].position, 2);
        let text = printed(orchestrator);
        assert!(text.contains("[2/3] Test Case 2 Passed!"));
        assert!(!text.contains("Test Case 1 "));
    }

    #[tokio::test]
    async fn test_unknown_selected_index_fails_before_compiling() {
        let fixture = fixture(&[(1, "1\n", "2")]).await;
        let source = write_source(&fixture, "double.sh", DOUBLER);
        let runner = ShellRunner::default();

        let mut orchestrator = RunOrchestrator::new(&runner, reporter());
        let options = RunOptions {
            timeout: None,
            selected: Some(9),
        };
        let err = orchestrator.run(&fixture.store, &source, &options).await.unwrap_err();
        assert!(matches!(err, EngineError::TestNotFound(9)));
        assert!(runner.artifacts().is_empty());
        assert_eq!(orchestrator.phase(), RunPhase::Cleaned);
    }

    #[tokio::test]
    async fn test_compile_failure_skips_execution_and_cleans_up() {
        let fixture = fixture(&[(1, "1\n", "2")]).await;
        let source = write_source(&fixture, "broken.sh", "if then fi\n");
        let runner = ShellRunner::default();

        let mut orchestrator = RunOrchestrator::new(&runner, reporter());
        let err = orchestrator
            .run(&fixture.store, &source, &RunOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Compile);
        assert_eq!(err.to_string(), "compile failed");
        assert_eq!(
            orchestrator.phase_history(),
            &[RunPhase::Idle, RunPhase::TestsLoaded, RunPhase::Reported, RunPhase::Cleaned]
        );
        let artifacts = runner.artifacts();
        assert_eq!(artifacts.len(), 1);
        assert!(!artifacts[0].exists(), "partial artifact must be removed");

        let text = printed(orchestrator);
        assert!(text.contains("Compile Failed!"));
        assert!(text.contains("solvekit-"), "diagnostics name the checked file: {}", text);
        assert!(!text.contains("Test Case 1"));
    }

    #[tokio::test]
    async fn test_missing_tests_are_signalled() {
        let fixture = fixture(&[]).await;
        let source = write_source(&fixture, "double.sh", DOUBLER);
        let runner = ShellRunner::default();

        let mut orchestrator = RunOrchestrator::new(&runner, reporter());
        let err = orchestrator
            .run(&fixture.store, &source, &RunOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::TestsNotFound);
        assert!(runner.artifacts().is_empty());
    }

    #[tokio::test]
    async fn test_c_solution_end_to_end() {
        if which::which("cc").is_err() {
            eprintln!("cc not available, skipping");
            return;
        }
        let fixture = fixture(&[(1, "1 2\n", "3\n"), (2, "40 2\n", "42\n")]).await;
        let source = write_source(
            &fixture,
            "sum.c",
            "#include <stdio.h>\nint main(void) {\n  int a, b;\n  if (scanf(\"%d %d\", &a, &b) != 2) return 1;\n  printf(\"%d\\n\", a + b);\n  return 0;\n}\n",
        );
        let settings = RunnerSettings::from_json_str(r#"{"c": {"compiler": "cc", "std": "c11"}}"#).unwrap();
        let runner = RunnerRegistry::builtin().create(Language::C, &settings).unwrap();

        let mut orchestrator = RunOrchestrator::new(runner.as_ref(), reporter());
        let options = RunOptions {
            timeout: Some(Duration::from_secs(10)),
            selected: None,
        };
        let report = orchestrator.run(&fixture.store, &source, &options).await.unwrap();
        assert!(report.all_passed());
        assert_eq!(report.cases.len(), 2);
    }

    #[tokio::test]
    async fn test_c_solution_timeout_is_per_case() {
        if which::which("cc").is_err() {
            eprintln!("cc not available, skipping");
            return;
        }
        let fixture = fixture(&[(1, "1\n", "1\n"), (2, "2\n", "2\n"), (3, "3\n", "3\n")]).await;
        let source = write_source(
            &fixture,
            "slow.c",
            "#include <stdio.h>\n#include <unistd.h>\nint main(void) {\n  int n;\n  if (scanf(\"%d\", &n) != 1) return 1;\n  if (n == 2) sleep(5);\n  printf(\"%d\\n\", n);\n  return 0;\n}\n",
        );
        let settings = RunnerSettings::from_json_str(r#"{"c": {"compiler": "cc", "std": "gnu11"}}"#).unwrap();
        let runner = RunnerRegistry::builtin().create(Language::C, &settings).unwrap();

        let mut orchestrator = RunOrchestrator::new(runner.as_ref(), reporter());
        let options = RunOptions {
            timeout: Some(Duration::from_millis(500)),
            selected: None,
        };
        let report = orchestrator.run(&fixture.store, &source, &options).await.unwrap();

        let statuses: Vec<TestStatus> = report.cases.iter().map(|case| case.status()).collect();
        assert_eq!(statuses, vec![TestStatus::Passed, TestStatus::Timeout, TestStatus::Passed]);
        assert_eq!(report.count(TestStatus::Timeout), 1);
        assert!(report.cases[1].output.elapsed < Duration::from_secs(4));
        assert_eq!(orchestrator.phase(), RunPhase::Cleaned);
    }
}
