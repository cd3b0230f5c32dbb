/// Run Orchestrator - drives one test run from fixtures to summary
///
/// **Phases:**
/// `Idle → TestsLoaded → Compiled | CompileSkipped → Running → Reported → Cleaned`
///
/// A compile failure jumps from `TestsLoaded` straight to `Reported`; no
/// test case is attempted.
///
/// **Guarantees:**
/// - Compilation happens at most once per run
/// - Test cases execute sequentially in ascending index order
/// - Each verdict is printed as soon as it is known
/// - Every temporary resource is removed before `run` returns, and by the
///   guard's `Drop` if the run future is cancelled
use crate::comparator::{self, Verdict};
use crate::error::{EngineError, Result};
use crate::process::{ExecutionOutput, ExitOutcome};
use crate::report::Reporter;
use crate::resources::ResourceGuard;
use crate::runner::LanguageRunner;
use crate::store::TestCaseStore;
use solvekit_common::types::{TestCase, TestStatus};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    TestsLoaded,
    Compiled,
    CompileSkipped,
    Running,
    Reported,
    Cleaned,
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Per-case limit, `None` disables it
    pub timeout: Option<Duration>,
    /// Run only the Test Case with this index
    pub selected: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct CaseReport {
    pub index: u32,
    /// 1-based position among all loaded cases
    pub position: usize,
    pub verdict: Verdict,
    pub output: ExecutionOutput,
}

impl CaseReport {
    pub fn status(&self) -> TestStatus {
        self.verdict.status
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    /// Number of loaded cases, including skipped ones
    pub total: usize,
    pub cases: Vec<CaseReport>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn all_passed(&self) -> bool {
        self.cases.iter().all(|case| case.status().is_passed())
    }

    pub fn count(&self, status: TestStatus) -> usize {
        self.cases.iter().filter(|case| case.status() == status).count()
    }
}

pub struct RunOrchestrator<'a, W: Write> {
    runner: &'a dyn LanguageRunner,
    reporter: Reporter<W>,
    resources: ResourceGuard,
    phases: Vec<RunPhase>,
}

impl<'a, W: Write> RunOrchestrator<'a, W> {
    pub fn new(runner: &'a dyn LanguageRunner, reporter: Reporter<W>) -> Self {
        Self {
            runner,
            reporter,
            resources: ResourceGuard::new(),
            phases: vec![RunPhase::Idle],
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phases.last().copied().unwrap_or(RunPhase::Idle)
    }

    /// Every phase the run went through, in order
    pub fn phase_history(&self) -> &[RunPhase] {
        &self.phases
    }

    pub fn into_reporter(self) -> Reporter<W> {
        self.reporter
    }

    fn enter(&mut self, phase: RunPhase) {
        debug!(from = ?self.phase(), to = ?phase, "Run phase transition");
        self.phases.push(phase);
    }

    /// Load the fixtures of `store`, build `source` once and judge every
    /// selected case
    #[instrument(
        skip(self, store, options),
        fields(
            language = %self.runner.language(),
            scope = %store.scope(),
            selected = ?options.selected
        )
    )]
    pub async fn run(&mut self, store: &TestCaseStore, source: &Path, options: &RunOptions) -> Result<RunReport> {
        let result = self.run_phases(store, source, options).await;

        let removed = self.resources.cleanup();
        self.enter(RunPhase::Cleaned);
        debug!(removed, "Run resources released");
        result
    }

    async fn run_phases(&mut self, store: &TestCaseStore, source: &Path, options: &RunOptions) -> Result<RunReport> {
        let started = Instant::now();

        let tests = store.read_all().await?;
        if tests.is_empty() {
            return Err(EngineError::TestsNotFound(store.scope().to_string()));
        }
        if let Some(selected) = options.selected {
            if !tests.iter().any(|case| case.index == selected) {
                return Err(EngineError::TestNotFound(selected));
            }
        }
        self.enter(RunPhase::TestsLoaded);

        let meta = store.load_meta().await?;
        self.reporter.runtime_info(&self.runner.runtime_info(), meta.as_ref())?;

        let target = self.build(source).await?;

        self.enter(RunPhase::Running);
        let total = tests.len();
        let mut cases = Vec::new();
        for (position, case) in (1..).zip(tests.iter()) {
            if options.selected.is_some_and(|selected| selected != case.index) {
                debug!(index = case.index, "Skipping unselected test case");
                continue;
            }
            let report = self.run_case(position, total, case, &target, options.timeout).await?;
            cases.push(report);
        }

        let report = RunReport {
            total,
            cases,
            elapsed: started.elapsed(),
        };
        self.reporter.summary(report.all_passed())?;
        self.enter(RunPhase::Reported);

        info!(
            executed = report.cases.len(),
            passed = report.count(TestStatus::Passed),
            failed = report.count(TestStatus::Failed),
            timed_out = report.count(TestStatus::Timeout),
            runtime_errors = report.count(TestStatus::RuntimeError),
            total_ms = report.elapsed.as_millis() as u64,
            "Run completed"
        );
        Ok(report)
    }

    async fn build(&mut self, source: &Path) -> Result<PathBuf> {
        let requires_compilation = self.runner.requires_compilation();
        match self.runner.compile(source, &mut self.resources).await {
            Ok(target) => {
                self.enter(if requires_compilation {
                    RunPhase::Compiled
                } else {
                    RunPhase::CompileSkipped
                });
                Ok(target)
            }
            Err(EngineError::CompileFailure { diagnostics }) => {
                self.reporter.compile_failure(&diagnostics)?;
                self.enter(RunPhase::Reported);
                Err(EngineError::CompileFailure { diagnostics })
            }
            Err(e) => Err(e),
        }
    }

    async fn run_case(
        &mut self,
        position: usize,
        total: usize,
        case: &TestCase,
        target: &Path,
        timeout: Option<Duration>,
    ) -> Result<CaseReport> {
        let output = match self
            .runner
            .execute(&case.stdin, target, timeout, &mut self.resources)
            .await
        {
            Ok(output) => output,
            Err(e) => {
                // Spawn problems count against this case only
                warn!(index = case.index, error = %e, "Test execution error");
                ExecutionOutput {
                    stdout: String::new(),
                    stderr: format!("Test execution error: {}", e),
                    elapsed: Duration::ZERO,
                    outcome: ExitOutcome::Failure {
                        code: None,
                        signal: None,
                    },
                    truncated: false,
                }
            }
        };

        let verdict = comparator::evaluate(&output, &case.expected_stdout);
        info!(
            index = case.index,
            status = %verdict.status,
            elapsed_ms = output.elapsed.as_millis() as u64,
            "Test case judged"
        );
        self.reporter.case_result(position, total, case, &verdict, &output)?;

        Ok(CaseReport {
            index: case.index,
            position,
            verdict,
            output,
        })
    }
}
