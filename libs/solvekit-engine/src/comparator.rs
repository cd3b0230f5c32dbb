/// Output Comparator - pass/fail decision for one test case
///
/// **Normalization Rules:**
/// - Trim leading/trailing whitespace of the whole output
/// - Split into lines, trim every line (also drops `\r`)
/// - Pad the shorter side with missing-line sentinels
///
/// **Matching:**
/// - Alignment is strictly positional
/// - Two aligned lines match iff both are present and equal
/// - Case sensitive, no floating-point tolerance
///
/// A test case passes iff every aligned pair matches, which also rules out
/// extra or missing lines on either side.
use crate::process::{ExecutionOutput, ExitOutcome};
use solvekit_common::types::TestStatus;

/// Lower bound of the rendered column width
pub const MIN_COLUMN_WIDTH: usize = 24;
/// Terminals narrower than this always get the verbose block dump
pub const NARROW_TERMINAL_WIDTH: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinePair {
    pub actual: Option<String>,
    pub expected: Option<String>,
}

impl LinePair {
    pub fn is_match(&self) -> bool {
        matches!((&self.actual, &self.expected), (Some(a), Some(e)) if a == e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Separate `actual` and `expected` blocks
    Verbose,
    /// Aligned two-column table
    SideBySide,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub passed: bool,
    pub lines: Vec<LinePair>,
    /// Longest line on either side, at least [`MIN_COLUMN_WIDTH`]
    pub column_width: usize,
}

impl Comparison {
    /// 0-based position of the first diverging line
    pub fn first_mismatch(&self) -> Option<usize> {
        self.lines.iter().position(|pair| !pair.is_match())
    }

    pub fn render_mode(&self, terminal_width: Option<usize>) -> RenderMode {
        match terminal_width {
            Some(width)
                if width < NARROW_TERMINAL_WIDTH
                    || (self.column_width * 2).saturating_sub(4) > width =>
            {
                RenderMode::Verbose
            }
            _ => RenderMode::SideBySide,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputWarning {
    /// Nothing on stdout while stderr has content
    EmptyStdout,
}

/// Final judgement of one executed test case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: TestStatus,
    /// Present whenever the process completed and outputs were compared
    pub comparison: Option<Comparison>,
    pub warning: Option<OutputWarning>,
}

fn normalize_lines(output: &str) -> Vec<&str> {
    output.trim().split('\n').map(str::trim).collect()
}

/// Compare actual against expected output
pub fn compare(actual: &str, expected: &str) -> Comparison {
    let actual_lines = normalize_lines(actual);
    let expected_lines = normalize_lines(expected);
    let line_count = actual_lines.len().max(expected_lines.len());

    let mut lines = Vec::with_capacity(line_count);
    let mut column_width = MIN_COLUMN_WIDTH;

    for idx in 0..line_count {
        let pair = LinePair {
            actual: actual_lines.get(idx).map(|line| line.to_string()),
            expected: expected_lines.get(idx).map(|line| line.to_string()),
        };
        for line in [&pair.actual, &pair.expected].into_iter().flatten() {
            column_width = column_width.max(line.chars().count());
        }
        lines.push(pair);
    }

    let passed = lines.iter().all(LinePair::is_match);

    Comparison {
        passed,
        lines,
        column_width,
    }
}

/// Evaluate an execution output against the expected stdout
///
/// Priority: timeout, then runtime error, then output comparison.
pub fn evaluate(output: &ExecutionOutput, expected_stdout: &str) -> Verdict {
    match output.outcome {
        ExitOutcome::TimedOut => Verdict {
            status: TestStatus::Timeout,
            comparison: None,
            warning: None,
        },
        ExitOutcome::Failure { .. } => Verdict {
            status: TestStatus::RuntimeError,
            comparison: None,
            warning: None,
        },
        ExitOutcome::Success => {
            let comparison = compare(&output.stdout, expected_stdout);
            let warning = (output.stdout.trim().is_empty() && !output.stderr.trim().is_empty())
                .then_some(OutputWarning::EmptyStdout);
            let status = if comparison.passed {
                TestStatus::Passed
            } else {
                TestStatus::Failed
            };
            Verdict {
                status,
                comparison: Some(comparison),
                warning,
            }
        }
    }
}
